//! Typed configuration targets.
//!
//! A [`ConfigTarget`] describes one record the way a provisioning task wants it
//! to be: the natural key used to recognise it across runs, the full field
//! set used on creation, and the subset of fields that are reconciled when the
//! record already exists. Each record kind has its own struct so the field set
//! is fixed at compile time.

use strum::{Display, IntoStaticStr};

use crate::{
  Error, Result, fields,
  query::{Filter, Query},
  record::{FieldMap, RecordId, Value},
};

// ─── Scope ───────────────────────────────────────────────────────────────────

/// The owning-company partition a target lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
  /// Not owned by any company. For company-owned kinds this means
  /// `company_id` is unset.
  Global,
  Company(RecordId),
}

impl Scope {
  pub fn company(self) -> Option<RecordId> {
    match self {
      Self::Global => None,
      Self::Company(id) => Some(id),
    }
  }

  /// The `company_id` value records in this scope carry.
  pub fn company_value(self) -> Value { Value::from(self.company()) }
}

// ─── Kinds ───────────────────────────────────────────────────────────────────

/// Whether records of a kind are partitioned by company.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
  Company,
  /// Owned by a company, but a record with no company is visible to every
  /// company and is reused rather than duplicated.
  CompanyOrShared,
  Shared,
}

/// The record kinds erpseed knows how to provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum TargetKind {
  Journal,
  TaxGroup,
  Tax,
  FiscalPosition,
  PaymentTerm,
  PartnerTag,
  CountryState,
  Product,
  Default,
}

impl TargetKind {
  /// The store model records of this kind live in.
  pub fn model(self) -> &'static str {
    match self {
      Self::Journal => "account.journal",
      Self::TaxGroup => "account.tax.group",
      Self::Tax => "account.tax",
      Self::FiscalPosition => "account.fiscal.position",
      Self::PaymentTerm => "account.payment.term",
      Self::PartnerTag => "res.partner.category",
      Self::CountryState => "res.country.state",
      Self::Product => "product.template",
      Self::Default => "ir.default",
    }
  }

  pub fn ownership(self) -> Ownership {
    match self {
      Self::PaymentTerm | Self::PartnerTag | Self::CountryState => {
        Ownership::Shared
      }
      Self::Product => Ownership::CompanyOrShared,
      _ => Ownership::Company,
    }
  }

  /// The filter that confines a search to `scope`, if the kind is scoped.
  pub fn scope_filter(self, scope: Scope) -> Result<Option<Filter>> {
    match (self.ownership(), scope) {
      (Ownership::Company, scope) | (Ownership::CompanyOrShared, scope @ Scope::Global) => {
        Ok(Some(Filter::eq("company_id", scope.company_value())))
      }
      (Ownership::CompanyOrShared, Scope::Company(company)) => Ok(Some(Filter::is_in(
        "company_id",
        [Value::Null, Value::from(company)],
      ))),
      (Ownership::Shared, Scope::Global) => Ok(None),
      (Ownership::Shared, Scope::Company(company)) => Err(Error::ScopeMismatch {
        kind: self.into(),
        company,
      }),
    }
  }
}

// ─── Journal ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum JournalType {
  Sale,
  Purchase,
}

/// An accounting journal, recognised by code or by a name substring.
#[derive(Debug, Clone, PartialEq)]
pub struct Journal {
  pub name:            String,
  pub code:            String,
  pub journal_type:    JournalType,
  /// Income account used on creation. Not reconciled.
  pub default_account: Option<RecordId>,
  /// Dedicated credit-note numbering. `None` leaves the field alone.
  pub refund_sequence: Option<bool>,
}

impl Journal {
  fn natural_key(&self) -> Vec<Filter> {
    vec![
      Filter::eq("type", <&str>::from(self.journal_type)),
      Filter::any([
        Filter::eq("code", self.code.as_str()),
        Filter::ilike("name", self.name.as_str()),
      ]),
    ]
  }

  fn fields(&self) -> FieldMap {
    let mut map = fields! {
      "name" => self.name.as_str(),
      "code" => self.code.as_str(),
      "type" => <&str>::from(self.journal_type),
    };
    if let Some(account) = self.default_account {
      map.insert("default_account_id".into(), account.into());
    }
    if let Some(refund) = self.refund_sequence {
      map.insert("refund_sequence".into(), refund.into());
    }
    map
  }

  fn managed(&self) -> &'static [&'static str] {
    if self.refund_sequence.is_some() { &["refund_sequence"] } else { &[] }
  }
}

// ─── Taxes ───────────────────────────────────────────────────────────────────

/// A tax group scoped to a country.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxGroup {
  pub name:    String,
  pub country: RecordId,
  /// When non-empty, an existing group whose name contains any of these
  /// (case-insensitively) is accepted instead of an exact name match.
  pub aliases: Vec<String>,
}

impl TaxGroup {
  fn natural_key(&self) -> Vec<Filter> {
    let name = if self.aliases.is_empty() {
      Filter::eq("name", self.name.as_str())
    } else {
      Filter::any(
        self
          .aliases
          .iter()
          .map(|alias| Filter::ilike("name", alias.as_str())),
      )
    };
    vec![Filter::eq("country_id", self.country), name]
  }

  fn fields(&self) -> FieldMap {
    fields! {
      "name" => self.name.as_str(),
      "country_id" => self.country,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum TaxUse {
  Sale,
  Purchase,
}

/// How a tax computes its amount.
#[derive(Debug, Clone, PartialEq)]
pub enum TaxComputation {
  /// A percentage of the base; may be negative for withholdings.
  Percent(f64),
  /// A container whose amount is the sum of its children.
  Group(Vec<RecordId>),
}

/// How an existing tax is recognised, and whether it is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxPolicy {
  /// Recognised by name, use and rate, plus the tax group when `by_group`.
  /// A tax that already exists is left exactly as found.
  Keep { by_group: bool },
  /// Recognised by name and use; amounts, labels, group and children are
  /// reconciled.
  Reconcile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tax {
  pub name:             String,
  pub usage:            TaxUse,
  pub computation:      TaxComputation,
  pub description:      Option<String>,
  pub invoice_label:    Option<String>,
  pub group:            RecordId,
  pub country:          RecordId,
  pub is_base_affected: Option<bool>,
  pub policy:           TaxPolicy,
}

impl Tax {
  /// A plain percentage tax with no label overrides. Never rewritten once it
  /// exists.
  pub fn percent(
    name: impl Into<String>,
    usage: TaxUse,
    amount: f64,
    description: impl Into<String>,
    group: RecordId,
    country: RecordId,
  ) -> Self {
    Self {
      name: name.into(),
      usage,
      computation: TaxComputation::Percent(amount),
      description: Some(description.into()),
      invoice_label: None,
      group,
      country,
      is_base_affected: None,
      policy: TaxPolicy::Keep { by_group: false },
    }
  }

  /// Only a tax already in this tax group counts as existing.
  pub fn keyed_by_group(mut self) -> Self {
    self.policy = TaxPolicy::Keep { by_group: true };
    self
  }

  fn natural_key(&self) -> Vec<Filter> {
    let mut key = vec![
      Filter::eq("country_id", self.country),
      Filter::eq("type_tax_use", <&str>::from(self.usage)),
      Filter::eq("name", self.name.as_str()),
    ];
    if let TaxPolicy::Keep { by_group } = self.policy {
      if let TaxComputation::Percent(amount) = self.computation {
        key.push(Filter::eq("amount", amount));
      }
      if by_group {
        key.push(Filter::eq("tax_group_id", self.group));
      }
    }
    key
  }

  fn fields(&self) -> FieldMap {
    let mut map = fields! {
      "name" => self.name.as_str(),
      "type_tax_use" => <&str>::from(self.usage),
      "tax_group_id" => self.group,
      "country_id" => self.country,
      "price_include" => false,
      "include_base_amount" => false,
      "description" => self.description.clone().map_or(Value::Null, Value::Text),
    };
    match &self.computation {
      TaxComputation::Percent(amount) => {
        map.insert("amount_type".into(), "percent".into());
        map.insert("amount".into(), (*amount).into());
      }
      TaxComputation::Group(children) => {
        map.insert("amount_type".into(), "group".into());
        map.insert("children_tax_ids".into(), children.clone().into());
      }
    }
    if let Some(label) = &self.invoice_label {
      map.insert("invoice_label".into(), label.as_str().into());
    }
    if let Some(affected) = self.is_base_affected {
      map.insert("is_base_affected".into(), affected.into());
    }
    map
  }

  fn managed(&self) -> &'static [&'static str] {
    if matches!(self.policy, TaxPolicy::Keep { .. }) {
      return &[];
    }
    &[
      "amount_type",
      "amount",
      "children_tax_ids",
      "description",
      "invoice_label",
      "tax_group_id",
      "price_include",
      "include_base_amount",
      "is_base_affected",
    ]
  }
}

// ─── Fiscal positions ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct FiscalPosition {
  pub name:       String,
  pub country:    Option<RecordId>,
  /// Detect automatically from partner attributes.
  pub auto_apply: bool,
}

impl FiscalPosition {
  fn natural_key(&self) -> Vec<Filter> {
    vec![Filter::eq("name", self.name.as_str())]
  }

  fn fields(&self) -> FieldMap {
    let mut map = fields! {
      "name" => self.name.as_str(),
      "auto_apply" => self.auto_apply,
    };
    if let Some(country) = self.country {
      map.insert("country_id".into(), country.into());
    }
    map
  }
}

// ─── Payment terms ───────────────────────────────────────────────────────────

/// A payment term whose whole balance is due `due_days` after the invoice
/// date (0 = immediate).
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentTerm {
  pub name:     String,
  pub sequence: i64,
  pub due_days: i64,
}

impl PaymentTerm {
  fn natural_key(&self) -> Vec<Filter> {
    vec![Filter::eq("name", self.name.as_str())]
  }

  fn fields(&self) -> FieldMap {
    let line = fields! {
      "value" => "percent",
      "value_amount" => 100.0,
      "delay_type" => "days_after",
      "nb_days" => self.due_days,
    };
    let mut map = fields! {
      "name" => self.name.as_str(),
      "sequence" => self.sequence,
    };
    map.insert("line_ids".into(), Value::Lines(vec![line]));
    map
  }
}

// ─── Partners & localisation ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PartnerTag {
  pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountryState {
  pub country: RecordId,
  pub code:    String,
  pub name:    String,
}

impl CountryState {
  fn natural_key(&self) -> Vec<Filter> {
    vec![
      Filter::eq("country_id", self.country),
      Filter::eq("code", self.code.as_str()),
    ]
  }

  fn fields(&self) -> FieldMap {
    fields! {
      "country_id" => self.country,
      "code" => self.code.as_str(),
      "name" => self.name.as_str(),
    }
  }
}

// ─── Products ────────────────────────────────────────────────────────────────

/// A service product with fixed customer and vendor taxes.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
  pub name:         String,
  pub sale_tax:     RecordId,
  pub purchase_tax: RecordId,
}

impl Product {
  fn natural_key(&self) -> Vec<Filter> {
    vec![Filter::eq("name", self.name.as_str())]
  }

  fn fields(&self) -> FieldMap {
    fields! {
      "name" => self.name.as_str(),
      "type" => "service",
      "taxes_id" => vec![self.sale_tax],
      "supplier_taxes_id" => vec![self.purchase_tax],
    }
  }
}

// ─── Field defaults ──────────────────────────────────────────────────────────

/// An entry in the per-field default registry: new `model` records get
/// `value` in `field`, optionally only when `condition` holds
/// (e.g. `move_type=out_refund`).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefault {
  pub model:     String,
  pub field:     String,
  pub condition: Option<String>,
  pub value:     Value,
}

impl FieldDefault {
  fn natural_key(&self) -> Vec<Filter> {
    vec![
      Filter::eq("model", self.model.as_str()),
      Filter::eq("field", self.field.as_str()),
      Filter::eq(
        "condition",
        self.condition.clone().map_or(Value::Null, Value::Text),
      ),
    ]
  }

  fn fields(&self) -> FieldMap {
    fields! {
      "model" => self.model.as_str(),
      "field" => self.field.as_str(),
      "condition" => self.condition.clone().map_or(Value::Null, Value::Text),
      "value" => self.value.clone(),
    }
  }
}

// ─── ConfigTarget ────────────────────────────────────────────────────────────

/// One desired configuration record.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigTarget {
  Journal(Journal),
  TaxGroup(TaxGroup),
  Tax(Tax),
  FiscalPosition(FiscalPosition),
  PaymentTerm(PaymentTerm),
  PartnerTag(PartnerTag),
  CountryState(CountryState),
  Product(Product),
  Default(FieldDefault),
}

impl ConfigTarget {
  pub fn kind(&self) -> TargetKind {
    match self {
      Self::Journal(_) => TargetKind::Journal,
      Self::TaxGroup(_) => TargetKind::TaxGroup,
      Self::Tax(_) => TargetKind::Tax,
      Self::FiscalPosition(_) => TargetKind::FiscalPosition,
      Self::PaymentTerm(_) => TargetKind::PaymentTerm,
      Self::PartnerTag(_) => TargetKind::PartnerTag,
      Self::CountryState(_) => TargetKind::CountryState,
      Self::Product(_) => TargetKind::Product,
      Self::Default(_) => TargetKind::Default,
    }
  }

  pub fn model(&self) -> &'static str { self.kind().model() }

  /// Short label for log lines, e.g. `tax 'ITBMS 7%'`.
  pub fn label(&self) -> String {
    let name = match self {
      Self::Journal(t) => t.name.as_str(),
      Self::TaxGroup(t) => t.name.as_str(),
      Self::Tax(t) => t.name.as_str(),
      Self::FiscalPosition(t) => t.name.as_str(),
      Self::PaymentTerm(t) => t.name.as_str(),
      Self::PartnerTag(t) => t.name.as_str(),
      Self::CountryState(t) => t.name.as_str(),
      Self::Product(t) => t.name.as_str(),
      Self::Default(t) => {
        return match &t.condition {
          Some(cond) => format!("default {}.{} [{cond}]", t.model, t.field),
          None => format!("default {}.{}", t.model, t.field),
        };
      }
    };
    format!("{} '{name}'", self.kind())
  }

  /// Fields that recognise the record, without the scope filter.
  pub fn natural_key(&self) -> Vec<Filter> {
    match self {
      Self::Journal(t) => t.natural_key(),
      Self::TaxGroup(t) => t.natural_key(),
      Self::Tax(t) => t.natural_key(),
      Self::FiscalPosition(t) => t.natural_key(),
      Self::PaymentTerm(t) => t.natural_key(),
      Self::PartnerTag(t) => vec![Filter::eq("name", t.name.as_str())],
      Self::CountryState(t) => t.natural_key(),
      Self::Product(t) => t.natural_key(),
      Self::Default(t) => t.natural_key(),
    }
  }

  /// The full field mapping written on creation, without `company_id`.
  pub fn fields(&self) -> FieldMap {
    match self {
      Self::Journal(t) => t.fields(),
      Self::TaxGroup(t) => t.fields(),
      Self::Tax(t) => t.fields(),
      Self::FiscalPosition(t) => t.fields(),
      Self::PaymentTerm(t) => t.fields(),
      Self::PartnerTag(t) => fields! { "name" => t.name.as_str() },
      Self::CountryState(t) => t.fields(),
      Self::Product(t) => t.fields(),
      Self::Default(t) => t.fields(),
    }
  }

  /// Names of the fields reconciled on an existing record.
  pub fn managed(&self) -> &'static [&'static str] {
    match self {
      Self::Journal(t) => t.managed(),
      Self::Tax(t) => t.managed(),
      Self::FiscalPosition(_) => &["auto_apply"],
      Self::PaymentTerm(_) => &["sequence"],
      Self::CountryState(_) => &["name"],
      Self::Default(_) => &["value"],
      Self::TaxGroup(_) | Self::PartnerTag(_) | Self::Product(_) => &[],
    }
  }

  /// The desired values of the managed fields. A managed field the target
  /// does not set is not reconciled.
  pub fn managed_fields(&self) -> FieldMap {
    let mut all = self.fields();
    all.retain(|name, _| self.managed().contains(&name.as_str()));
    all
  }

  /// The search that finds this target's record within `scope`.
  pub fn lookup(&self, scope: Scope) -> Result<Query> {
    let query = Query::new(self.model()).filters(self.natural_key());
    Ok(match self.kind().scope_filter(scope)? {
      Some(filter) => query.filter(filter),
      None => query,
    })
  }

  /// The creation mapping for `scope`, including `company_id` for
  /// company-owned kinds.
  pub fn fields_in(&self, scope: Scope) -> Result<FieldMap> {
    let mut map = self.fields();
    if self.kind().scope_filter(scope)?.is_some() {
      map.insert("company_id".into(), scope.company_value());
    }
    Ok(map)
  }
}

macro_rules! impl_from_shape {
  ($($shape:ident => $variant:ident),* $(,)?) => {
    $(
      impl From<$shape> for ConfigTarget {
        fn from(t: $shape) -> Self { Self::$variant(t) }
      }
    )*
  };
}

impl_from_shape! {
  Journal => Journal,
  TaxGroup => TaxGroup,
  Tax => Tax,
  FiscalPosition => FiscalPosition,
  PaymentTerm => PaymentTerm,
  PartnerTag => PartnerTag,
  CountryState => CountryState,
  Product => Product,
  FieldDefault => Default,
}
