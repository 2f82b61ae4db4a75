//! Panamanian sales taxes: exempt, ITBMS and withholding.

use std::collections::BTreeMap;

use erpseed_core::{
  Error, Result, Session,
  query::{Filter, Query},
  record::{Record, RecordId},
  store::ConfigStore,
  target::{
    ConfigTarget, FiscalPosition, Scope, Tax, TaxComputation, TaxGroup, TaxPolicy, TaxUse,
  },
  upsert::{Upserted, link, require, require_model, upsert},
};
use tracing::{error, info};

use crate::{Settings, Summary, common};

/// `(rate, group name, sale description, purchase description)`.
pub const ITBMS_RATES: &[(f64, &str, &str, &str)] = &[
  (7.0, "ITBMS 7%", "ITBMS 7% Venta", "ITBMS 7% Compra"),
  (10.0, "ITBMS 10%", "ITBMS 10% Venta", "ITBMS 10% Compra"),
  (15.0, "ITBMS 15%", "ITBMS 15% Venta", "ITBMS 15% Compra"),
];

/// A component of the withholding group taxes.
struct BaseTax {
  name:             &'static str,
  amount:           f64,
  description:      &'static str,
  invoice_label:    &'static str,
  is_base_affected: bool,
}

const EXEMPT_BASE: &str = "ITBMS 0% (Operacion Exento de Impuesto)";
const RETAINED_BASE: &str = "ITBMS 7% (Operaciones con Retención)";
const HALF_WITHHELD: &str = "ITBMS 50% (Operaciones con Retención)";
const FULLY_WITHHELD: &str = "ITBMS 100% (Operaciones con Retención)";

const BASE_TAXES: &[BaseTax] = &[
  BaseTax {
    name:             EXEMPT_BASE,
    amount:           0.0,
    description:      "ITBMS 0% Venta",
    invoice_label:    "ITBMS 0% Venta",
    is_base_affected: false,
  },
  BaseTax {
    name:             RETAINED_BASE,
    amount:           7.0,
    description:      "ITBMS 7% Venta",
    invoice_label:    "7%",
    is_base_affected: true,
  },
  BaseTax {
    name:             HALF_WITHHELD,
    amount:           -3.5,
    description:      "ITBMS -50% Venta",
    invoice_label:    "-3.5%",
    is_base_affected: false,
  },
  BaseTax {
    name:             FULLY_WITHHELD,
    amount:           -7.0,
    description:      "ITBMS -100% Venta",
    invoice_label:    "-7.0%",
    is_base_affected: false,
  },
];

const HALF_RETENTION: &str = "Retención de impuestos 50%";

/// `(name, children, invoice label)` of the withholding group taxes.
const GROUP_TAXES: &[(&str, &[&str], &str)] = &[
  (
    HALF_RETENTION,
    &[RETAINED_BASE, HALF_WITHHELD],
    "ITBMS 7% (Operaciones con Retención)",
  ),
  (
    "Retención de impuestos 100%",
    &[RETAINED_BASE, FULLY_WITHHELD],
    "ITBMS 7% (Operaciones con Retención)",
  ),
  (
    "Exento de Impuestos 100%",
    &[EXEMPT_BASE],
    "ITBMS 7% (Operaciones con Exento)",
  ),
];

// ─── Exempt ──────────────────────────────────────────────────────────────────

/// The "Exento 0%" tax group with a 0 % sale and a 0 % purchase tax, per
/// company in the fiscal country. Taxes that already exist are not touched.
pub async fn default_taxes<S: ConfigStore>(
  session: &Session<'_, S>,
  settings: &Settings,
) -> Result<Summary> {
  require_model(session, "account.tax").await?;
  let country = common::fiscal_country(session, settings).await?;

  let mut summary = Summary::default();
  for company in common::companies_in(session, &country).await? {
    let scope = Scope::Company(company.id);
    let group = TaxGroup {
      name:    "Exento 0%".into(),
      country: country.id,
      aliases: vec!["Exento".into(), "Excento".into()],
    };
    let group = track(&mut summary, upsert(session, scope, &group.into()).await?);

    for (usage, description) in [
      (TaxUse::Sale, "Exento 0% Venta"),
      (TaxUse::Purchase, "Exento 0% Compra"),
    ] {
      let tax = Tax::percent("0%", usage, 0.0, description, group.id(), country.id);
      track(&mut summary, upsert(session, scope, &tax.into()).await?);
    }
  }
  Ok(summary)
}

// ─── ITBMS ───────────────────────────────────────────────────────────────────

/// One tax group per ITBMS rate, each with a sale and a purchase tax.
pub async fn itbms_taxes<S: ConfigStore>(
  session: &Session<'_, S>,
  settings: &Settings,
) -> Result<Summary> {
  require_model(session, "account.tax").await?;
  let country = common::fiscal_country(session, settings).await?;

  let mut summary = Summary::default();
  for company in common::companies_in(session, &country).await? {
    let scope = Scope::Company(company.id);
    for &(rate, group_name, sale, purchase) in ITBMS_RATES {
      let group = TaxGroup {
        name:    group_name.into(),
        country: country.id,
        aliases: Vec::new(),
      };
      let group = track(&mut summary, upsert(session, scope, &group.into()).await?);

      let name = format!("{}%", rate as i64);
      for (usage, description) in [(TaxUse::Sale, sale), (TaxUse::Purchase, purchase)] {
        let tax = Tax::percent(name.as_str(), usage, rate, description, group.id(), country.id)
          .keyed_by_group();
        track(&mut summary, upsert(session, scope, &tax.into()).await?);
      }
    }
  }
  Ok(summary)
}

// ─── Withholding ─────────────────────────────────────────────────────────────

/// The withholding tax group, its four component taxes and three group
/// taxes. Under the withholding fiscal position, the 50 % group tax replaces
/// the company's 0 % sale tax.
pub async fn retention_taxes<S: ConfigStore>(
  session: &Session<'_, S>,
  settings: &Settings,
) -> Result<Summary> {
  require_model(session, "account.tax").await?;
  require_model(session, "account.fiscal.position").await?;
  let country = common::fiscal_country(session, settings).await?;
  if common::companies(session).await?.is_empty() {
    return Err(Error::MissingPrerequisite("a company".into()));
  }

  let mut summary = Summary::default();
  for company in common::companies_in(session, &country).await? {
    info!(company = %company.display_name(), "provisioning withholding taxes");
    let scope = Scope::Company(company.id);

    let group = TaxGroup {
      name:    settings.tax_group_retencion_name.clone(),
      country: country.id,
      aliases: Vec::new(),
    };
    let group = track(&mut summary, upsert(session, scope, &group.into()).await?);

    let mut bases = BTreeMap::new();
    for base in BASE_TAXES {
      let tax = Tax {
        name:             base.name.into(),
        usage:            TaxUse::Sale,
        computation:      TaxComputation::Percent(base.amount),
        description:      Some(base.description.into()),
        invoice_label:    Some(base.invoice_label.into()),
        group:            group.id(),
        country:          country.id,
        is_base_affected: Some(base.is_base_affected),
        policy:           TaxPolicy::Reconcile,
      };
      let tax = track(&mut summary, upsert(session, scope, &tax.into()).await?);
      bases.insert(base.name, tax.id());
    }

    let mut half_retention = None;
    for &(name, children, label) in GROUP_TAXES {
      let tax = Tax {
        name:             name.into(),
        usage:            TaxUse::Sale,
        computation:      TaxComputation::Group(
          children.iter().filter_map(|c| bases.get(c).copied()).collect(),
        ),
        description:      None,
        invoice_label:    Some(label.into()),
        group:            group.id(),
        country:          country.id,
        is_base_affected: None,
        policy:           TaxPolicy::Reconcile,
      };
      let tax = track(&mut summary, upsert(session, scope, &tax.into()).await?);
      if name == HALF_RETENTION {
        half_retention = Some(tax.record);
      }
    }

    let position = withholding_position(session, settings, scope, country.id, &mut summary).await?;
    let Some(half_retention) = half_retention else { continue };
    let Some(exempt) = exempt_sale_tax(session, company.id, country.id).await? else {
      error!(company = %company.display_name(), "no 0% sale tax found; cannot map it to '{HALF_RETENTION}'");
      continue;
    };

    let mapped = link(session, half_retention, "original_tax_ids", exempt.id).await?;
    if mapped.outcome.is_change() {
      info!("'{HALF_RETENTION}' now replaces '{}'", exempt.display_name());
    }
    summary.record(&mapped.outcome);
    let mapped = link(session, mapped.record, "fiscal_position_ids", position.id).await?;
    if mapped.outcome.is_change() {
      info!("'{HALF_RETENTION}' linked to fiscal position '{}'", position.display_name());
    }
    summary.record(&mapped.outcome);
  }
  Ok(summary)
}

/// The withholding fiscal position. It is normally created by the
/// `fiscal-position-retencion` task; when missing it is created here with
/// automatic detection off.
async fn withholding_position<S: ConfigStore>(
  session: &Session<'_, S>,
  settings: &Settings,
  scope: Scope,
  country: RecordId,
  summary: &mut Summary,
) -> Result<Record> {
  let target: ConfigTarget = FiscalPosition {
    name:       settings.fiscal_position_retencion_name.clone(),
    country:    Some(country),
    auto_apply: false,
  }
  .into();

  match require(session, &target.lookup(scope)?, &target.label()).await {
    Ok(position) => Ok(position),
    Err(e) if e.is_missing_prerequisite() => {
      error!(
        "fiscal position '{}' not found; run fiscal-position-retencion first. Creating it",
        settings.fiscal_position_retencion_name
      );
      Ok(track(summary, upsert(session, scope, &target).await?).record)
    }
    Err(e) => Err(e),
  }
}

/// The company's 0 % sale tax, falling back to any sale tax named like an
/// exemption.
async fn exempt_sale_tax<S: ConfigStore>(
  session: &Session<'_, S>,
  company: RecordId,
  country: RecordId,
) -> Result<Option<Record>> {
  if let Some(tax) = common::zero_tax(session, company, country, TaxUse::Sale).await? {
    return Ok(Some(tax));
  }
  let query = Query::new("account.tax")
    .filter(Filter::eq("company_id", company))
    .filter(Filter::eq("type_tax_use", "sale"))
    .filter(Filter::any([Filter::ilike("name", "Exento"), Filter::eq("name", "0%")]))
    .limit(1);
  Ok(session.search(&query).await.map_err(Error::store)?.into_iter().next())
}

fn track(summary: &mut Summary, upserted: Upserted) -> Upserted {
  summary.record(&upserted.outcome);
  upserted
}
