//! Task runs against an in-memory `SqliteStore`.

use erpseed_core::{
  fields,
  query::{Filter, Query},
  record::{Record, RecordId, Value},
  store::ConfigStore,
};
use erpseed_store_sqlite::SqliteStore;

use crate::{PANAMA_STATES, PAYMENT_TERMS, Settings, Summary, Task, TaskReport, run, run_all};

const MODELS: &[&str] = &[
  "res.company",
  "res.country",
  "res.country.state",
  "res.partner",
  "res.partner.category",
  "res.groups",
  "ir.default",
  "ir.actions.act_window",
  "ir.actions.act_window.view",
  "report.paperformat",
  "account.account",
  "account.journal",
  "account.tax",
  "account.tax.group",
  "account.fiscal.position",
  "account.payment.term",
  "product.template",
];

/// A store with Panama, one Panamanian company and its income account.
struct Fixture {
  store:   SqliteStore,
  country: RecordId,
  company: RecordId,
  account: RecordId,
}

async fn fixture() -> Fixture {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  store.install_models(MODELS.iter().copied()).await.expect("install models");

  let country = store
    .create("res.country", fields! { "code" => "PA", "name" => "Panamá" })
    .await
    .unwrap()
    .id;
  let company = store
    .create("res.company", fields! { "name" => "Demo S.A.", "country_id" => country })
    .await
    .unwrap()
    .id;
  let account = store
    .create(
      "account.account",
      fields! {
        "name" => "Ventas",
        "account_type" => "income",
        "company_id" => company,
      },
    )
    .await
    .unwrap()
    .id;

  Fixture { store, country, company, account }
}

async fn completed(store: &SqliteStore, task: Task) -> Summary {
  match run(store, &Settings::default(), task).await.unwrap() {
    TaskReport::Completed(summary) => summary,
    other => panic!("{task} did not complete: {other:?}"),
  }
}

async fn find(store: &SqliteStore, model: &str, filters: Vec<Filter>) -> Vec<Record> {
  store.search(&Query::new(model).filters(filters)).await.unwrap()
}

// ─── Task list ───────────────────────────────────────────────────────────────

#[test]
fn task_names_are_kebab_case() {
  assert_eq!(Task::CreditNotesJournal.to_string(), "credit-notes-journal");
  assert_eq!("sale-uom-packaging".parse::<Task>().unwrap(), Task::SaleUomPackaging);
  assert!("credit_notes_journal".parse::<Task>().is_err());
}

#[test]
fn products_run_after_taxes() {
  let order: Vec<Task> = Task::all().collect();
  let position = |t: Task| order.iter().position(|o| *o == t).unwrap();
  assert_eq!(order.len(), 15);
  assert!(position(Task::DefaultTaxes) < position(Task::DefaultProducts));
  assert!(position(Task::FiscalPositionRetencion) < position(Task::RetentionTaxes));
}

// ─── Journals ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn credit_notes_journal_is_created_once() {
  let f = fixture().await;

  let first = completed(&f.store, Task::CreditNotesJournal).await;
  assert_eq!(first.created, 2);

  let journals = find(&f.store, "account.journal", vec![Filter::eq("code", "NC")]).await;
  assert_eq!(journals.len(), 1);
  let journal = &journals[0];
  assert_eq!(journal.text("name"), Some("Notas de Crédito"));
  assert_eq!(journal.text("type"), Some("sale"));
  assert!(journal.flag("refund_sequence"));
  assert_eq!(journal.reference("default_account_id"), Some(f.account));
  assert_eq!(journal.reference("company_id"), Some(f.company));

  let defaults = find(&f.store, "ir.default", vec![]).await;
  assert_eq!(defaults.len(), 1);
  assert_eq!(defaults[0].text("model"), Some("account.move"));
  assert_eq!(defaults[0].text("field"), Some("journal_id"));
  assert_eq!(defaults[0].text("condition"), Some("move_type=out_refund"));
  assert_eq!(defaults[0].field("value"), &Value::Ref(journal.id));
  assert_eq!(defaults[0].reference("company_id"), Some(f.company));

  let second = completed(&f.store, Task::CreditNotesJournal).await;
  assert!(!second.changed());
  assert_eq!(second.unchanged, 2);
}

#[tokio::test]
async fn existing_credit_notes_journal_gets_refund_sequence() {
  let f = fixture().await;
  let existing = f
    .store
    .create(
      "account.journal",
      fields! {
        "name" => "Notas de crédito clientes",
        "code" => "NCC",
        "type" => "sale",
        "company_id" => f.company,
      },
    )
    .await
    .unwrap();

  let summary = completed(&f.store, Task::CreditNotesJournal).await;
  assert_eq!(summary.updated, 1);

  let journal = f.store.get("account.journal", existing.id).await.unwrap().unwrap();
  assert!(journal.flag("refund_sequence"));
  assert_eq!(journal.text("code"), Some("NCC"));
  assert_eq!(find(&f.store, "account.journal", vec![]).await.len(), 1);
}

#[tokio::test]
async fn company_without_income_account_is_skipped() {
  let f = fixture().await;
  let bare = f
    .store
    .create("res.company", fields! { "name" => "Sin Plan" })
    .await
    .unwrap();

  let summary = completed(&f.store, Task::SalesJournal).await;
  assert_eq!(summary.skipped, 1);

  let journals = find(&f.store, "account.journal", vec![]).await;
  assert_eq!(journals.len(), 1);
  assert_eq!(journals[0].text("code"), Some("FE"));
  assert!(!journals[0].fields.contains_key("refund_sequence"));
  assert!(
    find(&f.store, "ir.default", vec![Filter::eq("company_id", bare.id)])
      .await
      .is_empty()
  );
}

#[tokio::test]
async fn journals_stay_within_their_company() {
  let f = fixture().await;
  let other = f
    .store
    .create("res.company", fields! { "name" => "Otra", "income_account_id" => f.account })
    .await
    .unwrap();

  completed(&f.store, Task::SalesJournal).await;
  let journals = find(&f.store, "account.journal", vec![]).await;
  assert_eq!(journals.len(), 2);
  let owners: Vec<_> = journals.iter().map(|j| j.reference("company_id")).collect();
  assert_eq!(owners, [Some(f.company), Some(other.id)]);
}

// ─── Preconditions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_country_skips_and_rolls_back() {
  let f = fixture().await;
  let settings = Settings { country_code: "CR".into(), ..Settings::default() };

  let report = run(&f.store, &settings, Task::DefaultCountry).await.unwrap();
  assert_eq!(report, TaskReport::Skipped("missing prerequisite: country CR".into()));
  assert!(find(&f.store, "ir.default", vec![]).await.is_empty());
}

#[tokio::test]
async fn missing_tag_model_fails() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let report = run(&store, &Settings::default(), Task::PartnerTags).await.unwrap();
  assert!(report.is_failure());
}

#[tokio::test]
async fn run_all_stops_at_first_failure() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let reports = run_all(&store, &Settings::default(), Task::all()).await.unwrap();

  let tasks: Vec<Task> = reports.iter().map(|(t, _)| *t).collect();
  assert_eq!(tasks, [Task::DefaultCountry, Task::CountryStates, Task::PartnerTags]);
  assert!(matches!(reports[0].1, TaskReport::Skipped(_)));
  assert!(reports[2].1.is_failure());
}

// ─── Localisation ────────────────────────────────────────────────────────────

#[tokio::test]
async fn default_country_sets_companies_and_contact_default() {
  let f = fixture().await;
  let other = f
    .store
    .create("res.company", fields! { "name" => "Sin País" })
    .await
    .unwrap();

  let summary = completed(&f.store, Task::DefaultCountry).await;
  assert_eq!(summary.updated, 1);
  assert_eq!(summary.created, 1);

  let other = f.store.get("res.company", other.id).await.unwrap().unwrap();
  assert_eq!(other.reference("country_id"), Some(f.country));

  let defaults = find(&f.store, "ir.default", vec![Filter::eq("model", "res.partner")]).await;
  assert_eq!(defaults.len(), 1);
  assert_eq!(defaults[0].field("condition"), &Value::Null);
  assert_eq!(defaults[0].field("company_id"), &Value::Null);
  assert_eq!(defaults[0].field("value"), &Value::Ref(f.country));
}

#[tokio::test]
async fn country_states_are_created_and_renamed() {
  let f = fixture().await;
  let colon = f
    .store
    .create(
      "res.country.state",
      fields! { "country_id" => f.country, "code" => "03", "name" => "Colon" },
    )
    .await
    .unwrap();

  let summary = completed(&f.store, Task::CountryStates).await;
  assert_eq!(summary.created, PANAMA_STATES.len() - 1);
  assert_eq!(summary.updated, 1);

  let colon = f.store.get("res.country.state", colon.id).await.unwrap().unwrap();
  assert_eq!(colon.text("name"), Some("Colón"));
  assert_eq!(
    find(&f.store, "res.country.state", vec![]).await.len(),
    PANAMA_STATES.len()
  );
}

// ─── Partners ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn partner_tags_do_not_duplicate() {
  let f = fixture().await;
  f.store
    .create("res.partner.category", fields! { "name" => "Cliente" })
    .await
    .unwrap();

  let summary = completed(&f.store, Task::PartnerTags).await;
  assert_eq!(summary.created, crate::TAG_NAMES.len() - 1);
  assert_eq!(summary.unchanged, 1);
  assert_eq!(
    find(&f.store, "res.partner.category", vec![Filter::eq("name", "Cliente")])
      .await
      .len(),
    1
  );
}

#[tokio::test]
async fn contacts_open_on_kanban() {
  let f = fixture().await;
  let kanban = f
    .store
    .create(
      "ir.actions.act_window.view",
      fields! { "view_mode" => "kanban", "sequence" => 5_i64 },
    )
    .await
    .unwrap();
  let list = f
    .store
    .create(
      "ir.actions.act_window.view",
      fields! { "view_mode" => "list", "sequence" => 2_i64 },
    )
    .await
    .unwrap();
  let action = f
    .store
    .create(
      "ir.actions.act_window",
      fields! {
        "name" => "Contactos",
        "res_model" => "res.partner",
        "view_mode" => "list,kanban,form",
        "view_ids" => vec![kanban.id, list.id],
      },
    )
    .await
    .unwrap();

  let first = completed(&f.store, Task::ContactsKanban).await;
  assert_eq!(first.updated, 3);

  let kanban = f.store.get("ir.actions.act_window.view", kanban.id).await.unwrap().unwrap();
  let list = f.store.get("ir.actions.act_window.view", list.id).await.unwrap().unwrap();
  let action = f.store.get("ir.actions.act_window", action.id).await.unwrap().unwrap();
  assert_eq!(kanban.field("sequence"), &Value::Int(1));
  assert_eq!(list.field("sequence"), &Value::Int(10));
  assert_eq!(action.text("view_mode"), Some("kanban,list,form"));

  let second = completed(&f.store, Task::ContactsKanban).await;
  assert!(!second.changed());
}

#[tokio::test]
async fn uom_groups_are_implied_for_internal_users() {
  let f = fixture().await;
  let users = f
    .store
    .create("res.groups", fields! { "name" => "Internal User" })
    .await
    .unwrap();
  let uom = f
    .store
    .create("res.groups", fields! { "name" => "Manage Multiple Units of Measure" })
    .await
    .unwrap();
  f.store.bind_ref("base.group_user", users.id).await.unwrap();
  f.store.bind_ref("uom.group_uom", uom.id).await.unwrap();

  let summary = completed(&f.store, Task::SaleUomPackaging).await;
  assert_eq!(summary.updated, 1);
  let users = f.store.get("res.groups", users.id).await.unwrap().unwrap();
  assert_eq!(users.refs("implied_ids"), [uom.id]);

  assert!(!completed(&f.store, Task::SaleUomPackaging).await.changed());
}

#[tokio::test]
async fn uom_without_internal_user_group_is_skipped() {
  let f = fixture().await;
  let report = run(&f.store, &Settings::default(), Task::SaleUomPackaging)
    .await
    .unwrap();
  assert!(matches!(report, TaskReport::Skipped(reason) if reason.contains("base.group_user")));
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn paperformat_switches_to_letter() {
  let f = fixture().await;
  let us = f
    .store
    .create(
      "report.paperformat",
      fields! { "name" => "US Letter", "format" => "Letter", "margin_top" => 40.0 },
    )
    .await
    .unwrap();
  let a4 = f
    .store
    .create(
      "report.paperformat",
      fields! { "name" => "A4 propio", "format" => "A4", "margin_top" => 40.0 },
    )
    .await
    .unwrap();
  f.store.bind_ref("base.paperformat_us", us.id).await.unwrap();
  let own = f
    .store
    .create("res.company", fields! { "name" => "Con formato", "paperformat_id" => a4.id })
    .await
    .unwrap();

  completed(&f.store, Task::Paperformat).await;

  for id in [us.id, a4.id] {
    let format = f.store.get("report.paperformat", id).await.unwrap().unwrap();
    assert_eq!(format.text("format"), Some("Letter"));
    assert_eq!(format.field("margin_top"), &Value::Float(5.0));
    assert_eq!(format.field("margin_bottom"), &Value::Float(5.0));
  }
  let demo = f.store.get("res.company", f.company).await.unwrap().unwrap();
  assert_eq!(demo.reference("paperformat_id"), Some(us.id));
  let own = f.store.get("res.company", own.id).await.unwrap().unwrap();
  assert_eq!(own.reference("paperformat_id"), Some(a4.id));
}

// ─── Taxes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn exempt_taxes_reuse_an_excento_group() {
  let f = fixture().await;
  let group = f
    .store
    .create(
      "account.tax.group",
      fields! {
        "name" => "Excento",
        "company_id" => f.company,
        "country_id" => f.country,
      },
    )
    .await
    .unwrap();

  completed(&f.store, Task::DefaultTaxes).await;

  assert_eq!(find(&f.store, "account.tax.group", vec![]).await.len(), 1);
  let taxes = find(&f.store, "account.tax", vec![Filter::eq("name", "0%")]).await;
  assert_eq!(taxes.len(), 2);
  assert!(taxes.iter().all(|t| t.reference("tax_group_id") == Some(group.id)));
  assert_eq!(taxes[0].text("description"), Some("Exento 0% Venta"));
  assert_eq!(taxes[1].text("description"), Some("Exento 0% Compra"));
}

#[tokio::test]
async fn existing_zero_tax_is_left_as_found() {
  let f = fixture().await;
  let localized = f
    .store
    .create(
      "account.tax.group",
      fields! { "name" => "ITBMS 0%", "company_id" => f.company, "country_id" => f.country },
    )
    .await
    .unwrap();
  let existing = f
    .store
    .create(
      "account.tax",
      fields! {
        "name" => "0%",
        "type_tax_use" => "sale",
        "amount_type" => "percent",
        "amount" => 0.0,
        "description" => "ITBMS Exento",
        "price_include" => true,
        "tax_group_id" => localized.id,
        "company_id" => f.company,
        "country_id" => f.country,
      },
    )
    .await
    .unwrap();

  let summary = completed(&f.store, Task::DefaultTaxes).await;
  assert_eq!((summary.created, summary.updated, summary.unchanged), (2, 0, 1));

  let after = f.store.get("account.tax", existing.id).await.unwrap().unwrap();
  assert_eq!(after, existing);
}

#[tokio::test]
async fn itbms_tax_outside_its_group_is_not_taken_over() {
  let f = fixture().await;
  let other = f
    .store
    .create(
      "account.tax.group",
      fields! { "name" => "Impuestos", "company_id" => f.company, "country_id" => f.country },
    )
    .await
    .unwrap();
  let existing = f
    .store
    .create(
      "account.tax",
      fields! {
        "name" => "7%",
        "type_tax_use" => "sale",
        "amount_type" => "percent",
        "amount" => 7.0,
        "price_include" => true,
        "tax_group_id" => other.id,
        "company_id" => f.company,
        "country_id" => f.country,
      },
    )
    .await
    .unwrap();

  completed(&f.store, Task::ItbmsTaxes).await;

  assert_eq!(f.store.get("account.tax", existing.id).await.unwrap().unwrap(), existing);
  let sevens = find(
    &f.store,
    "account.tax",
    vec![Filter::eq("name", "7%"), Filter::eq("type_tax_use", "sale")],
  )
  .await;
  assert_eq!(sevens.len(), 2);
  let group = find(&f.store, "account.tax.group", vec![Filter::eq("name", "ITBMS 7%")]).await;
  assert_eq!(sevens[1].reference("tax_group_id"), Some(group[0].id));

  let again = completed(&f.store, Task::ItbmsTaxes).await;
  assert!(!again.changed());
}

#[tokio::test]
async fn foreign_companies_get_no_taxes() {
  let f = fixture().await;
  let costa_rica = f
    .store
    .create("res.country", fields! { "code" => "CR" })
    .await
    .unwrap();
  f.store
    .create(
      "res.company",
      fields! { "name" => "Tica", "account_fiscal_country_id" => costa_rica.id },
    )
    .await
    .unwrap();

  completed(&f.store, Task::ItbmsTaxes).await;

  let taxes = find(&f.store, "account.tax", vec![]).await;
  assert_eq!(taxes.len(), 6);
  assert!(taxes.iter().all(|t| t.reference("company_id") == Some(f.company)));
  let names: Vec<_> = taxes.iter().map(|t| t.display_name()).collect();
  assert_eq!(names, ["7%", "7%", "10%", "10%", "15%", "15%"]);
}

#[tokio::test]
async fn retention_maps_exempt_tax_under_withholding_position() {
  let f = fixture().await;
  for task in [Task::DefaultTaxes, Task::FiscalPositionRetencion, Task::RetentionTaxes] {
    completed(&f.store, task).await;
  }

  let exempt = find(
    &f.store,
    "account.tax",
    vec![Filter::eq("name", "0%"), Filter::eq("type_tax_use", "sale")],
  )
  .await;
  let position = find(&f.store, "account.fiscal.position", vec![]).await;
  assert_eq!(position.len(), 1);
  assert!(position[0].flag("auto_apply"));

  let half = find(
    &f.store,
    "account.tax",
    vec![Filter::eq("name", "Retención de impuestos 50%")],
  )
  .await;
  assert_eq!(half.len(), 1);
  let half = &half[0];
  assert_eq!(half.text("amount_type"), Some("group"));
  assert_eq!(half.refs("children_tax_ids").len(), 2);
  assert_eq!(half.refs("original_tax_ids"), [exempt[0].id]);
  assert_eq!(half.refs("fiscal_position_ids"), [position[0].id]);

  let withheld = find(
    &f.store,
    "account.tax",
    vec![Filter::eq("name", "ITBMS 50% (Operaciones con Retención)")],
  )
  .await;
  assert_eq!(withheld[0].field("amount"), &Value::Float(-3.5));
  assert_eq!(withheld[0].text("invoice_label"), Some("-3.5%"));

  let again = completed(&f.store, Task::RetentionTaxes).await;
  assert!(!again.changed());
}

#[tokio::test]
async fn retention_creates_missing_position_without_auto_apply() {
  let f = fixture().await;
  completed(&f.store, Task::RetentionTaxes).await;

  let position = find(&f.store, "account.fiscal.position", vec![]).await;
  assert_eq!(position.len(), 1);
  assert_eq!(position[0].text("name"), Some("Retención de impuestos"));
  assert!(!position[0].flag("auto_apply"));
  assert_eq!(position[0].reference("country_id"), Some(f.country));
}

#[tokio::test]
async fn retention_without_companies_fails() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  store.install_models(MODELS.iter().copied()).await.unwrap();
  store
    .create("res.country", fields! { "code" => "PA" })
    .await
    .unwrap();

  let report = run(&store, &Settings::default(), Task::RetentionTaxes).await.unwrap();
  assert!(report.is_failure());
  assert!(find(&store, "account.tax.group", vec![]).await.is_empty());
}

// ─── Fiscal positions ────────────────────────────────────────────────────────

#[tokio::test]
async fn fiscal_position_auto_apply_follows_settings() {
  let f = fixture().await;
  let settings = Settings {
    fiscal_position_retencion_auto_apply: false,
    ..Settings::default()
  };
  run(&f.store, &settings, Task::FiscalPositionRetencion).await.unwrap();
  let position = find(&f.store, "account.fiscal.position", vec![]).await;
  assert!(!position[0].flag("auto_apply"));

  let summary = completed(&f.store, Task::FiscalPositionRetencion).await;
  assert_eq!(summary.updated, 1);
  let position = f
    .store
    .get("account.fiscal.position", position[0].id)
    .await
    .unwrap()
    .unwrap();
  assert!(position.flag("auto_apply"));
}

// ─── Payment terms ───────────────────────────────────────────────────────────

#[tokio::test]
async fn payment_terms_are_reconciled_to_the_list() {
  let f = fixture().await;
  let stale = f
    .store
    .create("account.payment.term", fields! { "name" => "21 días" })
    .await
    .unwrap();
  let used = f
    .store
    .create("account.payment.term", fields! { "name" => "45 días" })
    .await
    .unwrap();
  f.store
    .create("res.partner", fields! { "name" => "Cliente", "property_payment_term_id" => used.id })
    .await
    .unwrap();
  f.store
    .create("account.payment.term", fields! { "name" => "Efectivo", "sequence" => 9_i64 })
    .await
    .unwrap();

  let summary = completed(&f.store, Task::PaymentTerms).await;
  assert_eq!(summary.removed, 1);
  assert_eq!(summary.in_use, 1);
  assert_eq!(summary.updated, 1);
  assert_eq!(summary.created, PAYMENT_TERMS.len() - 1);

  assert!(f.store.get("account.payment.term", stale.id).await.unwrap().is_none());
  assert!(f.store.get("account.payment.term", used.id).await.unwrap().is_some());

  let efectivo = find(&f.store, "account.payment.term", vec![Filter::eq("name", "Efectivo")]).await;
  assert_eq!(efectivo[0].field("sequence"), &Value::Int(1));

  let thirty = find(
    &f.store,
    "account.payment.term",
    vec![Filter::eq("name", "Crédito a 30 días")],
  )
  .await;
  assert_eq!(thirty[0].field("sequence"), &Value::Int(2));
  let Value::Lines(lines) = thirty[0].field("line_ids") else {
    panic!("line_ids should be lines");
  };
  assert_eq!(lines[0]["nb_days"], Value::Int(30));
  assert_eq!(lines[0]["value_amount"], Value::Float(100.0));
}

// ─── Products ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn products_wait_for_exempt_taxes() {
  let f = fixture().await;

  let summary = completed(&f.store, Task::DefaultProducts).await;
  assert_eq!(summary.skipped, 1);
  assert!(find(&f.store, "product.template", vec![]).await.is_empty());

  completed(&f.store, Task::DefaultTaxes).await;
  let summary = completed(&f.store, Task::DefaultProducts).await;
  assert_eq!(summary.created, crate::PRODUCT_NAMES.len());

  let products = find(&f.store, "product.template", vec![]).await;
  let sale_tax = find(
    &f.store,
    "account.tax",
    vec![Filter::eq("name", "0%"), Filter::eq("type_tax_use", "sale")],
  )
  .await;
  assert!(products.iter().all(|p| p.text("type") == Some("service")));
  assert!(products.iter().all(|p| p.refs("taxes_id") == [sale_tax[0].id]));
}

#[tokio::test]
async fn shared_products_are_not_duplicated() {
  let f = fixture().await;
  let shared = f
    .store
    .create("product.template", fields! { "name" => "Seguro", "type" => "service" })
    .await
    .unwrap();

  completed(&f.store, Task::DefaultTaxes).await;
  let summary = completed(&f.store, Task::DefaultProducts).await;
  assert_eq!((summary.created, summary.unchanged), (2, 1));

  let seguro = find(&f.store, "product.template", vec![Filter::eq("name", "Seguro")]).await;
  assert_eq!(seguro, [shared]);
  let others = find(&f.store, "product.template", vec![Filter::eq("company_id", f.company)]).await;
  assert_eq!(others.len(), 2);
}

#[tokio::test]
async fn aborted_run_keeps_earlier_reports() {
  // No default registry installed: default-country hits a store error.
  let store = SqliteStore::open_in_memory().await.unwrap();
  store
    .install_models(["res.company", "res.country", "res.country.state"])
    .await
    .unwrap();
  let country = store
    .create("res.country", fields! { "code" => "PA", "name" => "Panamá" })
    .await
    .unwrap();
  let company = store
    .create("res.company", fields! { "name" => "Demo S.A." })
    .await
    .unwrap();

  let aborted = run_all(&store, &Settings::default(), [
    Task::CountryStates,
    Task::DefaultCountry,
    Task::PartnerTags,
  ])
  .await
  .unwrap_err();

  assert_eq!(aborted.task, Task::DefaultCountry);
  assert_eq!(aborted.completed.len(), 1);
  assert!(matches!(
    aborted.completed[0],
    (Task::CountryStates, TaskReport::Completed(_))
  ));

  let states = find(&store, "res.country.state", vec![Filter::eq("country_id", country.id)]).await;
  assert_eq!(states.len(), PANAMA_STATES.len());
  let company = store.get("res.company", company.id).await.unwrap().unwrap();
  assert!(company.field("country_id").is_null());
}

// ─── Whole run ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_full_run_changes_nothing() {
  let f = fixture().await;
  let settings = Settings::default();

  let first = run_all(&f.store, &settings, Task::all()).await.unwrap();
  assert_eq!(first.len(), 15);
  assert!(first.iter().all(|(_, report)| !report.is_failure()));

  let second = run_all(&f.store, &settings, Task::all()).await.unwrap();
  for (task, report) in &second {
    if let TaskReport::Completed(summary) = report {
      assert!(!summary.changed(), "{task} changed something: {summary}");
    }
  }
}
