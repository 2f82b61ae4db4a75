//! Contact tags and the contacts app's default view.

use erpseed_core::{
  Error, Result, Session, fields,
  query::{Filter, Query},
  store::ConfigStore,
  target::{PartnerTag, Scope},
  upsert::{Outcome, reconcile, require_model, upsert},
};
use tracing::{info, warn};

use crate::{Settings, Summary};

pub const TAG_NAMES: &[&str] = &[
  "Cliente",
  "Proveedor",
  "Persona Natural",
  "Persona Jurídica",
  "Extranjero",
  "Contribuyente",
  "Gobierno",
  "Retenedor 50% de Impuestos",
  "Retenedor 100% de Impuestos",
  "Exento de Impuestos",
  "Efectivo(contado)",
  "Tarjeta de Crédito",
  "Tarjeta de Débito",
  "Tarjeta de Fidelización",
  "Vale",
  "Tarjeta de Regalo",
  "Transf. / Deposito a cta. Bancaria",
  "Cheque",
  "Punto de Pago",
  "Otro",
  "Crédito a 30 días",
  "Crédito a 60 días",
  "Crédito a 90 días",
  "Crédito Otro",
];

const WINDOW_ACTION: &str = "ir.actions.act_window";
const WINDOW_VIEW: &str = "ir.actions.act_window.view";

// ─── Tags ────────────────────────────────────────────────────────────────────

pub async fn partner_tags<S: ConfigStore>(
  session: &Session<'_, S>,
  _settings: &Settings,
) -> Result<Summary> {
  require_model(session, "res.partner.category").await?;

  let mut summary = Summary::default();
  for name in TAG_NAMES.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
    let tag = PartnerTag { name: name.into() };
    summary.record(&upsert(session, Scope::Global, &tag.into()).await?.outcome);
  }
  Ok(summary)
}

// ─── Kanban default ──────────────────────────────────────────────────────────

/// Open every contacts window action on its kanban view.
///
/// Kanban views attached to the action get sequence 1 and list views are
/// pushed to at least 10; `view_mode` is rewritten to start with `kanban`.
pub async fn contacts_kanban<S: ConfigStore>(
  session: &Session<'_, S>,
  _settings: &Settings,
) -> Result<Summary> {
  require_model(session, WINDOW_ACTION).await?;

  let actions = session
    .search(&Query::new(WINDOW_ACTION).filter(Filter::eq("res_model", "res.partner")))
    .await
    .map_err(Error::store)?;

  let mut summary = Summary::default();
  for action in actions {
    let label = format!("{} ({})", action.display_name(), action.id);

    for &view_id in action.refs("view_ids") {
      let Some(view) = session.get(WINDOW_VIEW, view_id).await.map_err(Error::store)? else {
        warn!(action = %label, view = %view_id, "view of action not found");
        continue;
      };
      let sequence = view.field("sequence").as_int().unwrap_or(0);
      let wanted: i64 = match view.text("view_mode") {
        Some("kanban") if sequence != 1 => 1,
        Some("tree" | "list") if sequence < 10 => 10,
        _ => continue,
      };
      let result = reconcile(session, view, fields! { "sequence" => wanted }).await?;
      info!(action = %label, "set view {view_id} sequence to {wanted}");
      summary.record(&result.outcome);
    }

    let current = action.text("view_mode").unwrap_or_default().to_owned();
    match kanban_first(&current) {
      Some(view_mode) => {
        let result = reconcile(session, action, fields! { "view_mode" => view_mode.as_str() })
          .await?;
        info!(action = %label, "view_mode set to {view_mode}");
        summary.record(&result.outcome);
      }
      None => summary.record(&Outcome::Unchanged),
    }
  }
  Ok(summary)
}

/// `view_mode` with `kanban` moved (or added) to the front, or `None` when it
/// already starts with `kanban` or is empty.
fn kanban_first(view_mode: &str) -> Option<String> {
  let modes: Vec<&str> = view_mode
    .split(',')
    .map(str::trim)
    .filter(|m| !m.is_empty())
    .collect();
  if modes.first().is_none_or(|m| *m == "kanban") {
    return None;
  }
  let rest = modes.into_iter().filter(|m| *m != "kanban");
  Some(std::iter::once("kanban").chain(rest).collect::<Vec<_>>().join(","))
}
