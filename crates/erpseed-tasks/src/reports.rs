//! Printed report layout.

use erpseed_core::{
  Error, Result, Session, fields,
  record::FieldMap,
  store::ConfigStore,
  upsert::{reconcile, require_model},
};
use tracing::info;

use crate::{Settings, Summary, common};

const PAPERFORMAT: &str = "report.paperformat";

fn letter() -> FieldMap {
  fields! {
    "format" => "Letter",
    "margin_top" => 5.0,
    "margin_bottom" => 5.0,
  }
}

/// Switch the stock paper formats, and every company's own format, to US
/// Letter with 5 mm top and bottom margins. Companies without a format are
/// given the US one.
pub async fn paperformat<S: ConfigStore>(
  session: &Session<'_, S>,
  _settings: &Settings,
) -> Result<Summary> {
  require_model(session, PAPERFORMAT).await?;

  let mut summary = Summary::default();
  let mut us = None;
  for xml_id in ["base.paperformat_us", "base.paperformat_euro"] {
    let Some(format) = session.resolve_ref(xml_id).await.map_err(Error::store)? else {
      continue;
    };
    let result = reconcile(session, format, letter()).await?;
    if result.outcome.is_change() {
      info!(id = %result.id(), "paper format '{}' set to Letter", result.record.display_name());
    }
    summary.record(&result.outcome);
    if xml_id == "base.paperformat_us" {
      us = Some(result.id());
    }
  }

  for company in common::companies(session).await? {
    let name = company.display_name().to_owned();
    match company.reference("paperformat_id") {
      Some(id) => {
        let Some(format) = session.get(PAPERFORMAT, id).await.map_err(Error::store)? else {
          continue;
        };
        let result = reconcile(session, format, letter()).await?;
        if result.outcome.is_change() {
          info!(company = %name, "company paper format set to Letter");
        }
        summary.record(&result.outcome);
      }
      None => {
        let Some(us) = us else { continue };
        let result = reconcile(session, company, fields! { "paperformat_id" => us }).await?;
        info!(company = %name, "assigned the US Letter paper format");
        summary.record(&result.outcome);
      }
    }
  }
  Ok(summary)
}
