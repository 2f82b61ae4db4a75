//! Fiscal positions applied to exempt and withholding customers.

use erpseed_core::{
  Result, Session,
  store::ConfigStore,
  target::{ConfigTarget, FiscalPosition, Scope},
  upsert::{require_model, upsert},
};

use crate::{Settings, Summary, common};

/// The exemption fiscal position, detected automatically, in every company.
pub async fn exento<S: ConfigStore>(
  session: &Session<'_, S>,
  settings: &Settings,
) -> Result<Summary> {
  ensure(session, &settings.fiscal_position_name, true).await
}

/// The withholding fiscal position in every company. Automatic detection
/// follows `fiscal_position_retencion_auto_apply`.
pub async fn retencion<S: ConfigStore>(
  session: &Session<'_, S>,
  settings: &Settings,
) -> Result<Summary> {
  ensure(
    session,
    &settings.fiscal_position_retencion_name,
    settings.fiscal_position_retencion_auto_apply,
  )
  .await
}

async fn ensure<S: ConfigStore>(
  session: &Session<'_, S>,
  name: &str,
  auto_apply: bool,
) -> Result<Summary> {
  require_model(session, "account.fiscal.position").await?;

  let target: ConfigTarget = FiscalPosition {
    name: name.into(),
    country: None,
    auto_apply,
  }
  .into();
  let mut summary = Summary::default();
  for company in common::companies(session).await? {
    let result = upsert(session, Scope::Company(company.id), &target).await?;
    summary.record(&result.outcome);
  }
  Ok(summary)
}
