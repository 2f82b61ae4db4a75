//! Country-level defaults: the companies' country and its provinces.

use erpseed_core::{
  Result, Session, fields,
  store::ConfigStore,
  target::{CountryState, FieldDefault, Scope},
  upsert::{reconcile, require_model, upsert},
};
use tracing::info;

use crate::{Settings, Summary, common};

/// Provinces and indigenous comarcas of Panama, by official code.
pub const PANAMA_STATES: &[(&str, &str)] = &[
  ("01", "Bocas del Toro"),
  ("02", "Coclé"),
  ("03", "Colón"),
  ("04", "Chiriquí"),
  ("05", "Darién"),
  ("06", "Herrera"),
  ("07", "Los Santos"),
  ("08", "Panamá"),
  ("09", "Veraguas"),
  ("10", "Panamá Oeste"),
  ("11", "Comarca Emberá Wounaan"),
  ("12", "Comarca Kuna Yala (Guna Yala)"),
  ("13", "Comarca Ngäbe-Buglé"),
];

/// Point every company at the fiscal country and make it the default
/// country of new contacts. Existing contacts are left alone.
pub async fn default_country<S: ConfigStore>(
  session: &Session<'_, S>,
  settings: &Settings,
) -> Result<Summary> {
  let country = common::fiscal_country(session, settings).await?;

  let mut summary = Summary::default();
  for company in common::companies(session).await? {
    let name = company.display_name().to_owned();
    let result = reconcile(session, company, fields! { "country_id" => country.id }).await?;
    if result.outcome.is_change() {
      info!(company = %name, "set country to {}", settings.country_code);
    }
    summary.record(&result.outcome);
  }

  let default = FieldDefault {
    model:     "res.partner".into(),
    field:     "country_id".into(),
    condition: None,
    value:     country.id.into(),
  };
  summary.record(&upsert(session, Scope::Global, &default.into()).await?.outcome);
  Ok(summary)
}

/// Create the Panamanian provinces, and correct the names of existing ones.
pub async fn country_states<S: ConfigStore>(
  session: &Session<'_, S>,
  settings: &Settings,
) -> Result<Summary> {
  require_model(session, "res.country.state").await?;
  let country = common::fiscal_country(session, settings).await?;

  let mut summary = Summary::default();
  for (code, name) in PANAMA_STATES {
    let state = CountryState {
      country: country.id,
      code:    (*code).into(),
      name:    (*name).into(),
    };
    summary.record(&upsert(session, Scope::Global, &state.into()).await?.outcome);
  }
  Ok(summary)
}
