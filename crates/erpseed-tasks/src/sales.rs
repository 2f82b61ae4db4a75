//! Sales feature toggles granted to every internal user.

use erpseed_core::{
  Error, Result, Session,
  store::ConfigStore,
  upsert::{link, require_model},
};
use tracing::{debug, info};

use crate::{Settings, Summary};

/// Groups behind the "units of measure and packagings" sales setting.
pub const UOM_PACKAGING_GROUPS: &[&str] = &["uom.group_uom", "product.group_stock_packaging"];

const INTERNAL_USER: &str = "base.group_user";

/// Imply the unit-of-measure and packaging groups from the internal user
/// group. Groups whose module is not installed are passed over.
pub async fn sale_uom_packaging<S: ConfigStore>(
  session: &Session<'_, S>,
  _settings: &Settings,
) -> Result<Summary> {
  require_model(session, "res.groups").await?;
  let mut user_group = session
    .resolve_ref(INTERNAL_USER)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::MissingPrerequisite(INTERNAL_USER.into()))?;

  let mut summary = Summary::default();
  for xml_id in UOM_PACKAGING_GROUPS {
    let Some(group) = session.resolve_ref(xml_id).await.map_err(Error::store)? else {
      debug!("{xml_id} not installed");
      continue;
    };
    let linked = link(session, user_group, "implied_ids", group.id).await?;
    if linked.outcome.is_change() {
      info!("enabled {} for all users", group.display_name());
    }
    summary.record(&linked.outcome);
    user_group = linked.record;
  }
  Ok(summary)
}
