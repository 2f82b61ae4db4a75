//! Default service products.

use erpseed_core::{
  Result, Session,
  store::ConfigStore,
  target::{Product, Scope, TaxUse},
  upsert::{require_model, upsert},
};
use tracing::warn;

use crate::{Settings, Summary, common};

pub const PRODUCT_NAMES: &[&str] = &["Servicio de Acarreo", "Otros Gastos", "Seguro"];

/// Service products taxed at 0 % for every company in the fiscal country.
/// Companies without both 0 % taxes are skipped.
/// A product with no company is shared, and counts as existing for every
/// company.
pub async fn default_products<S: ConfigStore>(
  session: &Session<'_, S>,
  settings: &Settings,
) -> Result<Summary> {
  require_model(session, "product.template").await?;
  require_model(session, "account.tax").await?;
  let country = common::fiscal_country(session, settings).await?;

  let mut summary = Summary::default();
  for company in common::companies_in(session, &country).await? {
    let sale = common::zero_tax(session, company.id, country.id, TaxUse::Sale).await?;
    let purchase = common::zero_tax(session, company.id, country.id, TaxUse::Purchase).await?;
    let (Some(sale), Some(purchase)) = (sale, purchase) else {
      warn!(
        company = %company.display_name(),
        "0% sale or purchase tax missing; run default-taxes first. Company skipped"
      );
      summary.skipped += 1;
      continue;
    };

    for name in PRODUCT_NAMES {
      let product = Product {
        name:         (*name).into(),
        sale_tax:     sale.id,
        purchase_tax: purchase.id,
      };
      let result = upsert(session, Scope::Company(company.id), &product.into()).await?;
      summary.record(&result.outcome);
    }
  }
  Ok(summary)
}
