//! Lookups shared by several tasks.

use erpseed_core::{
  Error, Result, Session,
  query::{Filter, Query},
  record::{Record, RecordId},
  store::ConfigStore,
  target::TaxUse,
  upsert::require,
};

use crate::Settings;

/// The `res.country` record for the configured fiscal country.
pub async fn fiscal_country<S: ConfigStore>(
  session: &Session<'_, S>,
  settings: &Settings,
) -> Result<Record> {
  require(
    session,
    &Query::new("res.country").filter(Filter::eq("code", settings.country_code.as_str())),
    &format!("country {}", settings.country_code),
  )
  .await
}

pub async fn companies<S: ConfigStore>(session: &Session<'_, S>) -> Result<Vec<Record>> {
  session
    .search(&Query::new("res.company"))
    .await
    .map_err(Error::store)
}

/// Companies whose fiscal country (or, failing that, country) is `country`
/// or is not set at all.
pub async fn companies_in<S: ConfigStore>(
  session: &Session<'_, S>,
  country: &Record,
) -> Result<Vec<Record>> {
  let code = country.text("code");
  let mut selected = Vec::new();
  for company in companies(session).await? {
    let fiscal = company
      .reference("account_fiscal_country_id")
      .or_else(|| company.reference("country_id"));
    let keep = match fiscal {
      None => true,
      Some(id) if id == country.id => true,
      Some(id) => session
        .get("res.country", id)
        .await
        .map_err(Error::store)?
        .is_some_and(|other| other.text("code") == code),
    };
    if keep {
      selected.push(company);
    } else {
      tracing::debug!(company = %company.display_name(), "not in the fiscal country; skipped");
    }
  }
  Ok(selected)
}

/// The company's income account: `income_account_id` when set, else the
/// first `account.account` of type `income` owned by the company.
pub async fn income_account<S: ConfigStore>(
  session: &Session<'_, S>,
  company: &Record,
) -> Result<Option<RecordId>> {
  if let Some(id) = company.reference("income_account_id") {
    return Ok(Some(id));
  }
  let query = Query::new("account.account")
    .filter(Filter::eq("company_id", company.id))
    .filter(Filter::eq("account_type", "income"))
    .limit(1);
  Ok(
    session
      .search(&query)
      .await
      .map_err(Error::store)?
      .first()
      .map(|account| account.id),
  )
}

/// The first 0 % percentage tax of `usage` for the company in `country`.
pub async fn zero_tax<S: ConfigStore>(
  session: &Session<'_, S>,
  company: RecordId,
  country: RecordId,
  usage: TaxUse,
) -> Result<Option<Record>> {
  let query = Query::new("account.tax")
    .filter(Filter::eq("company_id", company))
    .filter(Filter::eq("country_id", country))
    .filter(Filter::eq("type_tax_use", <&str>::from(usage)))
    .filter(Filter::eq("amount", 0.0))
    .filter(Filter::eq("amount_type", "percent"))
    .limit(1);
  Ok(
    session
      .search(&query)
      .await
      .map_err(Error::store)?
      .into_iter()
      .next(),
  )
}
