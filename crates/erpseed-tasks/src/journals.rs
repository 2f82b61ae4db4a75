//! Default sales journals for customer invoices and credit notes.

use erpseed_core::{
  Error, Result, Session,
  store::ConfigStore,
  target::{ConfigTarget, FieldDefault, Journal, JournalType, Scope},
  upsert::{require_model, upsert},
};
use tracing::{info, warn};

use crate::{Settings, Summary, common};

/// The journal one kind of customer document defaults to.
struct DocumentJournal<'a> {
  code:            &'a str,
  name:            &'a str,
  refund_sequence: Option<bool>,
  /// `ir.default` condition selecting the document type.
  condition:       &'static str,
}

pub async fn sales_journal<S: ConfigStore>(
  session: &Session<'_, S>,
  settings: &Settings,
) -> Result<Summary> {
  provision(session, DocumentJournal {
    code:            &settings.sales_journal_code,
    name:            &settings.sales_journal_name,
    refund_sequence: None,
    condition:       "move_type=out_invoice",
  })
  .await
}

/// Like [`sales_journal`], with a dedicated credit-note numbering sequence.
pub async fn credit_notes_journal<S: ConfigStore>(
  session: &Session<'_, S>,
  settings: &Settings,
) -> Result<Summary> {
  provision(session, DocumentJournal {
    code:            &settings.credit_notes_journal_code,
    name:            &settings.credit_notes_journal_name,
    refund_sequence: Some(true),
    condition:       "move_type=out_refund",
  })
  .await
}

async fn provision<S: ConfigStore>(
  session: &Session<'_, S>,
  doc: DocumentJournal<'_>,
) -> Result<Summary> {
  require_model(session, "account.journal").await?;

  let mut summary = Summary::default();
  for company in common::companies(session).await? {
    let scope = Scope::Company(company.id);
    let income = common::income_account(session, &company).await?;
    let target: ConfigTarget = Journal {
      name:            doc.name.to_owned(),
      code:            doc.code.to_owned(),
      journal_type:    JournalType::Sale,
      default_account: income,
      refund_sequence: doc.refund_sequence,
    }
    .into();

    // The income account is only needed to create the journal.
    if income.is_none()
      && session
        .search(&target.lookup(scope)?)
        .await
        .map_err(Error::store)?
        .is_empty()
    {
      warn!(
        company = %company.display_name(),
        "no income account; install a chart of accounts first. Company skipped"
      );
      summary.skipped += 1;
      continue;
    }

    let journal = upsert(session, scope, &target).await?;
    summary.record(&journal.outcome);

    let default = FieldDefault {
      model:     "account.move".into(),
      field:     "journal_id".into(),
      condition: Some(doc.condition.into()),
      value:     journal.id().into(),
    };
    let result = upsert(session, scope, &default.into()).await?;
    if result.outcome.is_change() {
      info!(
        company = %company.display_name(),
        "documents with {} now default to journal '{}'",
        doc.condition,
        journal.record.display_name()
      );
    }
    summary.record(&result.outcome);
  }
  Ok(summary)
}
