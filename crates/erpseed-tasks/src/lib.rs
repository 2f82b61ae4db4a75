//! Provisioning tasks for a Panamanian accounting setup.
//!
//! Every task is idempotent: it runs inside one [`Session`], creates what is
//! missing, reconciles what differs and commits once at the end. A task whose
//! preconditions are not met rolls back and reports
//! [`TaskReport::Skipped`] or [`TaskReport::Failed`].

mod common;
mod error;
mod fiscal_positions;
mod journals;
mod localization;
mod partners;
mod payment_terms;
mod products;
mod report;
mod reports;
mod sales;
mod settings;
mod taxes;

pub use error::Aborted;
pub use localization::PANAMA_STATES;
pub use partners::TAG_NAMES;
pub use payment_terms::PAYMENT_TERMS;
pub use products::PRODUCT_NAMES;
pub use report::{Summary, TaskReport};
pub use settings::Settings;

use erpseed_core::{Result, Session, store::ConfigStore};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _};
use tracing::{error, info, warn};

// ─── Tasks ───────────────────────────────────────────────────────────────────

/// The provisioning tasks, declared in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Task {
  DefaultCountry,
  CountryStates,
  PartnerTags,
  ContactsKanban,
  SaleUomPackaging,
  Paperformat,
  SalesJournal,
  CreditNotesJournal,
  DefaultTaxes,
  ItbmsTaxes,
  FiscalPositionExento,
  FiscalPositionRetencion,
  RetentionTaxes,
  PaymentTerms,
  DefaultProducts,
}

/// What a task reports when a precondition is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnMissing {
  Skip,
  Fail,
}

impl Task {
  /// Every task, in the order `all` runs them.
  pub fn all() -> impl Iterator<Item = Task> { Self::iter() }

  fn on_missing(self) -> OnMissing {
    match self {
      Self::PartnerTags | Self::RetentionTaxes => OnMissing::Fail,
      _ => OnMissing::Skip,
    }
  }

  async fn execute<S: ConfigStore>(
    self,
    session: &Session<'_, S>,
    settings: &Settings,
  ) -> Result<Summary> {
    match self {
      Self::DefaultCountry => localization::default_country(session, settings).await,
      Self::CountryStates => localization::country_states(session, settings).await,
      Self::PartnerTags => partners::partner_tags(session, settings).await,
      Self::ContactsKanban => partners::contacts_kanban(session, settings).await,
      Self::SaleUomPackaging => sales::sale_uom_packaging(session, settings).await,
      Self::Paperformat => reports::paperformat(session, settings).await,
      Self::SalesJournal => journals::sales_journal(session, settings).await,
      Self::CreditNotesJournal => journals::credit_notes_journal(session, settings).await,
      Self::DefaultTaxes => taxes::default_taxes(session, settings).await,
      Self::ItbmsTaxes => taxes::itbms_taxes(session, settings).await,
      Self::FiscalPositionExento => fiscal_positions::exento(session, settings).await,
      Self::FiscalPositionRetencion => fiscal_positions::retencion(session, settings).await,
      Self::RetentionTaxes => taxes::retention_taxes(session, settings).await,
      Self::PaymentTerms => payment_terms::payment_terms(session, settings).await,
      Self::DefaultProducts => products::default_products(session, settings).await,
    }
  }
}

// ─── Running ─────────────────────────────────────────────────────────────────

/// Run `task` in its own session.
///
/// A missing precondition rolls back and is reported, not returned as an
/// error. Any other error rolls back and is returned.
pub async fn run<S: ConfigStore>(
  store: &S,
  settings: &Settings,
  task: Task,
) -> Result<TaskReport> {
  let session = Session::begin(store).await?;
  info!(%task, "running");

  match task.execute(&session, settings).await {
    Ok(summary) => {
      session.commit().await?;
      info!(%task, "done: {summary}");
      Ok(TaskReport::Completed(summary))
    }
    Err(e) if e.is_missing_prerequisite() => {
      session.rollback().await?;
      let reason = e.to_string();
      Ok(match task.on_missing() {
        OnMissing::Skip => {
          warn!(%task, "skipped: {reason}");
          TaskReport::Skipped(reason)
        }
        OnMissing::Fail => {
          error!(%task, "failed: {reason}");
          TaskReport::Failed(reason)
        }
      })
    }
    Err(e) => {
      if let Err(rollback) = session.rollback().await {
        error!(%task, "rollback failed: {rollback}");
      }
      Err(e)
    }
  }
}

/// Run `tasks` in order, each in its own session, stopping after the first
/// failure. On an unexpected error the reports of the tasks already
/// committed are returned inside [`Aborted`].
pub async fn run_all<S, I>(
  store: &S,
  settings: &Settings,
  tasks: I,
) -> Result<Vec<(Task, TaskReport)>, Aborted>
where
  S: ConfigStore,
  I: IntoIterator<Item = Task>,
{
  let mut reports = Vec::new();
  for task in tasks {
    let report = match run(store, settings, task).await {
      Ok(report) => report,
      Err(source) => {
        return Err(Aborted { task, completed: reports, source });
      }
    };
    let failed = report.is_failure();
    reports.push((task, report));
    if failed {
      break;
    }
  }
  Ok(reports)
}

#[cfg(test)]
mod tests;
