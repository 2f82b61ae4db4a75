//! What a task run did.

use std::fmt;

use erpseed_core::upsert::{Outcome, Pruned};

/// Counters accumulated over one task run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
  pub created:   usize,
  pub updated:   usize,
  pub unchanged: usize,
  pub removed:   usize,
  /// Deletions refused because the record is still referenced.
  pub in_use:    usize,
  /// Companies passed over because a per-company dependency was missing.
  pub skipped:   usize,
}

impl Summary {
  pub fn record(&mut self, outcome: &Outcome) {
    match outcome {
      Outcome::Created => self.created += 1,
      Outcome::Updated { .. } => self.updated += 1,
      Outcome::Unchanged => self.unchanged += 1,
    }
  }

  pub fn absorb(&mut self, pruned: &Pruned) {
    self.removed += pruned.removed.len();
    self.in_use += pruned.in_use.len();
  }

  /// Whether the run wrote anything.
  pub fn changed(&self) -> bool {
    self.created + self.updated + self.removed > 0
  }
}

impl fmt::Display for Summary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} created, {} updated, {} unchanged",
      self.created, self.updated, self.unchanged
    )?;
    if self.removed > 0 || self.in_use > 0 {
      write!(f, ", {} removed, {} in use", self.removed, self.in_use)?;
    }
    if self.skipped > 0 {
      write!(f, ", {} companies skipped", self.skipped)?;
    }
    Ok(())
  }
}

/// The result of running one task in its own session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskReport {
  /// Committed.
  Completed(Summary),
  /// A precondition was missing and the task has nothing to do yet. Rolled
  /// back.
  Skipped(String),
  /// A precondition the task cannot run without was missing. Rolled back.
  Failed(String),
}

impl TaskReport {
  pub fn is_failure(&self) -> bool { matches!(self, Self::Failed(_)) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn counts_outcomes() {
    let mut summary = Summary::default();
    summary.record(&Outcome::Created);
    summary.record(&Outcome::Unchanged);
    summary.record(&Outcome::Updated { fields: vec!["sequence".into()] });
    summary.absorb(&Pruned {
      removed: vec!["Inmediato".into()],
      in_use:  vec![("30 días".into(), "referenced".into())],
    });

    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.unchanged, 1);
    assert!(summary.changed());
    assert_eq!(
      summary.to_string(),
      "1 created, 1 updated, 1 unchanged, 1 removed, 1 in use"
    );
  }

  #[test]
  fn unchanged_run_reports_no_change() {
    let mut summary = Summary::default();
    summary.record(&Outcome::Unchanged);
    assert!(!summary.changed());
    assert_eq!(summary.to_string(), "0 created, 0 updated, 1 unchanged");
  }
}
