//! The closed list of payment terms.

use erpseed_core::{
  Result, Session,
  store::ConfigStore,
  target::{PaymentTerm, Scope, TargetKind},
  upsert::{prune, require_model, upsert},
};

use crate::{Settings, Summary};

/// `(name, days until due)`, in display order. 0 means immediate.
pub const PAYMENT_TERMS: &[(&str, i64)] = &[
  ("Efectivo", 0),
  ("Crédito a 30 días", 30),
  ("Crédito a 60 días", 60),
  ("Crédito a 90 días", 90),
  ("Crédito Otro", 0),
  ("Tarjeta Crédito", 0),
  ("Tarjeta Débito", 0),
  ("Tarjeta Fidelización", 0),
  ("Vale", 0),
  ("Tarjeta de Regalo", 0),
  ("Transf./Depósito a cta. Bancaria", 0),
  ("Cheque", 0),
  ("Punto de Pago", 0),
  ("otro", 0),
];

/// Remove every payment term not in [`PAYMENT_TERMS`] (terms still in use
/// stay), then create the missing ones and fix the display order.
pub async fn payment_terms<S: ConfigStore>(
  session: &Session<'_, S>,
  _settings: &Settings,
) -> Result<Summary> {
  require_model(session, TargetKind::PaymentTerm.model()).await?;

  let mut summary = Summary::default();
  let allowed: Vec<&str> = PAYMENT_TERMS.iter().map(|(name, _)| *name).collect();
  summary.absorb(&prune(session, Scope::Global, TargetKind::PaymentTerm, &allowed).await?);

  for (sequence, &(name, due_days)) in (1..).zip(PAYMENT_TERMS) {
    let term = PaymentTerm { name: name.into(), sequence, due_days };
    summary.record(&upsert(session, Scope::Global, &term.into()).await?.outcome);
  }
  Ok(summary)
}
