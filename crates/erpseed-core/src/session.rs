//! An explicit transaction handle.
//!
//! Every provisioning run happens inside one [`Session`]: opened at start,
//! committed at the very end, or rolled back as a whole.

use std::ops::Deref;

use crate::{Error, Result, store::ConfigStore};

/// A store with an open transaction.
///
/// Dereferences to the store so reads and writes go through the session.
/// Dropping a session without calling [`commit`](Session::commit) or
/// [`rollback`](Session::rollback) leaves the transaction open on the
/// backend; callers are expected to end it explicitly.
pub struct Session<'s, S: ConfigStore> {
  store: &'s S,
}

impl<'s, S: ConfigStore> Session<'s, S> {
  pub async fn begin(store: &'s S) -> Result<Self> {
    store.begin().await.map_err(Error::store)?;
    tracing::debug!("transaction opened");
    Ok(Self { store })
  }

  pub async fn commit(self) -> Result<()> {
    self.store.commit().await.map_err(Error::store)?;
    tracing::debug!("transaction committed");
    Ok(())
  }

  pub async fn rollback(self) -> Result<()> {
    self.store.rollback().await.map_err(Error::store)?;
    tracing::debug!("transaction rolled back");
    Ok(())
  }
}

impl<S: ConfigStore> Deref for Session<'_, S> {
  type Target = S;

  fn deref(&self) -> &S { self.store }
}
