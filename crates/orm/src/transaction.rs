//! Transaction Management
//!
//! [`DomainModel::begin_transaction`] returns a [`Transaction`] handle that
//! borrows the model mutably and dereferences to it, so CRUD and queries run
//! inside the transaction through the handle. Dropping the handle without
//! [`Transaction::commit`] rolls the transaction back before the connection
//! is used again.
//!
//! Only the handle that started the transaction ends it. A handle returned
//! by a nested `begin_transaction` joins the open transaction and leaves
//! commit and rollback to the outer handle.

use std::fmt;
use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use crate::domain::DomainModel;
use crate::error::ModelResult;

/// Open transaction on a domain model
pub struct Transaction<'a> {
    model: &'a mut DomainModel,
    owner: bool,
    finished: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(model: &'a mut DomainModel) -> Self {
        Self {
            model,
            owner: true,
            finished: false,
        }
    }

    /// Handle on a transaction some other handle started
    pub(crate) fn joined(model: &'a mut DomainModel) -> Self {
        Self {
            model,
            owner: false,
            finished: false,
        }
    }

    /// Whether this handle started the transaction and ends it
    pub fn is_owner(&self) -> bool {
        self.owner
    }

    /// Commit the transaction. A joined handle commits nothing.
    pub async fn commit(mut self) -> ModelResult<()> {
        self.finished = true;
        if !self.owner {
            return Ok(());
        }
        debug!("Committing transaction");
        self.model.end_transaction(true).await
    }

    /// Roll the transaction back now instead of on drop. A joined handle
    /// rolls nothing back.
    pub async fn rollback(mut self) -> ModelResult<()> {
        self.finished = true;
        if !self.owner {
            return Ok(());
        }
        debug!("Rolling back transaction");
        self.model.end_transaction(false).await
    }
}

impl Deref for Transaction<'_> {
    type Target = DomainModel;

    fn deref(&self) -> &DomainModel {
        &*self.model
    }
}

impl DerefMut for Transaction<'_> {
    fn deref_mut(&mut self) -> &mut DomainModel {
        &mut *self.model
    }
}

impl fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("model", &self.model)
            .field("owner", &self.owner)
            .field("finished", &self.finished)
            .finish()
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.owner && !self.finished {
            warn!("Transaction dropped without commit, it will be rolled back");
            self.model.abandon_transaction();
        }
    }
}
