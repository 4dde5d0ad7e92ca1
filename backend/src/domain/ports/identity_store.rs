//! Transactional port used to resolve verified identities to accounts.
//!
//! Resolution reads and writes several rows that must change together: an
//! account matched by email gets the external uid bound to it, or a new
//! account is inserted. [`IdentityStore::in_transaction`] hands the caller a
//! [`UserTransaction`] whose operations all run inside one storage
//! transaction; returning an error from the closure rolls every write back.

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::domain::{Email, ExternalUid, NewUser, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity store adapters.
    pub enum IdentityStoreError {
        /// Store connection could not be established.
        Connection { message: String } => "identity store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "identity store query failed: {message}",
        /// A uniqueness constraint on uid or email rejected the write.
        ///
        /// Seen when a concurrent request created the same account first.
        Duplicate { message: String } => "identity already recorded: {message}",
    }
}

/// Account row located by email during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    /// Account id.
    pub user_id: UserId,
    /// External uid currently bound to the account, if any.
    pub external_uid: Option<String>,
}

/// Operations available inside an identity transaction.
#[async_trait]
pub trait UserTransaction: Send {
    /// Find the account bound to `uid`.
    async fn find_by_external_uid(
        &mut self,
        uid: &ExternalUid,
    ) -> Result<Option<UserId>, IdentityStoreError>;

    /// Find the account registered with `email`.
    async fn find_by_email(
        &mut self,
        email: &Email,
    ) -> Result<Option<IdentityRecord>, IdentityStoreError>;

    /// Bind `uid` to an existing account.
    async fn bind_external_uid(
        &mut self,
        id: UserId,
        uid: &ExternalUid,
    ) -> Result<(), IdentityStoreError>;

    /// Insert a new account and return its id.
    async fn insert_user(&mut self, user: &NewUser) -> Result<UserId, IdentityStoreError>;

    /// Re-read an account, observing writes made earlier in the transaction.
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, IdentityStoreError>;
}

/// Port opening identity transactions.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Run `work` inside a single transaction.
    ///
    /// The transaction commits when `work` returns `Ok` and rolls back
    /// otherwise.
    async fn in_transaction<T, F>(&self, work: F) -> Result<T, IdentityStoreError>
    where
        T: Send + 'static,
        F: for<'t> FnOnce(&'t mut dyn UserTransaction) -> BoxFuture<'t, Result<T, IdentityStoreError>>
            + Send
            + 'static;
}
