//! Identity resolution service.
//!
//! Maps an identity asserted by the upstream verifier to an internal account.
//! Lookup goes by external uid first and falls back to email, so accounts
//! created as collaborator placeholders are claimed on first login. Each
//! attempt runs inside one [`IdentityStore`] transaction.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::ports::{IdentityCommand, IdentityStore, IdentityStoreError, UserTransaction};
use crate::domain::{Error, NewUser, ResolvedUser, VerifiedIdentity};

/// Identity resolver implementing [`IdentityCommand`].
#[derive(Clone)]
pub struct IdentityResolver<S> {
    store: Arc<S>,
}

impl<S> IdentityResolver<S> {
    /// Create a resolver over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S> IdentityResolver<S>
where
    S: IdentityStore,
{
    fn map_store_error(error: IdentityStoreError) -> Error {
        match error {
            IdentityStoreError::Connection { message } => {
                Error::service_unavailable(format!("identity store unavailable: {message}"))
            }
            IdentityStoreError::Query { message } | IdentityStoreError::Duplicate { message } => {
                Error::storage(format!("identity store error: {message}"))
            }
        }
    }

    async fn attempt(&self, new_user: NewUser) -> Result<ResolvedUser, IdentityStoreError> {
        self.store
            .in_transaction(move |tx| Box::pin(async move { resolve_within(tx, &new_user).await }))
            .await
    }
}

async fn resolve_within(
    tx: &mut dyn UserTransaction,
    new_user: &NewUser,
) -> Result<ResolvedUser, IdentityStoreError> {
    let user_id = if let Some(id) = tx.find_by_external_uid(&new_user.external_uid).await? {
        id
    } else if let Some(record) = tx.find_by_email(&new_user.email).await? {
        if record.external_uid.as_deref() != Some(new_user.external_uid.as_ref()) {
            debug!(user_id = %record.user_id, "binding external uid to account found by email");
            tx.bind_external_uid(record.user_id, &new_user.external_uid)
                .await?;
        }
        record.user_id
    } else {
        let id = tx.insert_user(new_user).await?;
        debug!(user_id = %id, "created account for new identity");
        id
    };

    let user = tx.find_user(user_id).await?.ok_or_else(|| {
        IdentityStoreError::query(format!("user {user_id} disappeared during resolution"))
    })?;
    Ok(ResolvedUser {
        user_id,
        needs_username: user.needs_username(),
    })
}

#[async_trait]
impl<S> IdentityCommand for IdentityResolver<S>
where
    S: IdentityStore,
{
    async fn resolve_or_create(&self, identity: VerifiedIdentity) -> Result<ResolvedUser, Error> {
        let new_user =
            NewUser::from_identity(identity).map_err(|err| Error::invalid_request(err.to_string()))?;

        match self.attempt(new_user.clone()).await {
            Err(IdentityStoreError::Duplicate { message }) => {
                // A concurrent login created the row first; the fresh
                // transaction sees the winner.
                warn!(%message, "identity insert conflicted, retrying lookup");
                self.attempt(new_user).await.map_err(Self::map_store_error)
            }
            other => other.map_err(Self::map_store_error),
        }
    }
}

#[cfg(test)]
#[path = "identity_resolver_tests.rs"]
mod tests;
