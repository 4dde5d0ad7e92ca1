//! Driving port for identity resolution.
//!
//! Inbound adapters call [`IdentityCommand`] once per login with the identity
//! asserted by the upstream verifier. The returned id is what the session
//! carries from then on.

use async_trait::async_trait;

use crate::domain::{Error, ResolvedUser, VerifiedIdentity};

/// Driving port mapping verified identities to accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityCommand: Send + Sync {
    /// Find or create the account for `identity`.
    ///
    /// # Errors
    ///
    /// - [`crate::domain::ErrorCode::InvalidRequest`] when uid or email is
    ///   missing or malformed.
    /// - Storage failures mapped to service unavailable or storage errors.
    async fn resolve_or_create(&self, identity: VerifiedIdentity) -> Result<ResolvedUser, Error>;
}
