//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on driving ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountCommand, IdentityCommand, ListCommand, PlaceCommand, SocialCommand,
};

/// Dependency bundle for HTTP handlers.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
///
/// use placelists::domain::ports::{
///     AccountCommand, IdentityCommand, ListCommand, PlaceCommand, SocialCommand,
/// };
/// use placelists::inbound::http::state::HttpState;
///
/// fn wire(
///     identity: Arc<dyn IdentityCommand>,
///     accounts: Arc<dyn AccountCommand>,
///     lists: Arc<dyn ListCommand>,
///     places: Arc<dyn PlaceCommand>,
///     social: Arc<dyn SocialCommand>,
/// ) -> HttpState {
///     HttpState { identity, accounts, lists, places, social }
/// }
/// ```
#[derive(Clone)]
pub struct HttpState {
    /// Resolves verified identities at login.
    pub identity: Arc<dyn IdentityCommand>,
    /// Profile, username, privacy, and account deletion.
    pub accounts: Arc<dyn AccountCommand>,
    /// Lists and memberships.
    pub lists: Arc<dyn ListCommand>,
    /// Places inside lists.
    pub places: Arc<dyn PlaceCommand>,
    /// Follow graph and notifications.
    pub social: Arc<dyn SocialCommand>,
}
