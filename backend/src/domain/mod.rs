//! Domain primitives, services, and ports.
//!
//! Purpose: define the strongly typed entities shared by the HTTP and
//! persistence adapters, the ports those adapters plug into, and the services
//! that enforce list ownership, collaboration, place uniqueness, and follow
//! rules.
//!
//! Public surface:
//! - [`Error`] and [`ErrorCode`]: the typed failure taxonomy.
//! - Entities for users, lists, places, and the social graph.
//! - Services implementing the driving ports in [`ports`].

mod access;
mod account_service;
pub mod error;
mod identity_resolver;
pub mod list;
mod list_service;
pub mod patch;
pub mod place;
mod place_service;
pub mod ports;
pub mod social;
mod social_service;
pub mod trace_id;
pub mod user;

pub use self::access::AccessEvaluator;
pub use self::account_service::AccountService;
pub use self::error::{Error, ErrorCode};
pub use self::identity_resolver::IdentityResolver;
pub use self::list::{
    AccessLevel, CollaboratorRole, LIST_DESCRIPTION_MAX, LIST_NAME_MAX, ListDescription,
    ListDetails, ListId, ListMember, ListName, ListQuery, ListSummary, ListUpdate,
    ListValidationError, NewList, PlaceList, SearchTerm,
};
pub use self::list_service::ListService;
pub use self::patch::Patch;
pub use self::place::{
    Coordinates, NewPlace, NewPlaceInput, PLACE_ADDRESS_MAX, PLACE_NAME_MAX, PLACE_NOTES_MAX,
    Place, PlaceId, PlaceUpdate, PlaceValidationError,
};
pub use self::place_service::PlaceService;
pub use self::social::{FollowOutcome, Notification, UserFollowInfo, UserListing};
pub use self::social_service::SocialService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    DISPLAY_NAME_MAX, DisplayName, EMAIL_MAX, Email, ExternalUid, NewUser, PrivacySettings,
    PrivacySettingsUpdate, ProfileUpdate, ResolvedUser, USERNAME_MAX, User, UserId,
    UserValidationError, Username, VerifiedIdentity,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use placelists::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
