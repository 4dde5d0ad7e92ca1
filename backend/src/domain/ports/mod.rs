//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`IdentityStore`]) are implemented by the
//! persistence adapters. Driving ports (`*Command`) are implemented by the
//! domain services and consumed by the HTTP adapter.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod identity_command;
mod identity_store;
mod list_command;
mod list_repository;
mod place_command;
mod place_repository;
mod social_command;
mod social_repository;
mod user_repository;

pub use account_command::AccountCommand;
#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use identity_command::IdentityCommand;
#[cfg(test)]
pub use identity_command::MockIdentityCommand;
pub use identity_store::{IdentityRecord, IdentityStore, IdentityStoreError, UserTransaction};
pub use list_command::ListCommand;
#[cfg(test)]
pub use list_command::MockListCommand;
#[cfg(test)]
pub use list_repository::MockListRepository;
pub use list_repository::{ListRepository, ListRepositoryError};
#[cfg(test)]
pub use place_command::MockPlaceCommand;
pub use place_command::PlaceCommand;
#[cfg(test)]
pub use place_repository::MockPlaceRepository;
pub use place_repository::{PlaceRepository, PlaceRepositoryError};
#[cfg(test)]
pub use social_command::MockSocialCommand;
pub use social_command::SocialCommand;
#[cfg(test)]
pub use social_repository::MockSocialRepository;
pub use social_repository::{SocialRepository, SocialRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
