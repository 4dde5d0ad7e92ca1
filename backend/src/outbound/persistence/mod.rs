//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain's driven ports, backed by
//! PostgreSQL through `diesel-async` and a `bb8` connection pool.
//!
//! - **Thin adapters**: repositories translate between Diesel rows and
//!   domain types. Business rules stay in the domain services.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Typed errors**: Diesel failures are classified once in
//!   `diesel_helpers` and mapped onto each port's error enum, so constraint
//!   violations with domain meaning arrive as distinct variants.
//!
//! ```no_run
//! use std::sync::Arc;
//! use placelists::outbound::persistence::{DbPool, DieselListRepository, PoolConfig};
//!
//! # async fn build() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/placelists")).await?;
//! let lists = Arc::new(DieselListRepository::new(pool));
//! # let _ = lists;
//! # Ok(())
//! # }
//! ```

pub(crate) mod diesel_helpers;
mod diesel_identity_store;
mod diesel_list_repository;
mod diesel_place_repository;
mod diesel_social_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_identity_store::DieselIdentityStore;
pub use diesel_list_repository::DieselListRepository;
pub use diesel_place_repository::DieselPlaceRepository;
pub use diesel_social_repository::DieselSocialRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{
    DEFAULT_CONNECTION_TIMEOUT, DEFAULT_MAX_CONNECTIONS, DEFAULT_MIN_IDLE, DbPool, PoolConfig,
    PoolError,
};
