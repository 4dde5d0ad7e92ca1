//! Shared helpers for backend integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`; this
//! module is their common home for embedded PostgreSQL setup.

pub mod cluster;
pub mod database;

pub use cluster::{handle_cluster_setup_failure, shared_cluster};
pub use database::provision_template_database;
