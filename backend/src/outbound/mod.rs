//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! Only PostgreSQL is spoken to today; adapters are thin translators between
//! domain types and Diesel rows and carry no business logic.

pub mod persistence;
