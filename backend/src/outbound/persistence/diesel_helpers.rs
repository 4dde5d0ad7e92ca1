//! Shared helpers for Diesel repository implementations.
//!
//! Repositories differ in which constraint violations carry domain meaning,
//! so Diesel errors are first classified here and each repository then maps
//! the classification onto its own port error.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use pagination::{Page, PageRequest};
use tracing::debug;

use super::models::CountRow;
use super::pool::PoolError;

/// Diesel failure reduced to the cases repositories distinguish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    /// The connection dropped mid-operation.
    Connection(String),
    /// A unique constraint or index rejected the write.
    UniqueViolation { constraint: Option<String> },
    /// A check constraint rejected a value.
    CheckViolation { constraint: Option<String> },
    /// A referenced row does not exist.
    ForeignKeyViolation { constraint: Option<String> },
    /// Anything else.
    Query(String),
}

/// Extract a readable message from a pool error.
pub(crate) fn pool_error_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

/// Classify a Diesel error, logging the database error kind at debug level.
pub(crate) fn classify_diesel_error(error: DieselError) -> DieselFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(kind, info) => {
            let constraint = info.constraint_name().map(str::to_owned);
            match kind {
                DatabaseErrorKind::UniqueViolation => DieselFailure::UniqueViolation { constraint },
                DatabaseErrorKind::CheckViolation => DieselFailure::CheckViolation { constraint },
                DatabaseErrorKind::ForeignKeyViolation => {
                    DieselFailure::ForeignKeyViolation { constraint }
                }
                DatabaseErrorKind::ClosedConnection => {
                    DieselFailure::Connection("database connection error".to_owned())
                }
                _ => DieselFailure::Query("database error".to_owned()),
            }
        }
        DieselError::NotFound => DieselFailure::Query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => {
            DieselFailure::Query("database query error".to_owned())
        }
        _ => DieselFailure::Query("database error".to_owned()),
    }
}

impl DieselFailure {
    /// Message used when a repository has no specific mapping for the case.
    pub(crate) fn into_message(self) -> String {
        match self {
            Self::Connection(message) | Self::Query(message) => message,
            Self::UniqueViolation { constraint } => {
                format!("unique violation on {}", constraint.as_deref().unwrap_or("unknown"))
            }
            Self::CheckViolation { constraint } => {
                format!("check violation on {}", constraint.as_deref().unwrap_or("unknown"))
            }
            Self::ForeignKeyViolation { constraint } => format!(
                "foreign key violation on {}",
                constraint.as_deref().unwrap_or("unknown")
            ),
        }
    }
}

/// Assemble a page from a `COUNT(*)` row and the fetched items.
pub(crate) fn page_from_count<T>(items: Vec<T>, request: PageRequest, count: CountRow) -> Page<T> {
    Page::new(items, request, u64::try_from(count.total).unwrap_or_default())
}
