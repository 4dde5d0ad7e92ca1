//! PostgreSQL-backed `IdentityStore` implementation.
//!
//! Each call to [`IdentityStore::in_transaction`] checks out one pooled
//! connection, opens a Diesel transaction on it, and lends the caller a
//! [`UserTransaction`] bound to that connection.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use futures_util::future::BoxFuture;
use tracing::debug;

use crate::domain::ports::{IdentityRecord, IdentityStore, IdentityStoreError, UserTransaction};
use crate::domain::{Email, ExternalUid, NewUser, User, UserId};

use super::diesel_helpers::{DieselFailure, classify_diesel_error, pool_error_message};
use super::diesel_user_repository::row_to_user;
use super::models::{IdentityRow, NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `IdentityStore` port.
#[derive(Clone)]
pub struct DieselIdentityStore {
    pool: DbPool,
}

impl DieselIdentityStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> IdentityStoreError {
    IdentityStoreError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> IdentityStoreError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => IdentityStoreError::connection(message),
        failure @ DieselFailure::UniqueViolation { .. } => {
            IdentityStoreError::duplicate(failure.into_message())
        }
        other => IdentityStoreError::query(other.into_message()),
    }
}

/// Error carried out of the Diesel transaction closure.
///
/// Diesel needs `From<diesel::result::Error>` for failures raised by
/// `BEGIN`/`COMMIT`; port errors from the caller's work pass through intact.
#[derive(Debug)]
enum TxError {
    Diesel(diesel::result::Error),
    Store(IdentityStoreError),
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

impl From<TxError> for IdentityStoreError {
    fn from(error: TxError) -> Self {
        match error {
            TxError::Diesel(error) => map_diesel_error(error),
            TxError::Store(error) => error,
        }
    }
}

/// Transaction-scoped view of the users table.
struct DieselUserTransaction<'c> {
    conn: &'c mut AsyncPgConnection,
}

#[async_trait]
impl UserTransaction for DieselUserTransaction<'_> {
    async fn find_by_external_uid(
        &mut self,
        uid: &ExternalUid,
    ) -> Result<Option<UserId>, IdentityStoreError> {
        let uid: &str = uid.as_ref();
        let id: Option<i64> = users::table
            .filter(users::external_uid.eq(uid))
            .select(users::id)
            .first(&mut *self.conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(id.map(UserId::new))
    }

    async fn find_by_email(
        &mut self,
        email: &Email,
    ) -> Result<Option<IdentityRecord>, IdentityStoreError> {
        let email: &str = email.as_ref();
        let row: Option<IdentityRow> = users::table
            .filter(users::email.eq(email))
            .select(IdentityRow::as_select())
            .first(&mut *self.conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(|row| IdentityRecord {
            user_id: UserId::new(row.id),
            external_uid: row.external_uid,
        }))
    }

    async fn bind_external_uid(
        &mut self,
        id: UserId,
        uid: &ExternalUid,
    ) -> Result<(), IdentityStoreError> {
        let uid: &str = uid.as_ref();
        diesel::update(users::table.filter(users::id.eq(id.get())))
            .set((
                users::external_uid.eq(uid),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        debug!(user_id = %id, "external uid bound to existing account");
        Ok(())
    }

    async fn insert_user(&mut self, user: &NewUser) -> Result<UserId, IdentityStoreError> {
        let row = NewUserRow {
            external_uid: Some(user.external_uid.as_ref()),
            email: user.email.as_ref(),
            display_name: user.display_name.as_deref(),
            profile_picture_url: user.profile_picture_url.as_deref(),
        };
        let id: i64 = diesel::insert_into(users::table)
            .values(&row)
            .returning(users::id)
            .get_result(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(UserId::new(id))
    }

    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, IdentityStoreError> {
        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.get()))
            .select(UserRow::as_select())
            .first(&mut *self.conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_user))
    }
}

#[async_trait]
impl IdentityStore for DieselIdentityStore {
    async fn in_transaction<T, F>(&self, work: F) -> Result<T, IdentityStoreError>
    where
        T: Send + 'static,
        F: for<'t> FnOnce(&'t mut dyn UserTransaction) -> BoxFuture<'t, Result<T, IdentityStoreError>>
            + Send
            + 'static,
    {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let result = conn
            .transaction::<T, TxError, _>(|conn| {
                async move {
                    let mut tx = DieselUserTransaction { conn };
                    work(&mut tx).await.map_err(TxError::Store)
                }
                .scope_boxed()
            })
            .await?;

        Ok(result)
    }
}
