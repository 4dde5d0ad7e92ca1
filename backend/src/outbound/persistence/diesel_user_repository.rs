//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{
    Email, Patch, PrivacySettings, PrivacySettingsUpdate, ProfileUpdate, User, UserId, Username,
};

use super::diesel_helpers::{DieselFailure, classify_diesel_error, pool_error_message};
use super::models::{
    CountRow, NewUserRow, PrivacyChangeset, PrivacyRow, ProfileChangeset, UserRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::users;

const USERNAME_INDEX: &str = "users_username_lower_key";

const USERNAME_TAKEN_SQL: &str = r#"
SELECT COUNT(*) AS total
FROM users
WHERE LOWER(username) = LOWER($1) AND id <> $2
"#;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    UserRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => UserRepositoryError::connection(message),
        DieselFailure::UniqueViolation { constraint }
            if constraint.as_deref() == Some(USERNAME_INDEX) =>
        {
            UserRepositoryError::username_taken()
        }
        other => UserRepositoryError::query(other.into_message()),
    }
}

pub(crate) fn row_to_user(row: UserRow) -> User {
    User {
        id: UserId::new(row.id),
        email: row.email,
        username: row.username,
        display_name: row.display_name,
        profile_picture_url: row.profile_picture_url,
    }
}

fn row_to_privacy(row: PrivacyRow) -> PrivacySettings {
    PrivacySettings {
        profile_is_public: row.profile_is_public,
        lists_are_public: row.lists_are_public,
        allow_analytics: row.allow_analytics,
    }
}

/// Column change for one privacy flag; `Null` writes the default.
fn privacy_change(patch: &Patch<bool>, default: bool) -> Option<bool> {
    match patch {
        Patch::Unset => None,
        Patch::Null => Some(default),
        Patch::Value(value) => Some(*value),
    }
}

fn privacy_changeset(update: &PrivacySettingsUpdate) -> PrivacyChangeset {
    let defaults = PrivacySettings::default();
    PrivacyChangeset {
        profile_is_public: privacy_change(&update.profile_is_public, defaults.profile_is_public),
        lists_are_public: privacy_change(&update.lists_are_public, defaults.lists_are_public),
        allow_analytics: privacy_change(&update.allow_analytics, defaults.allow_analytics),
    }
}

fn profile_changeset(update: &ProfileUpdate) -> ProfileChangeset<'_> {
    ProfileChangeset {
        display_name: update
            .display_name
            .as_change()
            .map(|value| value.map(|name| name.as_ref())),
        profile_picture_url: update
            .profile_picture_url
            .as_change()
            .map(|value| value.map(String::as_str)),
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.get()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_user))
    }

    async fn exists(&self, id: UserId) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(diesel::dsl::exists(users::table.filter(users::id.eq(id.get()))))
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn find_or_create_placeholder(
        &self,
        email: &Email,
    ) -> Result<UserId, UserRepositoryError> {
        let email: &str = email.as_ref();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let existing: Option<i64> = users::table
            .filter(users::email.eq(email))
            .select(users::id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        if let Some(id) = existing {
            return Ok(UserId::new(id));
        }

        let row = NewUserRow {
            external_uid: None,
            email,
            display_name: None,
            profile_picture_url: None,
        };
        // A concurrent insert of the same email lands on the conflict arm and
        // still yields the surviving row's id.
        let id: i64 = diesel::insert_into(users::table)
            .values(&row)
            .on_conflict(users::email)
            .do_update()
            .set(users::updated_at.eq(diesel::dsl::now))
            .returning(users::id)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        debug!(user_id = id, "placeholder account created");
        Ok(UserId::new(id))
    }

    async fn username_taken(
        &self,
        username: &Username,
        except: UserId,
    ) -> Result<bool, UserRepositoryError> {
        let username: &str = username.as_ref();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let count: CountRow = sql_query(USERNAME_TAKEN_SQL)
            .bind::<Text, _>(username)
            .bind::<BigInt, _>(except.get())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(count.total > 0)
    }

    async fn set_username(
        &self,
        id: UserId,
        username: &Username,
    ) -> Result<bool, UserRepositoryError> {
        let username: &str = username.as_ref();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(users::table.filter(users::id.eq(id.get())))
            .set((
                users::username.eq(username),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(updated == 1)
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = profile_changeset(update);

        let row: Option<UserRow> = diesel::update(users::table.filter(users::id.eq(id.get())))
            .set((&changes, users::updated_at.eq(diesel::dsl::now)))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_user))
    }

    async fn privacy_settings(
        &self,
        id: UserId,
    ) -> Result<Option<PrivacySettings>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<PrivacyRow> = users::table
            .filter(users::id.eq(id.get()))
            .select(PrivacyRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_privacy))
    }

    async fn update_privacy_settings(
        &self,
        id: UserId,
        update: &PrivacySettingsUpdate,
    ) -> Result<Option<PrivacySettings>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = privacy_changeset(update);

        let row: Option<PrivacyRow> = diesel::update(users::table.filter(users::id.eq(id.get())))
            .set((&changes, users::updated_at.eq(diesel::dsl::now)))
            .returning(PrivacyRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_privacy))
    }

    async fn delete(&self, id: UserId) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(users::table.filter(users::id.eq(id.get())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted == 1)
    }
}
