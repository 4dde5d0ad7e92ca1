//! PostgreSQL-backed `SocialRepository` implementation.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Nullable, Text};
use diesel_async::RunQueryDsl;
use pagination::{Page, PageRequest};

use crate::domain::ports::{SocialRepository, SocialRepositoryError};
use crate::domain::{Notification, UserFollowInfo, UserId, UserListing};

use super::diesel_helpers::{
    DieselFailure, classify_diesel_error, page_from_count, pool_error_message,
};
use super::models::{CountRow, NotificationRow, UserFollowRow};
use super::pool::{DbPool, PoolError};
use super::schema::{notifications, user_follows};

const FOLLOWS_BACK: &str =
    "EXISTS (SELECT 1 FROM user_follows b WHERE b.follower_id = $1 AND b.followed_id = u.id)";
const NAME_ORDER: &str = "u.username ASC NULLS LAST, u.display_name ASC NULLS LAST";

/// Shape of one user listing. `$1` is the subject or viewer, `$2` the
/// search pattern (NULL outside search).
struct UserFilter {
    source: &'static str,
    clause: &'static str,
    following: &'static str,
    order: &'static str,
    user: i64,
    pattern: Option<String>,
}

impl UserFilter {
    fn for_listing(listing: &UserListing) -> Self {
        match listing {
            UserListing::Following(user) => Self {
                source: "user_follows f JOIN users u ON u.id = f.followed_id",
                clause: "f.follower_id = $1",
                following: "TRUE",
                order: "u.id",
                user: user.get(),
                pattern: None,
            },
            UserListing::Followers(user) => Self {
                source: "user_follows f JOIN users u ON u.id = f.follower_id",
                clause: "f.followed_id = $1",
                following: FOLLOWS_BACK,
                order: "u.id",
                user: user.get(),
                pattern: None,
            },
            UserListing::Search { term, viewer } => Self {
                source: "users u",
                clause: "u.id <> $1 AND (LOWER(u.email) LIKE $2 \
                         OR LOWER(COALESCE(u.username, '')) LIKE $2)",
                following: FOLLOWS_BACK,
                order: "u.email, u.id",
                user: viewer.get(),
                pattern: Some(term.like_pattern()),
            },
        }
    }

    fn count_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) AS total FROM {} WHERE {}",
            self.source, self.clause
        )
    }

    fn page_sql(&self) -> String {
        format!(
            "SELECT u.id, u.email, u.username, u.display_name, u.profile_picture_url, \
             {} AS is_following \
             FROM {} WHERE {} \
             ORDER BY {NAME_ORDER}, {} \
             LIMIT $3 OFFSET $4",
            self.following, self.source, self.clause, self.order
        )
    }
}

/// Diesel-backed implementation of the `SocialRepository` port.
#[derive(Clone)]
pub struct DieselSocialRepository {
    pool: DbPool,
}

impl DieselSocialRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SocialRepositoryError {
    SocialRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> SocialRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => SocialRepositoryError::connection(message),
        DieselFailure::ForeignKeyViolation { .. } => SocialRepositoryError::unknown_user(),
        other => SocialRepositoryError::query(other.into_message()),
    }
}

fn row_to_follow_info(row: UserFollowRow) -> UserFollowInfo {
    UserFollowInfo {
        id: UserId::new(row.id),
        email: row.email,
        username: row.username,
        display_name: row.display_name,
        profile_picture_url: row.profile_picture_url,
        is_following: row.is_following,
    }
}

fn row_to_notification(row: NotificationRow) -> Notification {
    Notification {
        id: row.id,
        title: row.title,
        message: row.message,
        is_read: row.is_read,
        timestamp: row.created_at,
    }
}

#[async_trait]
impl SocialRepository for DieselSocialRepository {
    async fn insert_follow(
        &self,
        follower: UserId,
        followed: UserId,
    ) -> Result<bool, SocialRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let inserted = diesel::insert_into(user_follows::table)
            .values((
                user_follows::follower_id.eq(follower.get()),
                user_follows::followed_id.eq(followed.get()),
            ))
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(inserted == 1)
    }

    async fn delete_follow(
        &self,
        follower: UserId,
        followed: UserId,
    ) -> Result<bool, SocialRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(
            user_follows::table
                .filter(user_follows::follower_id.eq(follower.get()))
                .filter(user_follows::followed_id.eq(followed.get())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(deleted == 1)
    }

    async fn users(
        &self,
        listing: &UserListing,
        request: PageRequest,
    ) -> Result<Page<UserFollowInfo>, SocialRepositoryError> {
        let filter = UserFilter::for_listing(listing);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let count: CountRow = sql_query(filter.count_sql())
            .bind::<BigInt, _>(filter.user)
            .bind::<Nullable<Text>, _>(filter.pattern.as_deref())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if count.total == 0 {
            return Ok(Page::empty(request));
        }

        let rows: Vec<UserFollowRow> = sql_query(filter.page_sql())
            .bind::<BigInt, _>(filter.user)
            .bind::<Nullable<Text>, _>(filter.pattern.as_deref())
            .bind::<BigInt, _>(request.limit())
            .bind::<BigInt, _>(request.offset())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(page_from_count(
            rows.into_iter().map(row_to_follow_info).collect(),
            request,
            count,
        ))
    }

    async fn notifications(
        &self,
        user: UserId,
        request: PageRequest,
    ) -> Result<Page<Notification>, SocialRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = notifications::table
            .filter(notifications::user_id.eq(user.get()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if total == 0 {
            return Ok(Page::empty(request));
        }

        let rows: Vec<NotificationRow> = notifications::table
            .filter(notifications::user_id.eq(user.get()))
            .select(NotificationRow::as_select())
            .order((notifications::created_at.desc(), notifications::id.desc()))
            .limit(request.limit())
            .offset(request.offset())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(Page::new(
            rows.into_iter().map(row_to_notification).collect(),
            request,
            u64::try_from(total).unwrap_or_default(),
        ))
    }
}
