//! PostgreSQL-backed `ListRepository` implementation.
//!
//! Discovery listings and the member union are plain SQL run through
//! `sql_query`; everything else uses the Diesel DSL.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Nullable, Text};
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use pagination::{Page, PageRequest};
use tracing::{debug, warn};

use crate::domain::ports::{ListRepository, ListRepositoryError};
use crate::domain::{
    AccessLevel, CollaboratorRole, ListId, ListMember, ListQuery, ListSummary, ListUpdate,
    NewList, PlaceList, UserId,
};

use super::diesel_helpers::{
    DieselFailure, classify_diesel_error, page_from_count, pool_error_message,
};
use super::models::{
    AccessRow, CountRow, ListChangeset, ListRow, ListSummaryRow, MemberRow, NewListRow,
    NewMembershipRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{list_collaborators, lists, users};

const MEMBERSHIP_KEY: &str = "list_collaborators_list_id_user_id_key";

/// Owner or collaborator check in one round trip. No row means no access.
const ACCESS_SQL: &str = r#"
SELECT (l.owner_id = $2) AS is_owner
FROM lists l
WHERE l.id = $1
  AND (
    l.owner_id = $2
    OR EXISTS (
      SELECT 1 FROM list_collaborators c
      WHERE c.list_id = l.id AND c.user_id = $2
    )
  )
"#;

const MEMBERS_SQL: &str = r#"
SELECT user_id, email, display_name, role
FROM (
  SELECT u.id AS user_id, u.email, u.display_name, 'owner' AS role, 0 AS ord
  FROM lists l
  JOIN users u ON u.id = l.owner_id
  WHERE l.id = $1
  UNION ALL
  SELECT u.id, u.email, u.display_name, c.role, 1
  FROM list_collaborators c
  JOIN users u ON u.id = c.user_id
  WHERE c.list_id = $1
) m
ORDER BY ord, email
"#;

// Every discovery filter reads from the same bind slots: $1 is the viewer or
// owner id, $2 the LIKE pattern. Unused slots are bound as NULL.
const OWNED_FILTER: &str = "l.owner_id = $1";
const PUBLIC_FILTER: &str = "l.is_private = FALSE";
const VISIBLE_FILTER: &str = "(l.is_private = FALSE OR l.owner_id = $1)";
const SEARCH_FILTER: &str = "(l.is_private = FALSE OR l.owner_id = $1) \
     AND (LOWER(l.name) LIKE $2 OR LOWER(COALESCE(l.description, '')) LIKE $2)";

struct ListFilter {
    clause: &'static str,
    user: Option<i64>,
    pattern: Option<String>,
}

impl ListFilter {
    fn for_query(query: &ListQuery) -> Self {
        match query {
            ListQuery::Owned(owner) => Self {
                clause: OWNED_FILTER,
                user: Some(owner.get()),
                pattern: None,
            },
            ListQuery::Public => Self {
                clause: PUBLIC_FILTER,
                user: None,
                pattern: None,
            },
            ListQuery::Recent(viewer) => Self {
                clause: VISIBLE_FILTER,
                user: Some(viewer.get()),
                pattern: None,
            },
            // An anonymous viewer binds NULL, so `owner_id = $1` never holds.
            ListQuery::Search { term, viewer } => Self {
                clause: SEARCH_FILTER,
                user: viewer.map(UserId::get),
                pattern: Some(term.like_pattern()),
            },
        }
    }

    fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) AS total FROM lists l WHERE {}", self.clause)
    }

    fn page_sql(&self) -> String {
        format!(
            "SELECT l.id, l.name, l.description, l.is_private, \
             (SELECT COUNT(*) FROM places p WHERE p.list_id = l.id) AS place_count \
             FROM lists l WHERE {} \
             ORDER BY l.created_at DESC, l.id DESC \
             LIMIT $3 OFFSET $4",
            self.clause
        )
    }
}

/// Diesel-backed implementation of the `ListRepository` port.
#[derive(Clone)]
pub struct DieselListRepository {
    pool: DbPool,
}

impl DieselListRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ListRepositoryError {
    ListRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> ListRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => ListRepositoryError::connection(message),
        DieselFailure::UniqueViolation { constraint }
            if constraint.as_deref() == Some(MEMBERSHIP_KEY) =>
        {
            ListRepositoryError::duplicate_membership()
        }
        failure @ DieselFailure::ForeignKeyViolation { .. } => {
            ListRepositoryError::missing_reference(failure.into_message())
        }
        other => ListRepositoryError::query(other.into_message()),
    }
}

fn row_to_list(row: ListRow) -> PlaceList {
    PlaceList {
        id: ListId::new(row.id),
        owner_id: UserId::new(row.owner_id),
        name: row.name,
        description: row.description,
        is_private: row.is_private,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn row_to_summary(row: ListSummaryRow) -> ListSummary {
    ListSummary {
        id: ListId::new(row.id),
        name: row.name,
        description: row.description,
        is_private: row.is_private,
        place_count: row.place_count,
    }
}

fn row_to_member(row: MemberRow) -> ListMember {
    let role = row.role.parse().unwrap_or_else(|_| {
        warn!(
            value = row.role.as_str(),
            user_id = row.user_id,
            "unrecognised collaborator role, treating as viewer"
        );
        CollaboratorRole::Viewer
    });
    ListMember {
        user_id: UserId::new(row.user_id),
        email: row.email,
        display_name: row.display_name,
        role,
    }
}

fn list_changeset(update: &ListUpdate) -> ListChangeset<'_> {
    ListChangeset {
        name: update.name.as_ref().map(|name| name.as_ref()),
        description: update
            .description
            .as_change()
            .map(|value| value.map(|description| description.as_ref())),
        is_private: update.is_private,
    }
}

#[async_trait]
impl ListRepository for DieselListRepository {
    async fn insert(&self, list: &NewList) -> Result<PlaceList, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewListRow {
            owner_id: list.owner_id.get(),
            name: list.name.as_ref(),
            description: list.description.as_ref().map(|description| description.as_ref()),
            is_private: list.is_private,
        };

        let stored: ListRow = diesel::insert_into(lists::table)
            .values(&row)
            .returning(ListRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        debug!(list_id = stored.id, owner_id = stored.owner_id, "list inserted");
        Ok(row_to_list(stored))
    }

    async fn find_by_id(&self, id: ListId) -> Result<Option<PlaceList>, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ListRow> = lists::table
            .filter(lists::id.eq(id.get()))
            .select(ListRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_list))
    }

    async fn update(
        &self,
        id: ListId,
        update: &ListUpdate,
    ) -> Result<Option<PlaceList>, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = list_changeset(update);

        let row: Option<ListRow> = diesel::update(lists::table.filter(lists::id.eq(id.get())))
            .set((&changes, lists::updated_at.eq(diesel::dsl::now)))
            .returning(ListRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_list))
    }

    async fn delete(&self, id: ListId) -> Result<bool, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(lists::table.filter(lists::id.eq(id.get())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted == 1)
    }

    async fn exists(&self, id: ListId) -> Result<bool, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(diesel::dsl::exists(lists::table.filter(lists::id.eq(id.get()))))
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn access_level(
        &self,
        list: ListId,
        user: UserId,
    ) -> Result<Option<AccessLevel>, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<AccessRow> = sql_query(ACCESS_SQL)
            .bind::<BigInt, _>(list.get())
            .bind::<BigInt, _>(user.get())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(|row| {
            if row.is_owner {
                AccessLevel::Owner
            } else {
                AccessLevel::Collaborator
            }
        }))
    }

    async fn is_owner(&self, list: ListId, user: UserId) -> Result<bool, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(diesel::dsl::exists(
            lists::table
                .filter(lists::id.eq(list.get()))
                .filter(lists::owner_id.eq(user.get())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn collaborator_emails(&self, list: ListId) -> Result<Vec<String>, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        list_collaborators::table
            .inner_join(users::table)
            .filter(list_collaborators::list_id.eq(list.get()))
            .select(users::email)
            .order(users::email.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn members(&self, list: ListId) -> Result<Vec<ListMember>, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<MemberRow> = sql_query(MEMBERS_SQL)
            .bind::<BigInt, _>(list.get())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_member).collect())
    }

    async fn membership_exists(
        &self,
        list: ListId,
        user: UserId,
    ) -> Result<bool, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(diesel::dsl::exists(
            list_collaborators::table
                .filter(list_collaborators::list_id.eq(list.get()))
                .filter(list_collaborators::user_id.eq(user.get())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn insert_membership(
        &self,
        list: ListId,
        user: UserId,
        role: CollaboratorRole,
    ) -> Result<(), ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewMembershipRow {
            list_id: list.get(),
            user_id: user.get(),
            role: role.as_str(),
        };

        diesel::insert_into(list_collaborators::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        debug!(list_id = %list, user_id = %user, role = role.as_str(), "membership inserted");
        Ok(())
    }

    async fn upsert_membership(
        &self,
        list: ListId,
        user: UserId,
        role: CollaboratorRole,
    ) -> Result<(), ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewMembershipRow {
            list_id: list.get(),
            user_id: user.get(),
            role: role.as_str(),
        };

        diesel::insert_into(list_collaborators::table)
            .values(&row)
            .on_conflict((list_collaborators::list_id, list_collaborators::user_id))
            .do_update()
            .set(list_collaborators::role.eq(excluded(list_collaborators::role)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(())
    }

    async fn delete_membership(
        &self,
        list: ListId,
        user: UserId,
    ) -> Result<bool, ListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(
            list_collaborators::table
                .filter(list_collaborators::list_id.eq(list.get()))
                .filter(list_collaborators::user_id.eq(user.get())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(deleted == 1)
    }

    async fn page(
        &self,
        query: &ListQuery,
        request: PageRequest,
    ) -> Result<Page<ListSummary>, ListRepositoryError> {
        let filter = ListFilter::for_query(query);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let count: CountRow = sql_query(filter.count_sql())
            .bind::<Nullable<BigInt>, _>(filter.user)
            .bind::<Nullable<Text>, _>(filter.pattern.as_deref())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if count.total == 0 {
            return Ok(Page::empty(request));
        }

        let rows: Vec<ListSummaryRow> = sql_query(filter.page_sql())
            .bind::<Nullable<BigInt>, _>(filter.user)
            .bind::<Nullable<Text>, _>(filter.pattern.as_deref())
            .bind::<BigInt, _>(request.limit())
            .bind::<BigInt, _>(request.offset())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(page_from_count(
            rows.into_iter().map(row_to_summary).collect(),
            request,
            count,
        ))
    }
}
