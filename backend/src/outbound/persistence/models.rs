//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool, Nullable, Text};

use super::schema::{list_collaborators, lists, notifications, places, users};

// ---------------------------------------------------------------------------
// User models
// ---------------------------------------------------------------------------

/// Row struct for reading account fields from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub email: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub profile_picture_url: Option<String>,
}

/// Identity lookup projection.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IdentityRow {
    pub id: i64,
    pub external_uid: Option<String>,
}

/// Privacy flag projection.
#[derive(Debug, Clone, Copy, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PrivacyRow {
    pub profile_is_public: bool,
    pub lists_are_public: bool,
    pub allow_analytics: bool,
}

/// Insertable struct for accounts, full or placeholder.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub external_uid: Option<&'a str>,
    pub email: &'a str,
    pub display_name: Option<&'a str>,
    pub profile_picture_url: Option<&'a str>,
}

/// Profile changeset. `Some(None)` clears a column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct ProfileChangeset<'a> {
    pub display_name: Option<Option<&'a str>>,
    pub profile_picture_url: Option<Option<&'a str>>,
}

/// Privacy changeset. `None` leaves a flag untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct PrivacyChangeset {
    pub profile_is_public: Option<bool>,
    pub lists_are_public: Option<bool>,
    pub allow_analytics: Option<bool>,
}

// ---------------------------------------------------------------------------
// List models
// ---------------------------------------------------------------------------

/// Row struct for reading from the lists table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = lists)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ListRow {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for new lists.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = lists)]
pub(crate) struct NewListRow<'a> {
    pub owner_id: i64,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub is_private: bool,
}

/// List changeset. `description: Some(None)` clears the description.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = lists)]
pub(crate) struct ListChangeset<'a> {
    pub name: Option<&'a str>,
    pub description: Option<Option<&'a str>>,
    pub is_private: Option<bool>,
}

/// Insertable struct for membership rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = list_collaborators)]
pub(crate) struct NewMembershipRow<'a> {
    pub list_id: i64,
    pub user_id: i64,
    pub role: &'a str,
}

/// Discovery row with its correlated place count.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct ListSummaryRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub description: Option<String>,
    #[diesel(sql_type = Bool)]
    pub is_private: bool,
    #[diesel(sql_type = BigInt)]
    pub place_count: i64,
}

/// Member row from the owner/collaborator union.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct MemberRow {
    #[diesel(sql_type = BigInt)]
    pub user_id: i64,
    #[diesel(sql_type = Text)]
    pub email: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub display_name: Option<String>,
    #[diesel(sql_type = Text)]
    pub role: String,
}

/// Result of the combined existence and permission query.
#[derive(Debug, Clone, Copy, QueryableByName)]
pub(crate) struct AccessRow {
    #[diesel(sql_type = Bool)]
    pub is_owner: bool,
}

/// `COUNT(*)` result for paginated raw queries.
#[derive(Debug, Clone, Copy, QueryableByName)]
pub(crate) struct CountRow {
    #[diesel(sql_type = BigInt)]
    pub total: i64,
}

// ---------------------------------------------------------------------------
// Place models
// ---------------------------------------------------------------------------

/// Row struct for reading from the places table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = places)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PlaceRow {
    pub id: i64,
    pub list_id: i64,
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: Option<String>,
    pub notes: Option<String>,
    pub visit_status: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for new places.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = places)]
pub(crate) struct NewPlaceRow<'a> {
    pub list_id: i64,
    pub place_id: &'a str,
    pub name: &'a str,
    pub address: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub visit_status: Option<&'a str>,
}

/// Place changeset. `Some(None)` clears a column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = places)]
pub(crate) struct PlaceChangeset<'a> {
    pub notes: Option<Option<&'a str>>,
    pub rating: Option<Option<&'a str>>,
    pub visit_status: Option<Option<&'a str>>,
}

// ---------------------------------------------------------------------------
// Social models
// ---------------------------------------------------------------------------

/// User listing row with the viewer's follow flag.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct UserFollowRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub email: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub username: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub display_name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub profile_picture_url: Option<String>,
    #[diesel(sql_type = Bool)]
    pub is_following: bool,
}

/// Row struct for reading from the notifications table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
