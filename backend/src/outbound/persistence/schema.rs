//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations under `backend/migrations`
//! exactly. `diesel print-schema` regenerates them from a live database.

diesel::table! {
    /// User accounts, including placeholders created by invites.
    users (id) {
        id -> Int8,
        /// Identity provider uid; NULL for placeholder accounts.
        external_uid -> Nullable<Text>,
        email -> Varchar,
        /// Unique case-insensitively via `users_username_lower_key`.
        username -> Nullable<Varchar>,
        display_name -> Nullable<Varchar>,
        profile_picture_url -> Nullable<Text>,
        profile_is_public -> Bool,
        lists_are_public -> Bool,
        allow_analytics -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Place lists. The owner is stored here and never as a collaborator.
    lists (id) {
        id -> Int8,
        owner_id -> Int8,
        name -> Varchar,
        description -> Nullable<Varchar>,
        is_private -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Collaborator memberships, unique per `(list_id, user_id)`.
    list_collaborators (id) {
        id -> Int8,
        list_id -> Int8,
        user_id -> Int8,
        role -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Places saved in a list, unique per `(list_id, place_id)`.
    places (id) {
        id -> Int8,
        list_id -> Int8,
        /// External catalogue reference.
        place_id -> Text,
        name -> Varchar,
        address -> Varchar,
        latitude -> Float8,
        longitude -> Float8,
        rating -> Nullable<Text>,
        notes -> Nullable<Varchar>,
        visit_status -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Directed follow edges.
    user_follows (follower_id, followed_id) {
        follower_id -> Int8,
        followed_id -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    notifications (id) {
        id -> Int8,
        user_id -> Int8,
        title -> Varchar,
        message -> Text,
        is_read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(list_collaborators -> lists (list_id));
diesel::joinable!(list_collaborators -> users (user_id));
diesel::joinable!(lists -> users (owner_id));
diesel::joinable!(notifications -> users (user_id));
diesel::joinable!(places -> lists (list_id));

diesel::allow_tables_to_appear_in_same_query!(
    list_collaborators,
    lists,
    notifications,
    places,
    user_follows,
    users,
);
