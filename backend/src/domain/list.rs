//! Place lists, their collaborators, and discovery queries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Patch, UserId};

/// Maximum list name length in characters.
pub const LIST_NAME_MAX: usize = 100;
/// Maximum list description length in characters.
pub const LIST_DESCRIPTION_MAX: usize = 500;

/// Validation errors for list input values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListValidationError {
    /// Name is blank.
    #[error("list name must not be empty")]
    EmptyName,
    /// Name exceeds [`LIST_NAME_MAX`].
    #[error("list name must be at most {max} characters")]
    NameTooLong {
        /// Upper bound.
        max: usize,
    },
    /// Description exceeds [`LIST_DESCRIPTION_MAX`].
    #[error("list description must be at most {max} characters")]
    DescriptionTooLong {
        /// Upper bound.
        max: usize,
    },
    /// Search terms must contain something to match.
    #[error("search term must not be empty")]
    EmptySearchTerm,
    /// Role outside `viewer`, `editor`, `owner`.
    #[error("unknown collaborator role: {0}")]
    UnknownRole(String),
}

/// Internal numeric list identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(i64);

impl ListId {
    /// Wrap a raw database identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated list name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListName(String);

impl ListName {
    /// Validate a list name.
    ///
    /// # Errors
    /// Rejects blank names and names longer than [`LIST_NAME_MAX`].
    pub fn new(name: impl Into<String>) -> Result<Self, ListValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ListValidationError::EmptyName);
        }
        if name.chars().count() > LIST_NAME_MAX {
            return Err(ListValidationError::NameTooLong { max: LIST_NAME_MAX });
        }
        Ok(Self(name))
    }
}

impl AsRef<str> for ListName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Validated list description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDescription(String);

impl ListDescription {
    /// Validate a list description.
    ///
    /// # Errors
    /// Rejects descriptions longer than [`LIST_DESCRIPTION_MAX`].
    pub fn new(description: impl Into<String>) -> Result<Self, ListValidationError> {
        let description = description.into();
        if description.chars().count() > LIST_DESCRIPTION_MAX {
            return Err(ListValidationError::DescriptionTooLong {
                max: LIST_DESCRIPTION_MAX,
            });
        }
        Ok(Self(description))
    }
}

impl AsRef<str> for ListDescription {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Fields for a new list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewList {
    /// Creator, who becomes the immutable owner.
    pub owner_id: UserId,
    /// List name.
    pub name: ListName,
    /// Optional description.
    pub description: Option<ListDescription>,
    /// Hidden from discovery when true.
    pub is_private: bool,
}

/// Stored list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceList {
    /// Identifier.
    #[schema(value_type = i64)]
    pub id: ListId,
    /// Owning user.
    #[schema(value_type = i64)]
    pub owner_id: UserId,
    /// Name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Visibility flag.
    pub is_private: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// List metadata plus the emails of its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListDetails {
    /// Identifier.
    #[schema(value_type = i64)]
    pub id: ListId,
    /// Name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Visibility flag.
    pub is_private: bool,
    /// Whether the viewer owns the list.
    pub is_owner: bool,
    /// Collaborator emails, owner excluded.
    pub collaborators: Vec<String>,
}

impl ListDetails {
    /// Assemble details as seen by `viewer`.
    #[must_use]
    pub fn for_viewer(list: PlaceList, collaborators: Vec<String>, viewer: UserId) -> Self {
        Self {
            id: list.id,
            is_owner: list.owner_id == viewer,
            name: list.name,
            description: list.description,
            is_private: list.is_private,
            collaborators,
        }
    }
}

/// Compact list row used by every paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListSummary {
    /// Identifier.
    #[schema(value_type = i64)]
    pub id: ListId,
    /// Name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Visibility flag.
    pub is_private: bool,
    /// Number of places, computed at read time.
    pub place_count: i64,
}

/// Partial list update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListUpdate {
    /// New name.
    pub name: Option<ListName>,
    /// New description; [`Patch::Null`] clears it.
    pub description: Patch<ListDescription>,
    /// New visibility.
    pub is_private: Option<bool>,
}

impl ListUpdate {
    /// True when no field was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && !self.description.is_set() && self.is_private.is_none()
    }
}

/// Case-insensitive substring to match against list names and descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm(String);

impl SearchTerm {
    /// Validate a search term.
    ///
    /// # Errors
    /// [`ListValidationError::EmptySearchTerm`] for blank input.
    pub fn new(term: impl Into<String>) -> Result<Self, ListValidationError> {
        let term = term.into().trim().to_owned();
        if term.is_empty() {
            return Err(ListValidationError::EmptySearchTerm);
        }
        Ok(Self(term))
    }

    /// `LIKE` pattern matching the term anywhere, lower-cased, with `%`, `_`
    /// and `\` escaped.
    #[must_use]
    pub fn like_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.0.len() + 2);
        pattern.push('%');
        for ch in self.0.to_lowercase().chars() {
            if matches!(ch, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(ch);
        }
        pattern.push('%');
        pattern
    }
}

impl AsRef<str> for SearchTerm {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// The discovery shapes sharing one paging contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListQuery {
    /// Lists owned by the user.
    Owned(UserId),
    /// Every public list.
    Public,
    /// Public lists plus the viewer's own.
    Recent(UserId),
    /// Substring search; anonymous viewers only see public lists.
    Search {
        /// What to match.
        term: SearchTerm,
        /// Authenticated viewer, if any.
        viewer: Option<UserId>,
    },
}

/// Collaborator role. `Owner` is only ever synthesised for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorRole {
    /// Read access.
    #[default]
    Viewer,
    /// Read and write access to places.
    Editor,
    /// The list owner.
    Owner,
}

impl CollaboratorRole {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Editor => "editor",
            Self::Owner => "owner",
        }
    }
}

impl std::str::FromStr for CollaboratorRole {
    type Err = ListValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(Self::Viewer),
            "editor" => Ok(Self::Editor),
            "owner" => Ok(Self::Owner),
            other => Err(ListValidationError::UnknownRole(other.to_owned())),
        }
    }
}

/// A member of a list: a collaborator or the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListMember {
    /// Member's user id.
    #[schema(value_type = i64)]
    pub user_id: UserId,
    /// Member's email.
    pub email: String,
    /// Member's display name.
    pub display_name: Option<String>,
    /// Role on the list.
    pub role: CollaboratorRole,
}

/// The caller's relationship to a list it can reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    /// The caller owns the list.
    Owner,
    /// The caller has a membership row.
    Collaborator,
}
