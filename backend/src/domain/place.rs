//! Places saved inside a list.
//!
//! A place is identified within its list by the external reference of the
//! catalogue it came from; the same real-world place may be saved in many
//! lists but only once per list.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ListId, Patch};

/// Maximum place name length in characters.
pub const PLACE_NAME_MAX: usize = 200;
/// Maximum address length in characters.
pub const PLACE_ADDRESS_MAX: usize = 300;
/// Maximum notes length in characters.
pub const PLACE_NOTES_MAX: usize = 1000;

/// Validation errors for place input values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaceValidationError {
    /// External reference is blank.
    #[error("place id must not be empty")]
    EmptyExternalRef,
    /// Name is blank or too long.
    #[error("place name must be between 1 and {max} characters")]
    InvalidName {
        /// Upper bound.
        max: usize,
    },
    /// Address too long.
    #[error("address must be at most {max} characters")]
    AddressTooLong {
        /// Upper bound.
        max: usize,
    },
    /// Notes too long.
    #[error("notes must be at most {max} characters")]
    NotesTooLong {
        /// Upper bound.
        max: usize,
    },
    /// Latitude outside [-90, 90].
    #[error("latitude must be between -90 and 90, got {0}")]
    LatitudeOutOfRange(f64),
    /// Longitude outside [-180, 180].
    #[error("longitude must be between -180 and 180, got {0}")]
    LongitudeOutOfRange(f64),
}

/// Internal numeric place identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(i64);

impl PlaceId {
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

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point on the globe with range-checked coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Validate a latitude/longitude pair.
    ///
    /// # Errors
    /// Either value out of range (or NaN).
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, PlaceValidationError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(PlaceValidationError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(PlaceValidationError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Validated fields for a place being added to a list.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlace {
    /// Reference into the external places catalogue.
    pub external_ref: String,
    /// Place name.
    pub name: String,
    /// Formatted address.
    pub address: String,
    /// Location.
    pub coordinates: Coordinates,
    /// Free-form rating, constrained by storage.
    pub rating: Option<String>,
    /// User notes.
    pub notes: Option<String>,
    /// Visit status, constrained by storage.
    pub visit_status: Option<String>,
}

/// Unvalidated input for [`NewPlace::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlaceInput {
    /// Reference into the external places catalogue.
    pub external_ref: String,
    /// Place name.
    pub name: String,
    /// Formatted address.
    pub address: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Optional rating.
    pub rating: Option<String>,
    /// Optional notes.
    pub notes: Option<String>,
    /// Optional visit status.
    pub visit_status: Option<String>,
}

fn check_notes(notes: &str) -> Result<(), PlaceValidationError> {
    if notes.chars().count() > PLACE_NOTES_MAX {
        return Err(PlaceValidationError::NotesTooLong {
            max: PLACE_NOTES_MAX,
        });
    }
    Ok(())
}

impl NewPlace {
    /// Validate a place before insertion.
    ///
    /// Rating and visit status are not checked here: the store's check
    /// constraints own those enumerations.
    ///
    /// # Errors
    /// The first violated length or range rule.
    pub fn new(input: NewPlaceInput) -> Result<Self, PlaceValidationError> {
        if input.external_ref.trim().is_empty() {
            return Err(PlaceValidationError::EmptyExternalRef);
        }
        let name_len = input.name.trim().chars().count();
        if name_len == 0 || input.name.chars().count() > PLACE_NAME_MAX {
            return Err(PlaceValidationError::InvalidName {
                max: PLACE_NAME_MAX,
            });
        }
        if input.address.chars().count() > PLACE_ADDRESS_MAX {
            return Err(PlaceValidationError::AddressTooLong {
                max: PLACE_ADDRESS_MAX,
            });
        }
        if let Some(notes) = &input.notes {
            check_notes(notes)?;
        }
        Ok(Self {
            coordinates: Coordinates::new(input.latitude, input.longitude)?,
            external_ref: input.external_ref,
            name: input.name,
            address: input.address,
            rating: input.rating,
            notes: input.notes,
            visit_status: input.visit_status,
        })
    }
}

/// Stored place.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// Identifier.
    #[schema(value_type = i64)]
    pub id: PlaceId,
    /// Owning list.
    #[schema(value_type = i64)]
    pub list_id: ListId,
    /// External catalogue reference.
    pub place_id: String,
    /// Place name.
    pub name: String,
    /// Formatted address.
    pub address: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Rating, if set.
    pub rating: Option<String>,
    /// Notes, if set.
    pub notes: Option<String>,
    /// Visit status, if set.
    pub visit_status: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Partial place update. [`Patch::Null`] clears a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceUpdate {
    /// Notes change.
    pub notes: Patch<String>,
    /// Rating change.
    pub rating: Patch<String>,
    /// Visit status change.
    pub visit_status: Patch<String>,
}

impl PlaceUpdate {
    /// Validate the supplied fields.
    ///
    /// # Errors
    /// Notes longer than [`PLACE_NOTES_MAX`].
    pub fn validated(self) -> Result<Self, PlaceValidationError> {
        if let Patch::Value(notes) = &self.notes {
            check_notes(notes)?;
        }
        Ok(self)
    }

    /// True when no field was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.notes.is_set() || self.rating.is_set() || self.visit_status.is_set())
    }
}
