//! Tri-state field updates.
//!
//! Partial updates must tell "field not sent" apart from "field sent as
//! null". [`Patch`] keeps the three states distinct; combined with
//! `#[serde(default)]` on the containing struct, a missing key deserialises
//! to [`Patch::Unset`] and an explicit `null` to [`Patch::Null`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Requested change for one optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Leave the stored value untouched.
    #[default]
    Unset,
    /// Clear the stored value.
    Null,
    /// Replace the stored value.
    Value(T),
}

impl<T> Patch<T> {
    /// Whether the field was supplied at all.
    #[must_use]
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    /// `None` when unset, otherwise the new (nullable) value.
    #[must_use]
    pub fn into_change(self) -> Option<Option<T>> {
        match self {
            Self::Unset => None,
            Self::Null => Some(None),
            Self::Value(value) => Some(Some(value)),
        }
    }

    /// Borrowing form of [`Patch::into_change`].
    #[must_use]
    pub fn as_change(&self) -> Option<Option<&T>> {
        match self {
            Self::Unset => None,
            Self::Null => Some(None),
            Self::Value(value) => Some(Some(value)),
        }
    }

    /// Validate or convert the carried value, keeping the state.
    ///
    /// # Errors
    /// Propagates the error returned by `f`.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Patch<U>, E> {
        Ok(match self {
            Self::Unset => Patch::Unset,
            Self::Null => Patch::Null,
            Self::Value(value) => Patch::Value(f(value)?),
        })
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Value)
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}

impl<T> Serialize for Patch<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.as_change().flatten().serialize(serializer)
    }
}
