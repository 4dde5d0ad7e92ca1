//! Shared validation helpers for inbound HTTP adapters.
//!
//! Request bodies arrive as plain strings; these helpers turn domain
//! validation failures into `invalid_request` errors that name the offending
//! field so clients can highlight it.

use std::fmt::Display;

use pagination::{PageParams, PageRequest, PageRequestError};
use serde_json::json;

use crate::domain::Error;

/// Default page size for list and user listings.
pub(crate) const DEFAULT_PAGE_SIZE: u32 = 20;
/// Default page size for place listings.
pub(crate) const PLACE_PAGE_SIZE: u32 = 30;

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidValue,
    OutOfRange,
}

impl ErrorCode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidValue => "invalid_value",
            Self::OutOfRange => "out_of_range",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    const fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    field_error(
        field,
        ErrorCode::MissingField,
        format!("missing required field: {}", field.as_str()),
    )
}

/// Wrap a domain validation failure for `field`.
pub(crate) fn invalid_field(field: FieldName, error: impl Display) -> Error {
    field_error(field, ErrorCode::InvalidValue, error.to_string())
}

/// Validate paging parameters, substituting `default_page_size`.
pub(crate) fn page_request(params: PageParams, default_page_size: u32) -> Result<PageRequest, Error> {
    params
        .into_request(default_page_size)
        .map_err(|error| match error {
            PageRequestError::PageOutOfRange { .. } => {
                field_error(FieldName::new("page"), ErrorCode::OutOfRange, error.to_string())
            }
            PageRequestError::PageSizeOutOfRange { .. } => field_error(
                FieldName::new("pageSize"),
                ErrorCode::OutOfRange,
                error.to_string(),
            ),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode as DomainCode;
    use rstest::rstest;

    fn detail<'a>(error: &'a Error, key: &str) -> Option<&'a str> {
        error
            .details()
            .and_then(|details| details.get(key))
            .and_then(serde_json::Value::as_str)
    }

    #[rstest]
    fn missing_field_names_the_field() {
        let error = missing_field_error(FieldName::new("email"));

        assert_eq!(error.code(), DomainCode::InvalidRequest);
        assert_eq!(detail(&error, "field"), Some("email"));
        assert_eq!(detail(&error, "code"), Some("missing_field"));
    }

    #[rstest]
    #[case(PageParams { page: Some(0), page_size: None }, "page")]
    #[case(PageParams { page: None, page_size: Some(101) }, "pageSize")]
    fn out_of_range_paging_is_rejected(#[case] params: PageParams, #[case] field: &str) {
        let error = page_request(params, DEFAULT_PAGE_SIZE).expect_err("invalid paging");

        assert_eq!(error.code(), DomainCode::InvalidRequest);
        assert_eq!(detail(&error, "field"), Some(field));
        assert_eq!(detail(&error, "code"), Some("out_of_range"));
    }

    #[rstest]
    fn place_listings_default_to_thirty() {
        let request = page_request(PageParams::default(), PLACE_PAGE_SIZE).expect("valid");

        assert_eq!(request.page_size(), 30);
    }
}
