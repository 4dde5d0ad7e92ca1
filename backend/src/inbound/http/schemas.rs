//! OpenAPI schema definitions for paged responses.
//!
//! [`pagination::Page`] lives in a framework-free crate and does not derive
//! `ToSchema`. The wrappers here mirror its JSON shape for each item type
//! the API pages over.

use utoipa::ToSchema;

use crate::domain::{ListSummary, Notification, Place, UserFollowInfo};

macro_rules! page_schema {
    ($name:ident, $item:ty, $as:ident) => {
        #[doc = concat!("OpenAPI schema for a page of [`", stringify!($item), "`].")]
        #[derive(ToSchema)]
        #[schema(as = $as, rename_all = "camelCase")]
        #[expect(
            dead_code,
            reason = "Used only for OpenAPI schema generation via utoipa"
        )]
        pub struct $name {
            /// Items on this page.
            items: Vec<$item>,
            /// 1-based page number.
            #[schema(example = 1)]
            page: u32,
            /// Requested page size.
            #[schema(example = 20)]
            page_size: u32,
            /// Items across all pages.
            total_items: u64,
            /// `ceil(totalItems / pageSize)`.
            total_pages: u64,
        }
    };
}

page_schema!(ListSummaryPageSchema, ListSummary, ListSummaryPage);
page_schema!(PlacePageSchema, Place, PlacePage);
page_schema!(UserFollowInfoPageSchema, UserFollowInfo, UserFollowInfoPage);
page_schema!(NotificationPageSchema, Notification, NotificationPage);

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::PartialSchema;

    #[test]
    fn page_schema_uses_camel_case_field_names() {
        let schema = serde_json::to_value(PlacePageSchema::schema()).expect("schema json");
        let properties = schema
            .get("properties")
            .and_then(serde_json::Value::as_object)
            .expect("object schema");

        assert!(properties.contains_key("items"));
        assert!(properties.contains_key("pageSize"));
        assert!(properties.contains_key("totalPages"));
    }
}
