//! Typed bindings for the console backend.
//!
//! Each submodule adds methods to [`ApiClient`](crate::ApiClient) for one
//! resource. All of them go through [`ApiClient::call`](crate::ApiClient::call),
//! so credential injection, envelope interpretation and session-expiry
//! handling apply uniformly.

pub mod articles;
pub mod auth;
pub mod configs;
pub mod message_tasks;
pub mod subscriptions;
pub mod user;

use serde::{Deserialize, Deserializer, Serialize};

use crate::request::RequestSpec;

/// Default page size of list endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Zero-based page of a list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.page_size)
    }

    /// Add `offset`/`limit` query parameters.
    pub(crate) fn apply(&self, request: RequestSpec) -> RequestSpec {
        request
            .query("offset", self.offset())
            .query("limit", self.page_size)
    }
}

/// One page of results.
///
/// Accepts both a bare JSON array and an object carrying the items under
/// `list`, `items` or `data` with an optional `total`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListingRepr<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(alias = "items", alias = "data")]
        list: Vec<T>,
        #[serde(default)]
        total: Option<u64>,
    },
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Listing<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match ListingRepr::deserialize(deserializer)? {
            ListingRepr::Bare(items) => Listing { items, total: None },
            ListingRepr::Wrapped { list, total } => Listing { items: list, total },
        })
    }
}

impl<T> Listing<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_offset() {
        assert_eq!(Page::default().offset(), 0);
        assert_eq!(Page::new(3, 20).offset(), 60);
    }

    #[test]
    fn test_page_query() {
        let spec = Page::new(2, 10).apply(RequestSpec::get("/wx/configs"));
        assert_eq!(
            spec.query_pairs(),
            &[
                ("offset".to_string(), "20".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_listing_shapes() {
        let bare: Listing<u32> = serde_json::from_value(json!([1, 2])).unwrap();
        assert_eq!(bare.items, vec![1, 2]);
        assert_eq!(bare.total, None);

        let wrapped: Listing<u32> =
            serde_json::from_value(json!({"list": [3], "total": 9})).unwrap();
        assert_eq!(wrapped.items, vec![3]);
        assert_eq!(wrapped.total, Some(9));

        let data: Listing<u32> = serde_json::from_value(json!({"data": [4, 5]})).unwrap();
        assert_eq!(data.len(), 2);
    }
}
