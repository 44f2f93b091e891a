//! Collected articles.

use serde::{Deserialize, Serialize};

use crate::api::{Listing, DEFAULT_PAGE_SIZE};
use crate::client::ApiClient;
use crate::error::ClassifiedError;
use crate::request::RequestSpec;

pub const ARTICLES_PATH: &str = "/mps";
pub const FEEDS_PATH: &str = "/feeds";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub publish_time: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// Filters for the article list. Pages are numbered from 1 on this endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleQuery {
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
    pub status: Option<String>,
    pub account_id: Option<i64>,
}

impl Default for ArticleQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
            status: None,
            account_id: None,
        }
    }
}

impl ArticleQuery {
    fn to_request(&self) -> RequestSpec {
        RequestSpec::get(ARTICLES_PATH)
            .query("page", self.page)
            .query("pageSize", self.page_size)
            .query_opt("search", self.search.as_deref().filter(|s| !s.is_empty()))
            .query_opt("status", self.status.as_deref())
            .query_opt("account_id", self.account_id)
    }
}

fn feed_path(id: i64) -> String {
    format!("{}/{}", FEEDS_PATH, id)
}

impl ApiClient {
    pub async fn list_articles(
        &self,
        query: &ArticleQuery,
    ) -> Result<Listing<Article>, ClassifiedError> {
        self.call_as(query.to_request()).await
    }

    pub async fn article(&self, id: i64) -> Result<Article, ClassifiedError> {
        self.call_as(RequestSpec::get(feed_path(id))).await
    }

    pub async fn delete_article(&self, id: i64) -> Result<(), ClassifiedError> {
        self.call_unit(RequestSpec::delete(feed_path(id))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_skips_empty_filters() {
        let query = ArticleQuery {
            search: Some(String::new()),
            account_id: Some(7),
            ..ArticleQuery::default()
        };
        let request = query.to_request();
        let pairs: Vec<(&str, &str)> = request
            .query_pairs()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("page", "1"), ("pageSize", "10"), ("account_id", "7")]
        );
    }
}
