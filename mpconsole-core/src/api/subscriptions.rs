//! Subscribed official accounts.

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ClassifiedError;
use crate::request::RequestSpec;

pub const SUBSCRIPTIONS_PATH: &str = "/wx/mps";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub rss_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubscription {
    pub name: String,
    pub account_id: String,
    pub rss_url: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Fields to change on a subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rss_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

fn item_path(id: i64) -> String {
    format!("{}/{}", SUBSCRIPTIONS_PATH, id)
}

impl ApiClient {
    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>, ClassifiedError> {
        self.call_as(RequestSpec::get(SUBSCRIPTIONS_PATH)).await
    }

    pub async fn add_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> Result<(), ClassifiedError> {
        let request = RequestSpec::post(SUBSCRIPTIONS_PATH)
            .json_from(subscription)
            .map_err(ClassifiedError::payload)?;
        self.call_unit(request)
            .await
            .map_err(ClassifiedError::into_validation)
    }

    pub async fn update_subscription(
        &self,
        id: i64,
        update: &SubscriptionUpdate,
    ) -> Result<(), ClassifiedError> {
        let request = RequestSpec::put(item_path(id))
            .json_from(update)
            .map_err(ClassifiedError::payload)?;
        self.call_unit(request).await
    }

    pub async fn delete_subscription(&self, id: i64) -> Result<(), ClassifiedError> {
        self.call_unit(RequestSpec::delete(item_path(id))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_subscription_uses_camel_case() {
        let new = NewSubscription {
            name: "Tech Daily".to_string(),
            account_id: "gh_123".to_string(),
            rss_url: "https://example.com/rss".to_string(),
            category: "tech".to_string(),
            description: None,
        };
        assert_eq!(
            serde_json::to_value(&new).unwrap(),
            json!({
                "name": "Tech Daily",
                "accountId": "gh_123",
                "rssUrl": "https://example.com/rss",
                "category": "tech"
            })
        );
    }

    #[test]
    fn test_subscription_tolerates_missing_fields() {
        let sub: Subscription = serde_json::from_value(json!({"id": 1, "name": "x"})).unwrap();
        assert_eq!(sub.rss_url, None);
    }
}
