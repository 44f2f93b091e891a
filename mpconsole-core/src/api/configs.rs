//! Backend configuration entries.

use serde::{Deserialize, Serialize};

use crate::api::{Listing, Page};
use crate::client::ApiClient;
use crate::error::ClassifiedError;
use crate::request::RequestSpec;

pub const CONFIGS_PATH: &str = "/wx/configs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub config_key: String,
    #[serde(default)]
    pub config_value: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl ConfigEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            config_key: key.into(),
            config_value: value.into(),
            description: None,
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigUpdate {
    pub config_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Serialize)]
struct NewConfig<'a> {
    config_key: &'a str,
    config_value: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

fn entry_path(key: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(key.as_bytes()).collect();
    format!("{}/{}", CONFIGS_PATH, encoded)
}

impl ApiClient {
    pub async fn list_configs(&self, page: Page) -> Result<Listing<ConfigEntry>, ClassifiedError> {
        self.call_as(page.apply(RequestSpec::get(CONFIGS_PATH)))
            .await
    }

    pub async fn config(&self, key: &str) -> Result<ConfigEntry, ClassifiedError> {
        self.call_as(RequestSpec::get(entry_path(key))).await
    }

    pub async fn create_config(&self, entry: &ConfigEntry) -> Result<(), ClassifiedError> {
        let request = RequestSpec::post(CONFIGS_PATH)
            .json_from(&NewConfig {
                config_key: &entry.config_key,
                config_value: &entry.config_value,
                description: entry.description.as_deref(),
            })
            .map_err(ClassifiedError::payload)?;
        self.call_unit(request)
            .await
            .map_err(ClassifiedError::into_validation)
    }

    pub async fn update_config(
        &self,
        key: &str,
        update: &ConfigUpdate,
    ) -> Result<(), ClassifiedError> {
        let request = RequestSpec::put(entry_path(key))
            .json_from(update)
            .map_err(ClassifiedError::payload)?;
        self.call_unit(request)
            .await
            .map_err(ClassifiedError::into_validation)
    }

    pub async fn delete_config(&self, key: &str) -> Result<(), ClassifiedError> {
        self.call_unit(RequestSpec::delete(entry_path(key))).await
    }
}
