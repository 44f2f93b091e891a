//! Scheduled message push tasks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{Listing, Page};
use crate::client::ApiClient;
use crate::error::ClassifiedError;
use crate::request::RequestSpec;

pub const MESSAGE_TASKS_PATH: &str = "/wx/message_tasks";

/// Task status as stored by the backend.
pub const TASK_ENABLED: i64 = 1;
pub const TASK_DISABLED: i64 = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTask {
    pub id: String,
    #[serde(default)]
    pub message_template: String,
    #[serde(default)]
    pub web_hook_url: String,
    /// Target accounts; the backend stores this as free-form JSON.
    #[serde(default)]
    pub mps_id: Value,
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl MessageTask {
    pub fn is_enabled(&self) -> bool {
        self.status == TASK_ENABLED
    }
}

/// Body for creating or editing a task. Unset fields are left alone on edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessageTaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_hook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mps_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
}

fn task_path(id: &str) -> String {
    format!("{}/{}", MESSAGE_TASKS_PATH, id)
}

impl ApiClient {
    pub async fn list_message_tasks(
        &self,
        page: Page,
    ) -> Result<Listing<MessageTask>, ClassifiedError> {
        self.call_as(page.apply(RequestSpec::get(MESSAGE_TASKS_PATH)))
            .await
    }

    pub async fn message_task(&self, id: &str) -> Result<MessageTask, ClassifiedError> {
        self.call_as(RequestSpec::get(task_path(id))).await
    }

    pub async fn create_message_task(
        &self,
        task: &MessageTaskUpdate,
    ) -> Result<(), ClassifiedError> {
        let request = RequestSpec::post(MESSAGE_TASKS_PATH)
            .json_from(task)
            .map_err(ClassifiedError::payload)?;
        self.call_unit(request)
            .await
            .map_err(ClassifiedError::into_validation)
    }

    pub async fn update_message_task(
        &self,
        id: &str,
        update: &MessageTaskUpdate,
    ) -> Result<(), ClassifiedError> {
        let request = RequestSpec::put(task_path(id))
            .json_from(update)
            .map_err(ClassifiedError::payload)?;
        self.call_unit(request)
            .await
            .map_err(ClassifiedError::into_validation)
    }

    pub async fn delete_message_task(&self, id: &str) -> Result<(), ClassifiedError> {
        self.call_unit(RequestSpec::delete(task_path(id))).await
    }
}
