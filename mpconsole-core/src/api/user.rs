//! Signed-in user profile and system information.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ClassifiedError;
use crate::guard::{PermissionSet, ADMIN_PERMISSION};
use crate::request::RequestSpec;

pub const USER_PATH: &str = "/wx/user";
pub const PASSWORD_PATH: &str = "/wx/user/password";
pub const SYS_INFO_PATH: &str = "/wx/sys/info";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl UserInfo {
    /// Permission tags for route checks. The `admin` role grants `admin`.
    pub fn permission_set(&self) -> PermissionSet {
        let role = self
            .role
            .as_deref()
            .filter(|r| *r == ADMIN_PERMISSION)
            .map(str::to_string);
        PermissionSet::new(self.permissions.iter().cloned().chain(role))
    }
}

/// Profile fields to change; unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
struct PasswordChange<'a> {
    old_password: &'a str,
    new_password: &'a str,
}

impl ApiClient {
    /// Profile of the signed-in user.
    pub async fn current_user(&self) -> Result<UserInfo, ClassifiedError> {
        self.call_as(RequestSpec::get(USER_PATH)).await
    }

    pub async fn update_user(&self, update: &UserUpdate) -> Result<(), ClassifiedError> {
        let request = RequestSpec::put(USER_PATH)
            .json_from(update)
            .map_err(ClassifiedError::payload)?;
        self.call_unit(request).await
    }

    /// Change the password. A rejection is reported as a validation error.
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ClassifiedError> {
        let request = RequestSpec::put(PASSWORD_PATH)
            .json_from(&PasswordChange {
                old_password,
                new_password,
            })
            .map_err(ClassifiedError::payload)?;
        self.call_unit(request)
            .await
            .map_err(ClassifiedError::into_validation)
    }

    /// Backend host information; shape is backend-defined.
    pub async fn sys_info(&self) -> Result<Value, ClassifiedError> {
        self.call(RequestSpec::get(SYS_INFO_PATH)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_info_minimal() {
        let user: UserInfo = serde_json::from_value(json!({"username": "admin"})).unwrap();
        assert_eq!(user.username, "admin");
        assert!(user.permissions.is_empty());
    }

    #[test]
    fn test_admin_role_grants_admin_permission() {
        let user: UserInfo =
            serde_json::from_value(json!({"username": "root", "role": "admin"})).unwrap();
        assert!(user.permission_set().contains(ADMIN_PERMISSION));
    }

    #[test]
    fn test_permissions_carried_over() {
        let user: UserInfo = serde_json::from_value(json!({
            "username": "ed",
            "role": "editor",
            "permissions": ["config:view"]
        }))
        .unwrap();
        let set = user.permission_set();
        assert!(set.contains("config:view"));
        assert!(!set.contains(ADMIN_PERMISSION));
        assert!(!set.contains("editor"));
    }

    #[test]
    fn test_user_update_skips_unset_fields() {
        let update = UserUpdate {
            nickname: Some("Ed".to_string()),
            ..UserUpdate::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"nickname": "Ed"}));
    }
}
