//! User administration endpoints.

use serde_json::json;

use super::client::{ApiClient, ApiRequest};
use super::error::ApiError;
use crate::models::{Page, User};

impl ApiClient {
    /// List users, one page at a time. Pages start at 1.
    pub async fn list_users(&self, page: u32, page_size: u32) -> Result<Page<User>, ApiError> {
        let req = ApiRequest::get("/users")
            .query("page", page.max(1))
            .query("pageSize", page_size.max(1));
        self.send(req).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, ApiError> {
        self.send(ApiRequest::get("/users").segment(user_id)).await
    }

    pub async fn update_user_role(&self, user_id: &str, role: &str) -> Result<(), ApiError> {
        let req = ApiRequest::put("/users")
            .segment(user_id)
            .segment("role")
            .json(&json!({ "role": role }))?;
        self.send(req).await
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::delete("/users").segment(user_id)).await
    }
}
