//! API key issuance endpoints.

use serde_json::json;

use super::client::{ApiClient, ApiRequest};
use super::error::ApiError;
use crate::models::ApiKey;

impl ApiClient {
    pub async fn list_api_keys(&self) -> Result<Vec<ApiKey>, ApiError> {
        self.get("/apikeys").await
    }

    /// Issue a new key. The full secret is only returned here.
    pub async fn create_api_key(&self, name: &str) -> Result<ApiKey, ApiError> {
        self.post("/apikeys", &json!({ "name": name })).await
    }

    pub async fn revoke_api_key(&self, key_id: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::delete("/apikeys").segment(key_id)).await
    }
}
