//! Usage statistics endpoints.

use super::client::{ApiClient, ApiRequest};
use super::error::ApiError;
use crate::models::{UsageSample, UsageSummary};

impl ApiClient {
    /// Today's usage for `user_id`.
    pub async fn usage_today(&self, user_id: &str) -> Result<UsageSummary, ApiError> {
        self.send(ApiRequest::get("/usage/today").segment(user_id)).await
    }

    /// Daily usage-rate samples for the last `days` days, oldest first.
    pub async fn usage_history(&self, user_id: &str, days: u32) -> Result<Vec<UsageSample>, ApiError> {
        let req = ApiRequest::get("/usage/history")
            .segment(user_id)
            .query("days", days);
        self.send(req).await
    }
}
