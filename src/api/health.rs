//! Channel health endpoints.

use super::client::{ApiClient, ApiRequest};
use super::error::ApiError;
use crate::models::{ChannelSnapshot, HealthRecord};
use crate::view::RawTimePoint;

impl ApiClient {
    /// Current snapshot of every monitored channel.
    pub async fn channel_snapshots(&self) -> Result<Vec<ChannelSnapshot>, ApiError> {
        self.get("/health/channels").await
    }

    /// Flat latency/availability time points for the last `hours` hours.
    pub async fn realtime_latency(&self, hours: u32) -> Result<Vec<RawTimePoint>, ApiError> {
        let req = ApiRequest::get("/health/realtime").query("hours", hours);
        self.send(req).await
    }

    /// Raw health-check records of one channel, in no particular order.
    pub async fn health_history(&self, alias: &str) -> Result<Vec<HealthRecord>, ApiError> {
        let req = ApiRequest::get("/health/history").segment(alias);
        self.send(req).await
    }
}
