//! Wire model types exchanged with the backend.
//!
//! Identifiers are always `String`. The backend sends them as JSON strings, but
//! [`string_id`] also accepts JSON integers so a large ID never passes through
//! a float.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Deserializers that keep identifiers string-typed.
pub mod string_id {
    use serde::de::{self, Deserializer, Visitor};
    use std::fmt;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or integer identifier")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        d.deserialize_any(IdVisitor)
    }
}

/// An access/refresh token pair as returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
}

/// Identity of the logged-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(deserialize_with = "string_id::deserialize")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
}

impl UserInfo {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}

/// Response of `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserInfo,
}

/// A paginated list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

/// A user account as listed in the admin view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "string_id::deserialize")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub package_name: Option<String>,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A membership/package plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    #[serde(deserialize_with = "string_id::deserialize")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub daily_quota: u64,
    #[serde(default)]
    pub duration_days: u32,
    #[serde(default)]
    pub description: String,
}

/// Fields accepted when creating or updating a package.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInput {
    pub name: String,
    pub price: f64,
    pub daily_quota: u64,
    pub duration_days: u32,
    #[serde(default)]
    pub description: String,
}

/// An issued API key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    #[serde(deserialize_with = "string_id::deserialize")]
    pub id: String,
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Usage of the current day for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    #[serde(deserialize_with = "string_id::deserialize")]
    pub user_id: String,
    #[serde(default)]
    pub used: u64,
    #[serde(default)]
    pub quota: u64,
    #[serde(default)]
    pub usage_rate: f64,
}

/// One periodic usage sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSample {
    pub time: String,
    pub usage_rate: f64,
}

/// A point-in-time read of one monitored channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnapshot {
    pub alias: String,
    pub alive: bool,
    #[serde(default)]
    pub consecutive_failures: u32,
    #[serde(default)]
    pub ewma_latency_ms: f64,
}

/// Outcome of one health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Available,
    Degraded,
    Unavailable,
    Unknown,
}

impl HealthStatus {
    /// Severity used to pick the worst status of a group.
    pub fn severity(self) -> u8 {
        match self {
            HealthStatus::Unknown => 0,
            HealthStatus::Available => 1,
            HealthStatus::Degraded => 2,
            HealthStatus::Unavailable => 3,
        }
    }
}

/// A single raw health-check record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub time: DateTime<Utc>,
    pub status: HealthStatus,
}
