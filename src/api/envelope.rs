//! Response envelope `{code, message, data}` decoding.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::error::ApiError;

/// The only envelope code that signals success.
pub const SUCCESS_CODE: i64 = 200;

/// Wrapper every backend JSON response uses.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl Envelope {
    /// Return `data` when `code` is 200, otherwise the envelope as an error.
    pub fn into_data(self) -> Result<Value, ApiError> {
        if self.code == SUCCESS_CODE {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(ApiError::new(self.code, self.message))
        }
    }
}

/// Decode the body of a successful (2xx) HTTP response.
pub fn decode_success(content_type: Option<&str>, body: &[u8]) -> Result<Value, ApiError> {
    if !is_json(content_type) {
        return Err(ApiError::transport(format!(
            "unexpected content type: {}",
            content_type.unwrap_or("<none>")
        )));
    }

    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ApiError::transport("empty response body"));
    }

    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| ApiError::transport(format!("invalid JSON response: {}", e)))?;

    envelope.into_data()
}

/// Build the error for a non-2xx HTTP response.
///
/// Uses the body's `message` field when there is one, the status reason otherwise.
pub fn decode_failure(status: reqwest::StatusCode, body: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    ApiError::new(i64::from(status.as_u16()), message)
}

/// Deserialize envelope `data` into the caller's type.
pub fn decode_data<T: DeserializeOwned>(data: Value) -> Result<T, ApiError> {
    serde_json::from_value(data)
        .map_err(|e| ApiError::transport(format!("unexpected response data: {}", e)))
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.to_ascii_lowercase().contains("json"))
        .unwrap_or(false)
}
