//! Login, logout and verification-code endpoints.

use serde_json::json;

use super::client::ApiClient;
use super::error::ApiError;
use crate::models::LoginResponse;

impl ApiClient {
    /// Ask the backend to email a one-time login code.
    pub async fn send_login_code(&self, email: &str) -> Result<(), ApiError> {
        self.post("/login/sendcode", &json!({ "email": email })).await
    }

    /// Exchange an emailed code for a session, persisting it on success.
    pub async fn login(&self, email: &str, code: &str) -> Result<LoginResponse, ApiError> {
        let login: LoginResponse = self
            .post("/login", &json!({ "email": email, "code": code }))
            .await?;
        self.session().store_login(&login);
        tracing::info!("Logged in as {} ({})", login.user.email, login.user.id);
        Ok(login)
    }

    /// End the session on the backend, then locally.
    ///
    /// The local session is cleared even if the backend call fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result: Result<(), ApiError> = self.post("/login/logout", &json!({})).await;
        self.session().clear();
        if let Err(e) = &result {
            tracing::warn!("Backend logout failed, local session cleared anyway: {}", e);
        }
        result
    }
}
