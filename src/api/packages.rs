//! Membership package endpoints.

use serde_json::json;

use super::client::{ApiClient, ApiRequest};
use super::error::ApiError;
use crate::models::{Package, PackageInput};

impl ApiClient {
    pub async fn list_packages(&self) -> Result<Vec<Package>, ApiError> {
        self.get("/packages").await
    }

    pub async fn create_package(&self, input: &PackageInput) -> Result<Option<Package>, ApiError> {
        self.post("/packages", input).await
    }

    pub async fn update_package(&self, package_id: &str, input: &PackageInput) -> Result<(), ApiError> {
        let req = ApiRequest::put("/packages").segment(package_id).json(input)?;
        self.send(req).await
    }

    pub async fn delete_package(&self, package_id: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::delete("/packages").segment(package_id)).await
    }

    /// Put a user on a package plan.
    pub async fn assign_package(&self, user_id: &str, package_id: &str) -> Result<(), ApiError> {
        let req = ApiRequest::post("/users")
            .segment(user_id)
            .segment("package")
            .json(&json!({ "packageId": package_id }))?;
        self.send(req).await
    }
}
