//! Typed endpoint functions for the expense-tracking service.
//!
//! Each method issues one call through the shared [`ApiGateway`] and
//! converts the raw JSON into the models in [`crate::models`].

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::gateway::{ApiGateway, RequestDescriptor};
use super::outcome::Outcome;
use super::ApiError;
use crate::models::{
    parse_categories, AuthResponse, Category, CategoryForm, LoginCredentials, RegisterCredentials,
    UserProfile,
};

const LOGIN_PATH: &str = "/users/login";
const REGISTER_PATH: &str = "/users/register";
const PROFILE_PATH: &str = "/users/profile";
const CATEGORY_LIST_PATH: &str = "/category/lists";
const CATEGORY_ADD_PATH: &str = "/category/add";

/// API client for the expense tracker.
/// Clone is cheap; all clones share one gateway.
#[derive(Clone)]
pub struct ApiClient {
    gateway: Arc<ApiGateway>,
}

impl ApiClient {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<ApiGateway> {
        &self.gateway
    }

    /// Exchange email/password for a token.
    ///
    /// A 2xx answer without a token is a contract violation and comes back
    /// as `Failure(ValidationError)`.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Outcome<AuthResponse>, ApiError> {
        let outcome = self
            .gateway
            .request(RequestDescriptor::post(LOGIN_PATH, credentials)?)
            .await?;

        Ok(outcome.validate(|body| {
            let response = AuthResponse::deserialize(body)
                .map_err(|e| format!("Malformed response payload: {}", e))?;
            if response.token().is_none() {
                return Err("Login response missing token".to_string());
            }
            Ok(response)
        }))
    }

    pub async fn register(&self, credentials: &RegisterCredentials) -> Result<Outcome<AuthResponse>, ApiError> {
        let outcome = self
            .gateway
            .request(RequestDescriptor::post(REGISTER_PATH, credentials)?)
            .await?;

        // An empty 2xx body is a plain acknowledgement.
        Ok(outcome.validate(|body| {
            if body.is_null() {
                return Ok(AuthResponse::default());
            }
            AuthResponse::deserialize(body).map_err(|e| format!("Malformed response payload: {}", e))
        }))
    }

    pub async fn profile(&self) -> Result<Outcome<UserProfile>, ApiError> {
        let outcome = self.gateway.request(RequestDescriptor::get(PROFILE_PATH)).await?;
        Ok(outcome.parse())
    }

    pub async fn list_categories(&self) -> Result<Outcome<Vec<Category>>, ApiError> {
        let outcome = self.gateway.request(RequestDescriptor::get(CATEGORY_LIST_PATH)).await?;
        Ok(outcome.validate(parse_categories))
    }

    /// Create a category. The server's answer body is passed through as-is.
    pub async fn add_category(&self, form: &CategoryForm) -> Result<Outcome<Value>, ApiError> {
        self.gateway
            .request(RequestDescriptor::post(CATEGORY_ADD_PATH, form)?)
            .await
    }
}
