//! REST client for the hosted identity provider.
//!
//! Credential verification and account ownership live entirely in the
//! provider; this service never checks a password locally. Provider error
//! codes form a closed set mapped explicitly to internal kinds; anything
//! unrecognized collapses into a single `Unavailable` variant instead of
//! being string-matched at call sites.

use common::error::AppError;
use log::warn;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use common::env_config::IdentityConfig;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("user not found")]
    UserNotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email already registered")]
    EmailExists,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

impl IdentityError {
    /// Maps a provider error code to an internal kind. The set of known
    /// codes is closed; unknown codes are upstream failures.
    pub fn from_code(code: &str) -> Self {
        match code {
            "USER_NOT_FOUND" => IdentityError::UserNotFound,
            "INVALID_CREDENTIALS" | "INVALID_PASSWORD" => IdentityError::InvalidCredentials,
            "EMAIL_EXISTS" => IdentityError::EmailExists,
            other => IdentityError::Unavailable(format!("unknown provider code: {}", other)),
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            // Never reveal whether the account exists.
            IdentityError::UserNotFound | IdentityError::InvalidCredentials => {
                AppError::Unauthorized("Invalid credentials".to_string())
            }
            IdentityError::EmailExists => {
                AppError::BadRequest("Email already registered".to_string())
            }
            IdentityError::Unavailable(detail) => {
                AppError::upstream("Authentication service unavailable", detail)
            }
        }
    }
}

/// An account as the identity provider reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityUser {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Serialize)]
struct VerifyPasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateAccountRequest<'a> {
    email: &'a str,
    password: &'a str,
    name: Option<&'a str>,
}

pub struct IdentityClient {
    client: Client,
    service_url: String,
    api_key: String,
}

impl IdentityClient {
    pub fn new(config: &IdentityConfig) -> Self {
        IdentityClient {
            client: Client::new(),
            service_url: config.service_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Verifies an email/password pair against the provider.
    pub async fn verify_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentityUser, IdentityError> {
        let response = self
            .client
            .post(format!("{}/accounts/verify-password", self.service_url))
            .json(&VerifyPasswordRequest { email, password })
            .header("X-API-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        Self::parse_account_response(response).await
    }

    /// Looks up an existing account by email. Used by the OAuth callback to
    /// enforce that sign-in never provisions a new account.
    pub async fn get_user_by_email(&self, email: &str) -> Result<IdentityUser, IdentityError> {
        let response = self
            .client
            .get(format!("{}/accounts", self.service_url))
            .query(&[("email", email)])
            .header("X-API-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        Self::parse_account_response(response).await
    }

    /// Creates a new account with the provider. Registration is the one
    /// flow allowed to provision.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<IdentityUser, IdentityError> {
        let response = self
            .client
            .post(format!("{}/accounts", self.service_url))
            .json(&CreateAccountRequest {
                email,
                password,
                name,
            })
            .header("X-API-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        Self::parse_account_response(response).await
    }

    async fn parse_account_response(
        response: reqwest::Response,
    ) -> Result<IdentityUser, IdentityError> {
        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            return response
                .json::<IdentityUser>()
                .await
                .map_err(|e| IdentityError::Unavailable(e.to_string()));
        }

        let body = response
            .json::<serde_json::Value>()
            .await
            .unwrap_or(serde_json::json!({}));
        let code = body["error"]["code"]
            .as_str()
            .or_else(|| body["code"].as_str())
            .unwrap_or("");

        if code.is_empty() {
            warn!("Identity provider returned {} with no error code", status);
            return Err(IdentityError::Unavailable(format!(
                "provider returned status {}",
                status
            )));
        }

        Err(IdentityError::from_code(code))
    }
}
