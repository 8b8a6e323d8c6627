//! Short-lived custom credential tokens.
//!
//! The web tier mints these for an already-authenticated session so the
//! identity provider's client SDK can exchange one for its own signed-in
//! state without re-entering a password. The uid is always re-derived from
//! the session by the caller; it never comes from the client.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    env_config::IdentityConfig,
    error::{AppError, Res},
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomTokenClaims {
    pub uid: String,
    pub iat: i64,
    pub exp: i64,
}

/// Mints a custom token scoped to `uid`, valid for the configured TTL.
pub fn mint_custom_token(uid: &str, config: &IdentityConfig) -> Res<String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::seconds(config.token_ttl_secs))
        .ok_or_else(|| AppError::Internal("Token expiration overflow".to_string()))?;

    let claims = CustomTokenClaims {
        uid: uid.to_string(),
        iat: now.timestamp(),
        exp: expiration.timestamp(),
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.token_secret.as_bytes()),
    )
    .map_err(AppError::from)
}

/// Extracts the claims from a custom token. Requires the signing secret.
pub fn validate_custom_token(token: &str, secret: &str) -> Res<CustomTokenClaims> {
    let token_data = jsonwebtoken::decode::<CustomTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
