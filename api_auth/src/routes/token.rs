use actix_session::Session;
use actix_web::{Responder, get, web};
use common::env_config::Config;
use common::error::{AppError, Res};
use common::http::Success;
use common::session;
use common::token;
use std::sync::Arc;

use crate::dtos::auth::TokenResponse;

/// Mints a short-lived custom credential token for the session's own uid.
///
/// The uid is re-derived from the session; a client-supplied uid is never
/// accepted. The identity provider's client SDK exchanges the token for
/// its own signed-in state.
///
/// # Output
/// - Success: `200 { "token": string }`
/// - Error: `401 { "error": "Authentication required" }` without a session,
///   `500 { "error": "Token generation failed" }` on signing failure
#[get("/token")]
pub async fn get_token(session: Session, config: web::Data<Arc<Config>>) -> Res<impl Responder> {
    let uid = session::require_uid(&session)?;

    let token = token::mint_custom_token(&uid, &config.identity)
        .map_err(|e| AppError::upstream("Token generation failed", e))?;

    Success::ok(TokenResponse { token })
}
