use actix_session::Session;
use actix_web::{HttpResponse, Responder, get, http::header::LOCATION, post, web};
use common::env_config::Config;
use common::error::{AppError, Res};
use common::http::Success;
use common::session::{self, SessionUser};
use oauth2::{AuthorizationCode, CsrfToken, Scope, TokenResponse, reqwest};
use std::sync::Arc;

use crate::dtos::auth::{LoginRequest, OAuthCallbackQuery, RegisterRequest, UserResponse};
use crate::services::{self, identity::IdentityClient};

/// Authenticates a user with email and password.
///
/// Credential verification is fully delegated to the hosted identity
/// provider; on success a server-side session is established. Wrong
/// password and unknown account both surface as the same 401 so account
/// existence is never revealed.
///
/// # Input
/// - `login_data`: JSON payload containing email and password
/// - `config`: Application configuration with identity provider settings
///
/// # Output
/// - Success: 200 with the signed-in user's profile
/// - Error: 401 Unauthorized for invalid credentials
#[post("/login")]
pub async fn post_login(
    login_data: web::Json<LoginRequest>,
    config: web::Data<Arc<Config>>,
    session: Session,
) -> Res<impl Responder> {
    let identity = IdentityClient::new(&config.identity);
    let user = identity
        .verify_password(&login_data.email, &login_data.password)
        .await?;

    let session_user = SessionUser {
        uid: user.uid,
        email: user.email,
        name: user.name,
        picture: user.picture,
    };
    session::establish(&session, &session_user)?;

    Success::ok(UserResponse {
        id: session_user.uid,
        email: session_user.email,
        name: session_user.name,
        image: session_user.picture,
    })
}

/// Registers a new account with the identity provider and signs it in.
///
/// The web tier only creates the identity account; the per-user database
/// record is owned by the store/webhook path and is not provisioned here.
///
/// # Input
/// - `req`: JSON payload with email, password and optional display name
///
/// # Output
/// - Success: 201 with the created user's profile
/// - Error: 400 Bad Request when the email is already registered
#[post("/register")]
pub async fn post_register(
    req: web::Json<RegisterRequest>,
    config: web::Data<Arc<Config>>,
    session: Session,
) -> Res<impl Responder> {
    let identity = IdentityClient::new(&config.identity);
    let user = identity
        .create_user(&req.email, &req.password, req.name.as_deref())
        .await?;

    let session_user = SessionUser {
        uid: user.uid,
        email: user.email,
        name: user.name,
        picture: user.picture,
    };
    session::establish(&session, &session_user)?;

    Success::created(UserResponse {
        id: session_user.uid,
        email: session_user.email,
        name: session_user.name,
        image: session_user.picture,
    })
}

/// Destroys the caller's session. Idempotent.
#[post("/logout")]
pub async fn post_logout(session: Session) -> Res<impl Responder> {
    session::destroy(&session);
    Success::ok(serde_json::json!({ "status": "signed_out" }))
}

/// Initiates the Google OAuth authorization-code flow.
///
/// # Output
/// - Redirects the user to Google's authentication page.
#[get("/oauth/google")]
pub async fn get_oauth_google(config: web::Data<Arc<Config>>) -> Res<impl Responder> {
    let client = services::auth::create_google_client(&config);

    let (auth_url, _csrf_token) = client
        .authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new("email profile".to_string()))
        .url();

    Ok(HttpResponse::Found()
        .append_header((LOCATION, auth_url.to_string()))
        .finish())
}

/// Handles the Google OAuth callback.
///
/// Exchanges the authorization code, fetches the Google profile, and then
/// requires a pre-existing identity-provider account for that email:
/// OAuth sign-in never provisions new accounts. On success the session is
/// established and the user is redirected to the configured post-auth URL.
///
/// # Note
/// This endpoint is not called directly from the frontend; it is the
/// redirect URL registered with the OAuth provider.
#[get("/oauth/google/callback")]
pub async fn get_oauth_google_callback(
    query: web::Query<OAuthCallbackQuery>,
    config: web::Data<Arc<Config>>,
    session: Session,
) -> Res<impl Responder> {
    let client = services::auth::create_google_client(&config);

    let http_client = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Client should build");

    let token = client
        .exchange_code(AuthorizationCode::new(query.code.clone()))
        .request_async(&http_client)
        .await
        .map_err(|e| {
            AppError::upstream(
                "Authentication service unavailable",
                format!("Failed to exchange code: {}", e),
            )
        })?;

    let access_token = token.access_token().secret();
    let profile = services::auth::fetch_google_user_data(access_token).await?;

    // Unknown Google accounts are rejected; provisioning belongs elsewhere.
    let identity = IdentityClient::new(&config.identity);
    let user = identity.get_user_by_email(&profile.email).await?;

    let session_user = SessionUser {
        uid: user.uid,
        email: user.email,
        // Prefer the fresher Google profile fields for display data.
        name: profile.name.or(user.name),
        picture: profile.picture.or(user.picture),
    };
    session::establish(&session, &session_user)?;

    Ok(HttpResponse::Found()
        .append_header((LOCATION, config.web_app_auth_callback_url.as_str()))
        .finish())
}
