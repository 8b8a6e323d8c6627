use base64::{Engine, engine::general_purpose};
use serde::Deserialize;
use std::{env, sync::Arc};

use crate::plans::PlanPrices;

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// This struct holds all the necessary configuration parameters
/// required to initialize and run the server: database connection
/// details, server host and port, CORS settings, logging preferences,
/// the trusted application origin used to build checkout redirect URLs,
/// session cookie signing secret, identity provider settings and the
/// Stripe keys and per-plan price references.
pub struct Config {
    // environment
    pub environment: String, // development or production
    /// The URL of the database to connect to.
    pub database_url: String,
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
    /// The trusted public origin of the web application. Checkout redirect
    /// URLs are derived from this value only, never from client input.
    /// May be empty; the checkout path then fails closed.
    pub app_base_url: String,
    /// Secret used to sign the session cookie. Must be at least 64 bytes.
    pub session_secret: String,
    /// The URL the web application lands on after OAuth authentication.
    pub web_app_auth_callback_url: String,
    /// Configuration for the Google OAuth2 client.
    pub google_client: OAuthProviderClient,
    /// Configuration for the hosted identity provider.
    pub identity: IdentityConfig,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook secret
    pub stripe_webhook_secret: String,
    /// Server-side price references for the paid plans.
    pub plan_prices: PlanPrices,
}

#[derive(Clone, Debug)]
/// `OAuthProviderClient` holds the configuration necessary for interacting
/// with an OAuth 2.0 provider: client ID and secret, the authorization and
/// token URLs, and the redirect URI used after successful authentication.
pub struct OAuthProviderClient {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub redirect_uri: String,
}

#[derive(Clone, Debug)]
/// Configuration for the hosted identity provider.
///
/// The identity provider verifies credentials and owns user accounts; this
/// service only talks to its REST API and mints short-lived custom tokens
/// that the provider's client SDK can exchange for a signed-in state.
pub struct IdentityConfig {
    /// Base URL of the identity provider's REST API.
    pub service_url: String,
    /// API key sent with every identity provider request.
    pub api_key: String,
    /// Secret used to sign custom credential tokens.
    pub token_secret: String,
    /// Lifetime of a minted custom token, in seconds.
    pub token_ttl_secs: i64,
    /// Optional service-account credentials, decoded from base64 JSON.
    pub service_account: Option<ServiceAccount>,
}

#[derive(Clone, Debug, Deserialize)]
/// Server-side service-account credentials for the identity provider.
pub struct ServiceAccount {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
}

impl IdentityConfig {
    /// Creates a new `IdentityConfig` instance from environment variables.
    ///
    /// Reads the identity provider configuration:
    /// - `IDENTITY_SERVICE_URL`: Required. Base URL of the provider's REST API.
    /// - `IDENTITY_API_KEY`: Optional.
    /// - `IDENTITY_TOKEN_SECRET`: Required. Custom-token signing secret.
    /// - `IDENTITY_TOKEN_TTL_SECS`: Optional. Defaults to 3600.
    /// - `IDENTITY_SERVICE_ACCOUNT_B64`: Optional. Base64-encoded JSON
    ///   service-account credentials.
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing or the TTL cannot be parsed.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        IdentityConfig {
            service_url: env::var("IDENTITY_SERVICE_URL")
                .expect("IDENTITY_SERVICE_URL must be set"),
            api_key: env::var("IDENTITY_API_KEY").unwrap_or_default(),
            token_secret: env::var("IDENTITY_TOKEN_SECRET")
                .expect("IDENTITY_TOKEN_SECRET must be set"),
            token_ttl_secs: env::var("IDENTITY_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .expect("IDENTITY_TOKEN_TTL_SECS must be a valid number"),
            service_account: decode_service_account(),
        }
    }
}

/// Decodes the optional base64-encoded service-account JSON.
/// A missing variable is fine; a malformed one is logged and ignored so a
/// bad deploy does not take the whole process down with it.
fn decode_service_account() -> Option<ServiceAccount> {
    let encoded = env::var("IDENTITY_SERVICE_ACCOUNT_B64").ok()?;
    let decoded = match general_purpose::STANDARD.decode(encoded) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Failed to decode IDENTITY_SERVICE_ACCOUNT_B64: {}", e);
            return None;
        }
    };
    match serde_json::from_slice::<ServiceAccount>(&decoded) {
        Ok(account) => Some(account),
        Err(e) => {
            log::warn!("Failed to parse identity service account JSON: {}", e);
            None
        }
    }
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// # Environment Variables
    ///
    /// Required:
    /// - `ENVIRONMENT`, `DATABASE_URL`, `SESSION_SECRET`
    /// - `IDENTITY_SERVICE_URL`, `IDENTITY_TOKEN_SECRET` (via
    ///   `IdentityConfig::from_env()`)
    ///
    /// Optional (with defaults):
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8080)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "http://localhost:3000")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `APP_BASE_URL`: Trusted application origin for checkout redirects
    /// - `WEB_APP_AUTH_CALLBACK_URL`: Web app callback URL after OAuth
    /// - `STRIPE_SECRET_KEY`, `STRIPE_WEBHOOK_SECRET`
    /// - `STRIPE_PRICE_MONTHLY`, `STRIPE_PRICE_ANNUAL`
    /// - Google OAuth client settings (see implementation for details)
    ///
    /// # Panics
    ///
    /// This function will panic if required environment variables are missing
    /// or if numeric values cannot be parsed correctly.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        let stripe_secret_key = env::var("STRIPE_SECRET_KEY").unwrap_or_default();
        let stripe_webhook_secret = env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default();

        Arc::new(Config {
            environment: env::var("ENVIRONMENT").expect("ENVIRONMENT must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_host: env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            num_workers: env::var("WORKERS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            console_logging_enabled: env::var("ENABLE_CONSOLE_LOGGING")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                == "true",
            app_base_url: env::var("APP_BASE_URL").unwrap_or_default(),
            session_secret: env::var("SESSION_SECRET").expect("SESSION_SECRET must be set"),
            web_app_auth_callback_url: env::var("WEB_APP_AUTH_CALLBACK_URL")
                .unwrap_or_else(|_| "http://localhost:3000/auth/callback".to_string()),
            google_client: OAuthProviderClient {
                client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
                client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
                auth_url: env::var("GOOGLE_AUTH_URL")
                    .unwrap_or_else(|_| "https://accounts.google.com/o/oauth2/v2/auth".to_string()),
                token_url: env::var("GOOGLE_TOKEN_URL")
                    .unwrap_or_else(|_| "https://www.googleapis.com/oauth2/v4/token".to_string()),
                redirect_uri: env::var("GOOGLE_REDIRECT_URI").unwrap_or_else(|_| {
                    "http://localhost:8080/api/auth/oauth/google/callback".to_string()
                }),
            },
            identity: IdentityConfig::from_env(),
            stripe_secret_key,
            stripe_webhook_secret,
            plan_prices: PlanPrices {
                monthly: env::var("STRIPE_PRICE_MONTHLY").ok().filter(|v| !v.is_empty()),
                annual: env::var("STRIPE_PRICE_ANNUAL").ok().filter(|v| !v.is_empty()),
            },
        })
    }
}
