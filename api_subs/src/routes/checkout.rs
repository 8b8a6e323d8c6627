use actix_session::Session;
use actix_web::{Responder, post, web};
use common::env_config::Config;
use common::error::{AppError, Res};
use common::http::Success;
use common::session;
use common::stripe;
use std::sync::Arc;

use crate::dtos::checkout::{CheckoutRequest, CheckoutResponse};
use crate::services;

/// Creates a hosted checkout session for the authenticated user.
///
/// Validation strictly precedes the outbound processor call: session
/// presence, body shape, plan allow-list, locale fallback, server-side
/// price resolution and trusted redirect URLs, in that order. The caller
/// only ever receives the opaque session identifier.
///
/// # Input
/// - `session`: The caller's session; must carry an authenticated uid
/// - `payload`: JSON body `{ "planId": string, "locale"?: string }`
/// - `config`: Application configuration with Stripe keys and plan prices
///
/// # Output
/// - Success: `200 { "sessionId": string }`
/// - Error: `401 { "error": "Authentication required" }`,
///   `400 { "error": "Invalid plan selected" | "Plan configuration error" }`,
///   `500 { "error": "Unable to start checkout. Please try again." }`
#[post("/checkout")]
pub async fn post_checkout(
    session: Session,
    payload: String,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let uid = session::require_uid(&session)?;

    // A malformed body and an unknown plan are the same dead end; neither
    // is echoed back.
    let req: CheckoutRequest = serde_json::from_str(&payload)
        .map_err(|_| AppError::BadRequest("Invalid plan selected".to_string()))?;

    let plan = services::checkout::prepare_checkout(
        &req.plan_id,
        req.locale.as_deref(),
        &config.app_base_url,
        &config.plan_prices,
    )?;

    let client = stripe::create_client(&config.stripe_secret_key);
    let checkout = services::checkout::create_checkout_session(&client, &uid, &plan).await?;

    Success::ok(CheckoutResponse {
        session_id: checkout.id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_session::{SessionMiddleware, storage::CookieSessionStore};
    use actix_web::cookie::Key;
    use actix_web::{App, HttpResponse, test};
    use common::env_config::{IdentityConfig, OAuthProviderClient};
    use common::plans::PlanPrices;
    use common::session::SessionUser;

    fn test_config() -> Arc<Config> {
        Arc::new(Config {
            environment: "development".to_string(),
            database_url: String::new(),
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            num_workers: 1,
            cors_allowed_origin: "http://localhost:3000".to_string(),
            console_logging_enabled: false,
            app_base_url: "https://easiful.com".to_string(),
            session_secret: "s".repeat(64),
            web_app_auth_callback_url: "http://localhost:3000/auth/callback".to_string(),
            google_client: OAuthProviderClient {
                client_id: String::new(),
                client_secret: String::new(),
                auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                token_url: "https://www.googleapis.com/oauth2/v4/token".to_string(),
                redirect_uri: String::new(),
            },
            identity: IdentityConfig {
                service_url: "http://localhost:9099".to_string(),
                api_key: String::new(),
                token_secret: "unit-test-token-secret".to_string(),
                token_ttl_secs: 3600,
                service_account: None,
            },
            stripe_secret_key: "sk_test_unit".to_string(),
            stripe_webhook_secret: String::new(),
            plan_prices: PlanPrices {
                monthly: Some("price_test_monthly".to_string()),
                annual: Some("price_test_annual".to_string()),
            },
        })
    }

    async fn sign_in(session: Session) -> HttpResponse {
        let user = SessionUser {
            uid: "uid123".to_string(),
            email: "user@example.com".to_string(),
            name: None,
            picture: None,
        };
        session::establish(&session, &user).unwrap();
        HttpResponse::Ok().finish()
    }

    fn session_layer() -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), Key::from(&[0u8; 64]))
            .cookie_secure(false)
            .build()
    }

    #[actix_web::test]
    async fn checkout_without_session_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_config()))
                .wrap(session_layer())
                .service(post_checkout),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/checkout")
            .set_json(serde_json::json!({ "planId": "monthly" }))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 401);
        let body: serde_json::Value = test::read_body_json(res).await;
        let map = body.as_object().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["error"]);
        assert_eq!(body["error"], "Authentication required");
    }

    #[actix_web::test]
    async fn provider_style_plan_id_gets_400_through_the_endpoint() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_config()))
                .wrap(session_layer())
                .route("/sign-in", web::post().to(sign_in))
                .service(post_checkout),
        )
        .await;

        let login = test::TestRequest::post().uri("/sign-in").to_request();
        let login_res = test::call_service(&app, login).await;
        let cookie = login_res
            .response()
            .cookies()
            .next()
            .expect("session cookie")
            .into_owned();

        let req = test::TestRequest::post()
            .uri("/checkout")
            .cookie(cookie)
            .set_json(serde_json::json!({ "planId": "price_abc123" }))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 400);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "Invalid plan selected");
    }

    #[actix_web::test]
    async fn malformed_body_gets_400_through_the_endpoint() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_config()))
                .wrap(session_layer())
                .route("/sign-in", web::post().to(sign_in))
                .service(post_checkout),
        )
        .await;

        let login = test::TestRequest::post().uri("/sign-in").to_request();
        let login_res = test::call_service(&app, login).await;
        let cookie = login_res
            .response()
            .cookies()
            .next()
            .expect("session cookie")
            .into_owned();

        let req = test::TestRequest::post()
            .uri("/checkout")
            .cookie(cookie)
            .set_payload("not json")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 400);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "Invalid plan selected");
    }
}
