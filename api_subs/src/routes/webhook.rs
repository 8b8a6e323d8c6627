use actix_web::{Responder, post, web};
use common::env_config::Config;
use common::error::{AppError, Res};
use common::http::Success;
use common::stripe;
use sqlx::PgPool;
use std::sync::Arc;

use crate::services;

/// Handles signed Stripe webhook events for the subscription lifecycle.
///
/// # Input
/// - `payload`: Raw request body, required verbatim for signature checking
/// - `req`: HTTP request carrying the `stripe-signature` header
/// - `config`: Application configuration with the webhook signing secret
///
/// # Output
/// - Success: 200 OK once the event is processed
/// - Error: 400 for a missing or invalid signature, 500 for processing
///   failures
///
/// # Note
/// This endpoint is called by the payment processor's servers, not by the
/// frontend. The endpoint URL and the signing secret are configured in the
/// processor's dashboard; the secret arrives as `STRIPE_WEBHOOK_SECRET`.
#[post("/webhook")]
pub async fn post_webhook(
    payload: String,
    req: actix_web::HttpRequest,
    config: web::Data<Arc<Config>>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let signature = match req.headers().get("stripe-signature") {
        Some(signature) => signature.to_str().unwrap_or(""),
        None => return Err(AppError::BadRequest("Stripe signature missing".to_string())),
    };

    let event =
        services::webhook::construct_event(&payload, signature, &config.stripe_webhook_secret)?;

    let client = stripe::create_client(&config.stripe_secret_key);
    services::webhook::process_event(event, &client, &pool, &config.plan_prices).await?;

    Success::ok("Webhook processed successfully")
}
