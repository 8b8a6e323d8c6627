use std::collections::HashMap;

use common::error::{AppError, Res};
use common::plans::{self, CheckoutUrls, PlanPrices};
use stripe::{CheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession};

/// Validated, server-resolved inputs for one checkout session. Everything
/// here is derived from configuration; nothing is client-supplied except
/// the already-validated plan choice.
#[derive(Debug)]
pub struct CheckoutPlan {
    pub price_id: String,
    pub urls: CheckoutUrls,
    pub locale: String,
}

/// Runs the full validation chain before any external call is made.
///
/// Invalid plan → `Invalid plan selected`. Valid plan whose price
/// reference is unset → `Plan configuration error` (distinguished for
/// operability, no configuration specifics leaked). Unrecognized locales
/// fall back to the default. An unset base origin surfaces as a server
/// configuration error.
pub fn prepare_checkout(
    plan_id: &str,
    locale: Option<&str>,
    base_url: &str,
    prices: &PlanPrices,
) -> Res<CheckoutPlan> {
    if !plans::is_valid_plan_id(plan_id) {
        return Err(AppError::BadRequest("Invalid plan selected".to_string()));
    }

    let locale = plans::locale_or_default(locale);

    let price_id = plans::resolve_stripe_price_id(plan_id, prices)
        .ok_or_else(|| AppError::BadRequest("Plan configuration error".to_string()))?;

    let urls = plans::build_checkout_urls(base_url, locale)?;

    Ok(CheckoutPlan {
        price_id,
        urls,
        locale: locale.to_string(),
    })
}

/// Creates the hosted checkout session: card payment, subscription mode,
/// the caller's uid as client reference and metadata, quantity 1 on the
/// resolved price. Returns only the opaque session.
pub async fn create_checkout_session(
    client: &Client,
    uid: &str,
    plan: &CheckoutPlan,
) -> Res<CheckoutSession> {
    let params = CreateCheckoutSession {
        payment_method_types: Some(vec![stripe::CreateCheckoutSessionPaymentMethodTypes::Card]),
        mode: Some(CheckoutSessionMode::Subscription),
        client_reference_id: Some(uid),
        line_items: Some(vec![stripe::CreateCheckoutSessionLineItems {
            price: Some(plan.price_id.to_string()),
            quantity: Some(1),
            ..Default::default()
        }]),
        success_url: Some(plan.urls.success_url.as_str()),
        cancel_url: Some(plan.urls.cancel_url.as_str()),
        metadata: Some(HashMap::from([("app_uid".to_string(), uid.to_string())])),
        ..Default::default()
    };

    CheckoutSession::create(client, params)
        .await
        .map_err(|e| AppError::upstream("Unable to start checkout. Please try again.", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices() -> PlanPrices {
        PlanPrices {
            monthly: Some("price_test_monthly".to_string()),
            annual: Some("price_test_annual".to_string()),
        }
    }

    const BASE: &str = "https://easiful.com";

    fn error_message(err: AppError) -> String {
        match err {
            AppError::BadRequest(msg) | AppError::Unauthorized(msg) => msg,
            AppError::Config(msg) => msg,
            other => panic!("unexpected error variant: {:?}", other),
        }
    }

    #[test]
    fn valid_plan_resolves_price_and_urls() {
        let plan = prepare_checkout("monthly", Some("en"), BASE, &prices()).unwrap();
        assert_eq!(plan.price_id, "price_test_monthly");
        assert_eq!(plan.locale, "en");
        assert_eq!(
            plan.urls.success_url,
            "https://easiful.com/en/dashboard?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(plan.urls.cancel_url, "https://easiful.com/en/pricing");
    }

    #[test]
    fn provider_style_plan_id_is_rejected_before_any_lookup() {
        let err = prepare_checkout("price_1Rj4q9PY7RDrzGXCxZ4Afq9k", None, BASE, &prices())
            .unwrap_err();
        assert_eq!(error_message(err), "Invalid plan selected");
    }

    #[test]
    fn empty_plan_id_is_invalid() {
        let err = prepare_checkout("", Some("es"), BASE, &prices()).unwrap_err();
        assert_eq!(error_message(err), "Invalid plan selected");
    }

    #[test]
    fn valid_but_unconfigured_plan_is_a_distinct_failure() {
        let unconfigured = PlanPrices {
            monthly: None,
            annual: Some("price_test_annual".to_string()),
        };
        let err = prepare_checkout("monthly", None, BASE, &unconfigured).unwrap_err();
        assert_eq!(error_message(err), "Plan configuration error");
    }

    #[test]
    fn unknown_locale_falls_back_to_default() {
        let plan = prepare_checkout("annual", Some("fr"), BASE, &prices()).unwrap();
        assert_eq!(plan.locale, "es");
        assert!(plan.urls.cancel_url.ends_with("/es/pricing"));
    }

    #[test]
    fn missing_base_origin_is_a_configuration_fault() {
        let err = prepare_checkout("monthly", Some("es"), "", &prices()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn failure_messages_never_leak_provider_strings() {
        let cases = [
            prepare_checkout("price_abc123", None, BASE, &prices()),
            prepare_checkout("monthly", None, BASE, &PlanPrices::default()),
        ];
        for case in cases {
            let message = error_message(case.unwrap_err());
            let lowered = message.to_lowercase();
            assert!(!lowered.contains("stripe"));
            assert!(!lowered.contains("price_"));
            assert!(!lowered.contains("sk_"));
        }
    }
}
