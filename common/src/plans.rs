//! Closed allow-lists for plans and locales.
//!
//! Nothing derived from client input may reach the payment processor as a
//! price reference or redirect target. This module is the firewall: plan
//! identifiers and locales are matched against fixed sets, price references
//! come only from server configuration, and redirect URLs are built from
//! the configured application origin.

use std::fmt;

use crate::error::{AppError, Res};

/// The closed set of purchasable plans. A third, free tier exists implicitly
/// and carries no price reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanId {
    Monthly,
    Annual,
}

impl PlanId {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanId::Monthly => "monthly",
            PlanId::Annual => "annual",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PlanId::Monthly => "Premium Monthly",
            PlanId::Annual => "Premium Annual",
        }
    }

    /// Strict match against the closed set. No normalization, no case
    /// folding: "Monthly" is not a plan.
    pub fn from_str(candidate: &str) -> Option<Self> {
        match candidate {
            "monthly" => Some(PlanId::Monthly),
            "annual" => Some(PlanId::Annual),
            _ => None,
        }
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Server-configured Stripe price references, one per paid plan.
/// `None` means the plan is not sellable right now.
#[derive(Clone, Debug, Default)]
pub struct PlanPrices {
    pub monthly: Option<String>,
    pub annual: Option<String>,
}

impl PlanPrices {
    fn price_for(&self, plan: PlanId) -> Option<&str> {
        match plan {
            PlanId::Monthly => self.monthly.as_deref(),
            PlanId::Annual => self.annual.as_deref(),
        }
    }
}

pub const ALLOWED_LOCALES: [&str; 2] = ["es", "en"];
pub const DEFAULT_LOCALE: &str = "es";

pub fn is_valid_plan_id(candidate: &str) -> bool {
    PlanId::from_str(candidate).is_some()
}

/// Resolves a client-facing plan identifier to the internal Stripe price
/// reference. Returns `None` both for an unknown plan and for a known plan
/// whose configuration value is unset; callers must treat both as a dead
/// end (fail closed).
pub fn resolve_stripe_price_id(candidate: &str, prices: &PlanPrices) -> Option<String> {
    let plan = PlanId::from_str(candidate)?;
    prices
        .price_for(plan)
        .filter(|price| !price.is_empty())
        .map(|price| price.to_string())
}

/// Reverse lookup used by the webhook to label stored subscription
/// snapshots with our plan identifier instead of a raw price reference.
pub fn plan_id_for_price(price_id: &str, prices: &PlanPrices) -> Option<PlanId> {
    if price_id.is_empty() {
        return None;
    }
    if prices.monthly.as_deref() == Some(price_id) {
        return Some(PlanId::Monthly);
    }
    if prices.annual.as_deref() == Some(price_id) {
        return Some(PlanId::Annual);
    }
    None
}

pub fn is_valid_locale(candidate: &str) -> bool {
    ALLOWED_LOCALES.contains(&candidate)
}

/// Unrecognized or absent locales silently fall back to the default so the
/// redirect URLs are always well-formed.
pub fn locale_or_default(candidate: Option<&str>) -> &str {
    match candidate {
        Some(locale) if is_valid_locale(locale) => locale,
        _ => DEFAULT_LOCALE,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

/// Builds the trusted checkout redirect URLs from the configured base
/// origin and a validated locale. An unset base origin is a server
/// configuration fault and must surface as an error, never as a silent
/// fallback: an empty base would produce same-origin-ambiguous URLs.
pub fn build_checkout_urls(base_url: &str, locale: &str) -> Res<CheckoutUrls> {
    let base = base_url.trim_end_matches('/');
    if base.is_empty() {
        return Err(AppError::Config(
            "APP_BASE_URL is not configured; cannot build checkout redirect URLs".to_string(),
        ));
    }

    Ok(CheckoutUrls {
        success_url: format!("{}/{}/dashboard?session_id={{CHECKOUT_SESSION_ID}}", base, locale),
        cancel_url: format!("{}/{}/pricing", base, locale),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured_prices() -> PlanPrices {
        PlanPrices {
            monthly: Some("price_test_monthly".to_string()),
            annual: Some("price_test_annual".to_string()),
        }
    }

    #[test]
    fn accepts_only_the_closed_plan_set() {
        assert!(is_valid_plan_id("monthly"));
        assert!(is_valid_plan_id("annual"));

        for candidate in [
            "",
            "free",
            "premium",
            "Monthly",
            "ANNUAL",
            " monthly",
            "monthly ",
            "price_1Rj4q9PY7RDrzGXCxZ4Afq9k",
            "monthly; DROP TABLE users",
            "'; DROP TABLE users; --",
            "42",
            "null",
            "undefined",
        ] {
            assert!(!is_valid_plan_id(candidate), "accepted {:?}", candidate);
        }
    }

    #[test]
    fn resolves_configured_plans() {
        let prices = configured_prices();
        assert_eq!(
            resolve_stripe_price_id("monthly", &prices).as_deref(),
            Some("price_test_monthly")
        );
        assert_eq!(
            resolve_stripe_price_id("annual", &prices).as_deref(),
            Some("price_test_annual")
        );
    }

    #[test]
    fn invalid_plan_never_resolves() {
        let prices = configured_prices();
        assert_eq!(resolve_stripe_price_id("free", &prices), None);
        assert_eq!(resolve_stripe_price_id("", &prices), None);
        assert_eq!(resolve_stripe_price_id("price_test_monthly", &prices), None);
    }

    #[test]
    fn valid_plan_without_configuration_fails_closed() {
        let prices = PlanPrices {
            monthly: None,
            annual: Some("".to_string()),
        };
        assert_eq!(resolve_stripe_price_id("monthly", &prices), None);
        assert_eq!(resolve_stripe_price_id("annual", &prices), None);
    }

    #[test]
    fn reverse_price_lookup() {
        let prices = configured_prices();
        assert_eq!(
            plan_id_for_price("price_test_monthly", &prices),
            Some(PlanId::Monthly)
        );
        assert_eq!(
            plan_id_for_price("price_test_annual", &prices),
            Some(PlanId::Annual)
        );
        assert_eq!(plan_id_for_price("price_other", &prices), None);
        assert_eq!(plan_id_for_price("", &PlanPrices::default()), None);
    }

    #[test]
    fn accepts_only_the_closed_locale_set() {
        assert!(is_valid_locale("es"));
        assert!(is_valid_locale("en"));
        for candidate in ["", "fr", "ES", "en-US", "es "] {
            assert!(!is_valid_locale(candidate), "accepted {:?}", candidate);
        }
    }

    #[test]
    fn unknown_locales_fall_back_silently() {
        assert_eq!(locale_or_default(Some("en")), "en");
        assert_eq!(locale_or_default(Some("fr")), "es");
        assert_eq!(locale_or_default(Some("")), "es");
        assert_eq!(locale_or_default(None), "es");
    }

    #[test]
    fn builds_exact_redirect_urls() {
        let urls = build_checkout_urls("https://easiful.com", "es").unwrap();
        assert_eq!(
            urls.success_url,
            "https://easiful.com/es/dashboard?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(urls.cancel_url, "https://easiful.com/es/pricing");
    }

    #[test]
    fn trailing_slash_does_not_double_up() {
        let plain = build_checkout_urls("https://easiful.com", "es").unwrap();
        let slashed = build_checkout_urls("https://easiful.com/", "es").unwrap();
        assert_eq!(plain, slashed);
    }

    #[test]
    fn missing_base_origin_is_an_error() {
        assert!(build_checkout_urls("", "es").is_err());
        assert!(build_checkout_urls("///", "es").is_err());
    }

    #[test]
    fn display_names_match_marketing_copy() {
        assert_eq!(PlanId::Monthly.display_name(), "Premium Monthly");
        assert_eq!(PlanId::Annual.display_name(), "Premium Annual");
    }
}
