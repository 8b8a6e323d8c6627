use serde::{Deserialize, Serialize};

/// Body of `POST /api/stripe/checkout`. Only the plan identifier and an
/// optional locale cross the trust boundary; price references and redirect
/// URLs are resolved server-side.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub plan_id: String,
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
}
