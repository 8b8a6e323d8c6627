use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription snapshot owned by the payment processor's webhook path.
/// The session-read path only mirrors it; absence means "no subscription",
/// never an implicit free/active default.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub user_uid: String,
    pub plan_id: String,
    pub status: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub stripe_subscription_id: String,
    pub stripe_customer_id: String,
    pub updated_at: DateTime<Utc>,
}
