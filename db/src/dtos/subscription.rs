use chrono::{DateTime, Utc};

/// Everything the webhook path needs to write a subscription snapshot.
#[derive(Debug, Clone)]
pub struct SubscriptionUpsert {
    pub user_uid: String,
    pub plan_id: String,
    pub status: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub stripe_subscription_id: String,
    pub stripe_customer_id: String,
}
