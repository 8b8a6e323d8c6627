use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mirror of the identity-provider account plus the processor customer
/// mapping. Rows are created by the store/webhook path, never by the web
/// tier's session reads.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
