use common::error::{AppError, Res};
use sqlx::PgPool;

use crate::models::user::User;

pub async fn get_user_by_uid(pool: &PgPool, uid: &str) -> Res<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE uid = $1")
        .bind(uid)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
}

pub async fn get_user_by_customer_id(pool: &PgPool, customer_id: &str) -> Res<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE stripe_customer_id = $1")
        .bind(customer_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
}

/// Records the uid to processor-customer mapping. Only the webhook path
/// writes this; later lifecycle events resolve users through it instead of
/// trusting event fields.
pub async fn upsert_user_customer(
    pool: &PgPool,
    uid: &str,
    email: &str,
    customer_id: &str,
) -> Res<()> {
    sqlx::query(
        r#"
        INSERT INTO users (uid, email, stripe_customer_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (uid) DO UPDATE
        SET stripe_customer_id = EXCLUDED.stripe_customer_id,
            updated_at = now()
        "#,
    )
    .bind(uid)
    .bind(email)
    .bind(customer_id)
    .execute(pool)
    .await?;
    Ok(())
}
