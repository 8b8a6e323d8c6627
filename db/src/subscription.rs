use common::error::{AppError, Res};
use sqlx::PgPool;

use crate::{dtos::subscription::SubscriptionUpsert, models::subscription::Subscription};

pub async fn get_subscription(pool: &PgPool, uid: &str) -> Res<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE user_uid = $1")
        .bind(uid)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
}

pub async fn upsert_subscription(pool: &PgPool, data: &SubscriptionUpsert) -> Res<()> {
    sqlx::query(
        r#"
        INSERT INTO subscriptions
            (user_uid, plan_id, status, current_period_start, current_period_end,
             stripe_subscription_id, stripe_customer_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (user_uid) DO UPDATE
        SET plan_id = EXCLUDED.plan_id,
            status = EXCLUDED.status,
            current_period_start = EXCLUDED.current_period_start,
            current_period_end = EXCLUDED.current_period_end,
            stripe_subscription_id = EXCLUDED.stripe_subscription_id,
            stripe_customer_id = EXCLUDED.stripe_customer_id,
            updated_at = now()
        "#,
    )
    .bind(&data.user_uid)
    .bind(&data.plan_id)
    .bind(&data.status)
    .bind(data.current_period_start)
    .bind(data.current_period_end)
    .bind(&data.stripe_subscription_id)
    .bind(&data.stripe_customer_id)
    .execute(pool)
    .await?;
    Ok(())
}
