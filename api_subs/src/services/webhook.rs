//! Processing of signed subscription-lifecycle events.
//!
//! The signature is verified before any payload field is trusted. Lifecycle
//! events resolve the affected user through the stored uid-to-customer
//! mapping, never through user-controllable event fields; the only uid
//! taken from an event is the `client_reference_id` this server itself set
//! when creating the checkout session.

use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use common::plans::{self, PlanPrices};
use db::dtos::subscription::SubscriptionUpsert;
use log::{info, warn};
use sqlx::PgPool;
use stripe::{Client, Event, EventObject, EventType, Subscription, Webhook};

/// Verifies the event signature against the webhook secret. The raw error
/// is logged; the response body only says the signature was invalid.
pub fn construct_event(payload: &str, signature: &str, webhook_secret: &str) -> Res<Event> {
    match Webhook::construct_event(payload, signature, webhook_secret) {
        Ok(event) => Ok(event),
        Err(e) => {
            log::error!("Webhook signature verification failed: {}", e);
            Err(AppError::BadRequest("Invalid webhook signature".to_string()))
        }
    }
}

/// Dispatches one verified event. Unhandled event types are acknowledged.
pub async fn process_event(
    event: Event,
    client: &Client,
    pool: &PgPool,
    prices: &PlanPrices,
) -> Res<()> {
    info!("Processing webhook event: {}", event.type_);

    match event.type_ {
        EventType::CheckoutSessionCompleted => {
            if let EventObject::CheckoutSession(session) = event.data.object {
                handle_checkout_completed(session, client, pool, prices).await?;
            }
        }
        EventType::CustomerSubscriptionUpdated => {
            if let EventObject::Subscription(subscription) = event.data.object {
                handle_subscription_change(subscription, pool, prices, None).await?;
            }
        }
        EventType::CustomerSubscriptionDeleted => {
            if let EventObject::Subscription(subscription) = event.data.object {
                handle_subscription_change(subscription, pool, prices, Some("canceled")).await?;
            }
        }
        other => {
            info!("Unhandled event type: {}", other);
        }
    }

    Ok(())
}

/// Checkout completed: the uid comes from `client_reference_id` (set by
/// this server at session creation), the subscription details are fetched
/// from the processor, and both the customer mapping and the snapshot are
/// written.
async fn handle_checkout_completed(
    session: stripe::CheckoutSession,
    client: &Client,
    pool: &PgPool,
    prices: &PlanPrices,
) -> Res<()> {
    let uid = session
        .client_reference_id
        .clone()
        .ok_or_else(|| AppError::BadRequest("Missing client reference".to_string()))?;

    let sub_ref = session
        .subscription
        .ok_or_else(|| AppError::BadRequest("Checkout session has no subscription".to_string()))?;
    let sub_id = sub_ref.id();

    let subscription = Subscription::retrieve(client, &sub_id, &[])
        .await
        .map_err(AppError::from)?;

    let email = session
        .customer_details
        .as_ref()
        .and_then(|details| details.email.clone())
        .unwrap_or_default();

    let snapshot = snapshot_from(&uid, &subscription, prices);

    db::user::upsert_user_customer(pool, &uid, &email, &snapshot.stripe_customer_id).await?;
    db::subscription::upsert_subscription(pool, &snapshot).await?;

    info!("Subscription snapshot stored for user {}", uid);
    Ok(())
}

/// Renewal, cancellation-scheduling and deletion events. The user is
/// resolved via the stored customer mapping. A missing mapping is
/// deliberately acknowledged with a warning instead of rejected: an error
/// response would make the processor retry an event that cannot succeed
/// until the checkout-completed write lands.
async fn handle_subscription_change(
    subscription: Subscription,
    pool: &PgPool,
    prices: &PlanPrices,
    forced_status: Option<&str>,
) -> Res<()> {
    let customer_id = subscription.customer.id().to_string();

    let Some(user) = db::user::get_user_by_customer_id(pool, &customer_id).await? else {
        warn!("No user mapping for customer {}", customer_id);
        return Ok(());
    };

    let mut snapshot = snapshot_from(&user.uid, &subscription, prices);
    if let Some(status) = forced_status {
        snapshot.status = status.to_string();
    }

    db::subscription::upsert_subscription(pool, &snapshot).await?;
    info!(
        "Subscription {} for user {} now {}",
        snapshot.stripe_subscription_id, user.uid, snapshot.status
    );
    Ok(())
}

fn snapshot_from(uid: &str, subscription: &Subscription, prices: &PlanPrices) -> SubscriptionUpsert {
    let price_id = subscription
        .items
        .data
        .first()
        .and_then(|item| item.price.as_ref())
        .map(|price| price.id.to_string())
        .unwrap_or_default();

    SubscriptionUpsert {
        user_uid: uid.to_string(),
        plan_id: plan_label(&price_id, prices),
        status: subscription.status.to_string(),
        current_period_start: period_bound(subscription.current_period_start),
        current_period_end: period_bound(subscription.current_period_end),
        stripe_subscription_id: subscription.id.to_string(),
        stripe_customer_id: subscription.customer.id().to_string(),
    }
}

/// Labels the snapshot with our plan identifier when the price reference
/// is one of ours; an unrecognized price keeps its raw reference so the
/// snapshot stays truthful.
fn plan_label(price_id: &str, prices: &PlanPrices) -> String {
    plans::plan_id_for_price(price_id, prices)
        .map(|plan| plan.as_str().to_string())
        .unwrap_or_else(|| price_id.to_string())
}

fn period_bound(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0).unwrap_or(DateTime::UNIX_EPOCH)
}
