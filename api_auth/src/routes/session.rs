use actix_session::Session;
use actix_web::{Responder, get, web};
use common::error::Res;
use common::http::Success;
use common::session;
use log::warn;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

/// Retrieves the current session for the authenticated user.
///
/// The subscription snapshot is re-fetched from the database on every
/// read; the cookie never caches it. A user with no stored record gets
/// `subscription: null` — absence is meaningful and is never upgraded to
/// an implicit free/active subscription, and this path never provisions
/// records.
///
/// # Output
/// - Success: `200 { "user": { id, email, name, image, subscription } }`
/// - Error: 401 Unauthorized when no valid session exists
#[get("/session")]
pub async fn get_session(session: Session, pool: web::Data<Arc<PgPool>>) -> Res<impl Responder> {
    let user = session::require_user(&session)?;

    let subscription = match db::user::get_user_by_uid(&pool, &user.uid).await? {
        Some(_) => db::subscription::get_subscription(&pool, &user.uid).await?,
        None => {
            warn!("User {} authenticated but has no stored record", user.uid);
            None
        }
    };

    Success::ok(json!({
        "user": {
            "id": user.uid,
            "email": user.email,
            "name": user.name,
            "image": user.picture,
            "subscription": subscription,
        }
    }))
}
