use actix_web::web;

use crate::routes;

/// The checkout endpoint authorizes via the session cookie inside the
/// handler; the webhook authenticates via its signature. Both live under
/// the same scope.
pub fn mount_stripe() -> actix_web::Scope {
    web::scope("/stripe")
        .service(routes::checkout::post_checkout)
        .service(routes::webhook::post_webhook)
}
