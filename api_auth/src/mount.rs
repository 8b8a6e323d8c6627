use actix_web::web;

use crate::routes;

pub fn mount_auth() -> actix_web::Scope {
    web::scope("/auth")
        .service(routes::auth::post_login)
        .service(routes::auth::post_register)
        .service(routes::auth::post_logout)
        .service(routes::auth::get_oauth_google)
        .service(routes::auth::get_oauth_google_callback)
        .service(routes::session::get_session)
        .service(routes::token::get_token)
}
