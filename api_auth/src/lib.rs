use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Key, SameSite};

pub mod routes {
    pub mod auth;
    pub mod session;
    pub mod token;
}

pub mod services {
    pub mod auth;
    pub mod identity;
}

pub mod dtos {
    pub mod auth;
}

pub mod mount;

/// Cookie-backed session middleware. The signing secret must be at least
/// 64 bytes; `Key::from` enforces this at startup.
pub fn session_middleware(
    cookie_secure: bool,
    secret: &[u8],
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::from(secret))
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .build()
}
