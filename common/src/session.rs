//! Server-side session layer.
//!
//! The session cookie holds the authenticated identity only: uid, email,
//! display name and avatar. The subscription snapshot is never stored in
//! the cookie; it is re-fetched from the database on every session read.

use actix_session::{Session, SessionExt};
use actix_web::dev::ServiceRequest;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Res};

const UID_KEY: &str = "uid";
const EMAIL_KEY: &str = "email";
const NAME_KEY: &str = "name";
const PICTURE_KEY: &str = "picture";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Writes the authenticated identity into the session, replacing whatever
/// was there before.
pub fn establish(session: &Session, user: &SessionUser) -> Res<()> {
    session
        .insert(UID_KEY, &user.uid)
        .and_then(|_| session.insert(EMAIL_KEY, &user.email))
        .and_then(|_| session.insert(NAME_KEY, &user.name))
        .and_then(|_| session.insert(PICTURE_KEY, &user.picture))
        .map_err(|e| AppError::Internal(format!("Failed to write session: {}", e)))
}

/// Destroys the session entirely (cookie invalidated).
pub fn destroy(session: &Session) {
    session.purge();
}

/// Returns the session's uid, or a 401-mapped error when no authenticated
/// session exists. This is the only source of uid for privileged
/// operations; a client-supplied uid is never accepted.
pub fn require_uid(session: &Session) -> Res<String> {
    session
        .get::<String>(UID_KEY)
        .map_err(|e| AppError::Internal(format!("Failed to read session: {}", e)))?
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
}

/// Best-effort uid read from a service request, for request logging.
pub fn session_uid(req: &ServiceRequest) -> Option<String> {
    req.get_session().get::<String>(UID_KEY).ok().flatten()
}

/// Reads the full identity from the session, 401 when absent.
pub fn require_user(session: &Session) -> Res<SessionUser> {
    let uid = require_uid(session)?;
    let read = |key: &str| {
        session
            .get::<Option<String>>(key)
            .unwrap_or_default()
            .flatten()
    };
    Ok(SessionUser {
        uid,
        email: session
            .get::<String>(EMAIL_KEY)
            .unwrap_or_default()
            .unwrap_or_default(),
        name: read(NAME_KEY),
        picture: read(PICTURE_KEY),
    })
}
