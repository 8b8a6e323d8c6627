//! Keeps two independent authentication states converged: the web session
//! (source of truth) and the identity provider's client SDK. The web
//! session's state transitions arrive as a push stream; each transition is
//! reconciled into the SDK by signing in with a server-minted custom token
//! or signing out.

pub mod gateway;
pub mod synchronizer;

pub use gateway::{HttpTokenSource, IdentityGateway, SyncError, TokenSource};
pub use synchronizer::{SessionState, SessionSynchronizer};
