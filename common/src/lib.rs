pub mod env_config;
pub mod error;
pub mod http;
pub mod plans;
pub mod session;
pub mod stripe;
pub mod token;

pub use error::{AppError, Res};
pub use http::Success;
