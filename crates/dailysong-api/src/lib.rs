pub mod auth;
pub mod error;
pub mod friends;
pub mod identity;
pub mod middleware;
pub mod posts;
pub mod routes;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
