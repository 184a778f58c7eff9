//! Daily Song core
//!
//! The stateful rules behind the app, kept free of HTTP and SQL:
//! - `streak`: consecutive-day posting streaks
//! - `friendship`: decisions for the friend request state machine
//! - `session`: in-memory bearer tokens with lazy expiry
//!
//! Time always comes from a `Clock` so callers and tests control "now".

pub mod clock;
pub mod error;
pub mod friendship;
pub mod session;
pub mod streak;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SocialError;
