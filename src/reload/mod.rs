//! Live reload.
//!
//! - `session` - the latest rendered document of one watched file
//! - `server` - push channel listener (WebSocket, loopback only)
//! - `message` - push channel wire format

pub mod message;
pub mod server;
pub mod session;

pub use message::ReloadMessage;
pub use session::{Refresh, Session};
