//! Actor System for the live session
//!
//! Message-passing concurrency for `mdlive live`:
//!
//! ```text
//! FsActor --> WsActor
//! (watch)    (broadcast)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - Watches the document and refreshes the session
//! - `ws` - WebSocket clients and broadcast
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod ws;

pub use coordinator::Coordinator;
