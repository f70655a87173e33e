//! Actor Message Definitions
//!
//! ```text
//! FsActor --Reload--> WsActor --{"type":"reload"}--> Clients
//!                        ^
//!   ws acceptor ---------+ AddClient
//! ```

use std::net::TcpStream;

/// Messages to the WebSocket actor.
#[derive(Debug)]
pub enum WsMsg {
    /// Raw connection from the acceptor thread, handshake pending.
    AddClient(TcpStream),
    /// The document changed: tell every open client to reload.
    Reload,
    /// Close all clients and stop.
    Shutdown,
}
