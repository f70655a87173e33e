//! Push channel listener.
//!
//! Accepts TCP connections on a loopback port and hands each raw stream to
//! the [`WsActor`](crate::actor::ws::WsActor), which performs the WebSocket
//! handshake.

use std::io::ErrorKind;
use std::net::TcpListener;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::actor::messages::WsMsg;

/// Default push channel port.
pub const DEFAULT_WS_PORT: u16 = 35729;

/// Maximum port retry attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind the push channel and spawn its acceptor thread.
///
/// Returns the port actually bound, which may differ from `base_port`.
pub fn start_ws_server(base_port: u16, ws_tx: mpsc::Sender<WsMsg>) -> Result<u16> {
    let (listener, port) = try_bind_port(base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    std::thread::spawn(move || {
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("reload"; "client connected: {}", addr);
                    // The handshake runs in blocking mode.
                    let _ = stream.set_nonblocking(false);
                    if ws_tx.blocking_send(WsMsg::AddClient(stream)).is_err() {
                        crate::debug!("reload"; "push actor stopped, closing listener");
                        break;
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    if ws_tx.is_closed() {
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    crate::log!("reload"; "accept error: {}", e);
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    });

    Ok(port)
}

/// Bind `127.0.0.1:base_port`, trying the following ports when it is taken.
fn try_bind_port(base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(("127.0.0.1", port)) {
            Ok(listener) => {
                let actual = listener.local_addr()?.port();
                if offset > 0 {
                    crate::debug!("reload"; "port {} in use, using {}", base_port, actual);
                }
                return Ok((listener, actual));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind push channel after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
