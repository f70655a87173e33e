//! WebSocket Actor
//!
//! Owns the push channel clients:
//! - completes the handshake of connections handed over by the acceptor,
//!   off the actor loop and under a timeout
//! - broadcasts reload notifications to every open client
//! - prunes closed clients from a background reader thread
//!
//! Delivery is fire-and-forget. A client that is not open when a
//! notification goes out is dropped; nothing is queued for it.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::messages::WsMsg;
use crate::reload::ReloadMessage;

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// Time a new connection has to send its upgrade request.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    rx: mpsc::Receiver<WsMsg>,
    /// Shared with the reader thread
    clients: Clients,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let clients_for_reader = Arc::clone(&self.clients);
        std::thread::spawn(move || client_reader_loop(clients_for_reader));

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::AddClient(stream) => {
                    // A silent peer must not hold up broadcasts.
                    let clients = Arc::clone(&self.clients);
                    tokio::task::spawn_blocking(move || add_client(&clients, stream));
                }
                WsMsg::Reload => {
                    let text = ReloadMessage::Reload.to_json();
                    self.broadcast(Message::Text(text.into()));
                }
                WsMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down");
                    for mut ws in self.clients.lock().drain(..) {
                        let _ = ws.close(None);
                        let _ = ws.flush();
                    }
                    break;
                }
            }
        }
    }

    fn broadcast(&self, msg: Message) {
        let mut clients = self.clients.lock();
        if clients.is_empty() {
            crate::debug!("ws"; "no clients connected");
            return;
        }

        clients.retain_mut(|ws| {
            if !ws.can_write() {
                return false;
            }
            match ws.send(msg.clone()) {
                Ok(()) => true,
                // Frame stays buffered and goes out with the next flush.
                Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => true,
                Err(e) => {
                    crate::debug!("ws"; "client disconnected: {}", e);
                    false
                }
            }
        });
        crate::debug!("ws"; "broadcast to {} clients", clients.len());
    }
}

/// Complete the handshake of `stream` and register the client.
///
/// Runs on the blocking pool. The upgrade request must arrive within
/// [`HANDSHAKE_TIMEOUT`].
fn add_client(clients: &Clients, stream: TcpStream) {
    if let Err(e) = stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT)) {
        crate::debug!("ws"; "cannot set handshake timeout: {}", e);
    }
    match tungstenite::accept(stream) {
        Ok(ws) => {
            // Switch to polling reads for the reader thread.
            let _ = ws.get_ref().set_read_timeout(None);
            let _ = ws.get_ref().set_nonblocking(true);
            let mut clients = clients.lock();
            clients.push(ws);
            crate::debug!("ws"; "client connected (total: {})", clients.len());
        }
        Err(e) => crate::debug!("ws"; "handshake failed: {}", e),
    }
}

/// Poll every client for incoming frames and drop the closed ones.
///
/// Clients never send anything meaningful; reading is what lets tungstenite
/// answer pings and observe close frames. Stops once the actor is gone.
fn client_reader_loop(clients: Clients) {
    loop {
        std::thread::sleep(Duration::from_millis(100));
        if Arc::strong_count(&clients) == 1 {
            break;
        }

        clients.lock().retain_mut(|ws| match ws.read() {
            Ok(Message::Close(_)) => false,
            Ok(_) => true,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => true,
            Err(_) => false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use tungstenite::stream::MaybeTlsStream;

    fn connect(port: u16) -> WebSocket<MaybeTlsStream<TcpStream>> {
        let (ws, _) = tungstenite::connect(format!("ws://127.0.0.1:{port}")).unwrap();
        if let MaybeTlsStream::Plain(stream) = ws.get_ref() {
            stream
                .set_read_timeout(Some(Duration::from_secs(5)))
                .unwrap();
        }
        ws
    }

    /// Accept `count` connections and hand them to the actor, in order.
    fn accept_into(tx: mpsc::Sender<WsMsg>, count: usize) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            for _ in 0..count {
                let (stream, _) = listener.accept().unwrap();
                tx.blocking_send(WsMsg::AddClient(stream)).unwrap();
            }
        });
        port
    }

    async fn wait_for_clients(clients: &Clients, count: usize) {
        for _ in 0..100 {
            if clients.lock().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("expected {count} registered clients");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reload_reaches_connected_client() {
        let (tx, rx) = mpsc::channel(8);
        let actor = WsActor::new(rx);
        let clients = Arc::clone(&actor.clients);
        let actor = tokio::spawn(actor.run());
        let port = accept_into(tx.clone(), 1);

        let mut client = tokio::task::spawn_blocking(move || connect(port))
            .await
            .unwrap();
        wait_for_clients(&clients, 1).await;
        tx.send(WsMsg::Reload).await.unwrap();

        let msg = tokio::task::spawn_blocking(move || client.read().unwrap())
            .await
            .unwrap();
        assert_eq!(msg.to_text().unwrap(), r#"{"type":"reload"}"#);

        tx.send(WsMsg::Shutdown).await.unwrap();
        actor.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_silent_connection_does_not_block_others() {
        let (tx, rx) = mpsc::channel(8);
        let actor = WsActor::new(rx);
        let clients = Arc::clone(&actor.clients);
        let actor = tokio::spawn(actor.run());
        let port = accept_into(tx.clone(), 2);

        // Connected but never sends the upgrade request.
        let _silent = TcpStream::connect(("127.0.0.1", port)).unwrap();

        let mut client = tokio::time::timeout(
            Duration::from_secs(2),
            tokio::task::spawn_blocking(move || connect(port)),
        )
        .await
        .expect("handshake stalled behind a silent connection")
        .unwrap();
        wait_for_clients(&clients, 1).await;
        tx.send(WsMsg::Reload).await.unwrap();

        let msg = tokio::task::spawn_blocking(move || client.read().unwrap())
            .await
            .unwrap();
        assert_eq!(msg.to_text().unwrap(), r#"{"type":"reload"}"#);

        tx.send(WsMsg::Shutdown).await.unwrap();
        actor.await.unwrap();
    }

    #[tokio::test]
    async fn test_broadcast_without_clients() {
        let (_tx, rx) = mpsc::channel(1);
        let actor = WsActor::new(rx);
        actor.broadcast(Message::Text(ReloadMessage::Reload.to_json().into()));
        assert_eq!(actor.clients.lock().len(), 0);
    }
}
