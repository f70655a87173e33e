//! Actor Coordinator - wires up the live session actors
//!
//! A thin orchestrator: it creates the actors, runs them concurrently and
//! stops them on the shutdown signal. Rendering lives in `reload::session`.
//!
//! ```text
//! FsActor --Reload--> WsActor
//!    |                   ^
//!  Session          ws acceptor
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::FsActor;
use super::messages::WsMsg;
use super::ws::WsActor;
use crate::reload::Session;

/// Coordinator - wires up and runs the actor system
pub struct Coordinator {
    session: Arc<Session>,
    /// Sender shared with the ws acceptor thread
    ws_tx: mpsc::Sender<WsMsg>,
    ws_rx: mpsc::Receiver<WsMsg>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(
        session: Arc<Session>,
        ws_tx: mpsc::Sender<WsMsg>,
        ws_rx: mpsc::Receiver<WsMsg>,
    ) -> Self {
        Self {
            session,
            ws_tx,
            ws_rx,
            shutdown_rx: None,
        }
    }

    /// Set shutdown signal receiver
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actors until shutdown (or until one of them stops).
    pub async fn run(self) -> Result<()> {
        let fs = FsActor::new(Arc::clone(&self.session), self.ws_tx.clone())
            .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;
        let ws = WsActor::new(self.ws_rx);

        crate::debug!("actor"; "start");
        let mut fs_handle = tokio::spawn(fs.run());
        let mut ws_handle = tokio::spawn(ws.run());

        if let Some(rx) = self.shutdown_rx {
            loop {
                if rx.try_recv().is_ok() || fs_handle.is_finished() || ws_handle.is_finished() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        } else {
            tokio::select! {
                _ = &mut fs_handle => {}
                _ = &mut ws_handle => {}
            }
        }

        fs_handle.abort();
        let _ = self.ws_tx.send(WsMsg::Shutdown).await;
        let _ = tokio::time::timeout(Duration::from_millis(500), ws_handle).await;

        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
