//! FileSystem Actor
//!
//! Watches the directory of the live document and turns change events for
//! the document (or its sibling `config.yml`) into session refreshes.
//!
//! ```text
//! notify → std mpsc → bridge thread → tokio mpsc → classify → Session::refresh → WsMsg::Reload
//! ```
//!
//! Events are handled one at a time in the order notify reports them. There
//! is no debouncing: duplicate events for one edit are absorbed by the
//! session's change detector.

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::messages::WsMsg;
use crate::config::SIBLING_CONFIG;
use crate::logger;
use crate::reload::{Refresh, Session};

/// What a filesystem event means for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// The document itself.
    Source,
    /// Its sibling `config.yml`.
    Config,
}

/// FileSystem Actor - watches the live document
pub struct FsActor {
    /// Sync side of the notify bridge
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    session: Arc<Session>,
    source_name: OsString,
    ws_tx: mpsc::Sender<WsMsg>,
}

impl FsActor {
    /// Start watching immediately; events buffer until [`run`](Self::run).
    ///
    /// The parent directory is watched rather than the file, so an editor
    /// that saves by replacing the file keeps being observed.
    pub fn new(session: Arc<Session>, ws_tx: mpsc::Sender<WsMsg>) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let dir = match session.source().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        crate::debug!(
            "watch";
            "watching {} and {}",
            session.source().display(),
            session.sibling_config().display()
        );

        let source_name = session.source().file_name().unwrap_or_default().to_os_string();
        Ok(Self {
            notify_rx,
            _watcher: watcher,
            session,
            source_name,
            ws_tx,
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        let notify_rx = self.notify_rx;
        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        while let Some(event) = async_rx.recv().await {
            let Some(change) = classify(&event, &self.source_name) else {
                continue;
            };
            if handle_change(&self.session, change, &self.ws_tx).await.is_err() {
                break;
            }
        }
    }
}

/// Map a notify event to a [`Change`], ignoring unrelated files and access events.
pub fn classify(event: &notify::Event, source_name: &OsString) -> Option<Change> {
    if matches!(event.kind, EventKind::Access(_) | EventKind::Other) {
        return None;
    }
    event.paths.iter().find_map(|path| {
        let name = path.file_name()?;
        if name == source_name.as_os_str() {
            Some(Change::Source)
        } else if name == SIBLING_CONFIG {
            Some(Change::Config)
        } else {
            None
        }
    })
}

/// Refresh the session and notify clients when the document changed.
///
/// Refresh failures are reported and the last good document keeps being
/// served. Returns `Err(())` once the WebSocket actor is gone.
pub async fn handle_change(
    session: &Session,
    change: Change,
    ws_tx: &mpsc::Sender<WsMsg>,
) -> Result<(), ()> {
    if change == Change::Config {
        session.invalidate();
    }

    let name = session.display_name();
    match session.refresh() {
        Ok(Refresh::Updated) => {
            logger::status_success(&format!("updated: {name}"));
            ws_tx.send(WsMsg::Reload).await.map_err(|_| ())?;
        }
        Ok(Refresh::Unchanged) => crate::debug!("watch"; "unchanged: {}", name),
        Err(e) => logger::status_error(&format!("failed: {name}"), &format!("{e:#}")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{Processor, SequentialIds};
    use notify::event::{CreateKind, DataChange, ModifyKind};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn session_in(dir: &TempDir, content: &str) -> Arc<Session> {
        let path = dir.path().join("doc.md");
        fs::write(&path, content).unwrap();
        let processor = Processor::default().with_ids(Arc::new(SequentialIds::default()));
        Arc::new(Session::with_head(path, processor, String::new()))
    }

    fn modify(path: PathBuf) -> notify::Event {
        notify::Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(path)
    }

    #[test]
    fn test_classify() {
        let name = OsString::from("doc.md");
        let dir = Path::new("/notes");

        assert_eq!(classify(&modify(dir.join("doc.md")), &name), Some(Change::Source));
        assert_eq!(classify(&modify(dir.join("config.yml")), &name), Some(Change::Config));
        assert_eq!(classify(&modify(dir.join("other.md")), &name), None);

        let created =
            notify::Event::new(EventKind::Create(CreateKind::File)).add_path(dir.join("doc.md"));
        assert_eq!(classify(&created, &name), Some(Change::Source));

        let access = notify::Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(dir.join("doc.md"));
        assert_eq!(classify(&access, &name), None);
    }

    #[tokio::test]
    async fn test_edit_broadcasts_exactly_once() {
        let dir = TempDir::new().unwrap();
        let session = session_in(&dir, "# A\n");
        session.refresh().unwrap();
        let (tx, mut rx) = mpsc::channel(8);

        fs::write(session.source(), "# B\n").unwrap();
        // One logical edit, reported twice.
        handle_change(&session, Change::Source, &tx).await.unwrap();
        handle_change(&session, Change::Source, &tx).await.unwrap();

        assert!(matches!(rx.try_recv(), Ok(WsMsg::Reload)));
        assert!(rx.try_recv().is_err());
        assert!(session.latest().unwrap().contains("<h1 id=\"b\">B</h1>"));
    }

    #[tokio::test]
    async fn test_unchanged_content_is_silent() {
        let dir = TempDir::new().unwrap();
        let session = session_in(&dir, "# A\n");
        session.refresh().unwrap();
        let (tx, mut rx) = mpsc::channel(8);

        handle_change(&session, Change::Source, &tx).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_config_change_rerenders() {
        let dir = TempDir::new().unwrap();
        let session = session_in(&dir, "# A\n");
        session.refresh().unwrap();
        let (tx, mut rx) = mpsc::channel(8);

        fs::write(dir.path().join(SIBLING_CONFIG), "title: Renamed\n").unwrap();
        handle_change(&session, Change::Config, &tx).await.unwrap();

        assert!(matches!(rx.try_recv(), Ok(WsMsg::Reload)));
        assert!(session.latest().unwrap().contains("<title>Renamed</title>"));
    }

    #[tokio::test]
    async fn test_deleted_source_keeps_serving() {
        let dir = TempDir::new().unwrap();
        let session = session_in(&dir, "# A\n");
        session.refresh().unwrap();
        let (tx, mut rx) = mpsc::channel(8);

        fs::remove_file(session.source()).unwrap();
        handle_change(&session, Change::Source, &tx).await.unwrap();

        assert!(rx.try_recv().is_err());
        assert!(session.latest().unwrap().contains("<h1 id=\"a\">A</h1>"));
    }

    #[tokio::test]
    async fn test_stopped_ws_actor_ends_loop() {
        let dir = TempDir::new().unwrap();
        let session = session_in(&dir, "# A\n");
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        assert!(handle_change(&session, Change::Source, &tx).await.is_err());
    }
}
