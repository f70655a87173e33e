//! HTTP routing and responses.
//!
//! [`route`] decides what to answer without touching the connection, so the
//! whole surface is testable without a socket.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::Result;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use super::path;
use crate::embed::serve::{LOADING_HTML, LoadingVars};
use crate::reload::Session;
use crate::utils::html::escape;
use crate::utils::mime::{self, types};

/// Headers sent with every response.
const CORS_HEADERS: [(&str, &str); 4] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Request-Method", "*"),
    ("Access-Control-Allow-Methods", "OPTIONS, GET"),
    ("Access-Control-Allow-Headers", "*"),
];

/// A response, before it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(404, types::PLAIN, "404 Not Found")
    }

    pub fn internal_error() -> Self {
        Self::new(500, types::PLAIN, "500 Internal Server Error")
    }

    pub fn unavailable() -> Self {
        Self::new(503, types::PLAIN, "503 Service Unavailable")
    }
}

/// Answer a request for `url`.
///
/// - `OPTIONS` → 200, empty
/// - `/` → latest document, or a 503 loading page before the first render
/// - anything else → file under `root`; 404 when it does not exist, 500 on
///   any other read failure
pub fn route(method: &Method, url: &str, session: &Session, root: &Path) -> Reply {
    if *method == Method::Options {
        return Reply::new(200, types::PLAIN, Vec::new());
    }

    if path::normalize_url(url).is_empty() {
        return match session.latest() {
            Some(document) => Reply::new(200, types::HTML, document.as_bytes()),
            None => {
                let name = session.display_name();
                let page = LOADING_HTML.render(&LoadingVars {
                    title: &escape(&name),
                });
                Reply::new(503, types::HTML, page)
            }
        };
    }

    let Some(local) = path::resolve_path(url, root) else {
        return Reply::not_found();
    };
    match fs::read(&local) {
        Ok(body) => Reply::new(200, mime::from_path(&local), body),
        Err(e) if e.kind() == ErrorKind::NotFound => Reply::not_found(),
        Err(e) => {
            crate::debug!("live"; "{}: {}", local.display(), e);
            Reply::internal_error()
        }
    }
}

/// Write `reply` to the client.
pub fn send(request: Request, reply: Reply) -> Result<()> {
    let mut response = Response::from_data(reply.body).with_status_code(StatusCode(reply.status));
    if let Ok(header) = Header::from_bytes("Content-Type", reply.content_type) {
        response.add_header(header);
    }
    for (field, value) in CORS_HEADERS {
        if let Ok(header) = Header::from_bytes(field, value) {
            response.add_header(header);
        }
    }
    request.respond(response)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{Processor, SequentialIds};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn session_in(dir: &TempDir, content: &str) -> Session {
        let path = dir.path().join("doc.md");
        fs::write(&path, content).unwrap();
        let processor = Processor::default().with_ids(Arc::new(SequentialIds::default()));
        Session::with_head(path, processor, String::new())
    }

    fn get(url: &str, session: &Session, root: &Path) -> Reply {
        route(&Method::Get, url, session, root)
    }

    fn text(reply: &Reply) -> &str {
        std::str::from_utf8(&reply.body).unwrap()
    }

    #[test]
    fn test_loading_page_before_first_render() {
        let dir = TempDir::new().unwrap();
        let session = session_in(&dir, "# A\n");
        let reply = get("/", &session, dir.path());
        assert_eq!(reply.status, 503);
        assert!(text(&reply).contains("<title>doc.md</title>"));
    }

    #[test]
    fn test_root_serves_latest_document() {
        let dir = TempDir::new().unwrap();
        let session = session_in(&dir, "# A\n");
        session.refresh().unwrap();

        let reply = get("/", &session, dir.path());
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, types::HTML);
        assert!(text(&reply).contains("<div id=\"content\"><h1 id=\"a\">A</h1>"));

        fs::write(session.source(), "# B\n").unwrap();
        session.refresh().unwrap();
        let reply = get("/?reload=1", &session, dir.path());
        assert!(text(&reply).contains("<div id=\"content\"><h1 id=\"b\">B</h1>"));
    }

    #[test]
    fn test_static_file_passthrough() {
        let dir = TempDir::new().unwrap();
        let session = session_in(&dir, "# A\n");
        fs::create_dir(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css/site.css"), "p{}").unwrap();
        fs::write(dir.path().join("notes.unknownext"), "raw").unwrap();

        let reply = get("/css/site.css", &session, dir.path());
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, types::CSS);
        assert_eq!(reply.body, b"p{}");

        let reply = get("/notes.unknownext", &session, dir.path());
        assert_eq!(reply.content_type, types::PLAIN);
    }

    #[test]
    fn test_missing_file_is_404() {
        let dir = TempDir::new().unwrap();
        let session = session_in(&dir, "# A\n");
        let reply = get("/nope.js", &session, dir.path());
        assert_eq!(reply, Reply::not_found());
        assert_eq!(get("/../secret", &session, dir.path()).status, 404);
    }

    #[test]
    fn test_other_read_failure_is_500() {
        let dir = TempDir::new().unwrap();
        let session = session_in(&dir, "# A\n");
        fs::create_dir(dir.path().join("folder")).unwrap();
        let reply = get("/folder", &session, dir.path());
        assert_eq!(reply.status, 500);
        assert_eq!(text(&reply), "500 Internal Server Error");
    }

    #[test]
    fn test_options_preflight() {
        let dir = TempDir::new().unwrap();
        let session = session_in(&dir, "# A\n");
        let reply = route(&Method::Options, "/anything", &session, dir.path());
        assert_eq!(reply.status, 200);
        assert!(reply.body.is_empty());
    }
}
