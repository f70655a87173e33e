//! Push channel message protocol.
//!
//! The server only ever sends `{"type":"reload"}`. The browser treats it as
//! "the document changed, fetch it again".

use serde::{Deserialize, Serialize};

/// Message sent over the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Full page reload; the client restores its view state afterwards.
    Reload,
}

impl ReloadMessage {
    /// Serialize to the wire format.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_wire_format() {
        assert_eq!(ReloadMessage::Reload.to_json(), r#"{"type":"reload"}"#);
    }

    #[test]
    fn test_parse_reload() {
        let msg: ReloadMessage = serde_json::from_str(r#"{"type":"reload"}"#).unwrap();
        assert_eq!(msg, ReloadMessage::Reload);
        assert!(serde_json::from_str::<ReloadMessage>(r#"{"type":"patch"}"#).is_err());
    }
}
