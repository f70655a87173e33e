//! Side tables filled while a document is processed.

use rustc_hash::FxHashMap;

/// Cross-reference identifier → most recently seen display text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTable {
    entries: FxHashMap<String, String>,
}

impl ReferenceTable {
    /// Record a reference; a repeated identifier keeps the latest text.
    pub fn record(&mut self, id: &str, text: &str) {
        self.entries.insert(id.to_string(), text.to_string());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Generated identifier → code of an executable block.
///
/// Entries are never deduplicated: identical blocks get one entry each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunBlockRegistry {
    blocks: Vec<(String, String)>,
}

impl RunBlockRegistry {
    pub fn insert(&mut self, id: String, code: String) {
        self.blocks.push((id, code));
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.blocks
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, code)| code.as_str())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_last_write_wins() {
        let mut table = ReferenceTable::default();
        table.record("fig1", "Fig 1");
        table.record("fig1", "Fig 1 Updated");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("fig1"), Some("Fig 1 Updated"));
    }

    #[test]
    fn test_run_blocks_keep_order() {
        let mut registry = RunBlockRegistry::default();
        registry.insert("b".into(), "two".into());
        registry.insert("a".into(), "one".into());
        let ids: Vec<_> = registry.blocks.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(registry.get("a"), Some("one"));
    }
}
