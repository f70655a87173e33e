//! Counted nouns for summary lines.

/// `"1 file"`, `"0 files"`, `"3 files"`.
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}
