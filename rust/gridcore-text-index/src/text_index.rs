use std::fmt::Write;

use crate::{Row, TextIndexConfig};

/// Searchable text for every row of the current dataset, addressed by row index.
///
/// Invariant: `len()` equals the number of rows the index was built from. The
/// column list and bounds are captured at build time and reused for single-row
/// updates.
#[derive(Debug, Clone, PartialEq)]
pub struct TextIndex {
    config: TextIndexConfig,
    columns: Vec<String>,
    texts: Vec<String>,
}

impl TextIndex {
    /// Builds the index for `rows` in one pass.
    pub fn build(rows: &[Row], columns: Vec<String>, config: TextIndexConfig) -> TextIndex {
        let mut builder = TextIndexBuilder::with_capacity(columns, config, rows.len());
        builder.extend(rows);
        builder.finish()
    }

    pub fn config(&self) -> &TextIndexConfig {
        &self.config
    }

    /// The full column list supplied at ingest (not only the indexed prefix).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn text(&self, row_index: usize) -> Option<&str> {
        self.texts.get(row_index).map(String::as_str)
    }

    /// Recomputes the text of one row with the captured column list.
    ///
    /// Returns `false` and leaves the index untouched when `row_index` is out of
    /// range, which happens when an edit races with a re-ingest of a smaller
    /// dataset.
    pub fn update_row(&mut self, row_index: usize, row: &Row) -> bool {
        let Some(slot) = self.texts.get_mut(row_index) else {
            return false;
        };
        *slot = build_row_text(row, &self.columns, &self.config);
        true
    }
}

/// Incremental [`TextIndex`] construction, one chunk of rows at a time.
///
/// The caller decides the chunking; this lets an async owner hand control back
/// to its scheduler between chunks of a large ingest.
#[derive(Debug)]
pub struct TextIndexBuilder {
    config: TextIndexConfig,
    columns: Vec<String>,
    texts: Vec<String>,
}

impl TextIndexBuilder {
    pub fn new(columns: Vec<String>, config: TextIndexConfig) -> TextIndexBuilder {
        Self::with_capacity(columns, config, 0)
    }

    pub fn with_capacity(
        columns: Vec<String>,
        config: TextIndexConfig,
        capacity: usize,
    ) -> TextIndexBuilder {
        TextIndexBuilder {
            config,
            columns,
            texts: Vec::with_capacity(capacity),
        }
    }

    /// Appends the texts of `rows`; row indices continue from the current length.
    pub fn extend<'a>(&mut self, rows: impl IntoIterator<Item = &'a Row>) {
        let columns = &self.columns;
        let config = &self.config;
        self.texts
            .extend(rows.into_iter().map(|row| build_row_text(row, columns, config)));
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn finish(self) -> TextIndex {
        log::debug!(
            "text index built: {} rows, {} columns ({} indexed)",
            self.texts.len(),
            self.columns.len(),
            self.columns.len().min(self.config.max_columns)
        );
        TextIndex {
            config: self.config,
            columns: self.columns,
            texts: self.texts,
        }
    }
}

/// Derives the searchable text of a single row.
///
/// Values of the first `config.max_columns` columns are stringified (absent and
/// null values as the empty string) and joined with single spaces; the result is
/// lowercased and cut to `config.max_text_chars` characters.
pub fn build_row_text(row: &Row, columns: &[String], config: &TextIndexConfig) -> String {
    let mut text = String::new();
    for (i, column) in columns.iter().take(config.max_columns).enumerate() {
        if i > 0 {
            text.push(' ');
        }
        if let Some(value) = row.get(column) {
            let _ = write!(text, "{value}");
        }
    }
    let mut text = text.to_lowercase();
    truncate_chars(&mut text, config.max_text_chars);
    text
}

/// Cuts `text` to at most `max_chars` characters, always at a codepoint boundary.
fn truncate_chars(text: &mut String, max_chars: usize) {
    if text.len() <= max_chars {
        // Byte length bounds the character count.
        return;
    }
    if let Some((boundary, _)) = text.char_indices().nth(max_chars) {
        text.truncate(boundary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_row_text_joins_and_lowercases() {
        let row = Row::from_iter([
            ("a", Value::from("Hello")),
            ("b", Value::Int(42)),
            ("c", Value::from("WORLD")),
        ]);
        let text = build_row_text(&row, &columns(&["a", "b", "c"]), &TextIndexConfig::default());
        assert_eq!(text, "hello 42 world");
    }

    #[test]
    fn test_row_text_missing_and_null_values() {
        let row = Row::from_iter([("a", Value::Null), ("c", Value::from("x"))]);
        let text = build_row_text(&row, &columns(&["a", "b", "c"]), &TextIndexConfig::default());
        assert_eq!(text, "  x");
    }

    #[test]
    fn test_row_text_column_limit() {
        let names: Vec<String> = (0..20).map(|c| format!("c{c}")).collect();
        let row = Row::from_iter(names.iter().map(|n| (n.clone(), Value::from(n.as_str()))));
        let text = build_row_text(&row, &names, &TextIndexConfig::default());
        assert!(text.ends_with("c11"));
        assert_eq!(text.split(' ').count(), 12);

        let config = TextIndexConfig::default().with_max_columns(2);
        assert_eq!(build_row_text(&row, &names, &config), "c0 c1");
    }

    #[test]
    fn test_row_text_truncation() {
        let row = Row::from_iter([("a", Value::from("X".repeat(300)))]);
        let text = build_row_text(&row, &columns(&["a"]), &TextIndexConfig::default());
        assert_eq!(text.chars().count(), 256);
        assert!(text.chars().all(|c| c == 'x'));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let row = Row::from_iter([("a", Value::from("ÄÖÜ".repeat(100)))]);
        let config = TextIndexConfig::default().with_max_text_chars(5);
        let text = build_row_text(&row, &columns(&["a"]), &config);
        assert_eq!(text, "äöüäö");
    }

    #[test]
    fn test_build_and_update() {
        let rows = vec![
            Row::from_iter([("c0", "Row 0")]),
            Row::from_iter([("c0", "Row 1")]),
        ];
        let mut index = TextIndex::build(&rows, columns(&["c0"]), TextIndexConfig::default());
        assert_eq!(index.len(), 2);
        assert_eq!(index.text(1), Some("row 1"));

        assert!(index.update_row(1, &Row::from_iter([("c0", "Edited")])));
        assert_eq!(index.text(1), Some("edited"));

        let before = index.clone();
        assert!(!index.update_row(2, &Row::from_iter([("c0", "ghost")])));
        assert_eq!(index, before);
    }

    #[test]
    fn test_update_is_idempotent() {
        let rows = vec![Row::from_iter([("c0", "a")]), Row::from_iter([("c0", "b")])];
        let mut once = TextIndex::build(&rows, columns(&["c0"]), TextIndexConfig::default());
        let mut twice = once.clone();
        let edit = Row::from_iter([("c0", "Updated Value")]);
        once.update_row(0, &edit);
        twice.update_row(0, &edit);
        twice.update_row(0, &edit);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_builder_in_chunks_matches_single_pass() {
        let rows: Vec<Row> = (0..10)
            .map(|i| Row::from_iter([("c0", Value::from(format!("Row {i}")))]))
            .collect();
        let mut builder = TextIndexBuilder::new(columns(&["c0"]), TextIndexConfig::default());
        for chunk in rows.chunks(3) {
            builder.extend(chunk);
        }
        assert_eq!(builder.len(), 10);
        let chunked = builder.finish();
        let single = TextIndex::build(&rows, columns(&["c0"]), TextIndexConfig::default());
        assert_eq!(chunked, single);
    }
}
