use gridcore_common::{Result, verify_arg};
use serde::{Deserialize, Serialize};

/// Default number of leading columns that contribute to a row's text (K).
pub const DEFAULT_MAX_INDEXED_COLUMNS: usize = 12;

/// Default maximum length of a row's text, in characters (L).
pub const DEFAULT_MAX_TEXT_CHARS: usize = 256;

/// Bounds applied when deriving the searchable text of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextIndexConfig {
    /// Only the first `max_columns` column identifiers are scanned.
    pub max_columns: usize,
    /// The lowercased text is cut to at most this many characters.
    pub max_text_chars: usize,
}

impl Default for TextIndexConfig {
    fn default() -> Self {
        TextIndexConfig {
            max_columns: DEFAULT_MAX_INDEXED_COLUMNS,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
        }
    }
}

impl TextIndexConfig {
    pub fn with_max_columns(mut self, max_columns: usize) -> Self {
        self.max_columns = max_columns;
        self
    }

    pub fn with_max_text_chars(mut self, max_text_chars: usize) -> Self {
        self.max_text_chars = max_text_chars;
        self
    }

    pub fn validate(&self) -> Result<()> {
        verify_arg!(max_columns, self.max_columns > 0);
        verify_arg!(max_text_chars, self.max_text_chars > 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TextIndexConfig::default();
        assert_eq!(config.max_columns, 12);
        assert_eq!(config.max_text_chars, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero() {
        assert!(TextIndexConfig::default().with_max_columns(0).validate().is_err());
        assert!(TextIndexConfig::default().with_max_text_chars(0).validate().is_err());
    }

    #[test]
    fn test_partial_deserialize() {
        let config: TextIndexConfig = serde_json::from_str(r#"{"max_columns": 3}"#).unwrap();
        assert_eq!(config.max_columns, 3);
        assert_eq!(config.max_text_chars, DEFAULT_MAX_TEXT_CHARS);
    }
}
