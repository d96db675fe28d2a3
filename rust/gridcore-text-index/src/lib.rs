//! Per-row searchable text index.
//!
//! This crate holds the row model shared by the rest of the engine ([`Value`], [`Row`])
//! and the [`TextIndex`]: for every ingested row, a lowercase, length-bounded string
//! built from the values of a bounded prefix of the column list. The index is what
//! substring filtering scans; it is rebuilt in full on ingest and patched one row at
//! a time on edits.
//!
//! # Quick Start
//!
//! ```rust
//! use gridcore_text_index::{Row, TextIndex, TextIndexConfig, Value};
//!
//! let rows = vec![
//!     Row::from_iter([("name", Value::from("Alice")), ("city", Value::from("KL"))]),
//!     Row::from_iter([("name", Value::from("Bob")), ("city", Value::Null)]),
//! ];
//! let columns = vec!["name".to_string(), "city".to_string()];
//! let index = TextIndex::build(&rows, columns, TextIndexConfig::default());
//!
//! assert_eq!(index.text(0), Some("alice kl"));
//! assert_eq!(index.text(1), Some("bob "));
//! ```

mod config;
mod row;
mod text_index;

pub use config::{DEFAULT_MAX_INDEXED_COLUMNS, DEFAULT_MAX_TEXT_CHARS, TextIndexConfig};
pub use row::{Row, Value};
pub use text_index::{TextIndex, TextIndexBuilder, build_row_text};
