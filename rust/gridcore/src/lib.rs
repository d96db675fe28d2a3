//! # Gridcore: off-main-thread tabular data engine
//!
//! Gridcore is the data side of a data-grid: it takes a row dataset and a column
//! list from the rendering layer, derives a searchable text index, and answers
//! sort and substring-filter requests with permutations of row positions. It also
//! produces deterministic synthetic datasets, either in bulk or as a cancellable
//! stream whose batches reach the consumer at a bounded rate.
//!
//! ## Module Organization
//!
//! * [`common`] - Error type, result alias and async runtime shims
//! * [`text_index`] - Row model and the per-row text index
//! * [`ordering`] - Permutations, sorting and filtering
//! * [`datagen`] - Synthetic data generation
//! * [`worker`] - The engine, its mailbox worker and the streaming client

pub use gridcore_common as common;
pub use gridcore_datagen as datagen;
pub use gridcore_ordering as ordering;
pub use gridcore_text_index as text_index;
pub use gridcore_worker as worker;

pub use gridcore_common::{Result, error::Error};
pub use gridcore_ordering::Permutation;
pub use gridcore_text_index::{Row, Value};
pub use gridcore_worker::{
    BatchingClient, EngineClient, EngineConfig, EngineWorker, GenerationStream, StreamConfig,
    TableEngine,
};
