//! Background execution of the tabular data engine.
//!
//! The rendering side owns the dataset; this crate owns everything derived from
//! it. A [`TableEngine`] holds the text index and answers sort, filter and
//! generation requests. [`EngineWorker`] runs one engine in its own task behind a
//! mailbox, so the caller only ever awaits replies. [`BatchingClient`] drives
//! streamed generation: producer batches are buffered and delivered to the caller
//! at most once per flush tick, and the stream can be cancelled at any point.
//!
//! # Example
//!
//! ```no_run
//! use gridcore_datagen::{SyntheticSpec, column_ids};
//! use gridcore_worker::{BatchingClient, EngineConfig, EngineWorker, StreamConfig};
//!
//! # async fn demo() -> gridcore_common::Result<()> {
//! let worker = EngineWorker::spawn(EngineConfig::default())?;
//! let engine = worker.client();
//!
//! let rows = engine.generate(SyntheticSpec::new(100_000, 6, 10_000)).await?;
//! let values = rows.iter().map(|r| r.get("c2").cloned().unwrap_or_default()).collect();
//! engine.ingest(rows, column_ids(6)).await?;
//!
//! let by_c2 = engine.sort_by_vector(values, true).await?;
//! let penang = engine.global_filter("penang", Some(by_c2)).await?;
//!
//! let stream = BatchingClient::new(StreamConfig::default())?.stream_generate(
//!     SyntheticSpec::new(10_000, 5, 500),
//!     |rows| {
//!         println!("{} rows", rows.len());
//!         Ok(())
//!     },
//! )?;
//! let stats = stream.wait().await?;
//! # let _ = (penang, stats);
//! worker.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod stream;
mod worker;

pub use config::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_FILTER_YIELD_INTERVAL, DEFAULT_FLUSH_INTERVAL_MS,
    DEFAULT_INGEST_YIELD_INTERVAL, EngineConfig, StreamConfig,
};
pub use engine::TableEngine;
pub use stream::{
    BatchResult, BatchingClient, GenerationOutcome, GenerationStream, StreamCanceller,
    StreamStats, generate_stream,
};
pub use worker::{EngineClient, EngineStatus, EngineWorker};
