//! Tunables of the engine worker and of the streaming client.

use std::time::Duration;

use gridcore_common::{Result, verify_arg};
use gridcore_text_index::TextIndexConfig;
use serde::{Deserialize, Serialize};

/// Rows indexed between two scheduling points during ingest.
pub const DEFAULT_INGEST_YIELD_INTERVAL: usize = 2048;

/// Candidates examined between two scheduling points during a filter scan.
pub const DEFAULT_FILTER_YIELD_INTERVAL: usize = 64 * 1024;

/// One frame at 60Hz.
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 16;

/// Batches the producer may run ahead of the consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Configuration of a [`TableEngine`](crate::TableEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub text_index: TextIndexConfig,
    pub ingest_yield_interval: usize,
    pub filter_yield_interval: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            text_index: TextIndexConfig::default(),
            ingest_yield_interval: DEFAULT_INGEST_YIELD_INTERVAL,
            filter_yield_interval: DEFAULT_FILTER_YIELD_INTERVAL,
        }
    }
}

impl EngineConfig {
    pub fn with_text_index(mut self, text_index: TextIndexConfig) -> Self {
        self.text_index = text_index;
        self
    }

    pub fn with_ingest_yield_interval(mut self, rows: usize) -> Self {
        self.ingest_yield_interval = rows;
        self
    }

    pub fn with_filter_yield_interval(mut self, rows: usize) -> Self {
        self.filter_yield_interval = rows;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.text_index.validate()?;
        verify_arg!(ingest_yield_interval, self.ingest_yield_interval > 0);
        verify_arg!(filter_yield_interval, self.filter_yield_interval > 0);
        Ok(())
    }
}

/// Configuration of the [`BatchingClient`](crate::BatchingClient).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Minimum time between two deliveries to the batch callback.
    pub flush_interval_ms: u64,
    /// Capacity of the producer to consumer channel, in batches. A full channel
    /// suspends the producer.
    pub channel_capacity: usize,
    /// The producer hands control back to the scheduler after this many batches.
    pub yield_every_batches: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            yield_every_batches: 1,
        }
    }
}

impl StreamConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_yield_every_batches(mut self, batches: usize) -> Self {
        self.yield_every_batches = batches;
        self
    }

    pub fn validate(&self) -> Result<()> {
        verify_arg!(flush_interval_ms, self.flush_interval_ms > 0);
        verify_arg!(channel_capacity, self.channel_capacity > 0);
        verify_arg!(yield_every_batches, self.yield_every_batches > 0);
        Ok(())
    }
}
