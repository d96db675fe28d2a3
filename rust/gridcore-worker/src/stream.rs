//! Streamed synthetic generation with coalesced, rate-limited delivery.
//!
//! A stream has two sides:
//!
//! - the producer, a dedicated task per stream, generates batches of `chunk_size`
//!   rows and pushes them into a bounded channel, yielding between batches;
//! - the consumer buffers whatever has arrived (the pending batch queue) and, at
//!   most once per flush tick, merges the buffered batches into a single delivery
//!   to the caller's callback.
//!
//! The one exception to the tick limit is the tail: once the producer has handed
//! over its last batch, whatever is still buffered is delivered right away.
//!
//! Batches are delayed and merged, never dropped. A failing callback is logged and
//! counted; delivery carries on with the next tick. Cancelling a stream stops
//! deliveries immediately and tears down the producer task: once
//! [`StreamCanceller::cancel`] returns, the callback is never invoked again.

use std::{
    cell::Cell,
    future::Future,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Mutex, PoisonError},
};

use gridcore_common::{
    Result,
    async_runtime::{self, JoinHandle, yield_now},
    error::{Error, StdErrorBoxed},
};
use gridcore_datagen::SyntheticSpec;
use gridcore_text_index::Row;
use tokio::{
    sync::mpsc,
    task::AbortHandle,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;

use crate::StreamConfig;

/// Result of one callback invocation.
pub type BatchResult = std::result::Result<(), StdErrorBoxed>;

/// How a producer run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerationOutcome {
    pub batches: usize,
    pub rows: usize,
    /// `true` if the run stopped before producing every batch.
    pub cancelled: bool,
}

/// Generates the rows described by `spec` in batches of `spec.chunk_size`,
/// awaiting `on_batch` for each one.
///
/// `on_batch` resolves to `false` to stop the run (the consumer went away). The
/// run also stops as soon as `cancel` fires: a batch is never handed over after
/// cancellation has been observed, and no error is raised for the remainder.
/// Control goes back to the scheduler every `yield_every` batches.
pub async fn generate_stream<F, Fut>(
    spec: SyntheticSpec,
    yield_every: usize,
    cancel: CancellationToken,
    mut on_batch: F,
) -> Result<GenerationOutcome>
where
    F: FnMut(Vec<Row>) -> Fut,
    Fut: Future<Output = bool>,
{
    let yield_every = yield_every.max(1);
    let mut outcome = GenerationOutcome::default();
    for batch in spec.batches()? {
        if cancel.is_cancelled() {
            outcome.cancelled = true;
            break;
        }
        let len = batch.len();
        let accepted = tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            accepted = on_batch(batch) => accepted,
        };
        if !accepted {
            outcome.cancelled = true;
            break;
        }
        outcome.batches += 1;
        outcome.rows += len;
        if outcome.batches % yield_every == 0 {
            yield_now().await;
        }
    }
    Ok(outcome)
}

/// Delivery statistics of a finished stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamStats {
    /// Batches received from the producer.
    pub batches_received: usize,
    /// Rows received from the producer.
    pub rows_received: usize,
    /// Callback invocations.
    pub flushes: usize,
    /// Rows handed to the callback.
    pub rows_delivered: usize,
    /// Callback invocations that returned an error or panicked.
    pub callback_failures: usize,
    pub cancelled: bool,
}

/// Orders callback invocations against cancellation.
///
/// A delivery checks the token and runs the callback under `lock`; cancellation
/// flips the token under the same lock. A delivery either starts before the
/// cancel (and the cancel waits for it) or sees the token set.
#[derive(Debug, Default)]
struct DeliveryGate {
    token: CancellationToken,
    lock: Mutex<()>,
}

thread_local! {
    /// The gate whose callback is running on this thread, `0` if none.
    static DELIVERING: Cell<usize> = const { Cell::new(0) };
}

impl DeliveryGate {
    fn id(&self) -> usize {
        self as *const DeliveryGate as usize
    }

    /// Runs `deliver` unless the stream is cancelled.
    fn deliver<R>(&self, deliver: impl FnOnce() -> R) -> Option<R> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.token.is_cancelled() {
            return None;
        }
        let outer = DELIVERING.replace(self.id());
        let result = deliver();
        DELIVERING.set(outer);
        Some(result)
    }

    fn cancel(&self) {
        if DELIVERING.get() == self.id() {
            // Called from inside the callback: the lock is already ours.
            self.token.cancel();
            return;
        }
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.token.cancel();
    }
}

/// Starts streams whose batches reach the caller coalesced per flush tick.
#[derive(Debug, Clone, Default)]
pub struct BatchingClient {
    config: StreamConfig,
}

impl BatchingClient {
    pub fn new(config: StreamConfig) -> Result<BatchingClient> {
        config.validate()?;
        Ok(BatchingClient { config })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Starts generating `spec` on a fresh producer task. `on_batch` receives the
    /// rows in row order, several producer batches possibly merged into one call.
    ///
    /// Must be called from within a tokio runtime.
    pub fn stream_generate<F>(
        &self,
        spec: SyntheticSpec,
        on_batch: F,
    ) -> Result<GenerationStream>
    where
        F: FnMut(Vec<Row>) -> BatchResult + Send + 'static,
    {
        spec.validate()?;
        let gate = Arc::new(DeliveryGate::default());
        let (tx, rx) = mpsc::channel::<Vec<Row>>(self.config.channel_capacity);

        let producer = async_runtime::spawn(generate_stream(
            spec,
            self.config.yield_every_batches,
            gate.token.clone(),
            move |batch| {
                let tx = tx.clone();
                async move { tx.send(batch).await.is_ok() }
            },
        ));
        let canceller = StreamCanceller {
            gate: gate.clone(),
            producer: producer.abort_handle(),
        };
        let consumer = Consumer {
            config: self.config,
            gate,
            rx,
            pending: Vec::new(),
            stats: StreamStats::default(),
        };
        let done = async_runtime::spawn(consumer.run(producer, on_batch));
        log::debug!(
            "stream started: {} rows x {} cols in batches of {}",
            spec.total,
            spec.cols,
            spec.chunk_size
        );
        Ok(GenerationStream { canceller, done })
    }
}

/// Cancels a stream. Cloneable; cancelling more than once, or after the stream
/// completed, does nothing.
#[derive(Debug, Clone)]
pub struct StreamCanceller {
    gate: Arc<DeliveryGate>,
    producer: AbortHandle,
}

impl StreamCanceller {
    /// Marks the stream cancelled, which suppresses every further delivery, and
    /// stops the producer task.
    ///
    /// A delivery already in progress on another thread is waited for. May be
    /// called from within the stream's own callback.
    pub fn cancel(&self) {
        if !self.gate.token.is_cancelled() {
            log::debug!("stream cancelled");
        }
        self.gate.cancel();
        self.producer.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.gate.token.is_cancelled()
    }

    /// Whether the producer task has stopped, by completing or by cancellation.
    pub fn is_producer_finished(&self) -> bool {
        self.producer.is_finished()
    }
}

/// A running stream.
#[derive(Debug)]
pub struct GenerationStream {
    canceller: StreamCanceller,
    done: JoinHandle<StreamStats>,
}

impl GenerationStream {
    pub fn canceller(&self) -> StreamCanceller {
        self.canceller.clone()
    }

    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// Whether the last delivery has happened (or the stream was cancelled).
    pub fn is_finished(&self) -> bool {
        self.done.is_finished()
    }

    /// Waits until the stream completes or is cancelled.
    pub async fn wait(self) -> Result<StreamStats> {
        self.done
            .await
            .map_err(|e| Error::invalid_operation(format!("stream consumer: {e}")))
    }
}

struct Consumer {
    config: StreamConfig,
    gate: Arc<DeliveryGate>,
    rx: mpsc::Receiver<Vec<Row>>,
    /// Batches received but not yet delivered.
    pending: Vec<Vec<Row>>,
    stats: StreamStats,
}

impl Consumer {
    async fn run<F>(
        mut self,
        producer: JoinHandle<Result<GenerationOutcome>>,
        mut on_batch: F,
    ) -> StreamStats
    where
        F: FnMut(Vec<Row>) -> BatchResult,
    {
        let mut ticker = interval(self.config.flush_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.gate.token.cancelled() => break,
                _ = ticker.tick(), if !self.pending.is_empty() => {
                    self.flush(&mut on_batch);
                }
                batch = self.rx.recv() => match batch {
                    Some(batch) => {
                        self.stats.batches_received += 1;
                        self.stats.rows_received += batch.len();
                        self.pending.push(batch);
                    }
                    None => {
                        // Producer is done: deliver the tail.
                        self.flush(&mut on_batch);
                        break;
                    }
                },
            }
        }

        if self.gate.token.is_cancelled() {
            self.stats.cancelled = true;
            self.pending.clear();
            producer.abort();
            // The producer is gone by the time the stream resolves.
            if let Err(e) = producer.await
                && !e.is_cancelled()
            {
                log::warn!("stream producer task failed: {e}");
            }
        } else {
            match producer.await {
                Ok(Ok(outcome)) => log::debug!(
                    "stream completed: {} batches, {} rows, {} flushes",
                    outcome.batches,
                    outcome.rows,
                    self.stats.flushes
                ),
                Ok(Err(e)) => log::warn!("stream producer failed: {e}"),
                Err(e) => log::warn!("stream producer task failed: {e}"),
            }
        }
        self.stats
    }

    fn flush<F>(&mut self, on_batch: &mut F)
    where
        F: FnMut(Vec<Row>) -> BatchResult,
    {
        if self.pending.is_empty() {
            return;
        }
        let merged = {
            let mut batches = self.pending.drain(..);
            let mut merged = batches.next().unwrap_or_default();
            for batch in batches {
                merged.extend(batch);
            }
            merged
        };
        let rows = merged.len();
        let flush_no = self.stats.flushes + 1;

        let Some(outcome) = self
            .gate
            .deliver(|| catch_unwind(AssertUnwindSafe(|| on_batch(merged))))
        else {
            log::trace!("flush #{flush_no} skipped: stream cancelled");
            return;
        };
        self.stats.flushes = flush_no;
        self.stats.rows_delivered += rows;
        log::trace!("flush #{flush_no}: {rows} rows");

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(Error::callback(format!("flush #{flush_no}"), e)),
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "callback panicked".to_string());
                Some(Error::callback(format!("flush #{flush_no}"), message))
            }
        };
        if let Some(e) = failure {
            self.stats.callback_failures += 1;
            log::warn!("{e}");
        }
    }
}
