//! Mailbox-driven execution context for a [`TableEngine`].
//!
//! [`EngineWorker::spawn`] moves a fresh engine into its own task. Callers talk to
//! it through cloneable [`EngineClient`] handles: every call is a message in the
//! worker's mailbox plus a oneshot reply channel. Messages are handled strictly in
//! the order they were sent, one at a time, so ingest, update, sort and filter
//! calls never interleave.
//!
//! Rows go in as `Arc<[Row]>` (the caller keeps its dataset) and permutations come
//! back by value, so neither crosses the boundary by copy.

use std::sync::Arc;

use gridcore_common::{
    Result,
    async_runtime::{self, JoinHandle},
    error::Error,
};
use gridcore_datagen::SyntheticSpec;
use gridcore_ordering::Permutation;
use gridcore_text_index::{Row, Value};
use tokio::sync::{mpsc, oneshot};

use crate::{EngineConfig, TableEngine};

/// A snapshot of the engine state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineStatus {
    pub row_count: usize,
    pub columns: Vec<String>,
    /// `false` before the first ingest and after a reset.
    pub indexed: bool,
}

enum Request {
    Ingest {
        rows: Arc<[Row]>,
        columns: Vec<String>,
        reply: oneshot::Sender<usize>,
    },
    UpdateRowText {
        row_index: usize,
        row: Row,
        reply: oneshot::Sender<bool>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    Sort {
        values: Vec<Value>,
        descending: bool,
        reply: oneshot::Sender<Permutation>,
    },
    Filter {
        query: String,
        order: Option<Permutation>,
        reply: oneshot::Sender<Option<Permutation>>,
    },
    Generate {
        spec: SyntheticSpec,
        reply: oneshot::Sender<Result<Vec<Row>>>,
    },
    RowText {
        row_index: usize,
        reply: oneshot::Sender<Option<String>>,
    },
    Status {
        reply: oneshot::Sender<EngineStatus>,
    },
    Shutdown,
}

impl Request {
    fn name(&self) -> &'static str {
        match self {
            Request::Ingest { .. } => "ingest",
            Request::UpdateRowText { .. } => "update_row_text",
            Request::Reset { .. } => "reset",
            Request::Sort { .. } => "sort_by_vector",
            Request::Filter { .. } => "global_filter",
            Request::Generate { .. } => "generate",
            Request::RowText { .. } => "row_text",
            Request::Status { .. } => "status",
            Request::Shutdown => "shutdown",
        }
    }
}

/// A running engine task.
pub struct EngineWorker {
    client: EngineClient,
    handle: JoinHandle<()>,
}

impl EngineWorker {
    /// Starts a new engine on the current runtime.
    pub fn spawn(config: EngineConfig) -> Result<EngineWorker> {
        let engine = TableEngine::new(config)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = async_runtime::spawn(Self::run(engine, rx));
        Ok(EngineWorker {
            client: EngineClient { mailbox: tx },
            handle,
        })
    }

    pub fn client(&self) -> EngineClient {
        self.client.clone()
    }

    /// Asks the worker to stop after the requests already queued and waits for it.
    pub async fn shutdown(self) {
        let _ = self.client.mailbox.send(Request::Shutdown);
        if let Err(e) = self.handle.await {
            log::warn!("engine worker ended abnormally: {e}");
        }
    }

    /// Stops the worker without draining its mailbox. Pending calls fail with
    /// [`ErrorKind::WorkerClosed`](gridcore_common::error::ErrorKind::WorkerClosed).
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    async fn run(mut engine: TableEngine, mut mailbox: mpsc::UnboundedReceiver<Request>) {
        log::debug!("engine worker started");
        while let Some(request) = mailbox.recv().await {
            log::trace!("engine worker: {}", request.name());
            // A dropped reply receiver means the caller gave up on the result.
            match request {
                Request::Ingest {
                    rows,
                    columns,
                    reply,
                } => {
                    let row_count = engine.ingest(&rows, columns).await;
                    let _ = reply.send(row_count);
                }
                Request::UpdateRowText {
                    row_index,
                    row,
                    reply,
                } => {
                    let _ = reply.send(engine.update_row_text(row_index, &row));
                }
                Request::Reset { reply } => {
                    engine.reset();
                    let _ = reply.send(());
                }
                Request::Sort {
                    values,
                    descending,
                    reply,
                } => {
                    let _ = reply.send(engine.sort_by_vector(&values, descending));
                }
                Request::Filter {
                    query,
                    order,
                    reply,
                } => {
                    let result = engine.global_filter(&query, order).await;
                    let _ = reply.send(result);
                }
                Request::Generate { spec, reply } => {
                    let _ = reply.send(engine.generate(spec));
                }
                Request::RowText { row_index, reply } => {
                    let _ = reply.send(engine.row_text(row_index).map(str::to_string));
                }
                Request::Status { reply } => {
                    let _ = reply.send(EngineStatus {
                        row_count: engine.row_count(),
                        columns: engine.columns().to_vec(),
                        indexed: engine.text_index().is_some(),
                    });
                }
                Request::Shutdown => break,
            }
        }
        log::debug!("engine worker stopped");
    }
}

/// Handle for submitting requests to an [`EngineWorker`].
///
/// The worker keeps running while any client (or the worker handle) is alive.
#[derive(Clone)]
pub struct EngineClient {
    mailbox: mpsc::UnboundedSender<Request>,
}

impl EngineClient {
    async fn call<R>(&self, make: impl FnOnce(oneshot::Sender<R>) -> Request) -> Result<R> {
        let (tx, rx) = oneshot::channel();
        let request = make(tx);
        let name = request.name();
        self.mailbox
            .send(request)
            .map_err(|_| Error::worker_closed(name))?;
        rx.await.map_err(|_| Error::worker_closed(name))
    }

    /// Replaces the worker's text index with one built from `rows`. Returns the
    /// new row count.
    pub async fn ingest(
        &self,
        rows: impl Into<Arc<[Row]>>,
        columns: Vec<String>,
    ) -> Result<usize> {
        let rows = rows.into();
        self.call(|reply| Request::Ingest {
            rows,
            columns,
            reply,
        })
        .await
    }

    /// Recomputes the text of one row; `Ok(false)` when the row index is out of
    /// range or nothing is ingested.
    pub async fn update_row_text(&self, row_index: usize, row: Row) -> Result<bool> {
        self.call(|reply| Request::UpdateRowText {
            row_index,
            row,
            reply,
        })
        .await
    }

    pub async fn reset(&self) -> Result<()> {
        self.call(|reply| Request::Reset { reply }).await
    }

    pub async fn sort_by_vector(
        &self,
        values: Vec<Value>,
        descending: bool,
    ) -> Result<Permutation> {
        self.call(|reply| Request::Sort {
            values,
            descending,
            reply,
        })
        .await
    }

    /// See [`TableEngine::global_filter`].
    pub async fn global_filter(
        &self,
        query: impl Into<String>,
        order: Option<Permutation>,
    ) -> Result<Option<Permutation>> {
        let query = query.into();
        self.call(|reply| Request::Filter {
            query,
            order,
            reply,
        })
        .await
    }

    pub async fn generate(&self, spec: SyntheticSpec) -> Result<Vec<Row>> {
        self.call(|reply| Request::Generate { spec, reply }).await?
    }

    pub async fn row_text(&self, row_index: usize) -> Result<Option<String>> {
        self.call(|reply| Request::RowText { row_index, reply }).await
    }

    pub async fn status(&self) -> Result<EngineStatus> {
        self.call(|reply| Request::Status { reply }).await
    }

    /// Whether the worker has stopped accepting requests.
    pub fn is_closed(&self) -> bool {
        self.mailbox.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use gridcore_datagen::column_ids;

    use super::*;

    #[tokio::test]
    async fn test_round_trip_through_mailbox() {
        let worker = EngineWorker::spawn(EngineConfig::default()).unwrap();
        let client = worker.client();

        let rows = gridcore_datagen::generate(20, 6, 20).unwrap();
        assert_eq!(client.ingest(rows, column_ids(6)).await.unwrap(), 20);

        let status = client.status().await.unwrap();
        assert_eq!(status.row_count, 20);
        assert!(status.indexed);
        assert_eq!(status.columns.len(), 6);

        let hits = client.global_filter("row 1", None).await.unwrap().unwrap();
        // "row 1" and "row 10".."row 19"
        assert_eq!(hits.len(), 11);

        let sorted = client
            .sort_by_vector(vec![Value::Int(3), Value::Int(1), Value::Int(2)], true)
            .await
            .unwrap();
        assert_eq!(sorted.as_slice(), &[0, 2, 1]);

        assert!(!client.is_closed());
        worker.shutdown().await;
        assert!(client.is_closed());
        assert!(client.status().await.unwrap_err().is_worker_closed());
    }

    #[tokio::test]
    async fn test_requests_processed_in_submission_order() {
        let config = EngineConfig::default().with_ingest_yield_interval(2);
        let worker = EngineWorker::spawn(config).unwrap();
        let client = worker.client();
        let rows: Vec<Row> = (0..100)
            .map(|i| Row::from_iter([("c0", Value::from(format!("item {i}")))]))
            .collect();

        // Submitted without awaiting in between: the filter must observe the
        // completed ingest, and the reset must come after the filter.
        let ingest = client.ingest(rows, column_ids(1));
        let filter = client.global_filter("item 9", None);
        let reset = client.reset();
        let status = client.status();
        let (ingested, filtered, reset, status) = tokio::join!(ingest, filter, reset, status);

        assert_eq!(ingested.unwrap(), 100);
        assert_eq!(filtered.unwrap().unwrap().len(), 11);
        reset.unwrap();
        assert_eq!(status.unwrap(), EngineStatus::default());
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_update_row_text_via_client() {
        let worker = EngineWorker::spawn(EngineConfig::default()).unwrap();
        let client = worker.client();
        assert!(!client.update_row_text(0, Row::new()).await.unwrap());

        let rows = vec![
            Row::from_iter([("c0", "first")]),
            Row::from_iter([("c0", "second")]),
        ];
        client.ingest(rows, column_ids(1)).await.unwrap();
        let edit = Row::from_iter([("c0", "Second Edit")]);
        assert!(client.update_row_text(1, edit.clone()).await.unwrap());
        let once = client.row_text(1).await.unwrap();
        assert!(client.update_row_text(1, edit).await.unwrap());
        assert_eq!(client.row_text(1).await.unwrap(), once);
        assert_eq!(once.as_deref(), Some("second edit"));
        assert!(!client.update_row_text(5, Row::new()).await.unwrap());
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_generate_errors_propagate() {
        let worker = EngineWorker::spawn(EngineConfig::default()).unwrap();
        let client = worker.client();
        let rows = client.generate(SyntheticSpec::new(3, 6, 2)).await.unwrap();
        assert_eq!(rows, gridcore_datagen::generate(3, 6, 2).unwrap());
        let err = client
            .generate(SyntheticSpec::new(3, 6, 0))
            .await
            .unwrap_err();
        assert!(!err.is_worker_closed());
        worker.shutdown().await;
    }

    #[test]
    fn test_spawn_rejects_invalid_config() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        runtime.block_on(async {
            let config = EngineConfig::default().with_filter_yield_interval(0);
            assert!(EngineWorker::spawn(config).is_err());
        });
    }
}
