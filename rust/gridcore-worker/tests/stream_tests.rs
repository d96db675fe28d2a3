use std::{
    sync::{
        Arc, Mutex, OnceLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use gridcore_datagen::{SyntheticSpec, synthetic_row};
use gridcore_text_index::Row;
use gridcore_worker::{BatchingClient, StreamCanceller, StreamConfig};

fn client(flush_ms: u64) -> BatchingClient {
    let config = StreamConfig::default().with_flush_interval(Duration::from_millis(flush_ms));
    BatchingClient::new(config).expect("valid config")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stream_delivers_every_row_in_order() {
    let received = Arc::new(Mutex::new(Vec::<Row>::new()));
    let sink = received.clone();
    let config = StreamConfig::default()
        .with_flush_interval(Duration::from_millis(2))
        .with_yield_every_batches(4);
    let stream = BatchingClient::new(config)
        .unwrap()
        .stream_generate(SyntheticSpec::new(10_000, 5, 500), move |rows| {
            sink.lock().unwrap().extend(rows);
            Ok(())
        })
        .unwrap();
    let stats = tokio::time::timeout(Duration::from_secs(30), stream.wait())
        .await
        .expect("stream completes")
        .unwrap();

    assert_eq!(stats.batches_received, 20);
    assert_eq!(stats.rows_received, 10_000);
    assert_eq!(stats.rows_delivered, 10_000);
    assert!(stats.flushes >= 1 && stats.flushes <= 20);
    assert_eq!(stats.callback_failures, 0);
    assert!(!stats.cancelled);

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 10_000);
    for (i, row) in received.iter().enumerate() {
        assert_eq!(row, &synthetic_row(i as u64, 5));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_ticks_coalesce_batches() {
    let tick = Duration::from_millis(20);
    let sizes = Arc::new(Mutex::new(Vec::<usize>::new()));
    let sink = sizes.clone();
    let started = Instant::now();
    let stream = BatchingClient::new(StreamConfig::default().with_flush_interval(tick))
        .unwrap()
        .stream_generate(SyntheticSpec::new(200_000, 3, 1_000), move |rows| {
            sink.lock().unwrap().push(rows.len());
            Ok(())
        })
        .unwrap();
    let stats = stream.wait().await.unwrap();
    let elapsed = started.elapsed();

    let sizes = sizes.lock().unwrap();
    assert_eq!(stats.batches_received, 200);
    assert_eq!(sizes.iter().sum::<usize>(), 200_000);
    assert_eq!(sizes.len(), stats.flushes);
    assert!(stats.flushes < 200);
    // One delivery per elapsed tick (the first tick fires at once), plus the tail.
    let ticks = (elapsed.as_millis() / tick.as_millis()) as usize;
    assert!(
        stats.flushes <= ticks + 2,
        "{} deliveries in {elapsed:?} with a {tick:?} tick",
        stats.flushes
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_callback_failures_do_not_stop_delivery() {
    let calls = Arc::new(AtomicUsize::new(0));
    let rows_seen = Arc::new(AtomicUsize::new(0));
    let (calls_in, rows_in) = (calls.clone(), rows_seen.clone());
    let stream = client(1)
        .stream_generate(SyntheticSpec::new(1_000, 2, 100), move |rows| {
            rows_in.fetch_add(rows.len(), Ordering::SeqCst);
            match calls_in.fetch_add(1, Ordering::SeqCst) {
                0 => Err("renderer not ready".into()),
                1 => panic!("renderer blew up"),
                _ => Ok(()),
            }
        })
        .unwrap();
    let stats = stream.wait().await.unwrap();

    let calls = calls.load(Ordering::SeqCst);
    assert!(calls >= 2);
    assert_eq!(stats.flushes, calls);
    assert_eq!(stats.callback_failures, calls.min(2));
    assert_eq!(rows_seen.load(Ordering::SeqCst), 1_000);
    assert!(!stats.cancelled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_stops_delivery() {
    let (first_tx, mut first_rx) = tokio::sync::mpsc::unbounded_channel::<usize>();
    let cancelled = Arc::new(AtomicBool::new(false));
    let late_deliveries = Arc::new(AtomicUsize::new(0));
    let (cancelled_in, late_in) = (cancelled.clone(), late_deliveries.clone());

    let total = 500_000;
    let stream = client(1)
        .stream_generate(SyntheticSpec::new(total, 3, 1_000), move |rows| {
            if cancelled_in.load(Ordering::SeqCst) {
                late_in.fetch_add(1, Ordering::SeqCst);
            }
            let _ = first_tx.send(rows.len());
            Ok(())
        })
        .unwrap();
    let canceller = stream.canceller();

    first_rx.recv().await.expect("first delivery");
    stream.cancel();
    cancelled.store(true, Ordering::SeqCst);
    assert!(canceller.is_cancelled());

    let stats = tokio::time::timeout(Duration::from_secs(10), stream.wait())
        .await
        .expect("cancelled stream finishes")
        .unwrap();
    assert!(stats.cancelled);
    assert!(stats.rows_delivered < total);
    assert!(canceller.is_producer_finished());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(late_deliveries.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_delivery_starts_once_cancelled() {
    let late_deliveries = Arc::new(AtomicUsize::new(0));
    for _ in 0..300 {
        let canceller = Arc::new(OnceLock::<StreamCanceller>::new());
        let (first_tx, mut first_rx) = tokio::sync::mpsc::unbounded_channel::<()>();
        let (late_in, canceller_in) = (late_deliveries.clone(), canceller.clone());
        let stream = client(1)
            .stream_generate(SyntheticSpec::new(50_000, 2, 100), move |_| {
                if canceller_in.get().is_some_and(StreamCanceller::is_cancelled) {
                    late_in.fetch_add(1, Ordering::SeqCst);
                }
                let _ = first_tx.send(());
                Ok(())
            })
            .unwrap();
        let _ = canceller.set(stream.canceller());

        first_rx.recv().await.expect("first delivery");
        stream.cancel();
        stream.wait().await.unwrap();
    }
    assert_eq!(late_deliveries.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_from_inside_callback() {
    let canceller = Arc::new(OnceLock::<StreamCanceller>::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let (calls_in, canceller_in) = (calls.clone(), canceller.clone());
    let stream = client(1)
        .stream_generate(SyntheticSpec::new(500_000, 2, 1_000), move |_| {
            calls_in.fetch_add(1, Ordering::SeqCst);
            if let Some(canceller) = canceller_in.get() {
                canceller.cancel();
            }
            Ok(())
        })
        .unwrap();
    let _ = canceller.set(stream.canceller());

    let stats = tokio::time::timeout(Duration::from_secs(10), stream.wait())
        .await
        .expect("stream cancelled by its own callback finishes")
        .unwrap();
    assert!(stats.cancelled);
    assert_eq!(stats.flushes, calls.load(Ordering::SeqCst));
    assert!(stats.flushes <= 2);
}

#[tokio::test]
async fn test_cancel_after_completion_is_noop() {
    let stream = client(1)
        .stream_generate(SyntheticSpec::new(10, 2, 5), |_| Ok(()))
        .unwrap();
    let canceller = stream.canceller();
    let stats = stream.wait().await.unwrap();
    assert_eq!(stats.rows_delivered, 10);
    assert!(!stats.cancelled);

    canceller.cancel();
    canceller.cancel();
    assert!(canceller.is_cancelled());
}

#[tokio::test]
async fn test_empty_and_invalid_streams() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in = calls.clone();
    let stream = client(1)
        .stream_generate(SyntheticSpec::new(0, 3, 10), move |_| {
            calls_in.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();
    let stats = stream.wait().await.unwrap();
    assert_eq!(stats.flushes, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert!(
        client(1)
            .stream_generate(SyntheticSpec::new(10, 3, 0), |_| Ok(()))
            .is_err()
    );
}
