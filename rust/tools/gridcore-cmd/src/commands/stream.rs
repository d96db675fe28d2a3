use std::{
    sync::{
        Arc, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use anyhow::Result;
use gridcore_datagen::SyntheticSpec;
use gridcore_worker::{BatchingClient, StreamCanceller, StreamConfig};

pub async fn run(
    rows: usize,
    cols: usize,
    chunk: usize,
    flush_ms: u64,
    cancel_after: Option<usize>,
) -> Result<()> {
    let config = StreamConfig::default().with_flush_interval(Duration::from_millis(flush_ms));
    let client = BatchingClient::new(config)?;

    let deliveries = Arc::new(AtomicUsize::new(0));
    let canceller: Arc<OnceLock<StreamCanceller>> = Arc::new(OnceLock::new());
    let callback_deliveries = deliveries.clone();
    let callback_canceller = canceller.clone();

    let started = Instant::now();
    let stream = client.stream_generate(SyntheticSpec::new(rows, cols, chunk), move |batch| {
        let n = callback_deliveries.fetch_add(1, Ordering::SeqCst) + 1;
        log::info!("delivery #{n}: {} rows", batch.len());
        if cancel_after.is_some_and(|limit| n >= limit)
            && let Some(canceller) = callback_canceller.get()
        {
            canceller.cancel();
        }
        Ok(())
    })?;
    let _ = canceller.set(stream.canceller());

    let stats = stream.wait().await?;
    println!("elapsed:            {:?}", started.elapsed());
    println!("batches received:   {}", stats.batches_received);
    println!("rows received:      {}", stats.rows_received);
    println!("deliveries:         {}", stats.flushes);
    println!("rows delivered:     {}", stats.rows_delivered);
    println!("callback failures:  {}", stats.callback_failures);
    println!("cancelled:          {}", stats.cancelled);
    Ok(())
}
