use std::time::Instant;

use anyhow::{Result, bail};
use gridcore_datagen::{SyntheticSpec, column_ids};
use gridcore_text_index::{Row, Value};
use gridcore_worker::{EngineConfig, EngineWorker};

fn sort_vector(rows: &[Row], column: &str) -> Vec<Value> {
    rows.iter()
        .map(|row| row.get(column).cloned().unwrap_or_default())
        .collect()
}

pub async fn run(
    rows: usize,
    cols: usize,
    sort_col: String,
    desc: bool,
    query: String,
) -> Result<()> {
    let columns = column_ids(cols);
    if !columns.contains(&sort_col) {
        bail!(
            "Unknown sort column '{sort_col}', expected one of c0..c{}",
            cols.saturating_sub(1)
        );
    }

    let worker = EngineWorker::spawn(EngineConfig::default())?;
    let engine = worker.client();

    let started = Instant::now();
    let dataset = engine
        .generate(SyntheticSpec::new(rows, cols, 10_000))
        .await?;
    let generate_time = started.elapsed();
    let values = sort_vector(&dataset, &sort_col);

    let started = Instant::now();
    let row_count = engine.ingest(dataset, columns).await?;
    let ingest_time = started.elapsed();

    let started = Instant::now();
    let sorted = engine.sort_by_vector(values, desc).await?;
    let sort_time = started.elapsed();

    let started = Instant::now();
    let filtered = engine.global_filter(query.as_str(), Some(sorted)).await?;
    let filter_time = started.elapsed();
    let matched = filtered.map_or(row_count, |p| p.len());

    println!("rows:      {row_count}");
    println!("generate:  {generate_time:?}");
    println!("ingest:    {ingest_time:?}");
    println!(
        "sort:      {sort_time:?} ({sort_col}, {})",
        if desc { "desc" } else { "asc" }
    );
    println!("filter:    {filter_time:?} ('{query}' matched {matched} rows)");

    worker.shutdown().await;
    Ok(())
}
