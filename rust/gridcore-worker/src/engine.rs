//! The stateful data engine.

use gridcore_common::{Result, async_runtime::yield_now};
use gridcore_datagen::SyntheticSpec;
use gridcore_ordering::{FilterQuery, FilterScan, Permutation, sort_by_vector};
use gridcore_text_index::{Row, TextIndex, TextIndexBuilder, Value};

use crate::EngineConfig;

/// Owns the text index of the current dataset and serves sort, filter and
/// generation requests against it.
///
/// One engine instance is owned by one execution context (see
/// [`EngineWorker`](crate::EngineWorker)); nothing else reads or writes its state.
/// Every method runs to completion once called. The long-running ones are
/// `async` only so that they can hand control back to the scheduler at bounded
/// intervals.
#[derive(Debug)]
pub struct TableEngine {
    config: EngineConfig,
    index: Option<TextIndex>,
}

impl TableEngine {
    pub fn new(config: EngineConfig) -> Result<TableEngine> {
        config.validate()?;
        Ok(TableEngine {
            config,
            index: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn text_index(&self) -> Option<&TextIndex> {
        self.index.as_ref()
    }

    /// Rows of the last ingest, zero when nothing is ingested.
    pub fn row_count(&self) -> usize {
        self.index.as_ref().map_or(0, TextIndex::len)
    }

    pub fn columns(&self) -> &[String] {
        match &self.index {
            Some(index) => index.columns(),
            None => &[],
        }
    }

    pub fn row_text(&self, row_index: usize) -> Option<&str> {
        self.index.as_ref().and_then(|index| index.text(row_index))
    }

    /// Replaces the text index and column list with ones built from `rows`.
    ///
    /// The previous index is discarded before the build starts. Control is handed
    /// back to the scheduler every `ingest_yield_interval` rows. Returns the new
    /// row count.
    pub async fn ingest(&mut self, rows: &[Row], columns: Vec<String>) -> usize {
        self.index = None;
        let interval = self.config.ingest_yield_interval;
        let mut builder =
            TextIndexBuilder::with_capacity(columns, self.config.text_index, rows.len());
        for chunk in rows.chunks(interval) {
            builder.extend(chunk);
            if builder.len() < rows.len() {
                yield_now().await;
            }
        }
        let index = builder.finish();
        let row_count = index.len();
        self.index = Some(index);
        log::debug!("ingested {row_count} rows");
        row_count
    }

    /// Recomputes the text of one row. Returns `false` without touching anything
    /// when there is no index or `row_index` is out of range.
    pub fn update_row_text(&mut self, row_index: usize, row: &Row) -> bool {
        let updated = self
            .index
            .as_mut()
            .is_some_and(|index| index.update_row(row_index, row));
        if !updated {
            log::trace!("ignored text update for row {row_index}");
        }
        updated
    }

    /// Drops the index, the column list and the row count.
    pub fn reset(&mut self) {
        if self.index.take().is_some() {
            log::debug!("engine reset");
        }
    }

    /// See [`gridcore_ordering::sort_by_vector`]. Independent of the index: the
    /// result always has `values.len()` entries.
    pub fn sort_by_vector(&self, values: &[Value], descending: bool) -> Permutation {
        sort_by_vector(values, descending)
    }

    /// Substring filter over the indexed row text.
    ///
    /// An empty query, or a call before any ingest, hands `order` back unchanged
    /// (`None` meaning "all rows, unfiltered"). Otherwise `order` is narrowed in
    /// place, or, when absent, all rows are scanned in ascending order. Large scans
    /// yield every `filter_yield_interval` candidates.
    pub async fn global_filter(
        &self,
        query: &str,
        order: Option<Permutation>,
    ) -> Option<Permutation> {
        let Some(query) = FilterQuery::parse(query) else {
            return order;
        };
        let Some(index) = self.index.as_ref() else {
            return order;
        };
        let mut scan = match order {
            Some(order) => FilterScan::over_order(query, order),
            None => FilterScan::over_rows(query, index.len()),
        };
        while !scan.step(index, self.config.filter_yield_interval) {
            yield_now().await;
        }
        let result = scan.finish();
        log::debug!("filter matched {} rows", result.len());
        Some(result)
    }

    /// Bulk synthetic generation.
    pub fn generate(&self, spec: SyntheticSpec) -> Result<Vec<Row>> {
        gridcore_datagen::generate(spec.total, spec.cols, spec.chunk_size)
    }
}
