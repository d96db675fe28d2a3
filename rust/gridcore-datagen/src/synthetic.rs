use chrono::{Days, NaiveDate};
use gridcore_common::{Result, verify_arg};
use gridcore_text_index::{Row, Value};
use serde::{Deserialize, Serialize};

/// City names used by the `c % 6 == 4` column kind.
pub const CITIES: [&str; 6] = ["KL", "Penang", "JB", "Ipoh", "Kuching", "Melaka"];

/// Day zero of the date column kind, as `(year, month, day)`.
pub const DATE_EPOCH: (i32, u32, u32) = (2020, 12, 29);

/// Column identifier of column position `c`.
pub fn column_id(c: usize) -> String {
    format!("c{c}")
}

/// Column identifiers `c0..c{cols - 1}`.
pub fn column_ids(cols: usize) -> Vec<String> {
    (0..cols).map(column_id).collect()
}

/// The value at row `i`, column `c`.
pub fn synthetic_value(i: u64, c: u64) -> Value {
    match c % 6 {
        0 => Value::Text(format!("Row {i}")),
        1 => Value::Text(format!("User {i}-{c}")),
        2 => Value::Int(((i * 13 + c) % 100_000) as i64),
        3 => Value::Text(calendar_date((i + c) % 365)),
        4 => Value::Text(CITIES[(i % 6) as usize].to_string()),
        _ => Value::Text(format!("C{c}-{}", (i * 7) % 9999)),
    }
}

/// Row `i` with `cols` columns.
pub fn synthetic_row(i: u64, cols: usize) -> Row {
    let mut row = Row::with_capacity(cols);
    for c in 0..cols {
        row.insert(column_id(c), synthetic_value(i, c as u64));
    }
    row
}

fn calendar_date(offset_days: u64) -> String {
    let (year, month, day) = DATE_EPOCH;
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|epoch| epoch.checked_add_days(Days::new(offset_days)))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Shape of a synthetic dataset request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    /// Number of rows.
    pub total: usize,
    /// Number of columns per row.
    pub cols: usize,
    /// Rows per batch.
    pub chunk_size: usize,
}

impl SyntheticSpec {
    pub fn new(total: usize, cols: usize, chunk_size: usize) -> SyntheticSpec {
        SyntheticSpec {
            total,
            cols,
            chunk_size,
        }
    }

    pub fn validate(&self) -> Result<()> {
        verify_arg!(chunk_size, self.chunk_size > 0);
        Ok(())
    }

    /// Number of batches a full generation produces.
    pub fn batch_count(&self) -> usize {
        if self.chunk_size == 0 {
            0
        } else {
            self.total.div_ceil(self.chunk_size)
        }
    }

    pub fn batches(&self) -> Result<SyntheticBatches> {
        SyntheticBatches::new(*self)
    }
}

/// Iterator over the batches of a synthetic dataset, in row order.
///
/// All batches hold `chunk_size` rows except possibly the last one.
#[derive(Debug, Clone)]
pub struct SyntheticBatches {
    spec: SyntheticSpec,
    next: usize,
}

impl SyntheticBatches {
    pub fn new(spec: SyntheticSpec) -> Result<SyntheticBatches> {
        spec.validate()?;
        Ok(SyntheticBatches { spec, next: 0 })
    }

    pub fn spec(&self) -> &SyntheticSpec {
        &self.spec
    }

    /// Row position of the first row of the next batch.
    pub fn position(&self) -> usize {
        self.next
    }

    pub fn remaining_rows(&self) -> usize {
        self.spec.total - self.next
    }
}

impl Iterator for SyntheticBatches {
    type Item = Vec<Row>;

    fn next(&mut self) -> Option<Vec<Row>> {
        if self.next >= self.spec.total {
            return None;
        }
        let end = (self.next + self.spec.chunk_size).min(self.spec.total);
        let batch = (self.next..end)
            .map(|i| synthetic_row(i as u64, self.spec.cols))
            .collect();
        self.next = end;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining_rows().div_ceil(self.spec.chunk_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SyntheticBatches {}

/// Generates the whole dataset at once. `chunk_size` only affects how the rows
/// are produced internally, never their values.
pub fn generate(total: usize, cols: usize, chunk_size: usize) -> Result<Vec<Row>> {
    let mut rows = Vec::with_capacity(total);
    for batch in SyntheticSpec::new(total, cols, chunk_size).batches()? {
        rows.extend(batch);
    }
    Ok(rows)
}
