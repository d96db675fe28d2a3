//! Deterministic synthetic rows for load testing.
//!
//! Every cell is a pure function of its row position `i` and column position `c`,
//! so generated datasets are reproducible across runs and across batch sizes. The
//! column kind is selected by `c % 6`:
//!
//! | `c % 6` | value |
//! |---|---|
//! | 0 | `"Row {i}"` |
//! | 1 | `"User {i}-{c}"` |
//! | 2 | integer `(i * 13 + c) % 100000` |
//! | 3 | ISO date, `(i + c) % 365` days after the epoch |
//! | 4 | city name, `CITIES[i % 6]` |
//! | 5 | `"C{c}-{(i * 7) % 9999}"` |

mod synthetic;

pub use synthetic::{
    CITIES, DATE_EPOCH, SyntheticBatches, SyntheticSpec, column_id, column_ids, generate,
    synthetic_row, synthetic_value,
};
