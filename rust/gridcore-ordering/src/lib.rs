//! Row orderings: sort permutations and substring filtering over a [`TextIndex`].
//!
//! Both engines produce a [`Permutation`], an owned buffer of row indices that the
//! caller takes by value. Sorting is independent of the text index and works on any
//! value vector aligned with the rows; filtering narrows either the full row range
//! or a prior permutation to rows whose indexed text contains the query.
//!
//! [`TextIndex`]: gridcore_text_index::TextIndex

pub mod filter;
pub mod permutation;
pub mod sort;

pub use filter::{FilterQuery, FilterScan, global_filter};
pub use permutation::Permutation;
pub use sort::{SortMode, compare_values, detect_sort_mode, sort_by_vector};
