//! Substring filtering of row positions against a [`TextIndex`].
//!
//! Matching is a plain, case-insensitive `contains` on the indexed row text: no
//! tokenization, no fuzziness. The scan is resumable ([`FilterScan::step`]) so that
//! an async owner can bound the time spent between scheduling points on very large
//! datasets.

use gridcore_text_index::TextIndex;

use crate::Permutation;

/// A normalized (trimmed, lowercased), non-empty filter query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterQuery {
    needle: String,
}

impl FilterQuery {
    /// Normalizes `query`; `None` when nothing is left to match after trimming.
    pub fn parse(query: &str) -> Option<FilterQuery> {
        let needle = query.trim().to_lowercase();
        (!needle.is_empty()).then_some(FilterQuery { needle })
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn matches(&self, text: &str) -> bool {
        text.contains(self.needle.as_str())
    }
}

/// A filter pass in progress.
#[derive(Debug)]
pub struct FilterScan {
    query: FilterQuery,
    source: ScanSource,
}

#[derive(Debug)]
enum ScanSource {
    /// Ascending scan of `next..end`, matches collected in `matches`.
    Rows {
        next: usize,
        end: usize,
        matches: Vec<u32>,
    },
    /// Walk over a prior permutation, compacting matches to the front of its own buffer.
    Order {
        indices: Vec<u32>,
        read: usize,
        write: usize,
    },
}

impl FilterScan {
    /// Scans all rows `0..row_count` in ascending order.
    pub fn over_rows(query: FilterQuery, row_count: usize) -> FilterScan {
        FilterScan {
            query,
            source: ScanSource::Rows {
                next: 0,
                end: row_count,
                matches: Vec::new(),
            },
        }
    }

    /// Narrows `order`, keeping the relative order of the surviving entries.
    pub fn over_order(query: FilterQuery, order: Permutation) -> FilterScan {
        FilterScan {
            query,
            source: ScanSource::Order {
                indices: order.into_vec(),
                read: 0,
                write: 0,
            },
        }
    }

    /// Examines up to `budget` more candidates. Returns `true` once every
    /// candidate has been examined.
    ///
    /// Candidates whose row index has no text in `index` (stale permutation
    /// entries) are dropped.
    pub fn step(&mut self, index: &TextIndex, budget: usize) -> bool {
        let budget = budget.max(1);
        let query = &self.query;
        match &mut self.source {
            ScanSource::Rows { next, end, matches } => {
                let stop = (*next).saturating_add(budget).min(*end);
                for row in *next..stop {
                    if index.text(row).is_some_and(|text| query.matches(text)) {
                        matches.push(row as u32);
                    }
                }
                *next = stop;
                *next >= *end
            }
            ScanSource::Order {
                indices,
                read,
                write,
            } => {
                let stop = (*read).saturating_add(budget).min(indices.len());
                for pos in *read..stop {
                    let row = indices[pos];
                    if index
                        .text(row as usize)
                        .is_some_and(|text| query.matches(text))
                    {
                        indices[*write] = row;
                        *write += 1;
                    }
                }
                *read = stop;
                *read >= indices.len()
            }
        }
    }

    pub fn is_done(&self) -> bool {
        match &self.source {
            ScanSource::Rows { next, end, .. } => next >= end,
            ScanSource::Order { indices, read, .. } => *read >= indices.len(),
        }
    }

    /// Runs the scan to completion in one go.
    pub fn run(mut self, index: &TextIndex) -> Permutation {
        self.step(index, usize::MAX);
        self.finish()
    }

    /// The matches found so far. Candidates not yet examined are not included.
    pub fn finish(self) -> Permutation {
        match self.source {
            ScanSource::Rows { matches, .. } => Permutation::from(matches),
            ScanSource::Order {
                mut indices, write, ..
            } => {
                indices.truncate(write);
                Permutation::from(indices)
            }
        }
    }
}

/// One-shot global filter.
///
/// With an empty (after trimming) query, or with no index (nothing ingested yet,
/// or the engine was reset), `order` is handed back unchanged: `None` stays
/// `None`, the "unfiltered, full range" marker. Otherwise the result is always
/// `Some`: the matches of `order` in their given order, or the matching rows in
/// ascending order when no `order` was supplied.
pub fn global_filter(
    index: Option<&TextIndex>,
    query: &str,
    order: Option<Permutation>,
) -> Option<Permutation> {
    let Some(query) = FilterQuery::parse(query) else {
        return order;
    };
    let Some(index) = index else {
        return order;
    };
    let scan = match order {
        Some(order) => FilterScan::over_order(query, order),
        None => FilterScan::over_rows(query, index.len()),
    };
    Some(scan.run(index))
}
