//! Owned row-index buffers.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// An ordered, duplicate-free sequence of row indices.
///
/// Depending on where it came from it is a total order over all rows (sort), an
/// ascending subset (filter over the full range) or a subset that keeps the
/// relative order of a prior permutation. Permutations have no identity of their
/// own; they are moved between the engine and its caller without copying.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permutation(Vec<u32>);

impl Permutation {
    pub fn new() -> Permutation {
        Permutation(Vec::new())
    }

    /// `0..len` in ascending order.
    pub fn identity(len: usize) -> Permutation {
        Permutation((0..len as u32).collect())
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.0
    }

    /// Whether the buffer is a permutation of `0..len`.
    pub fn is_permutation_of(&self, len: usize) -> bool {
        if self.0.len() != len {
            return false;
        }
        let mut seen = vec![false; len];
        for &i in &self.0 {
            match seen.get_mut(i as usize) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        true
    }
}

impl Deref for Permutation {
    type Target = [u32];

    fn deref(&self) -> &[u32] {
        &self.0
    }
}

impl From<Vec<u32>> for Permutation {
    fn from(indices: Vec<u32>) -> Self {
        Permutation(indices)
    }
}

impl From<Permutation> for Vec<u32> {
    fn from(permutation: Permutation) -> Self {
        permutation.0
    }
}

impl FromIterator<u32> for Permutation {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Permutation(iter.into_iter().collect())
    }
}
