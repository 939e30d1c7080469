// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

use serde::{Deserialize, Serialize};
use std::cmp::{max, min};
use std::fmt;

/// A closed range of SNP column indices, `[start_index, end_index()]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexedSnpInterval {
    /// First column of the interval.
    pub start_index: usize,
    /// Number of columns covered; at least one for every scanner output.
    pub extent_in_indices: usize,
}

impl IndexedSnpInterval {
    /// Build from a start column and a column count.
    pub fn new(start_index: usize, extent_in_indices: usize) -> Self {
        IndexedSnpInterval {
            start_index,
            extent_in_indices,
        }
    }

    /// Build from inclusive first and last columns.
    pub fn from_bounds(start_index: usize, end_index: usize) -> Self {
        assert!(end_index >= start_index);
        IndexedSnpInterval::new(start_index, end_index - start_index + 1)
    }

    /// The last column of the interval (inclusive).  The extent must be at
    /// least one; see [`Self::checked_end_index`] for caller-supplied
    /// intervals.
    pub fn end_index(&self) -> usize {
        self.start_index + self.extent_in_indices - 1
    }

    /// The last column, or None for an empty (or overflowing) interval.
    pub fn checked_end_index(&self) -> Option<usize> {
        self.extent_in_indices
            .checked_sub(1)
            .and_then(|k| self.start_index.checked_add(k))
    }

    /// Does this interval cover all of `other`?
    pub fn contains(&self, other: &IndexedSnpInterval) -> bool {
        self.start_index <= other.start_index && other.end_index() <= self.end_index()
    }

    /// Does this interval cover column `index`?
    pub fn contains_index(&self, index: usize) -> bool {
        self.start_index <= index && index <= self.end_index()
    }

    /// Do the two intervals share at least one column?
    pub fn intersects(&self, other: &IndexedSnpInterval) -> bool {
        self.start_index <= other.end_index() && other.start_index <= self.end_index()
    }

    /// The shared columns, if any.
    pub fn intersection(&self, other: &IndexedSnpInterval) -> Option<IndexedSnpInterval> {
        if !self.intersects(other) {
            return None;
        }
        Some(IndexedSnpInterval::from_bounds(
            max(self.start_index, other.start_index),
            min(self.end_index(), other.end_index()),
        ))
    }
}

impl fmt::Display for IndexedSnpInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.checked_end_index() {
            Some(end) => write!(f, "[{}, {}]", self.start_index, end),
            None => write!(f, "[{}, +{}]", self.start_index, self.extent_in_indices),
        }
    }
}

/// The chromosome and base-pair position of one SNP column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnpPosition {
    /// Chromosome name, e.g. "1" or "X".
    pub chromosome: String,
    /// One-based base-pair position.
    pub position_bp: u64,
}

/// A base-pair range on one chromosome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BasePairInterval {
    /// Chromosome name.
    pub chromosome: String,
    /// First base pair covered.
    pub start_bp: u64,
    /// Number of base pairs covered.
    pub extent_bp: u64,
}

impl BasePairInterval {
    /// The last base pair covered (inclusive).
    pub fn end_bp(&self) -> u64 {
        self.start_bp + self.extent_bp - 1
    }

    /// Do the two ranges share a base pair?
    pub fn intersects(&self, other: &BasePairInterval) -> bool {
        self.chromosome == other.chromosome
            && self.start_bp <= other.end_bp()
            && other.start_bp <= self.end_bp()
    }
}

/// Maps SNP column indices to physical positions.
pub trait PositionLookup {
    /// Position of column `index`, or None past the last column.
    fn position(&self, index: usize) -> Option<&SnpPosition>;
}

impl PositionLookup for [SnpPosition] {
    fn position(&self, index: usize) -> Option<&SnpPosition> {
        self.get(index)
    }
}

impl PositionLookup for Vec<SnpPosition> {
    fn position(&self, index: usize) -> Option<&SnpPosition> {
        self.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_algebra() {
        let a = IndexedSnpInterval::from_bounds(2, 6);
        let b = IndexedSnpInterval::from_bounds(5, 9);
        let c = IndexedSnpInterval::from_bounds(7, 7);
        assert_eq!(a.extent_in_indices, 5);
        assert_eq!(a.end_index(), 6);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(b.contains(&c));
        assert!(!c.contains(&b));
        assert_eq!(a.intersection(&b), Some(IndexedSnpInterval::from_bounds(5, 6)));
        assert_eq!(a.intersection(&c), None);
        assert_eq!(a.to_string(), "[2, 6]");
        assert_eq!(a.checked_end_index(), Some(6));
        let empty = IndexedSnpInterval::new(3, 0);
        assert_eq!(empty.checked_end_index(), None);
        assert_eq!(empty.to_string(), "[3, +0]");
        assert_eq!(IndexedSnpInterval::new(usize::MAX, 2).checked_end_index(), None);
    }

    #[test]
    fn test_interval_order() {
        let mut v = vec![
            IndexedSnpInterval::new(4, 1),
            IndexedSnpInterval::new(0, 3),
            IndexedSnpInterval::new(0, 2),
        ];
        v.sort();
        assert_eq!(
            v,
            vec![
                IndexedSnpInterval::new(0, 2),
                IndexedSnpInterval::new(0, 3),
                IndexedSnpInterval::new(4, 1)
            ]
        );
    }

    #[test]
    fn test_base_pair_interval() {
        let a = BasePairInterval {
            chromosome: "1".to_string(),
            start_bp: 100,
            extent_bp: 50,
        };
        let b = BasePairInterval {
            chromosome: "1".to_string(),
            start_bp: 149,
            extent_bp: 1,
        };
        let c = BasePairInterval {
            chromosome: "2".to_string(),
            ..a.clone()
        };
        assert_eq!(a.end_bp(), 149);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
