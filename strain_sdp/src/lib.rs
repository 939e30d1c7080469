//! strain_sdp
// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.
#![deny(missing_docs)]

//! Strain distribution patterns.
//!
//! A strain distribution pattern (SDP) records, for one SNP column, which of
//! the N strains in a fixed universe carry the minority allele.  Everything
//! downstream (interval scanning, haplotype tracking, phylogeny building)
//! works on these bit vectors, so this crate also owns the strain universe
//! and the rules that turn raw allele calls into SDPs and allele groups.

mod alleles;
mod sdp;

pub use alleles::{allele_groups, groups_from_sdp, sdp_from_calls, validate_groups};
pub use sdp::{normalize_minority, Sdp};

use std::collections::HashMap;

/// Failures raised when SDP input violates a structural precondition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SdpError {
    /// A column disagrees with the strain count established up front.
    #[error("column {column} has {actual} strains but the strain universe has {expected}")]
    StrainCountMismatch {
        /// The size of the strain universe.
        expected: usize,
        /// The size reported by the offending column.
        actual: usize,
        /// Index of the offending column.
        column: usize,
    },

    /// The operation needs at least one strain.
    #[error("the strain universe is empty")]
    EmptyUniverse,

    /// Two allele groups of one column share a strain.
    #[error("allele groups of column {column} are not disjoint")]
    OverlappingGroups {
        /// Index of the offending column.
        column: usize,
    },

    /// The allele groups of one column leave a strain unassigned.
    #[error("allele groups of column {column} do not cover all strains")]
    GroupsDoNotCoverStrains {
        /// Index of the offending column.
        column: usize,
    },

    /// More than two distinct allele symbols where a biallelic column is required.
    #[error("expected at most two allele symbols but found {symbols:?}")]
    NotBiallelic {
        /// The distinct symbols, in first-seen order.
        symbols: Vec<char>,
    },
}

/// The ordered set of strains under analysis.  Strains are referred to
/// everywhere else by their index in this list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrainUniverse {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl StrainUniverse {
    /// Build a universe from strain names, in the given order.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        StrainUniverse { names, index }
    }

    /// Number of strains.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if there are no strains.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of strain `i`.
    pub fn name(&self, i: usize) -> &str {
        &self.names[i]
    }

    /// All strain names in universe order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Index of the named strain, if it is part of the universe.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Names of the strains set in `sdp`, in universe order.
    pub fn names_of<'a>(&'a self, sdp: &'a Sdp) -> impl Iterator<Item = &'a str> + 'a {
        sdp.indices().map(move |i| self.name(i))
    }

    /// An SDP over this universe with every strain set.
    pub fn full(&self) -> Sdp {
        Sdp::full(self.len())
    }

    /// Check that `sdp` is defined over a universe of this size.
    pub fn check(&self, sdp: &Sdp, column: usize) -> Result<(), SdpError> {
        if sdp.len() != self.len() {
            return Err(SdpError::StrainCountMismatch {
                expected: self.len(),
                actual: sdp.len(),
                column,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universe_lookup() {
        let u = StrainUniverse::new(["A", "B", "C"]);
        assert_eq!(u.len(), 3);
        assert_eq!(u.index_of("B"), Some(1));
        assert_eq!(u.index_of("Z"), None);
        let sdp = Sdp::from_indices(3, [0, 2]);
        assert_eq!(u.names_of(&sdp).collect::<Vec<_>>(), vec!["A", "C"]);
    }

    #[test]
    fn test_universe_check() {
        let u = StrainUniverse::new(["A", "B", "C"]);
        assert!(u.check(&Sdp::new(3), 0).is_ok());
        assert_eq!(
            u.check(&Sdp::new(4), 7),
            Err(SdpError::StrainCountMismatch {
                expected: 3,
                actual: 4,
                column: 7
            })
        );
    }
}
