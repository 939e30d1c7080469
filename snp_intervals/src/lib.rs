//! snp_intervals
// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.
#![deny(missing_docs)]

//! Maximal-compatibility interval scanning over SDP columns.
//!
//! The scanner works purely in SNP-index space.  Intervals are translated to
//! base pairs only at the end, through a [`PositionLookup`].

mod interval;
mod scan;
mod source;

pub use interval::{BasePairInterval, IndexedSnpInterval, PositionLookup, SnpPosition};
pub use scan::{
    create_core_intervals, create_max_k_intervals, create_uber_cores, greedy_scan, max_k_scan,
    max_k_scan_columns, reverse_greedy_scan, scan_compatible_intervals,
    to_ordered_physical_intervals, uber_scan, ScanDirection,
};
pub use source::{SdpColumns, SdpCursor, SdpSource};

use strain_sdp::SdpError;

/// Failures of the interval scanner.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// Malformed SDP input.
    #[error(transparent)]
    Sdp(#[from] SdpError),

    /// The source produced a different number of columns than it announced.
    #[error("SDP source announced {announced} columns but produced {produced}")]
    ColumnCountMismatch {
        /// Columns announced up front.
        announced: usize,
        /// Columns actually produced.
        produced: usize,
    },

    /// Forward and reverse tilings disagree on the number of tiles.
    #[error("forward scan produced {forward} intervals but reverse scan produced {reverse}")]
    TileCountMismatch {
        /// Forward tile count.
        forward: usize,
        /// Reverse tile count.
        reverse: usize,
    },

    /// A forward tile does not overlap the reverse tile with the same index.
    #[error("forward interval {forward} and reverse interval {reverse} do not intersect")]
    DisjointTiles {
        /// The forward tile.
        forward: IndexedSnpInterval,
        /// The reverse tile.
        reverse: IndexedSnpInterval,
    },

    /// No uber-interval was found for a core interval.
    #[error("no uber interval covers core interval number {index}")]
    EmptyUberCoreGroup {
        /// Index of the core interval.
        index: usize,
    },

    /// A caller-supplied interval covers no column.
    #[error("interval starting at SNP index {start_index} is empty")]
    EmptyInterval {
        /// Start of the empty interval.
        start_index: usize,
    },

    /// A caller-supplied interval reaches past the last column.
    #[error("interval {interval} is outside the {column_count} available columns")]
    IntervalOutOfRange {
        /// The offending interval.
        interval: IndexedSnpInterval,
        /// Number of columns available.
        column_count: usize,
    },

    /// The position of an interval's last SNP lies before its first.
    #[error("positions of interval {interval} are not increasing")]
    PositionsNotIncreasing {
        /// The offending interval.
        interval: IndexedSnpInterval,
    },

    /// A SNP index has no known position.
    #[error("no position is known for SNP index {index}")]
    PositionOutOfRange {
        /// The SNP index.
        index: usize,
    },

    /// The two ends of an interval sit on different chromosomes.
    #[error("interval {interval} spans chromosomes {first} and {last}")]
    ChromosomeMismatch {
        /// The offending interval.
        interval: IndexedSnpInterval,
        /// Chromosome of the first SNP.
        first: String,
        /// Chromosome of the last SNP.
        last: String,
    },
}
