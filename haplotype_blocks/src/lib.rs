//! haplotype_blocks
// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.
#![deny(missing_docs)]

//! Haplotype block estimation.
//!
//! A haplotype block is a run of SNP columns over which a group of at least
//! `min_group_size` strains carries identical alleles.  Blocks are found in a
//! single streaming pass by [`HaplotypeTracker`] and can then be grouped by
//! strain membership with [`EquivalenceClasses`].

mod equiv;
mod tracker;

pub use equiv::{create_equivalence_classes_from_blocks, EquivalenceClass, EquivalenceClasses};
pub use tracker::{estimate_haplotype_blocks, estimate_haplotype_blocks_from_sdps, HaplotypeTracker};

use serde::{Deserialize, Serialize};
use snp_intervals::{to_ordered_physical_intervals, IndexedSnpInterval, PositionLookup, ScanError};
use strain_sdp::Sdp;

/// A haplotype block in SNP-index space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HaplotypeBlock {
    /// The columns over which the group is identical.
    pub interval: IndexedSnpInterval,
    /// The strains sharing the haplotype.
    pub strain_group: Sdp,
}

/// A haplotype block in base-pair space.  Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionedInterval {
    /// Chromosome name.
    pub chromosome: String,
    /// First base pair of the block.
    pub start_bp: u64,
    /// Number of base pairs covered.
    pub extent_bp: u64,
    /// The strains sharing the haplotype.
    pub strain_group: Sdp,
}

impl PartitionedInterval {
    /// Last base pair of the block (inclusive).
    pub fn end_bp(&self) -> u64 {
        self.start_bp + self.extent_bp - 1
    }
}

/// Translate index-space blocks to base pairs, keeping their order.
pub fn to_partitioned_intervals<L: PositionLookup + ?Sized>(
    blocks: &[HaplotypeBlock],
    positions: &L,
) -> Result<Vec<PartitionedInterval>, ScanError> {
    let intervals: Vec<IndexedSnpInterval> = blocks.iter().map(|b| b.interval).collect();
    Ok(to_ordered_physical_intervals(&intervals, positions)?
        .into_iter()
        .zip(blocks)
        .map(|(bp, block)| PartitionedInterval {
            chromosome: bp.chromosome,
            start_bp: bp.start_bp,
            extent_bp: bp.extent_bp,
            strain_group: block.strain_group.clone(),
        })
        .collect())
}

/// Sort blocks by start position, then by strain group.
pub fn sort_blocks(blocks: &mut [PartitionedInterval]) {
    blocks.sort_by(|a, b| {
        (&a.chromosome, a.start_bp, &a.strain_group, a.extent_bp).cmp(&(
            &b.chromosome,
            b.start_bp,
            &b.strain_group,
            b.extent_bp,
        ))
    });
}
