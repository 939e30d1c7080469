// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

// Streaming haplotype candidate tracking.
//
// The tracker keeps the set of open candidates: strain groups that have
// shared one allele at every column since their start column.  Each column
// moves the set forward by one step:
//
// - a candidate whose strains all fall in one allele group survives as is;
// - otherwise it terminates (and is emitted if it spans enough columns) and
//   each of its pieces that is big enough reopens with the same start;
// - every big enough allele group of the column opens a fresh candidate.
//
// A candidate is then dropped when another one with an earlier or equal
// start holds a superset of its strains, since anything it could report is
// already covered by that one.

use crate::HaplotypeBlock;
use log::debug;
use snp_intervals::{IndexedSnpInterval, ScanError, SdpSource};
use std::cmp::Reverse;
use strain_sdp::{groups_from_sdp, validate_groups, Sdp, SdpError};

#[derive(Debug, Clone, PartialEq, Eq)]
struct HaplotypeCandidate {
    start_column: usize,
    strain_group: Sdp,
}

// Where a candidate for the next column came from.  The order is the
// priority used to break exact ties in the redundancy filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Origin {
    Survivor,
    Split,
    Fresh,
}

/// Streaming haplotype block estimator.
///
/// Feed the allele groups of each column in order with
/// [`push_column`](Self::push_column), then call [`finish`](Self::finish).
/// Blocks come out in the order they close, not sorted.
#[derive(Debug, Clone)]
pub struct HaplotypeTracker {
    strain_count: usize,
    min_column_span: usize,
    min_group_size: usize,
    column: usize,
    open: Vec<HaplotypeCandidate>,
    blocks: Vec<HaplotypeBlock>,
}

impl HaplotypeTracker {
    /// A tracker over `strain_count` strains.  Blocks must cover at least
    /// `min_column_span` columns and `min_group_size` strains.
    pub fn new(strain_count: usize, min_column_span: usize, min_group_size: usize) -> Self {
        HaplotypeTracker {
            strain_count,
            min_column_span,
            min_group_size,
            column: 0,
            open: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Number of columns consumed so far.
    pub fn columns_seen(&self) -> usize {
        self.column
    }

    /// Number of currently open candidates.
    pub fn open_candidates(&self) -> usize {
        self.open.len()
    }

    /// Consume the allele groups of the next column.  The groups must
    /// partition the strain universe.
    pub fn push_column(&mut self, groups: &[Sdp]) -> Result<(), SdpError> {
        validate_groups(groups, self.strain_count, self.column)?;
        if self.strain_count >= 2 {
            let open = std::mem::take(&mut self.open);
            self.open = self.step(open, groups);
        }
        self.column += 1;
        Ok(())
    }

    /// Close every open candidate and return all blocks.
    pub fn finish(mut self) -> Vec<HaplotypeBlock> {
        for candidate in std::mem::take(&mut self.open) {
            self.close(candidate);
        }
        debug!(
            "haplotype tracker emitted {} blocks over {} columns",
            self.blocks.len(),
            self.column
        );
        self.blocks
    }

    fn close(&mut self, candidate: HaplotypeCandidate) {
        let span = self.column - candidate.start_column;
        if span >= self.min_column_span && span > 0 {
            self.blocks.push(HaplotypeBlock {
                interval: IndexedSnpInterval::new(candidate.start_column, span),
                strain_group: candidate.strain_group,
            });
        }
    }

    // Derive the open set after the current column from the open set before it.
    fn step(&mut self, open: Vec<HaplotypeCandidate>, groups: &[Sdp]) -> Vec<HaplotypeCandidate> {
        let mut next = Vec::<(Origin, HaplotypeCandidate)>::new();
        for candidate in open {
            let pieces: Vec<Sdp> = groups
                .iter()
                .map(|g| candidate.strain_group.intersection(g))
                .filter(|piece| !piece.is_empty())
                .collect();
            if let [whole] = pieces.as_slice() {
                debug_assert_eq!(whole, &candidate.strain_group);
                next.push((Origin::Survivor, candidate));
                continue;
            }
            for piece in pieces {
                if piece.count() >= self.min_group_size {
                    next.push((
                        Origin::Split,
                        HaplotypeCandidate {
                            start_column: candidate.start_column,
                            strain_group: piece,
                        },
                    ));
                }
            }
            self.close(candidate);
        }
        next.extend(
            groups
                .iter()
                .filter(|g| g.count() >= self.min_group_size)
                .map(|g| {
                    (
                        Origin::Fresh,
                        HaplotypeCandidate {
                            start_column: self.column,
                            strain_group: g.clone(),
                        },
                    )
                }),
        );
        remove_redundant(next)
    }
}

// Drop every candidate whose strains are covered by another candidate that
// started no later.  Sorting by start, then by decreasing size, then by
// origin means a dominating candidate is always seen before the candidates
// it dominates, and of two identical candidates the higher-priority one is
// kept.
fn remove_redundant(mut candidates: Vec<(Origin, HaplotypeCandidate)>) -> Vec<HaplotypeCandidate> {
    candidates.sort_by_key(|(origin, c)| (c.start_column, Reverse(c.strain_group.count()), *origin));
    let mut kept = Vec::<HaplotypeCandidate>::with_capacity(candidates.len());
    for (_, c) in candidates {
        if !kept
            .iter()
            .any(|k| c.strain_group.is_subset_of(&k.strain_group))
        {
            kept.push(c);
        }
    }
    kept
}

/// Run the tracker over a sequence of columns, each given as its allele
/// groups.  Fewer than two strains gives no blocks.
pub fn estimate_haplotype_blocks<I, G>(
    strain_count: usize,
    columns: I,
    min_column_span: usize,
    min_group_size: usize,
) -> Result<Vec<HaplotypeBlock>, SdpError>
where
    I: IntoIterator<Item = G>,
    G: AsRef<[Sdp]>,
{
    let mut tracker = HaplotypeTracker::new(strain_count, min_column_span, min_group_size);
    for groups in columns {
        tracker.push_column(groups.as_ref())?;
    }
    Ok(tracker.finish())
}

/// Run the tracker over biallelic SDP columns; each column's groups are the
/// SDP and its complement.  A source that yields a different number of
/// columns than it announces is an error.
pub fn estimate_haplotype_blocks_from_sdps<S: SdpSource + ?Sized>(
    source: &mut S,
    min_column_span: usize,
    min_group_size: usize,
) -> Result<Vec<HaplotypeBlock>, ScanError> {
    let announced = source.column_count();
    let mut tracker =
        HaplotypeTracker::new(source.strain_count(), min_column_span, min_group_size);
    while let Some(sdp) = source.next_sdp() {
        tracker.push_column(&groups_from_sdp(&sdp))?;
    }
    if tracker.columns_seen() != announced {
        return Err(ScanError::ColumnCountMismatch {
            announced,
            produced: tracker.columns_seen(),
        });
    }
    Ok(tracker.finish())
}
