// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

// Maximal compatibility intervals.
//
// Three independent passes over the columns feed the max-k computation: a
// greedy forward tiling, a greedy reverse tiling and the "uber" scan that
// finds every maximal compatible interval.  Forward and reverse tiles with
// the same index always overlap; their intersections are the core
// intervals, and each core is widened to the longest uber interval that
// stays clear of the neighboring cores.

use crate::{
    BasePairInterval, IndexedSnpInterval, PositionLookup, ScanError, SdpColumns, SdpSource,
};
use log::{debug, info};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use strain_sdp::{Sdp, SdpError};

/// The order in which a source hands out its columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    /// First column to last.
    Forward,
    /// Last column to first.
    Reverse,
}

impl ScanDirection {
    // Forward column index of the `consumed`-th column pulled from a source
    // of `n` columns.
    fn column_index(self, consumed: usize, n: usize) -> usize {
        match self {
            ScanDirection::Forward => consumed,
            ScanDirection::Reverse => n.saturating_sub(consumed + 1),
        }
    }
}

fn check_strain_count(
    sdp: &Sdp,
    strain_count: usize,
    consumed: usize,
    n: usize,
    direction: ScanDirection,
) -> Result<(), ScanError> {
    if sdp.len() != strain_count {
        return Err(SdpError::StrainCountMismatch {
            expected: strain_count,
            actual: sdp.len(),
            column: direction.column_index(consumed, n),
        }
        .into());
    }
    Ok(())
}

fn check_column_count(announced: usize, produced: usize) -> Result<(), ScanError> {
    if announced != produced {
        return Err(ScanError::ColumnCountMismatch {
            announced,
            produced,
        });
    }
    Ok(())
}

/// Greedily tile the columns of `source` into maximal compatible runs.
///
/// Each run is extended while every new SDP is compatible with every
/// distinct SDP already in the run; the first incompatible column starts the
/// next run.  The source is assumed to yield columns in `direction` order;
/// the returned intervals are always in forward index space, sorted by
/// start, and tile `[0, column_count)` exactly.
pub fn scan_compatible_intervals<S: SdpSource + ?Sized>(
    source: &mut S,
    direction: ScanDirection,
) -> Result<Vec<IndexedSnpInterval>, ScanError> {
    let n = source.column_count();
    let strain_count = source.strain_count();
    let mut tiles = Vec::<IndexedSnpInterval>::new();
    let mut run = HashSet::<Sdp>::new();
    let mut run_start = 0;
    let mut consumed = 0;
    while let Some(sdp) = source.next_sdp() {
        check_strain_count(&sdp, strain_count, consumed, n, direction)?;
        if !run.contains(&sdp) {
            if !run.iter().all(|prev| prev.is_compatible_with(&sdp)) {
                tiles.push(IndexedSnpInterval::new(run_start, consumed - run_start));
                run.clear();
                run_start = consumed;
            }
            run.insert(sdp);
        }
        consumed += 1;
    }
    check_column_count(n, consumed)?;
    if consumed > run_start {
        tiles.push(IndexedSnpInterval::new(run_start, consumed - run_start));
    }
    debug!("{direction:?} scan tiled {n} columns into {} intervals", tiles.len());

    Ok(match direction {
        ScanDirection::Forward => tiles,
        ScanDirection::Reverse => tiles
            .into_iter()
            .rev()
            .map(|t| IndexedSnpInterval::from_bounds(n - 1 - t.end_index(), n - 1 - t.start_index))
            .collect(),
    })
}

/// Greedy tiling reading `source` first column to last.
pub fn greedy_scan<S: SdpSource + ?Sized>(
    source: &mut S,
) -> Result<Vec<IndexedSnpInterval>, ScanError> {
    scan_compatible_intervals(source, ScanDirection::Forward)
}

/// Greedy tiling of a source that yields its columns last to first.  The
/// result is expressed in forward index space.
pub fn reverse_greedy_scan<S: SdpSource + ?Sized>(
    source: &mut S,
) -> Result<Vec<IndexedSnpInterval>, ScanError> {
    scan_compatible_intervals(source, ScanDirection::Reverse)
}

/// Find every maximal compatible interval of a forward source.
///
/// The window keeps each distinct SDP with the last column it was seen at.
/// When a new column conflicts with the window, the window up to the
/// previous column is maximal; the next window starts just after the last
/// conflicting column.  Windows whose end does not move past the previously
/// reported end are contained in an earlier interval and are not reported,
/// so no returned interval contains another.
pub fn uber_scan<S: SdpSource + ?Sized>(
    source: &mut S,
) -> Result<Vec<IndexedSnpInterval>, ScanError> {
    let n = source.column_count();
    let strain_count = source.strain_count();
    let mut intervals = Vec::<IndexedSnpInterval>::new();
    let mut window = HashMap::<Sdp, usize>::new();
    let mut start = 0;
    let mut column = 0;

    let report = |start: usize, end: usize, intervals: &mut Vec<IndexedSnpInterval>| {
        if intervals.last().map_or(true, |last| end > last.end_index()) {
            intervals.push(IndexedSnpInterval::from_bounds(start, end));
        }
    };

    while let Some(sdp) = source.next_sdp() {
        check_strain_count(&sdp, strain_count, column, n, ScanDirection::Forward)?;
        let last_conflict = window
            .iter()
            .filter(|(prev, _)| !prev.is_compatible_with(&sdp))
            .map(|(_, &at)| at)
            .max();
        if let Some(conflict) = last_conflict {
            report(start, column - 1, &mut intervals);
            start = conflict + 1;
            window.retain(|_, at| *at > conflict);
        }
        window.insert(sdp, column);
        column += 1;
    }
    check_column_count(n, column)?;
    if column > 0 {
        report(start, column - 1, &mut intervals);
    }
    debug!("uber scan found {} maximal intervals", intervals.len());
    Ok(intervals)
}

/// Intersect forward and reverse tiles with matching indices.
pub fn create_core_intervals(
    forward: &[IndexedSnpInterval],
    reverse: &[IndexedSnpInterval],
) -> Result<Vec<IndexedSnpInterval>, ScanError> {
    if forward.len() != reverse.len() {
        return Err(ScanError::TileCountMismatch {
            forward: forward.len(),
            reverse: reverse.len(),
        });
    }
    forward
        .iter()
        .zip(reverse)
        .map(|(f, r)| {
            f.intersection(r).ok_or(ScanError::DisjointTiles {
                forward: *f,
                reverse: *r,
            })
        })
        .collect()
}

/// For each core interval, the uber intervals that contain it and do not
/// touch either neighboring core.  One group per core, in core order.
pub fn create_uber_cores(
    uber_intervals: &[IndexedSnpInterval],
    core_intervals: &[IndexedSnpInterval],
) -> Vec<Vec<IndexedSnpInterval>> {
    core_intervals
        .iter()
        .enumerate()
        .map(|(i, core)| {
            let prev = i.checked_sub(1).map(|p| &core_intervals[p]);
            let next = core_intervals.get(i + 1);
            uber_intervals
                .iter()
                .filter(|u| u.contains(core))
                .filter(|u| !prev.is_some_and(|p| u.intersects(p)))
                .filter(|u| !next.is_some_and(|n| u.intersects(n)))
                .copied()
                .collect()
        })
        .collect()
}

/// Pick the widest uber interval of each group.  Ties go to the interval
/// with the smallest start index.
pub fn create_max_k_intervals(
    uber_core_groups: &[Vec<IndexedSnpInterval>],
) -> Result<Vec<IndexedSnpInterval>, ScanError> {
    uber_core_groups
        .iter()
        .enumerate()
        .map(|(index, group)| {
            group
                .iter()
                .min_by_key(|u| (Reverse(u.extent_in_indices), u.start_index))
                .copied()
                .ok_or(ScanError::EmptyUberCoreGroup { index })
        })
        .collect()
}

/// Translate SNP-index intervals to base-pair intervals, preserving order.
pub fn to_ordered_physical_intervals<L: PositionLookup + ?Sized>(
    intervals: &[IndexedSnpInterval],
    positions: &L,
) -> Result<Vec<BasePairInterval>, ScanError> {
    intervals
        .iter()
        .map(|interval| {
            let lookup = |index| {
                positions
                    .position(index)
                    .ok_or(ScanError::PositionOutOfRange { index })
            };
            let end = interval
                .checked_end_index()
                .ok_or(ScanError::EmptyInterval {
                    start_index: interval.start_index,
                })?;
            let first = lookup(interval.start_index)?;
            let last = lookup(end)?;
            if first.chromosome != last.chromosome {
                return Err(ScanError::ChromosomeMismatch {
                    interval: *interval,
                    first: first.chromosome.clone(),
                    last: last.chromosome.clone(),
                });
            }
            let extent_bp = last
                .position_bp
                .checked_sub(first.position_bp)
                .ok_or(ScanError::PositionsNotIncreasing {
                    interval: *interval,
                })?
                + 1;
            Ok(BasePairInterval {
                chromosome: first.chromosome.clone(),
                start_bp: first.position_bp,
                extent_bp,
            })
        })
        .collect()
}

/// Compose the three scans into max-k intervals.  `forward` and `uber` must
/// yield columns first to last, `reverse` last to first.
pub fn max_k_scan<F, R, U>(
    forward: &mut F,
    reverse: &mut R,
    uber: &mut U,
) -> Result<Vec<IndexedSnpInterval>, ScanError>
where
    F: SdpSource + ?Sized,
    R: SdpSource + ?Sized,
    U: SdpSource + ?Sized,
{
    let forward = greedy_scan(forward)?;
    let reverse = reverse_greedy_scan(reverse)?;
    let uber = uber_scan(uber)?;
    combine_scans(&forward, &reverse, &uber)
}

/// [`max_k_scan`] over in-memory columns, running the three passes in
/// parallel.
pub fn max_k_scan_columns(columns: &SdpColumns) -> Result<Vec<IndexedSnpInterval>, ScanError> {
    let (forward, (reverse, uber)) = rayon::join(
        || greedy_scan(&mut columns.forward()),
        || {
            rayon::join(
                || reverse_greedy_scan(&mut columns.reverse()),
                || uber_scan(&mut columns.forward()),
            )
        },
    );
    combine_scans(&forward?, &reverse?, &uber?)
}

fn combine_scans(
    forward: &[IndexedSnpInterval],
    reverse: &[IndexedSnpInterval],
    uber: &[IndexedSnpInterval],
) -> Result<Vec<IndexedSnpInterval>, ScanError> {
    let cores = create_core_intervals(forward, reverse)?;
    let groups = create_uber_cores(uber, &cores);
    let max_k = create_max_k_intervals(&groups)?;
    info!(
        "found {} max-k intervals from {} uber intervals",
        max_k.len(),
        uber.len()
    );
    Ok(max_k)
}
