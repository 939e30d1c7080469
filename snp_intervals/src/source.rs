// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

use crate::{IndexedSnpInterval, ScanError};
use strain_sdp::{Sdp, SdpError};

/// A sequential, pull-based supply of SDP columns.
///
/// The column count and strain count are known before the first pull.  A
/// source is consumed once; scanning in another direction needs a second
/// source.
pub trait SdpSource {
    /// Size of the strain universe every column is defined over.
    fn strain_count(&self) -> usize;

    /// Total number of columns this source will produce.
    fn column_count(&self) -> usize;

    /// The next column, or None when the source is exhausted.
    fn next_sdp(&mut self) -> Option<Sdp>;
}

/// An in-memory set of SDP columns in forward index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdpColumns {
    strain_count: usize,
    columns: Vec<Sdp>,
}

impl SdpColumns {
    /// Wrap `columns`, checking that every column has `strain_count` strains.
    pub fn new(strain_count: usize, columns: Vec<Sdp>) -> Result<Self, SdpError> {
        if let Some((column, sdp)) = columns
            .iter()
            .enumerate()
            .find(|(_, sdp)| sdp.len() != strain_count)
        {
            return Err(SdpError::StrainCountMismatch {
                expected: strain_count,
                actual: sdp.len(),
                column,
            });
        }
        Ok(SdpColumns {
            strain_count,
            columns,
        })
    }

    /// Size of the strain universe.
    pub fn strain_count(&self) -> usize {
        self.strain_count
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The columns, in forward order.
    pub fn columns(&self) -> &[Sdp] {
        &self.columns
    }

    /// The columns covered by `interval`, which must be non-empty and lie
    /// within the columns.
    pub fn slice(&self, interval: &IndexedSnpInterval) -> Result<&[Sdp], ScanError> {
        let end = interval
            .checked_end_index()
            .ok_or(ScanError::EmptyInterval {
                start_index: interval.start_index,
            })?;
        self.columns
            .get(interval.start_index..=end)
            .ok_or(ScanError::IntervalOutOfRange {
                interval: *interval,
                column_count: self.columns.len(),
            })
    }

    /// A source reading the columns from first to last.
    pub fn forward(&self) -> SdpCursor<'_> {
        SdpCursor {
            strain_count: self.strain_count,
            columns: &self.columns,
            next: 0,
            reverse: false,
        }
    }

    /// A source reading the columns from last to first.
    pub fn reverse(&self) -> SdpCursor<'_> {
        SdpCursor {
            reverse: true,
            ..self.forward()
        }
    }
}

/// A cursor over borrowed columns, in either direction.
#[derive(Debug, Clone)]
pub struct SdpCursor<'a> {
    strain_count: usize,
    columns: &'a [Sdp],
    next: usize,
    reverse: bool,
}

impl SdpSource for SdpCursor<'_> {
    fn strain_count(&self) -> usize {
        self.strain_count
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn next_sdp(&mut self) -> Option<Sdp> {
        if self.next == self.columns.len() {
            return None;
        }
        let i = if self.reverse {
            self.columns.len() - 1 - self.next
        } else {
            self.next
        };
        self.next += 1;
        Some(self.columns[i].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_directions() {
        let cols = vec![
            Sdp::from_indices(3, [0]),
            Sdp::from_indices(3, [1]),
            Sdp::from_indices(3, [2]),
        ];
        let columns = SdpColumns::new(3, cols.clone()).unwrap();
        let mut fwd = columns.forward();
        let mut rev = columns.reverse();
        assert_eq!(fwd.column_count(), 3);
        let f: Vec<_> = std::iter::from_fn(|| fwd.next_sdp()).collect();
        let r: Vec<_> = std::iter::from_fn(|| rev.next_sdp()).collect();
        assert_eq!(f, cols);
        assert_eq!(r, cols.into_iter().rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_slice_checks_bounds() {
        let columns = SdpColumns::new(2, vec![Sdp::new(2), Sdp::full(2), Sdp::new(2)]).unwrap();
        assert_eq!(
            columns.slice(&IndexedSnpInterval::new(1, 2)),
            Ok(&[Sdp::full(2), Sdp::new(2)][..])
        );
        assert_eq!(
            columns.slice(&IndexedSnpInterval::new(2, 2)),
            Err(ScanError::IntervalOutOfRange {
                interval: IndexedSnpInterval::new(2, 2),
                column_count: 3
            })
        );
        assert_eq!(
            columns.slice(&IndexedSnpInterval::new(0, 0)),
            Err(ScanError::EmptyInterval { start_index: 0 })
        );
    }

    #[test]
    fn test_columns_reject_mixed_universe() {
        let cols = vec![Sdp::new(3), Sdp::new(4)];
        assert_eq!(
            SdpColumns::new(3, cols),
            Err(SdpError::StrainCountMismatch {
                expected: 3,
                actual: 4,
                column: 1
            })
        );
    }
}
