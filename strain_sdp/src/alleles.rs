// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

// Turning per-strain allele calls into SDPs and allele groups.

use crate::{normalize_minority, Sdp, SdpError};
use itertools::Itertools;

/// Build the minority-normalized SDP of one biallelic column.
///
/// A strain's bit is set when its call differs from the call of strain 0;
/// the result is then passed through [`normalize_minority`].  A column with a
/// single symbol gives the empty SDP.
pub fn sdp_from_calls(calls: &[u8]) -> Result<Sdp, SdpError> {
    let Some(&first) = calls.first() else {
        return Err(SdpError::EmptyUniverse);
    };
    let symbols: Vec<u8> = calls.iter().copied().unique().collect();
    if symbols.len() > 2 {
        return Err(SdpError::NotBiallelic {
            symbols: symbols.into_iter().map(char::from).collect(),
        });
    }
    Ok(normalize_minority(Sdp::from_flags(
        calls.iter().map(|&c| c != first),
    )))
}

/// Partition the strains of one column by allele symbol.
///
/// Groups come out in the order their symbol is first seen, which keeps the
/// grouping of a column deterministic.  Any number of symbols is accepted.
pub fn allele_groups(calls: &[u8]) -> Vec<Sdp> {
    calls
        .iter()
        .copied()
        .unique()
        .map(|symbol| Sdp::from_flags(calls.iter().map(|&c| c == symbol)))
        .collect()
}

/// The two allele groups implied by a biallelic SDP, without empty groups.
pub fn groups_from_sdp(sdp: &Sdp) -> Vec<Sdp> {
    [sdp.clone(), sdp.complement()]
        .into_iter()
        .filter(|g| !g.is_empty())
        .collect()
}

/// Check that the allele groups of one column partition a universe of `n`
/// strains.
pub fn validate_groups(groups: &[Sdp], n: usize, column: usize) -> Result<(), SdpError> {
    let mut seen = Sdp::new(n);
    for g in groups {
        if g.len() != n {
            return Err(SdpError::StrainCountMismatch {
                expected: n,
                actual: g.len(),
                column,
            });
        }
        if !g.is_disjoint(&seen) {
            return Err(SdpError::OverlappingGroups { column });
        }
        seen = seen.union(g);
    }
    if n > 0 && !seen.is_full() {
        return Err(SdpError::GroupsDoNotCoverStrains { column });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sdp(n: usize, idx: &[usize]) -> Sdp {
        Sdp::from_indices(n, idx.iter().copied())
    }

    #[test]
    fn test_sdp_from_calls() {
        assert_eq!(sdp_from_calls(b"AAGGA").unwrap(), sdp(5, &[2, 3]));
        // majority differs from strain 0, so the bits flip onto strain 0's side
        assert_eq!(sdp_from_calls(b"AGGGA").unwrap(), sdp(5, &[0, 4]));
        // even split keeps strain 0 unset
        assert_eq!(sdp_from_calls(b"TTCC").unwrap(), sdp(4, &[2, 3]));
        assert_eq!(sdp_from_calls(b"CTTC").unwrap(), sdp(4, &[1, 2]));
        assert!(sdp_from_calls(b"CCCC").unwrap().is_empty());
        assert_eq!(
            sdp_from_calls(b"ACG"),
            Err(SdpError::NotBiallelic {
                symbols: vec!['A', 'C', 'G']
            })
        );
        assert_eq!(sdp_from_calls(b""), Err(SdpError::EmptyUniverse));
    }

    #[test]
    fn test_allele_groups() {
        let groups = allele_groups(b"ACAGC");
        assert_eq!(
            groups,
            vec![sdp(5, &[0, 2]), sdp(5, &[1, 4]), sdp(5, &[3])]
        );
        assert!(validate_groups(&groups, 5, 0).is_ok());
    }

    #[test]
    fn test_groups_from_sdp() {
        assert_eq!(
            groups_from_sdp(&sdp(4, &[1])),
            vec![sdp(4, &[1]), sdp(4, &[0, 2, 3])]
        );
        assert_eq!(groups_from_sdp(&Sdp::new(3)), vec![Sdp::full(3)]);
    }

    #[test]
    fn test_validate_groups() {
        assert_eq!(
            validate_groups(&[sdp(4, &[0, 1]), sdp(4, &[1, 2, 3])], 4, 3),
            Err(SdpError::OverlappingGroups { column: 3 })
        );
        assert_eq!(
            validate_groups(&[sdp(4, &[0, 1]), sdp(4, &[2])], 4, 5),
            Err(SdpError::GroupsDoNotCoverStrains { column: 5 })
        );
        assert_eq!(
            validate_groups(&[sdp(3, &[0, 1, 2])], 4, 1),
            Err(SdpError::StrainCountMismatch {
                expected: 4,
                actual: 3,
                column: 1
            })
        );
    }
}
