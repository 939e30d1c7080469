// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

// Top-down perfect phylogeny construction.
//
// The root holds every strain.  At each node the SDPs that no other
// remaining SDP properly contains become the child edges; each child
// recurses on the SDPs nested inside it.  Strains covered by none of the
// child SDPs hang directly off the node as leaves.

use crate::{PhylogenyError, PhylogenyTreeEdge, PhylogenyTreeNode};
use itertools::Itertools;
use log::debug;
use snp_intervals::{IndexedSnpInterval, SdpColumns};
use std::collections::HashMap;
use strain_sdp::{Sdp, StrainUniverse};

/// Build one phylogeny per interval, in interval order.
///
/// Universes with fewer than two strains have no meaningful phylogeny and
/// give an empty result.
pub fn infer_perfect_phylogenies(
    universe: &StrainUniverse,
    columns: &SdpColumns,
    intervals: &[IndexedSnpInterval],
) -> Result<Vec<PhylogenyTreeNode>, PhylogenyError> {
    if universe.len() < 2 {
        return Ok(Vec::new());
    }
    intervals
        .iter()
        .map(|interval| {
            debug!("building phylogeny for interval {interval}");
            build_perfect_phylogeny(universe, columns.slice(interval)?)
        })
        .collect()
}

/// Build the phylogeny of one set of SDP columns.
///
/// The columns must be pairwise compatible; otherwise the result is
/// [`PhylogenyError::NoValidPhylogeny`].  Each edge length is the number of
/// columns carrying the edge's SDP.
pub fn build_perfect_phylogeny(
    universe: &StrainUniverse,
    columns: &[Sdp],
) -> Result<PhylogenyTreeNode, PhylogenyError> {
    let mut counts = HashMap::<&Sdp, usize>::new();
    for (column, sdp) in columns.iter().enumerate() {
        universe.check(sdp, column)?;
        // empty and full sets do not split the strains
        if !sdp.is_empty() && !sdp.is_full() {
            *counts.entry(sdp).or_default() += 1;
        }
    }
    let sdps: Vec<(Sdp, usize)> = counts
        .into_iter()
        .map(|(sdp, n)| (sdp.clone(), n))
        .sorted()
        .collect();

    for ((a, _), (b, _)) in sdps.iter().tuple_combinations() {
        if !a.is_compatible_with(b) {
            return Err(PhylogenyError::NoValidPhylogeny {
                first: a.clone(),
                second: b.clone(),
            });
        }
    }
    Ok(build_node(universe, &universe.full(), &sdps))
}

fn build_node(universe: &StrainUniverse, active: &Sdp, sdps: &[(Sdp, usize)]) -> PhylogenyTreeNode {
    if active.count() == 1 {
        if let Some(i) = active.indices().next() {
            return PhylogenyTreeNode::Leaf {
                strain: universe.name(i).to_string(),
            };
        }
    }

    // Compatible SDPs that nobody contains are pairwise disjoint.
    let tops = sdps
        .iter()
        .filter(|(s, _)| !sdps.iter().any(|(o, _)| s.is_proper_subset_of(o)));

    let mut children: Vec<(usize, PhylogenyTreeEdge)> = Vec::new();
    let mut covered = Sdp::new(active.len());
    for (top, n) in tops {
        let nested: Vec<(Sdp, usize)> = sdps
            .iter()
            .filter(|(s, _)| s.is_proper_subset_of(top))
            .cloned()
            .collect();
        covered = covered.union(top);
        children.push((
            top.indices().next().unwrap_or_default(),
            PhylogenyTreeEdge {
                length: *n as f64,
                node: build_node(universe, top, &nested),
            },
        ));
    }
    for i in active.difference(&covered).indices() {
        children.push((
            i,
            PhylogenyTreeEdge {
                length: 0.0,
                node: PhylogenyTreeNode::Leaf {
                    strain: universe.name(i).to_string(),
                },
            },
        ));
    }
    children.sort_by_key(|(first, _)| *first);
    PhylogenyTreeNode::Internal {
        edges: children.into_iter().map(|(_, edge)| edge).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PhylogenyTreeEdge as Edge;
    use snp_intervals::ScanError;
    use pretty_assertions::assert_eq;
    use proptest::collection::vec;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use strain_sdp::normalize_minority;

    fn sdp(n: usize, idx: &[usize]) -> Sdp {
        Sdp::from_indices(n, idx.iter().copied())
    }

    fn leaf(name: &str, length: f64) -> Edge {
        Edge {
            length,
            node: PhylogenyTreeNode::Leaf {
                strain: name.to_string(),
            },
        }
    }

    #[test]
    fn test_nested_build() {
        let u = StrainUniverse::new(["A", "B", "C", "D", "E"]);
        let cols = vec![
            sdp(5, &[0, 1]),
            sdp(5, &[0]),
            sdp(5, &[3, 4]),
            sdp(5, &[0, 1]),
            Sdp::new(5),
        ];
        let tree = build_perfect_phylogeny(&u, &cols).unwrap();
        assert_eq!(
            tree,
            PhylogenyTreeNode::Internal {
                edges: vec![
                    Edge {
                        length: 2.0,
                        node: PhylogenyTreeNode::Internal {
                            edges: vec![leaf("A", 1.0), leaf("B", 0.0)]
                        },
                    },
                    leaf("C", 0.0),
                    Edge {
                        length: 1.0,
                        node: PhylogenyTreeNode::Internal {
                            edges: vec![leaf("D", 0.0), leaf("E", 0.0)]
                        },
                    },
                ]
            }
        );
        assert_eq!(tree.strains(), vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn test_incompatible_sdps() {
        let u = StrainUniverse::new(["A", "B", "C", "D"]);
        let err = build_perfect_phylogeny(&u, &[sdp(4, &[0, 1]), sdp(4, &[1, 2])]).unwrap_err();
        assert_eq!(
            err,
            PhylogenyError::NoValidPhylogeny {
                first: sdp(4, &[0, 1]),
                second: sdp(4, &[1, 2]),
            }
        );
    }

    #[test]
    fn test_small_universe() {
        let u = StrainUniverse::new(["A"]);
        let cols = SdpColumns::new(1, vec![Sdp::new(1)]).unwrap();
        let trees =
            infer_perfect_phylogenies(&u, &cols, &[IndexedSnpInterval::new(0, 1)]).unwrap();
        assert!(trees.is_empty());
    }

    #[test]
    fn test_interval_outside_columns() {
        let u = StrainUniverse::new(["A", "B", "C"]);
        let cols = SdpColumns::new(3, vec![sdp(3, &[0])]).unwrap();
        assert_eq!(
            infer_perfect_phylogenies(&u, &cols, &[IndexedSnpInterval::new(0, 5)]),
            Err(PhylogenyError::Scan(ScanError::IntervalOutOfRange {
                interval: IndexedSnpInterval::new(0, 5),
                column_count: 1,
            }))
        );
        assert_eq!(
            infer_perfect_phylogenies(&u, &cols, &[IndexedSnpInterval::new(0, 0)]),
            Err(PhylogenyError::Scan(ScanError::EmptyInterval { start_index: 0 }))
        );
    }

    #[test]
    fn test_strain_count_mismatch() {
        let u = StrainUniverse::new(["A", "B", "C"]);
        assert!(matches!(
            build_perfect_phylogeny(&u, &[sdp(4, &[0])]),
            Err(PhylogenyError::Sdp(_))
        ));
    }

    fn arb_columns() -> impl Strategy<Value = SdpColumns> {
        (2usize..8).prop_flat_map(|n| {
            vec(vec(any::<bool>(), n), 1..30).prop_map(move |rows| {
                SdpColumns::new(
                    n,
                    rows.into_iter()
                        .map(|r| normalize_minority(Sdp::from_flags(r)))
                        .collect(),
                )
                .unwrap()
            })
        })
    }

    proptest! {
        #[test]
        fn prop_tree_recovers_interval_sdps(cols in arb_columns()) {
            let n = cols.strain_count();
            let u = StrainUniverse::new((0..n).map(|i| format!("S{i}")));
            let intervals = snp_intervals::max_k_scan_columns(&cols).unwrap();
            let trees = infer_perfect_phylogenies(&u, &cols, &intervals).unwrap();
            prop_assert_eq!(trees.len(), intervals.len());
            for (tree, interval) in trees.iter().zip(&intervals) {
                let mut expected: HashSet<Sdp> = cols.slice(interval).unwrap().iter().cloned().collect();
                expected.insert(Sdp::new(n));
                let mut recovered: HashSet<Sdp> =
                    tree.edge_sdps(&u).unwrap().into_iter().collect();
                recovered.insert(Sdp::new(n));
                prop_assert_eq!(recovered, expected);
                let mut strains = tree.strains();
                strains.sort_unstable();
                let mut names: Vec<&str> = u.names().iter().map(String::as_str).collect();
                names.sort_unstable();
                prop_assert_eq!(strains, names);
            }
        }
    }
}
