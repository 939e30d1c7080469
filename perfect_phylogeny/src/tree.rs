// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

use crate::PhylogenyError;
use strain_sdp::{Sdp, StrainUniverse};

/// A node of a phylogeny.  Sibling subtrees hold disjoint strains, and the
/// leaves under a node are exactly the strains active at that node.
#[derive(Debug, Clone, PartialEq)]
pub enum PhylogenyTreeNode {
    /// A single strain.
    Leaf {
        /// The strain name.
        strain: String,
    },
    /// A split into child subtrees.
    Internal {
        /// Child edges, ordered by their lowest strain index.
        edges: Vec<PhylogenyTreeEdge>,
    },
}

/// An edge to a child subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct PhylogenyTreeEdge {
    /// Branch length.  The builder uses the number of columns carrying the
    /// edge's SDP; edges that only attach an unsplit strain get zero.
    pub length: f64,
    /// The child subtree.
    pub node: PhylogenyTreeNode,
}

impl PhylogenyTreeNode {
    /// Leaf strain names, left to right.
    pub fn strains(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_strains(&mut out);
        out
    }

    fn collect_strains<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            PhylogenyTreeNode::Leaf { strain } => out.push(strain),
            PhylogenyTreeNode::Internal { edges } => {
                for e in edges {
                    e.node.collect_strains(out);
                }
            }
        }
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        match self {
            PhylogenyTreeNode::Leaf { .. } => 1,
            PhylogenyTreeNode::Internal { edges } => {
                edges.iter().map(|e| e.node.leaf_count()).sum()
            }
        }
    }

    /// Child edges; empty for a leaf.
    pub fn edges(&self) -> &[PhylogenyTreeEdge] {
        match self {
            PhylogenyTreeNode::Leaf { .. } => &[],
            PhylogenyTreeNode::Internal { edges } => edges,
        }
    }

    /// The strains under this node as an SDP over `universe`.
    pub fn strain_sdp(&self, universe: &StrainUniverse) -> Result<Sdp, PhylogenyError> {
        let mut sdp = Sdp::new(universe.len());
        for name in self.strains() {
            let i = universe
                .index_of(name)
                .ok_or_else(|| PhylogenyError::UnknownStrain {
                    name: name.to_string(),
                })?;
            sdp.set(i, true);
        }
        Ok(sdp)
    }

    /// The SDPs carried by the positive-length edges of the tree.
    pub fn edge_sdps(&self, universe: &StrainUniverse) -> Result<Vec<Sdp>, PhylogenyError> {
        let mut out = Vec::new();
        for e in self.edges() {
            if e.length > 0.0 {
                out.push(e.node.strain_sdp(universe)?);
            }
            out.extend(e.node.edge_sdps(universe)?);
        }
        Ok(out)
    }

    /// Splice internal children reached through an edge no longer than
    /// `threshold` into their parent.
    pub fn collapse_short_edges(self, threshold: f64) -> Self {
        match self {
            leaf @ PhylogenyTreeNode::Leaf { .. } => leaf,
            PhylogenyTreeNode::Internal { edges } => {
                let mut collapsed = Vec::with_capacity(edges.len());
                for e in edges {
                    match e.node.collapse_short_edges(threshold) {
                        PhylogenyTreeNode::Internal { edges: inner } if e.length <= threshold => {
                            collapsed.extend(inner);
                        }
                        node => collapsed.push(PhylogenyTreeEdge {
                            length: e.length,
                            node,
                        }),
                    }
                }
                PhylogenyTreeNode::Internal { edges: collapsed }
            }
        }
    }

    /// Replace every internal node with a single child by that child,
    /// merging the two edge lengths.  A root with a single child becomes
    /// that child.
    pub fn remove_nonbranching_nodes(self) -> Self {
        match self.remove_nonbranching_below() {
            PhylogenyTreeNode::Internal { mut edges } if edges.len() == 1 => edges.remove(0).node,
            node => node,
        }
    }

    fn remove_nonbranching_below(self) -> Self {
        match self {
            leaf @ PhylogenyTreeNode::Leaf { .. } => leaf,
            PhylogenyTreeNode::Internal { edges } => PhylogenyTreeNode::Internal {
                edges: edges
                    .into_iter()
                    .map(|e| {
                        let mut edge = PhylogenyTreeEdge {
                            length: e.length,
                            node: e.node.remove_nonbranching_below(),
                        };
                        // edges below the child are already merged, so one
                        // level is all that can be left
                        if let PhylogenyTreeNode::Internal { edges: inner } = &mut edge.node {
                            if inner.len() == 1 {
                                let only = inner.remove(0);
                                edge.length += only.length;
                                edge.node = only.node;
                            }
                        }
                        edge
                    })
                    .collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leaf(name: &str, length: f64) -> PhylogenyTreeEdge {
        PhylogenyTreeEdge {
            length,
            node: PhylogenyTreeNode::Leaf {
                strain: name.to_string(),
            },
        }
    }

    fn internal(length: f64, edges: Vec<PhylogenyTreeEdge>) -> PhylogenyTreeEdge {
        PhylogenyTreeEdge {
            length,
            node: PhylogenyTreeNode::Internal { edges },
        }
    }

    fn root(edges: Vec<PhylogenyTreeEdge>) -> PhylogenyTreeNode {
        PhylogenyTreeNode::Internal { edges }
    }

    #[test]
    fn test_strains_and_edge_sdps() {
        let u = StrainUniverse::new(["A", "B", "C", "D"]);
        let tree = root(vec![
            internal(2.0, vec![leaf("A", 1.0), leaf("B", 0.0)]),
            leaf("C", 0.0),
            leaf("D", 0.0),
        ]);
        assert_eq!(tree.strains(), vec!["A", "B", "C", "D"]);
        assert_eq!(tree.leaf_count(), 4);
        assert_eq!(
            tree.edge_sdps(&u).unwrap(),
            vec![Sdp::from_indices(4, [0, 1]), Sdp::from_indices(4, [0])]
        );
        let stranger = root(vec![leaf("Q", 1.0), leaf("A", 0.0)]);
        assert_eq!(
            stranger.edge_sdps(&u),
            Err(PhylogenyError::UnknownStrain {
                name: "Q".to_string()
            })
        );
    }

    #[test]
    fn test_collapse_short_edges() {
        let tree = root(vec![
            internal(0.0, vec![leaf("A", 1.0), leaf("B", 0.0)]),
            internal(3.0, vec![leaf("C", 0.0), leaf("D", 0.0)]),
        ]);
        let collapsed = tree.collapse_short_edges(0.0);
        assert_eq!(
            collapsed,
            root(vec![
                leaf("A", 1.0),
                leaf("B", 0.0),
                internal(3.0, vec![leaf("C", 0.0), leaf("D", 0.0)]),
            ])
        );
    }

    #[test]
    fn test_remove_nonbranching_nodes() {
        let tree = root(vec![
            internal(1.0, vec![internal(2.0, vec![leaf("A", 0.5), leaf("B", 0.0)])]),
            internal(1.0, vec![internal(1.0, vec![leaf("C", 4.0)])]),
        ]);
        assert_eq!(
            tree.remove_nonbranching_nodes(),
            root(vec![
                internal(3.0, vec![leaf("A", 0.5), leaf("B", 0.0)]),
                leaf("C", 6.0),
            ])
        );
        let single = root(vec![leaf("A", 1.0)]);
        assert_eq!(
            single.remove_nonbranching_nodes(),
            PhylogenyTreeNode::Leaf {
                strain: "A".to_string()
            }
        );
    }
}
