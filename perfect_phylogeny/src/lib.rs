//! perfect_phylogeny
// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

//! Perfect phylogenies of SDP-compatible intervals.
//!
//! Within an interval whose SDPs are pairwise compatible, the distinct SDPs
//! nest into a tree: each SDP becomes exactly one edge, and the strains
//! below that edge are the strains of the SDP.

mod build;
mod newick;
mod tree;

pub use build::{build_perfect_phylogeny, infer_perfect_phylogenies};
pub use newick::{parse_newick, NewickError};
pub use tree::{PhylogenyTreeEdge, PhylogenyTreeNode};

use snp_intervals::ScanError;
use strain_sdp::{Sdp, SdpError};

/// Failures while building a phylogeny.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhylogenyError {
    /// Two SDPs of one interval overlap without one containing the other.
    #[error("no valid phylogeny: SDPs {first} and {second} are incompatible")]
    NoValidPhylogeny {
        /// One of the offending SDPs.
        first: Sdp,
        /// The other offending SDP.
        second: Sdp,
    },

    /// Malformed SDP input.
    #[error(transparent)]
    Sdp(#[from] SdpError),

    /// An interval does not fit the columns.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A tree names a strain that is not in the universe.
    #[error("strain {name} is not part of the strain universe")]
    UnknownStrain {
        /// The unknown name.
        name: String,
    },
}
