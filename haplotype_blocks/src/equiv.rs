// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

//! Equivalence classes of haplotype blocks.
//!
//! Two blocks are equivalent when their strain groups are identical, no
//! matter where on the genome they sit.  Grouping a whole chromosome (or
//! genome) of blocks this way shows which strain subgroups recur.
//!
//! Computational performance of EquivalenceClasses:
//! - storage = one index entry per distinct strain group plus the members
//! - time to group n blocks = O(n) hash lookups
//! - time to find the class of a strain group = O(1).

use crate::PartitionedInterval;
use std::collections::HashMap;
use strain_sdp::Sdp;

/// One strain group and every block that carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceClass {
    /// The shared strain group.
    pub strain_group: Sdp,
    /// Member blocks, in input order.
    pub members: Vec<PartitionedInterval>,
}

/// A partition of blocks by exact strain-group equality.
///
/// Classes are ordered by the first occurrence of their strain group in the
/// input; members keep their input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquivalenceClasses {
    classes: Vec<EquivalenceClass>,
    class_id: HashMap<Sdp, usize>,
}

impl EquivalenceClasses {
    /// Group `blocks` by strain group.
    pub fn from_blocks(blocks: impl IntoIterator<Item = PartitionedInterval>) -> Self {
        let mut eq = EquivalenceClasses::default();
        for block in blocks {
            eq.insert(block);
        }
        eq
    }

    /// Add one block, creating its class if needed.
    pub fn insert(&mut self, block: PartitionedInterval) {
        match self.class_id.get(&block.strain_group) {
            Some(&id) => self.classes[id].members.push(block),
            None => {
                self.class_id
                    .insert(block.strain_group.clone(), self.classes.len());
                self.classes.push(EquivalenceClass {
                    strain_group: block.strain_group.clone(),
                    members: vec![block],
                });
            }
        }
    }

    /// Return the number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True if no block was grouped.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Return the classes in first-occurrence order.
    pub fn classes(&self) -> &[EquivalenceClass] {
        &self.classes
    }

    /// Return the class holding exactly `strain_group`, if any.
    pub fn class_of(&self, strain_group: &Sdp) -> Option<&EquivalenceClass> {
        self.class_id.get(strain_group).map(|&id| &self.classes[id])
    }

    /// Return an iterator over all member blocks, class by class.
    pub fn members(&self) -> impl Iterator<Item = &PartitionedInterval> + '_ {
        self.classes.iter().flat_map(|c| c.members.iter())
    }

    /// Consume the grouping and return the classes.
    pub fn into_classes(self) -> Vec<EquivalenceClass> {
        self.classes
    }
}

/// Group blocks by identical strain membership.
pub fn create_equivalence_classes_from_blocks(
    blocks: impl IntoIterator<Item = PartitionedInterval>,
) -> Vec<EquivalenceClass> {
    EquivalenceClasses::from_blocks(blocks).into_classes()
}
