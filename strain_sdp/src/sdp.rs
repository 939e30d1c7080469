// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

use bitvec::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A set of strain indices over a universe of fixed size.
///
/// Bit `i` is set when strain `i` carries the minority allele (for SNP
/// columns) or belongs to the group (for haplotype strain groups).  The
/// universe size travels with the bits, so SDPs built over different
/// universes never compare equal.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Sdp {
    bits: BitVec<u64, Lsb0>,
}

impl Sdp {
    /// The empty set over `n` strains.
    pub fn new(n: usize) -> Sdp {
        Sdp {
            bits: bitvec![u64, Lsb0; 0; n],
        }
    }

    /// The set of all `n` strains.
    pub fn full(n: usize) -> Sdp {
        Sdp {
            bits: bitvec![u64, Lsb0; 1; n],
        }
    }

    /// Build from the indices of the set strains.  Indices must be below `n`.
    pub fn from_indices(n: usize, indices: impl IntoIterator<Item = usize>) -> Sdp {
        let mut sdp = Sdp::new(n);
        for i in indices {
            sdp.bits.set(i, true);
        }
        sdp
    }

    /// Build from one flag per strain.
    pub fn from_flags(flags: impl IntoIterator<Item = bool>) -> Sdp {
        Sdp {
            bits: flags.into_iter().collect(),
        }
    }

    /// Size of the strain universe (not the number of set strains).
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Number of strains in the set.
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    /// True if no strain is set.
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// True if every strain of the universe is set.
    pub fn is_full(&self) -> bool {
        self.bits.all()
    }

    /// Is strain `i` in the set?
    pub fn contains(&self, i: usize) -> bool {
        self.bits[i]
    }

    /// Add or remove strain `i`.
    pub fn set(&mut self, i: usize, value: bool) {
        self.bits.set(i, value);
    }

    /// Indices of the set strains, ascending.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    /// True if every strain of `self` is also in `other`.
    pub fn is_subset_of(&self, other: &Sdp) -> bool {
        self.len() == other.len() && self.indices().all(|i| other.bits[i])
    }

    /// Subset test that excludes equality.
    pub fn is_proper_subset_of(&self, other: &Sdp) -> bool {
        self.count() < other.count() && self.is_subset_of(other)
    }

    /// True if the two sets share no strain.
    pub fn is_disjoint(&self, other: &Sdp) -> bool {
        self.indices().all(|i| !other.bits[i])
    }

    /// Perfect-phylogeny compatibility: one set contains the other or
    /// they are disjoint.
    pub fn is_compatible_with(&self, other: &Sdp) -> bool {
        self.is_disjoint(other) || self.is_subset_of(other) || other.is_subset_of(self)
    }

    /// Strains in both sets.
    pub fn intersection(&self, other: &Sdp) -> Sdp {
        let mut bits = self.bits.clone();
        bits &= other.bits.as_bitslice();
        Sdp { bits }
    }

    /// Strains in either set.
    pub fn union(&self, other: &Sdp) -> Sdp {
        let mut bits = self.bits.clone();
        bits |= other.bits.as_bitslice();
        Sdp { bits }
    }

    /// Strains of `self` that are not in `other`.
    pub fn difference(&self, other: &Sdp) -> Sdp {
        Sdp::from_indices(self.len(), self.indices().filter(|&i| !other.bits[i]))
    }

    /// Strains of the universe that are not in the set.
    pub fn complement(&self) -> Sdp {
        Sdp {
            bits: self.bits.iter().by_vals().map(|b| !b).collect(),
        }
    }
}

/// Make the set side of `sdp` the minority side.
///
/// The bits are flipped only when strictly more than half of the strains
/// are set.  An exact half split keeps its original assignment, so callers
/// that build SDPs relative to strain 0 always leave strain 0 on the unset
/// side in that case.
pub fn normalize_minority(sdp: Sdp) -> Sdp {
    if 2 * sdp.count() > sdp.len() {
        sdp.complement()
    } else {
        sdp
    }
}

impl Ord for Sdp {
    // Smaller sets first, then by the lowest differing strain index.
    fn cmp(&self, other: &Self) -> Ordering {
        self.len()
            .cmp(&other.len())
            .then_with(|| self.count().cmp(&other.count()))
            .then_with(|| self.indices().cmp(other.indices()))
    }
}

impl PartialOrd for Sdp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Sdp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sdp{}", self)
    }
}

impl fmt::Display for Sdp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (k, i) in self.indices().enumerate() {
            if k > 0 {
                write!(f, ",")?;
            }
            write!(f, "{i}")?;
        }
        write!(f, "}}/{}", self.len())
    }
}

// Serialized as the universe size plus the set indices, which keeps the
// on-disk form independent of the bit storage layout.
#[derive(Serialize, Deserialize)]
struct SdpRepr {
    strain_count: usize,
    strains: Vec<usize>,
}

impl Serialize for Sdp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SdpRepr {
            strain_count: self.len(),
            strains: self.indices().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Sdp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = SdpRepr::deserialize(deserializer)?;
        if let Some(&bad) = repr.strains.iter().find(|&&i| i >= repr.strain_count) {
            return Err(serde::de::Error::custom(format!(
                "strain index {bad} out of range for {} strains",
                repr.strain_count
            )));
        }
        Ok(Sdp::from_indices(repr.strain_count, repr.strains))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::vec;
    use proptest::prelude::*;

    fn sdp(n: usize, idx: &[usize]) -> Sdp {
        Sdp::from_indices(n, idx.iter().copied())
    }

    #[test]
    fn test_set_algebra() {
        let a = sdp(6, &[0, 1, 2]);
        let b = sdp(6, &[1, 2]);
        let c = sdp(6, &[4, 5]);
        let d = sdp(6, &[2, 3]);
        assert!(b.is_subset_of(&a));
        assert!(b.is_proper_subset_of(&a));
        assert!(!a.is_proper_subset_of(&a));
        assert!(a.is_disjoint(&c));
        assert!(a.is_compatible_with(&b));
        assert!(a.is_compatible_with(&c));
        assert!(!a.is_compatible_with(&d));
        assert_eq!(a.intersection(&d), sdp(6, &[2]));
        assert_eq!(a.union(&c), sdp(6, &[0, 1, 2, 4, 5]));
        assert_eq!(a.difference(&b), sdp(6, &[0]));
        assert_eq!(a.complement(), sdp(6, &[3, 4, 5]));
        assert_eq!(d.indices().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_normalize_minority() {
        // 4 of 5 set: flipped
        assert_eq!(normalize_minority(sdp(5, &[1, 2, 3, 4])), sdp(5, &[0]));
        // exactly half: retained as given
        assert_eq!(normalize_minority(sdp(4, &[1, 2])), sdp(4, &[1, 2]));
        assert_eq!(normalize_minority(sdp(4, &[0, 3])), sdp(4, &[0, 3]));
        // minority already
        assert_eq!(normalize_minority(sdp(5, &[3])), sdp(5, &[3]));
    }

    #[test]
    fn test_ordering_and_display() {
        let mut v = vec![sdp(4, &[0, 1]), sdp(4, &[3]), sdp(4, &[0, 2])];
        v.sort();
        assert_eq!(v, vec![sdp(4, &[3]), sdp(4, &[0, 1]), sdp(4, &[0, 2])]);
        assert_eq!(sdp(4, &[0, 2]).to_string(), "{0,2}/4");
    }

    #[test]
    fn test_serde_round_trip() {
        let a = sdp(70, &[0, 63, 64, 69]);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, r#"{"strain_count":70,"strains":[0,63,64,69]}"#);
        assert_eq!(serde_json::from_str::<Sdp>(&json).unwrap(), a);
        assert!(serde_json::from_str::<Sdp>(r#"{"strain_count":3,"strains":[3]}"#).is_err());
    }

    proptest! {
        #[test]
        fn prop_complement_partitions(flags in vec(any::<bool>(), 1..130)) {
            let a = Sdp::from_flags(flags.iter().copied());
            let c = a.complement();
            prop_assert!(a.is_disjoint(&c));
            prop_assert_eq!(a.union(&c), Sdp::full(a.len()));
            prop_assert_eq!(a.count() + c.count(), a.len());
        }

        #[test]
        fn prop_normalized_is_minority(flags in vec(any::<bool>(), 1..130)) {
            let a = normalize_minority(Sdp::from_flags(flags));
            prop_assert!(2 * a.count() <= a.len());
        }
    }
}
