//! Dense fixed-universe bitsets for cluster membership
//!
//! A [`BitSet`] holds one bit per node of the graph, packed into `u64` words.
//! Bit `i` of the set lives in word `i / 64` at position `i % 64`. Bits past
//! the universe size are always zero so that population counts and equality
//! can work on whole words.

use crate::error::{MetricError, MetricResult};
use serde::{Deserialize, Serialize};

const WORD_BITS: usize = u64::BITS as usize;

#[inline]
fn word_count(universe: usize) -> usize {
    universe.div_ceil(WORD_BITS)
}

#[inline]
fn location(index: usize) -> (usize, u64) {
    (index / WORD_BITS, 1u64 << (index % WORD_BITS))
}

/// A subset of the node universe `[0, universe_size)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBitSet")]
pub struct BitSet {
    universe: usize,
    words: Vec<u64>,
}

/// Unchecked wire form of a [`BitSet`]
#[derive(Deserialize)]
struct RawBitSet {
    universe: usize,
    words: Vec<u64>,
}

impl TryFrom<RawBitSet> for BitSet {
    type Error = MetricError;

    fn try_from(raw: RawBitSet) -> MetricResult<Self> {
        let malformed = MetricError::MalformedBitSet {
            universe: raw.universe,
            words: raw.words.len(),
        };
        if raw.words.len() != word_count(raw.universe) {
            return Err(malformed);
        }
        // padding bits past the universe must be clear
        let tail = raw.universe % WORD_BITS;
        if tail != 0 && raw.words.last().is_some_and(|w| w >> tail != 0) {
            return Err(malformed);
        }
        Ok(BitSet {
            universe: raw.universe,
            words: raw.words,
        })
    }
}

impl BitSet {
    /// Create an empty set over `universe` nodes
    pub fn empty(universe: usize) -> Self {
        Self {
            universe,
            words: vec![0u64; word_count(universe)],
        }
    }

    /// Create a set containing every node of the universe
    pub fn full(universe: usize) -> Self {
        let mut set = Self {
            universe,
            words: vec![u64::MAX; word_count(universe)],
        };
        set.clear_padding();
        set
    }

    /// Build a set from node ids; duplicates collapse
    pub fn from_indices<I>(indices: I, universe: usize) -> MetricResult<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut set = Self::empty(universe);
        for index in indices {
            set.insert(index)?;
        }
        Ok(set)
    }

    /// Mark a node as present. Only used while a set is being built.
    pub(crate) fn insert(&mut self, index: usize) -> MetricResult<()> {
        if index >= self.universe {
            return Err(MetricError::index_out_of_range(index, self.universe));
        }
        let (word, mask) = location(index);
        self.words[word] |= mask;
        Ok(())
    }

    /// Number of nodes in the universe
    pub fn universe_size(&self) -> usize {
        self.universe
    }

    /// Backing words, lowest node ids first
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Membership test; ids outside the universe are never members
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        if index >= self.universe {
            return false;
        }
        let (word, mask) = location(index);
        self.words[word] & mask != 0
    }

    /// Population count
    #[inline]
    pub fn popcnt(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    fn check_universe(&self, other: &BitSet) -> MetricResult<()> {
        if self.universe != other.universe {
            return Err(MetricError::universe_mismatch(self.universe, other.universe));
        }
        Ok(())
    }

    /// In-place OR, used by the reductions
    pub(crate) fn union_with(&mut self, other: &BitSet) -> MetricResult<()> {
        self.check_universe(other)?;
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= *b;
        }
        Ok(())
    }

    /// Set union as a new value
    pub fn union(&self, other: &BitSet) -> MetricResult<BitSet> {
        let mut out = self.clone();
        out.union_with(other)?;
        Ok(out)
    }

    /// Set intersection as a new value
    pub fn intersection(&self, other: &BitSet) -> MetricResult<BitSet> {
        self.check_universe(other)?;
        let words = self
            .words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| a & b)
            .collect();
        Ok(BitSet {
            universe: self.universe,
            words,
        })
    }

    /// Size of the intersection without allocating it
    pub fn intersection_len(&self, other: &BitSet) -> MetricResult<usize> {
        self.check_universe(other)?;
        Ok(self
            .words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum())
    }

    /// Nodes of the universe not in this set
    pub fn complement(&self) -> BitSet {
        let mut out = BitSet {
            universe: self.universe,
            words: self.words.iter().map(|w| !w).collect(),
        };
        out.clear_padding();
        out
    }

    /// Union of every set in `sets`, or the empty set over `universe` when
    /// there are none
    pub fn union_all<'a, I>(sets: I, universe: usize) -> MetricResult<BitSet>
    where
        I: IntoIterator<Item = &'a BitSet>,
    {
        let mut acc = BitSet::empty(universe);
        for set in sets {
            acc.union_with(set)?;
        }
        Ok(acc)
    }

    /// Iterate over members in ascending order
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            words: &self.words,
            word_index: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }

    fn clear_padding(&mut self) {
        let tail = self.universe % WORD_BITS;
        if tail != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << tail) - 1;
            }
        }
    }
}

/// Ascending iterator over the members of a [`BitSet`]
pub struct Iter<'a> {
    words: &'a [u64],
    word_index: usize,
    current: u64,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                // clear lowest set bit
                self.current &= self.current - 1;
                return Some(self.word_index * WORD_BITS + bit);
            }
            self.word_index += 1;
            if self.word_index >= self.words.len() {
                return None;
            }
            self.current = self.words[self.word_index];
        }
    }
}

impl<'a> IntoIterator for &'a BitSet {
    type Item = usize;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn set(indices: &[usize], universe: usize) -> BitSet {
        BitSet::from_indices(indices.iter().copied(), universe).unwrap()
    }

    #[test]
    fn test_deserialize_checks_words() {
        let bs = set(&[0, 65], 70);
        let json = serde_json::to_string(&bs).unwrap();
        let back: BitSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bs);

        // bit 3 is past a universe of 3
        let padded = r#"{"universe":3,"words":[8]}"#;
        assert!(serde_json::from_str::<BitSet>(padded).is_err());

        let short = r#"{"universe":70,"words":[1]}"#;
        assert!(serde_json::from_str::<BitSet>(short).is_err());

        let exact = r#"{"universe":64,"words":[18446744073709551615]}"#;
        assert_eq!(serde_json::from_str::<BitSet>(exact).unwrap().popcnt(), 64);
    }

    #[test]
    fn test_from_indices_round_trip() {
        let input = [3, 0, 64, 3, 129, 64, 7];
        let bs = set(&input, 130);
        let expected: BTreeSet<usize> = input.iter().copied().collect();
        let actual: BTreeSet<usize> = bs.iter().collect();
        assert_eq!(actual, expected);
        assert_eq!(bs.popcnt(), expected.len());
        assert!(bs.contains(129));
        assert!(!bs.contains(128));
        assert!(!bs.contains(500));
    }

    #[test]
    fn test_out_of_range() {
        let err = BitSet::from_indices([0, 6], 6).unwrap_err();
        assert!(matches!(
            err,
            MetricError::IndexOutOfRange { index: 6, universe: 6 }
        ));
    }

    #[test]
    fn test_union_bounds() {
        let a = set(&[0, 1, 2, 70], 100);
        let b = set(&[2, 3, 70, 99], 100);
        let u = a.union(&b).unwrap();
        assert!(u.popcnt() >= a.popcnt().max(b.popcnt()));
        assert!(u.popcnt() <= a.popcnt() + b.popcnt());
        assert_eq!(u.iter().collect::<Vec<_>>(), vec![0, 1, 2, 3, 70, 99]);
    }

    #[test]
    fn test_union_commutative_associative() {
        let a = set(&[1, 5, 63], 65);
        let b = set(&[0, 64], 65);
        let c = set(&[5, 6, 7], 65);
        assert_eq!(a.union(&b).unwrap(), b.union(&a).unwrap());
        assert_eq!(
            a.union(&b).unwrap().union(&c).unwrap(),
            a.union(&b.union(&c).unwrap()).unwrap()
        );
    }

    #[test]
    fn test_universe_mismatch() {
        let a = set(&[1], 10);
        let b = set(&[1], 11);
        assert!(matches!(
            a.union(&b),
            Err(MetricError::UniverseMismatch { left: 10, right: 11 })
        ));
        assert!(a.intersection(&b).is_err());
        assert!(BitSet::union_all([&a, &b], 10).is_err());
    }

    #[test]
    fn test_union_all_empty_input() {
        let u = BitSet::union_all(std::iter::empty(), 70).unwrap();
        assert_eq!(u.universe_size(), 70);
        assert_eq!(u.popcnt(), 0);
        assert!(u.is_empty());
    }

    #[test]
    fn test_intersection() {
        let a = set(&[1, 2, 3, 100], 128);
        let b = set(&[2, 3, 4, 100], 128);
        assert_eq!(a.intersection(&b).unwrap().iter().collect::<Vec<_>>(), vec![2, 3, 100]);
        assert_eq!(a.intersection_len(&b).unwrap(), 3);
    }

    #[test]
    fn test_complement_keeps_padding_clear() {
        let a = set(&[0, 2], 67);
        let c = a.complement();
        assert_eq!(c.popcnt(), 65);
        assert!(!c.contains(0));
        assert!(c.contains(66));
        assert_eq!(BitSet::full(67), a.union(&c).unwrap());
        assert_eq!(BitSet::full(67).popcnt(), 67);
        assert_eq!(BitSet::full(128).popcnt(), 128);
    }

    #[test]
    fn test_zero_universe() {
        let bs = BitSet::empty(0);
        assert_eq!(bs.popcnt(), 0);
        assert_eq!(bs.iter().count(), 0);
        assert_eq!(BitSet::full(0).popcnt(), 0);
    }
}
