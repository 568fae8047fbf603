//! Keypoint sets.

use std::collections::BTreeSet;

use super::index::VertexId;
use crate::error::{Error, Result};

/// The vertices reported in every label file, in ascending canonical id order.
///
/// The position of an id in this order is its line index in a label file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeypointSet {
    ids: BTreeSet<VertexId>,
}

impl KeypointSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex. Returns `false` if it was already present.
    pub fn insert(&mut self, id: VertexId) -> bool {
        self.ids.insert(id)
    }

    /// Number of keypoints.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether `id` is a keypoint.
    pub fn contains(&self, id: VertexId) -> bool {
        self.ids.contains(&id)
    }

    /// Build a set from raw vertex ids.
    ///
    /// An id that cannot name any vertex (one past 32 bits) is
    /// [`Error::UnknownKeypoint`].
    pub fn from_indices<I: IntoIterator<Item = usize>>(ids: I) -> Result<Self> {
        ids.into_iter()
            .map(|id| VertexId::try_new(id).ok_or(Error::UnknownKeypoint { id }))
            .collect()
    }

    /// Keypoints in ascending id order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = VertexId> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<VertexId> for KeypointSet {
    fn from_iter<T: IntoIterator<Item = VertexId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_and_deduplicated() {
        let set = KeypointSet::from_indices(vec![7, 2, 7, 5]).unwrap();
        assert_eq!(set.len(), 3);
        let ids: Vec<usize> = set.iter().map(|v| v.index()).collect();
        assert_eq!(ids, vec![2, 5, 7]);
        assert!(set.contains(VertexId::new(5)));
        assert!(!set.contains(VertexId::new(3)));
    }

    #[test]
    fn test_ids_beyond_32_bits_are_unknown() {
        let too_large = u32::MAX as usize + 1;
        let err = KeypointSet::from_indices(vec![1, too_large, 2]).unwrap_err();
        assert!(matches!(err, Error::UnknownKeypoint { id } if id == too_large));
    }
}
