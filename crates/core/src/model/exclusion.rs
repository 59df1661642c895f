use std::collections::BTreeSet;

use crate::model::ids::QuestionIndex;

/// Question indices the user removed from the default rotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    indices: BTreeSet<QuestionIndex>,
}

impl ExclusionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, index: QuestionIndex) -> bool {
        self.indices.contains(&index)
    }

    /// Returns true if the index was newly excluded.
    pub fn insert(&mut self, index: QuestionIndex) -> bool {
        self.indices.insert(index)
    }

    /// Returns true if the index was excluded before.
    pub fn remove(&mut self, index: QuestionIndex) -> bool {
        self.indices.remove(&index)
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Excluded indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = QuestionIndex> + '_ {
        self.indices.iter().copied()
    }
}

impl FromIterator<QuestionIndex> for ExclusionSet {
    fn from_iter<T: IntoIterator<Item = QuestionIndex>>(iter: T) -> Self {
        Self {
            indices: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_sorted_without_duplicates() {
        let set: ExclusionSet = [5, 1, 5, 3]
            .into_iter()
            .map(QuestionIndex::new)
            .collect();
        let values: Vec<_> = set.iter().map(|i| i.value()).collect();
        assert_eq!(values, vec![1, 3, 5]);
    }
}
