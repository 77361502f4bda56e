use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};

mod subsets;
pub use subsets::{theme_subsets, ThemeSubsets};

mod plain;
pub use plain::find_confusable_subsets;

mod deidentified;
pub use deidentified::{
    deidentified_encodings, find_confusable_subsets_deidentified, SubsetEncoding,
};

/// A maximally confusable subset: plat column indices whose forms
/// cannot be reliably told apart across some rows of the plat.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct McSet(BTreeSet<usize>);

impl McSet {
    pub fn from_columns(columns: impl IntoIterator<Item = usize>) -> Self {
        McSet(columns.into_iter().collect())
    }

    /// The column indices, ascending.
    pub fn columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, column: usize) -> bool {
        self.0.contains(&column)
    }

    pub fn intersection(&self, other: &McSet) -> McSet {
        McSet(self.0.intersection(&other.0).copied().collect())
    }

    pub fn is_strict_subset_of(&self, other: &McSet) -> bool {
        self.0.is_subset(&other.0) && self.0 != other.0
    }
}

impl FromIterator<usize> for McSet {
    fn from_iter<I: IntoIterator<Item = usize>>(columns: I) -> Self {
        McSet::from_columns(columns)
    }
}

impl Debug for McSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Drop every candidate that is a strict subset of another candidate
/// from the same comparison.
fn prune_subsumed(sets: Vec<McSet>) -> Vec<McSet> {
    sets.iter()
        .filter(|set| !sets.iter().any(|other| set.is_strict_subset_of(other)))
        .cloned()
        .collect()
}
