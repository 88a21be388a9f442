use core::fmt::{Debug, Formatter, Result as FmtResult};

use derivative::Derivative;
use ethereum_types::H256;
use im::Vector;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use typenum::U1;

use crate::{
    error::{checked_index, Error},
    merkle_tree::{depth_for_chunks, merkleize_chunks, mix_in_length},
    porcelain::SszHash,
};

/// A list without a length limit that shares structure between versions.
///
/// Cloning is O(1). Replacing an element is O(log n) and leaves other clones untouched.
#[derive(Derivative)]
#[derivative(
    Clone(bound = "T: Clone"),
    PartialEq(bound = "T: Clone + PartialEq"),
    Eq(bound = "T: Clone + Eq"),
    Default(bound = "T: Clone")
)]
pub struct PersistentList<T> {
    elements: Vector<T>,
}

impl<T: Clone + Debug> Debug for PersistentList<T> {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        formatter.debug_list().entries(self).finish()
    }
}

impl<T: Clone> FromIterator<T> for PersistentList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(elements: I) -> Self {
        Self {
            elements: elements.into_iter().collect(),
        }
    }
}

impl<'list, T: Clone> IntoIterator for &'list PersistentList<T> {
    type Item = &'list T;
    type IntoIter = im::vector::Iter<'list, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<T: Clone + Serialize> Serialize for PersistentList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self)
    }
}

impl<'de, T: Clone + Deserialize<'de>> Deserialize<'de> for PersistentList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from_iter)
    }
}

impl<T: Clone + SszHash> SszHash for PersistentList<T> {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        let chunks = T::chunks(self);
        let depth = depth_for_chunks(chunks.len());
        mix_in_length(merkleize_chunks(chunks, depth), self.len())
    }
}

// Containers that are only built in memory hold lists as plain vectors.
impl<T: SszHash> SszHash for Vec<T> {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        let chunks = T::chunks(self);
        let depth = depth_for_chunks(chunks.len());
        mix_in_length(merkleize_chunks(chunks, depth), self.len())
    }
}

impl<T: Clone> PersistentList<T> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: u64) -> Result<&T, Error> {
        let position = checked_index(index, self.len())?;
        Ok(&self.elements[position])
    }

    pub fn get_mut(&mut self, index: u64) -> Result<&mut T, Error> {
        let position = checked_index(index, self.len())?;
        Ok(&mut self.elements[position])
    }

    /// Returns a new list in which the element at `index` is replaced with `function(old)`.
    ///
    /// `self` is not modified. All other elements are shared with it.
    pub fn update_with(&self, index: u64, function: impl FnOnce(&T) -> T) -> Result<Self, Error> {
        let position = checked_index(index, self.len())?;
        let new_value = function(&self.elements[position]);

        Ok(Self {
            elements: self.elements.update(position, new_value),
        })
    }

    pub fn push(&mut self, element: T) {
        self.elements.push_back(element);
    }

    pub fn iter(&self) -> im::vector::Iter<'_, T> {
        self.elements.iter()
    }

    pub fn iter_mut(&mut self) -> im::vector::IterMut<'_, T> {
        self.elements.iter_mut()
    }
}
