use core::{
    fmt::{Debug, Formatter, Result as FmtResult},
    marker::PhantomData,
};

use derivative::Derivative;
use ethereum_types::H256;
use im::Vector;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use typenum::{NonZero, Unsigned, U1};

use crate::{
    error::{checked_index, Error},
    merkle_tree::{depth_for_chunks, merkleize_chunks},
    porcelain::SszHash,
};

/// A vector of exactly `N` elements that shares structure between versions.
#[derive(Derivative)]
#[derivative(
    Clone(bound = "T: Clone"),
    PartialEq(bound = "T: Clone + PartialEq"),
    Eq(bound = "T: Clone + Eq")
)]
pub struct PersistentVector<T, N> {
    elements: Vector<T>,
    phantom: PhantomData<N>,
}

impl<T: Clone + Default, N: Unsigned + NonZero> Default for PersistentVector<T, N> {
    fn default() -> Self {
        Self::repeat_element(T::default())
    }
}

impl<T: Clone + Debug, N> Debug for PersistentVector<T, N> {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        formatter.debug_list().entries(&self.elements).finish()
    }
}

impl<'vector, T: Clone, N> IntoIterator for &'vector PersistentVector<T, N> {
    type Item = &'vector T;
    type IntoIter = im::vector::Iter<'vector, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<T: Clone + Serialize, N> Serialize for PersistentVector<T, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self)
    }
}

impl<'de, T: Clone + Deserialize<'de>, N: Unsigned + NonZero> Deserialize<'de>
    for PersistentVector<T, N>
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let elements = Vec::<T>::deserialize(deserializer)?;
        Self::try_from_iter(elements).map_err(D::Error::custom)
    }
}

impl<T: Clone + SszHash, N: Unsigned + NonZero> SszHash for PersistentVector<T, N> {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        let chunk_count = N::USIZE.div_ceil(T::PackingFactor::USIZE);
        merkleize_chunks(T::chunks(self), depth_for_chunks(chunk_count))
    }
}

impl<T: Clone, N: Unsigned + NonZero> PersistentVector<T, N> {
    #[must_use]
    pub fn repeat_element(element: T) -> Self {
        Self {
            elements: core::iter::repeat_n(element, N::USIZE).collect(),
            phantom: PhantomData,
        }
    }

    pub fn try_from_iter(elements: impl IntoIterator<Item = T>) -> Result<Self, Error> {
        let elements = elements.into_iter().collect::<Vector<_>>();

        if elements.len() != N::USIZE {
            return Err(Error::VectorSizeMismatch {
                expected: N::USIZE,
                actual: elements.len(),
            });
        }

        Ok(Self {
            elements,
            phantom: PhantomData,
        })
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        N::USIZE
    }

    pub fn get(&self, index: u64) -> Result<&T, Error> {
        let position = checked_index(index, N::USIZE)?;
        Ok(&self.elements[position])
    }

    pub fn get_mut(&mut self, index: u64) -> Result<&mut T, Error> {
        let position = checked_index(index, N::USIZE)?;
        Ok(&mut self.elements[position])
    }

    /// Returns the element at `index % N`.
    ///
    /// Ring buffers in `BeaconState` are indexed this way.
    #[must_use]
    pub fn mod_index(&self, index: u64) -> &T {
        &self.elements[Self::wrap(index)]
    }

    pub fn mod_index_mut(&mut self, index: u64) -> &mut T {
        &mut self.elements[Self::wrap(index)]
    }

    /// Returns a new vector in which the element at `index` is replaced with `function(old)`.
    pub fn update_with(&self, index: u64, function: impl FnOnce(&T) -> T) -> Result<Self, Error> {
        let position = checked_index(index, N::USIZE)?;
        let new_value = function(&self.elements[position]);

        Ok(Self {
            elements: self.elements.update(position, new_value),
            phantom: PhantomData,
        })
    }

    pub fn iter(&self) -> im::vector::Iter<'_, T> {
        self.elements.iter()
    }

    pub fn iter_mut(&mut self) -> im::vector::IterMut<'_, T> {
        self.elements.iter_mut()
    }

    fn wrap(index: u64) -> usize {
        usize::try_from(index % N::U64)
            .expect("remainder of division by N fits in usize because N::USIZE exists")
    }
}
