use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("index {index} is out of bounds for collection of length {length}")]
    IndexOutOfBounds { index: u64, length: usize },
    #[error("expected vector to have {expected} elements, found {actual} elements")]
    VectorSizeMismatch { expected: usize, actual: usize },
    #[error("expected bitfield of {expected} bytes, found {actual} bytes")]
    BitfieldLengthMismatch { expected: usize, actual: usize },
    #[error("bitfield has bits set at or beyond position {bit_count}")]
    BitfieldPaddingSet { bit_count: usize },
}

pub(crate) fn checked_index(index: u64, length: usize) -> Result<usize, Error> {
    usize::try_from(index)
        .ok()
        .filter(|position| *position < length)
        .ok_or(Error::IndexOutOfBounds { index, length })
}
