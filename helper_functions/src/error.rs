use thiserror::Error;
use types::phase0::primitives::{Epoch, Shard, Slot};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("custody bit 1 indices must be empty")]
    CustodyBitOneIndicesPresent,
    #[error("attestation has {count} attesting indices but at most {maximum} are allowed")]
    TooManyAttestingIndices { count: usize, maximum: u64 },
    #[error("custody bit 0 and custody bit 1 indices overlap")]
    CustodyBitIndicesOverlap,
    #[error("indices with custody bit {custody_bit} are not sorted")]
    CustodyBitIndicesNotSorted { custody_bit: bool },
    #[error("attestation signature is invalid")]
    InvalidAttestationSignature,
    #[error("signature is invalid")]
    InvalidSignature,
    #[error("epoch {epoch} is neither the previous nor the current epoch")]
    EpochNotPreviousOrCurrent { epoch: Epoch },
    #[error("epoch {epoch} is after the next epoch")]
    EpochAfterNext { epoch: Epoch },
    #[error("slot {slot} is out of range")]
    SlotOutOfRange { slot: Slot },
    #[error("shard {shard} is out of range")]
    ShardOutOfRange { shard: Shard },
    #[error("no validators are active")]
    NoActiveValidators,
    #[error("failed to select proposer")]
    FailedToSelectProposer,
    #[error("epoch number overflowed")]
    EpochOverflow,
}
