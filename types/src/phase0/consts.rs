use core::num::NonZeroU64;

use hex_literal::hex;
use nonzero_ext::nonzero;

use crate::phase0::primitives::{DomainType, Epoch, Slot, H32};

pub const BASE_REWARDS_PER_EPOCH: NonZeroU64 = nonzero!(5_u64);
pub const BLS_WITHDRAWAL_PREFIX: u8 = 0;
pub const DOMAIN_ATTESTATION: DomainType = H32(hex!("02000000"));
pub const DOMAIN_BEACON_PROPOSER: DomainType = H32(hex!("00000000"));
pub const DOMAIN_DEPOSIT: DomainType = H32(hex!("03000000"));
pub const DOMAIN_RANDAO: DomainType = H32(hex!("01000000"));
pub const DOMAIN_TRANSFER: DomainType = H32(hex!("05000000"));
pub const DOMAIN_VOLUNTARY_EXIT: DomainType = H32(hex!("04000000"));
pub const FAR_FUTURE_EPOCH: Epoch = Epoch::MAX;
pub const GENESIS_EPOCH: Epoch = 0;
pub const GENESIS_SLOT: Slot = 0;
pub const MAX_RANDOM_BYTE: u64 = (1 << 8) - 1;
