pub use ethereum_types::{H256, H32};

pub type Domain = u64;
pub type DomainType = H32;
pub type Epoch = u64;
pub type Gwei = u64;
pub type Shard = u64;
pub type Slot = u64;
pub type UnixSeconds = u64;
pub type ValidatorIndex = u64;
pub type Version = H32;
