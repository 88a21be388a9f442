pub use ethereum_types::{H256, H32};
pub use hashing;

pub use crate::{
    bitfield::Bitfield,
    error::Error,
    merkle_tree::{depth_for_chunks, merkleize_bytes, merkleize_chunks, merkleize_fields, mix_in_length},
    persistent_list::PersistentList,
    persistent_vector::PersistentVector,
    porcelain::SszHash,
};

mod basic;
mod bitfield;
mod error;
mod merkle_tree;
mod persistent_list;
mod persistent_vector;
mod porcelain;
