pub use crate::{
    consts::{DOMAIN_SEPARATION_TAG, EMPTY_PUBKEY, EMPTY_SIGNATURE},
    error::Error,
    public_key_bytes::PublicKeyBytes,
    secret_key::{SecretKey, SIZE as SECRET_KEY_SIZE},
    signature::{aggregate_pubkeys, aggregate_signatures, sign, verify, verify_multiple},
    signature_bytes::SignatureBytes,
};

mod consts;
mod error;
mod public_key_bytes;
mod secret_key;
mod signature;
mod signature_bytes;
