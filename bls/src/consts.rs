use crate::{public_key_bytes::PublicKeyBytes, signature_bytes::SignatureBytes};

pub const DOMAIN_SEPARATION_TAG: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Result of aggregating no public keys. It is not a valid point encoding.
pub const EMPTY_PUBKEY: PublicKeyBytes = PublicKeyBytes([0; 48]);

/// Result of aggregating no signatures. It is not a valid point encoding.
pub const EMPTY_SIGNATURE: SignatureBytes = SignatureBytes([0; 96]);
