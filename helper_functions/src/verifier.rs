#![expect(clippy::module_name_repetitions)]

use anyhow::Result;
use bls::{PublicKeyBytes, SignatureBytes};
use types::phase0::primitives::{Domain, H256};

/// Signature checking policy.
///
/// Validation functions take a `Verifier` so that callers who have already checked a signature
/// can skip doing it again.
pub trait Verifier {
    fn verify_singular(
        &mut self,
        message_hash: H256,
        public_key: PublicKeyBytes,
        signature: SignatureBytes,
        domain: Domain,
    ) -> Result<bool>;

    fn verify_multiple(
        &mut self,
        public_keys: &[PublicKeyBytes],
        message_hashes: &[H256],
        signature: SignatureBytes,
        domain: Domain,
    ) -> Result<bool>;
}

impl<V: Verifier> Verifier for &mut V {
    #[inline]
    fn verify_singular(
        &mut self,
        message_hash: H256,
        public_key: PublicKeyBytes,
        signature: SignatureBytes,
        domain: Domain,
    ) -> Result<bool> {
        (*self).verify_singular(message_hash, public_key, signature, domain)
    }

    #[inline]
    fn verify_multiple(
        &mut self,
        public_keys: &[PublicKeyBytes],
        message_hashes: &[H256],
        signature: SignatureBytes,
        domain: Domain,
    ) -> Result<bool> {
        (*self).verify_multiple(public_keys, message_hashes, signature, domain)
    }
}

pub struct NullVerifier;

impl Verifier for NullVerifier {
    #[inline]
    fn verify_singular(
        &mut self,
        _message_hash: H256,
        _public_key: PublicKeyBytes,
        _signature: SignatureBytes,
        _domain: Domain,
    ) -> Result<bool> {
        Ok(true)
    }

    #[inline]
    fn verify_multiple(
        &mut self,
        _public_keys: &[PublicKeyBytes],
        _message_hashes: &[H256],
        _signature: SignatureBytes,
        _domain: Domain,
    ) -> Result<bool> {
        Ok(true)
    }
}

pub struct SingleVerifier;

impl Verifier for SingleVerifier {
    #[inline]
    fn verify_singular(
        &mut self,
        message_hash: H256,
        public_key: PublicKeyBytes,
        signature: SignatureBytes,
        domain: Domain,
    ) -> Result<bool> {
        Ok(bls::verify(message_hash, public_key, signature, domain))
    }

    #[inline]
    fn verify_multiple(
        &mut self,
        public_keys: &[PublicKeyBytes],
        message_hashes: &[H256],
        signature: SignatureBytes,
        domain: Domain,
    ) -> Result<bool> {
        bls::verify_multiple(public_keys, message_hashes, signature, domain).map_err(Into::into)
    }
}
