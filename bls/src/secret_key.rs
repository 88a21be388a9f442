use blst::min_pk::SecretKey as RawSecretKey;

use crate::{consts::DOMAIN_SEPARATION_TAG, error::Error, public_key_bytes::PublicKeyBytes};

pub const SIZE: usize = 32;

#[derive(derive_more::Debug)]
#[debug("[REDACTED]")]
pub struct SecretKey(RawSecretKey);

// Prevent `SecretKey` from implementing some traits to avoid leaking secret keys.
static_assertions::assert_not_impl_any! {
    SecretKey:
    Clone, Copy, core::ops::Deref, ToOwned, core::fmt::Display, core::fmt::LowerHex,
}

impl PartialEq for SecretKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bytes() == other.0.to_bytes()
    }
}

impl Eq for SecretKey {}

impl TryFrom<[u8; SIZE]> for SecretKey {
    type Error = Error;

    /// Accepts big-endian scalars that are nonzero and below the curve order.
    #[inline]
    fn try_from(bytes: [u8; SIZE]) -> Result<Self, Self::Error> {
        RawSecretKey::from_bytes(&bytes)
            .map(Self)
            .map_err(|_| Error::InvalidSecretKey)
    }
}

impl SecretKey {
    #[must_use]
    pub fn to_public_key(&self) -> PublicKeyBytes {
        PublicKeyBytes(self.0.sk_to_pk().compress())
    }

    pub(crate) fn sign_raw(&self, message: &[u8]) -> blst::min_pk::Signature {
        self.0.sign(message, DOMAIN_SEPARATION_TAG, &[])
    }
}
