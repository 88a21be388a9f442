use blst::{
    min_pk::{
        AggregatePublicKey, AggregateSignature, PublicKey as RawPublicKey,
        Signature as RawSignature,
    },
    BLST_ERROR,
};
use itertools::Itertools as _;
use ssz::H256;

use crate::{
    consts::{DOMAIN_SEPARATION_TAG, EMPTY_PUBKEY, EMPTY_SIGNATURE},
    error::Error,
    public_key_bytes::PublicKeyBytes,
    secret_key::SecretKey,
    signature_bytes::SignatureBytes,
};

const MESSAGE_SIZE: usize = H256::len_bytes() + size_of::<u64>();

// The domain is appended to the message hash in big-endian order.
fn message(message_hash: H256, domain: u64) -> [u8; MESSAGE_SIZE] {
    let mut message = [0; MESSAGE_SIZE];
    message[..H256::len_bytes()].copy_from_slice(message_hash.as_bytes());
    message[H256::len_bytes()..].copy_from_slice(&domain.to_be_bytes());
    message
}

#[must_use]
pub fn sign(message_hash: H256, secret_key: &SecretKey, domain: u64) -> SignatureBytes {
    let signature = secret_key.sign_raw(&message(message_hash, domain));
    SignatureBytes(signature.compress())
}

#[must_use]
pub fn verify(
    message_hash: H256,
    public_key: PublicKeyBytes,
    signature: SignatureBytes,
    domain: u64,
) -> bool {
    let Ok(public_key) = decompress_public_key(public_key) else {
        return false;
    };

    let Ok(signature) = decompress_signature(signature) else {
        return false;
    };

    let result = signature.verify(
        true,
        &message(message_hash, domain),
        DOMAIN_SEPARATION_TAG,
        &[],
        &public_key,
        false,
    );

    result == BLST_ERROR::BLST_SUCCESS
}

/// Verifies `signature` as an aggregate of signatures over distinct `(public key, message)` pairs.
///
/// Pairs whose public key is [`EMPTY_PUBKEY`] contribute nothing. If no pairs remain,
/// the signature must be [`EMPTY_SIGNATURE`].
pub fn verify_multiple(
    public_keys: &[PublicKeyBytes],
    message_hashes: &[H256],
    signature: SignatureBytes,
    domain: u64,
) -> Result<bool, Error> {
    if public_keys.len() != message_hashes.len() {
        return Err(Error::LengthMismatch {
            public_keys: public_keys.len(),
            messages: message_hashes.len(),
        });
    }

    let (public_keys, messages): (Vec<_>, Vec<_>) = public_keys
        .iter()
        .zip(message_hashes)
        .filter(|(public_key, _)| **public_key != EMPTY_PUBKEY)
        .map(|(public_key, message_hash)| (*public_key, message(*message_hash, domain)))
        .unzip();

    if public_keys.is_empty() {
        return Ok(signature == EMPTY_SIGNATURE);
    }

    let Ok(signature) = decompress_signature(signature) else {
        return Ok(false);
    };

    let Ok(public_keys) = public_keys
        .into_iter()
        .map(decompress_public_key)
        .collect::<Result<Vec<_>, _>>()
    else {
        return Ok(false);
    };

    let public_keys = public_keys.iter().collect_vec();
    let messages = messages.iter().map(<[u8; MESSAGE_SIZE]>::as_slice).collect_vec();

    let result = signature.aggregate_verify(
        true,
        messages.as_slice(),
        DOMAIN_SEPARATION_TAG,
        public_keys.as_slice(),
        false,
    );

    Ok(result == BLST_ERROR::BLST_SUCCESS)
}

/// Aggregates signatures. Empty signatures are skipped and no signatures yield [`EMPTY_SIGNATURE`].
pub fn aggregate_signatures(
    signatures: impl IntoIterator<Item = SignatureBytes>,
) -> Result<SignatureBytes, Error> {
    let signatures = signatures
        .into_iter()
        .filter(|signature| *signature != EMPTY_SIGNATURE)
        .map(decompress_signature)
        .collect::<Result<Vec<_>, _>>()?;

    if signatures.is_empty() {
        return Ok(EMPTY_SIGNATURE);
    }

    let signatures = signatures.iter().collect_vec();

    let aggregate = AggregateSignature::aggregate(signatures.as_slice(), false)
        .map_err(|_| Error::InvalidSignature)?;

    Ok(SignatureBytes(aggregate.to_signature().compress()))
}

/// Aggregates public keys. Empty keys are skipped and no keys yield [`EMPTY_PUBKEY`].
pub fn aggregate_pubkeys(
    public_keys: impl IntoIterator<Item = PublicKeyBytes>,
) -> Result<PublicKeyBytes, Error> {
    let public_keys = public_keys
        .into_iter()
        .filter(|public_key| *public_key != EMPTY_PUBKEY)
        .map(decompress_public_key)
        .collect::<Result<Vec<_>, _>>()?;

    if public_keys.is_empty() {
        return Ok(EMPTY_PUBKEY);
    }

    let public_keys = public_keys.iter().collect_vec();

    let aggregate = AggregatePublicKey::aggregate(public_keys.as_slice(), false)
        .map_err(|_| Error::InvalidPublicKey)?;

    Ok(PublicKeyBytes(aggregate.to_public_key().compress()))
}

fn decompress_public_key(bytes: PublicKeyBytes) -> Result<RawPublicKey, Error> {
    let public_key = RawPublicKey::uncompress(bytes.as_bytes()).map_err(|_| Error::InvalidPublicKey)?;

    public_key.validate().map_err(|_| Error::InvalidPublicKey)?;

    Ok(public_key)
}

fn decompress_signature(bytes: SignatureBytes) -> Result<RawSignature, Error> {
    RawSignature::uncompress(bytes.as_bytes()).map_err(|_| Error::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use hex_literal::hex;

    use super::*;

    const DOMAIN: u64 = 0x0200_0000_0000_0000;

    fn secret_key(byte: u8) -> Result<SecretKey> {
        let mut bytes = [0; 32];
        bytes[31] = byte;
        SecretKey::try_from(bytes).map_err(Into::into)
    }

    #[test]
    fn verify_succeeds_on_correct_triple() -> Result<()> {
        let secret_key = secret_key(1)?;
        let message_hash = H256(hex!(
            "0101010101010101010101010101010101010101010101010101010101010101"
        ));
        let signature = sign(message_hash, &secret_key, DOMAIN);

        assert!(verify(message_hash, secret_key.to_public_key(), signature, DOMAIN));
        assert!(!verify(message_hash, secret_key.to_public_key(), signature, DOMAIN + 1));
        assert!(!verify(H256::zero(), secret_key.to_public_key(), signature, DOMAIN));

        Ok(())
    }

    #[test]
    fn verify_fails_on_empty_sentinels() -> Result<()> {
        let secret_key = secret_key(2)?;
        let signature = sign(H256::zero(), &secret_key, DOMAIN);

        assert!(!verify(H256::zero(), EMPTY_PUBKEY, signature, DOMAIN));
        assert!(!verify(H256::zero(), secret_key.to_public_key(), EMPTY_SIGNATURE, DOMAIN));

        Ok(())
    }

    #[test]
    fn verify_multiple_skips_empty_public_keys() -> Result<()> {
        let key_1 = secret_key(3)?;
        let key_2 = secret_key(4)?;
        let hash_0 = H256::repeat_byte(0);
        let hash_1 = H256::repeat_byte(1);

        let aggregate_key = aggregate_pubkeys([key_1.to_public_key(), key_2.to_public_key()])?;
        let signature = aggregate_signatures([
            sign(hash_0, &key_1, DOMAIN),
            sign(hash_0, &key_2, DOMAIN),
        ])?;

        assert!(verify_multiple(
            &[aggregate_key, EMPTY_PUBKEY],
            &[hash_0, hash_1],
            signature,
            DOMAIN,
        )?);

        assert!(!verify_multiple(
            &[aggregate_key, EMPTY_PUBKEY],
            &[hash_1, hash_0],
            signature,
            DOMAIN,
        )?);

        Ok(())
    }

    #[test]
    fn verify_multiple_with_only_empty_keys_requires_empty_signature() -> Result<()> {
        let hashes = [H256::zero(), H256::repeat_byte(1)];
        let keys = [EMPTY_PUBKEY, EMPTY_PUBKEY];

        assert!(verify_multiple(&keys, &hashes, EMPTY_SIGNATURE, DOMAIN)?);

        let signature = sign(H256::zero(), &secret_key(5)?, DOMAIN);

        assert!(!verify_multiple(&keys, &hashes, signature, DOMAIN)?);

        Ok(())
    }

    #[test]
    fn verify_multiple_rejects_length_mismatch() {
        assert_eq!(
            verify_multiple(&[EMPTY_PUBKEY], &[], EMPTY_SIGNATURE, DOMAIN),
            Err(Error::LengthMismatch {
                public_keys: 1,
                messages: 0,
            }),
        );
    }

    #[test]
    fn aggregating_nothing_yields_sentinels() -> Result<()> {
        assert_eq!(aggregate_signatures([])?, EMPTY_SIGNATURE);
        assert_eq!(aggregate_pubkeys([])?, EMPTY_PUBKEY);
        Ok(())
    }

    #[test]
    fn aggregating_one_key_is_identity() -> Result<()> {
        let public_key = secret_key(6)?.to_public_key();
        assert_eq!(aggregate_pubkeys([public_key])?, public_key);
        Ok(())
    }
}
