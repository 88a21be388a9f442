use anyhow::Result;
use bls::{PublicKeyBytes, SecretKey};
use genesis::Incremental;
use hex_literal::hex;
use num_bigint::BigUint;
use types::{
    config::Config,
    phase0::{
        beacon_state::BeaconState,
        consts::BLS_WITHDRAWAL_PREFIX,
        primitives::{UnixSeconds, ValidatorIndex, H256},
    },
    preset::Preset,
};

const QUICK_START_ETH1_BLOCK_HASH: H256 = H256([0x42; 32]);

// Encoded in binary to avoid parsing a decimal string at runtime.
const CURVE_ORDER: &[u8] =
    &hex!("73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001");

/// Genesis state with `validator_count` fully funded validators using [`secret_key`] keys.
///
/// The genesis trigger is not checked. Coordinated starts do not care about `MIN_GENESIS_TIME`
/// or the minimum validator count.
pub fn quick_start_beacon_state<P: Preset>(
    config: &Config,
    genesis_time: UnixSeconds,
    validator_count: u64,
) -> Result<BeaconState<P>> {
    let mut incremental = Incremental::new(config);

    incremental.set_genesis_time(genesis_time);

    for index in 0..validator_count {
        let pubkey = secret_key(index).to_public_key();

        incremental.add_validator(
            pubkey,
            bls_withdrawal_credentials(pubkey),
            P::MAX_EFFECTIVE_BALANCE,
        )?;
    }

    incremental.finish(QUICK_START_ETH1_BLOCK_HASH)
}

/// Deterministic secret key for the validator at `validator_index`.
///
/// The key is the SHA-256 hash of the index as a 32 byte little-endian integer,
/// read as a little-endian integer and reduced modulo the curve order.
#[must_use]
pub fn secret_key(validator_index: ValidatorIndex) -> SecretKey {
    let mut index_bytes = [0; 32];
    index_bytes[..size_of::<ValidatorIndex>()].copy_from_slice(&validator_index.to_le_bytes());

    let index_hash = hashing::hash(index_bytes);
    let curve_order = BigUint::from_bytes_be(CURVE_ORDER);
    let secret_key_uint = BigUint::from_bytes_le(index_hash.as_bytes()) % &curve_order;
    let unpadded = secret_key_uint.to_bytes_be();

    let mut padded = [0; bls::SECRET_KEY_SIZE];
    padded[bls::SECRET_KEY_SIZE - unpadded.len()..].copy_from_slice(unpadded.as_slice());

    padded
        .try_into()
        .expect("reduction modulo the curve order produces valid secret keys")
}

#[must_use]
pub fn bls_withdrawal_credentials(pubkey: PublicKeyBytes) -> H256 {
    let mut withdrawal_credentials = hashing::hash(pubkey.as_bytes());
    withdrawal_credentials.as_bytes_mut()[0] = BLS_WITHDRAWAL_PREFIX;
    withdrawal_credentials
}

#[cfg(test)]
mod tests {
    use helper_functions::accessors::get_active_validator_indices;
    use itertools::Itertools as _;
    use types::{phase0::consts::GENESIS_EPOCH, preset::Minimal};

    use super::*;

    #[test]
    fn curve_order_matches_bls12_381() {
        assert_eq!(
            BigUint::from_bytes_be(CURVE_ORDER).to_string(),
            "52435875175126190479447740508185965837690552500527637822603658699938581184513",
        );
    }

    // Published alongside the interop genesis procedure.
    #[test]
    fn keypairs_match_interop_test_vectors() -> Result<()> {
        let expected_keypairs = [
            (
                hex!("25295f0d1d592a90b333e26e85149708208e9f8e8bc18f6c77bd62f8ad7a6866"),
                hex!("a99a76ed7796f7be22d5b7e85deeb7c5677e88e511e0b337618f8c4eb61349b4bf2d153f649f7b53359fe8b94a38e44c"),
            ),
            (
                hex!("51d0b65185db6989ab0b560d6deed19c7ead0e24b9b6372cbecb1f26bdfad000"),
                hex!("b89bebc699769726a318c8e9971bd3171297c61aea4a6578a7a4f94b547dcba5bac16a89108b6b6a1fe3695d1a874a0b"),
            ),
            (
                hex!("315ed405fafe339603932eebe8dbfd650ce5dafa561f6928664c75db85f97857"),
                hex!("a3a32b0f8b4ddb83f1a0a853d81dd725dfe577d4f4c3db8ece52ce2b026eca84815c1a7e8e92a4de3d755733bf7e4a9b"),
            ),
        ];

        for ((secret_key_bytes, public_key_bytes), validator_index) in
            expected_keypairs.into_iter().zip(0..)
        {
            let actual_secret_key = secret_key(validator_index);

            assert_eq!(actual_secret_key, SecretKey::try_from(secret_key_bytes)?);
            assert_eq!(
                actual_secret_key.to_public_key(),
                PublicKeyBytes(public_key_bytes),
            );
        }

        Ok(())
    }

    #[test]
    fn quick_start_state_has_active_interop_validators() -> Result<()> {
        let config = Config::minimal();
        let state = quick_start_beacon_state::<Minimal>(&config, 1_578_009_600, 16)?;

        assert_eq!(state.genesis_time, 1_578_009_600);
        assert_eq!(state.eth1_data.block_hash, QUICK_START_ETH1_BLOCK_HASH);
        assert_eq!(state.registry.len(), 16);
        assert_eq!(
            get_active_validator_indices(&state, GENESIS_EPOCH).collect_vec(),
            (0..16).collect_vec(),
        );

        for (validator, index) in state.validators().iter().zip(0..) {
            assert_eq!(validator.pubkey, secret_key(index).to_public_key());
            assert_eq!(validator.withdrawal_credentials.as_bytes()[0], BLS_WITHDRAWAL_PREFIX);
            assert_eq!(state.registry.balance(index)?, Minimal::MAX_EFFECTIVE_BALANCE);
        }

        Ok(())
    }

    #[test]
    fn withdrawal_credentials_commit_to_public_key() {
        let pubkey = secret_key(0).to_public_key();
        let credentials = bls_withdrawal_credentials(pubkey);
        let hash = hashing::hash(pubkey.as_bytes());

        assert_eq!(credentials.as_bytes()[0], 0);
        assert_eq!(credentials.as_bytes()[1..], hash.as_bytes()[1..]);
    }
}
