use bls::{SecretKey, SignatureBytes};
use ssz::{Bitfield, H256};
use types::{
    phase0::{
        beacon_state::{BeaconState, ValidatorRegistry},
        containers::{Attestation, AttestationData, AttestationDataAndCustodyBit, Validator},
        primitives::{Slot, ValidatorIndex},
    },
    preset::Preset,
};

use crate::signing::SignForSingleFork;

pub fn secret_key(index: ValidatorIndex) -> SecretKey {
    let mut bytes = [0; 32];
    bytes[24..].copy_from_slice(&(index + 1).to_be_bytes());
    SecretKey::try_from(bytes).expect("small nonzero scalars are valid secret keys")
}

/// State with `count` fully funded validators, all active since genesis.
///
/// Block roots are filled with distinct values so that every recent slot has a known root.
pub fn state_with_validators<P: Preset>(count: u64, slot: Slot) -> BeaconState<P> {
    let mut registry = ValidatorRegistry::default();

    for index in 0..count {
        let validator = Validator {
            pubkey: secret_key(index).to_public_key(),
            activation_eligibility_epoch: 0,
            activation_epoch: 0,
            ..Validator::create_pending_validator::<P>(
                bls::EMPTY_PUBKEY,
                H256::zero(),
                P::MAX_EFFECTIVE_BALANCE,
            )
        };

        registry.push(validator, P::MAX_EFFECTIVE_BALANCE);
    }

    let mut state = BeaconState {
        slot,
        registry,
        ..BeaconState::default()
    };

    for (root, byte) in state.block_roots.iter_mut().zip(1..=u8::MAX) {
        *root = H256::repeat_byte(byte);
    }

    state
}

/// Attestation from the committee members at `positions`, signed with custody bit 0.
pub fn signed_attestation<P: Preset>(
    state: &BeaconState<P>,
    committee: &[ValidatorIndex],
    positions: &[usize],
    data: AttestationData,
) -> Attestation {
    let message = AttestationDataAndCustodyBit {
        data,
        custody_bit: false,
    };

    let signatures = positions
        .iter()
        .map(|position| {
            SignForSingleFork::<P>::sign(&message, state, &secret_key(committee[*position]))
        })
        .collect::<Vec<SignatureBytes>>();

    Attestation {
        aggregation_bitfield: Bitfield::from_bits(
            (0..committee.len()).map(|position| positions.contains(&position)),
        ),
        data,
        custody_bitfield: Bitfield::with_length(committee.len()),
        signature: bls::aggregate_signatures(signatures)
            .expect("signatures produced by bls::sign are valid"),
    }
}
