use anyhow::{ensure, Result};
use bls::PublicKeyBytes;
use itertools::Itertools as _;
use ssz::SszHash as _;
use typenum::Unsigned as _;
use types::{
    phase0::{
        beacon_state::BeaconState,
        consts::{DOMAIN_ATTESTATION, FAR_FUTURE_EPOCH},
        containers::{AttestationData, AttestationDataAndCustodyBit, IndexedAttestation, Validator},
        primitives::{Epoch, ValidatorIndex},
    },
    preset::Preset,
};

use crate::{
    accessors,
    error::Error,
    verifier::{SingleVerifier, Verifier},
};

// > Check if ``validator`` is active.
#[inline]
#[must_use]
pub const fn is_active_validator(validator: &Validator, epoch: Epoch) -> bool {
    validator.activation_epoch <= epoch && epoch < validator.exit_epoch
}

// > Check if ``validator`` is slashable.
#[inline]
#[must_use]
pub const fn is_slashable_validator(validator: &Validator, epoch: Epoch) -> bool {
    !validator.slashed
        && validator.activation_epoch <= epoch
        && epoch < validator.withdrawable_epoch
}

#[must_use]
pub const fn is_eligible_for_activation_queue<P: Preset>(validator: &Validator) -> bool {
    validator.activation_eligibility_epoch == FAR_FUTURE_EPOCH
        && validator.effective_balance >= P::MAX_EFFECTIVE_BALANCE
}

#[inline]
#[must_use]
pub const fn is_eligible_for_penalties(validator: &Validator, previous_epoch: Epoch) -> bool {
    is_active_validator(validator, previous_epoch)
        || (validator.slashed && previous_epoch + 1 < validator.withdrawable_epoch)
}

/// Double vote or surround vote with `data_1` surrounding `data_2`.
///
/// The surround branch only looks in one direction.
/// Use [`is_slashable_attestation_pair`] to compare attestations received independently.
#[inline]
#[must_use]
pub fn is_slashable_attestation_data(data_1: AttestationData, data_2: AttestationData) -> bool {
    // > Double vote
    (data_1 != data_2 && data_1.target_epoch == data_2.target_epoch)
        // > Surround vote
        || (data_1.source_epoch < data_2.source_epoch && data_2.target_epoch < data_1.target_epoch)
}

#[inline]
#[must_use]
pub fn is_slashable_attestation_pair(data_1: AttestationData, data_2: AttestationData) -> bool {
    is_slashable_attestation_data(data_1, data_2) || is_slashable_attestation_data(data_2, data_1)
}

pub fn validate_indexed_attestation<P: Preset>(
    state: &BeaconState<P>,
    indexed_attestation: &IndexedAttestation,
) -> Result<()> {
    validate_indexed_attestation_with_verifier(state, indexed_attestation, SingleVerifier)
}

/// Checks `indexed_attestation` and stops at the first failed check.
///
/// The checks run in this order:
/// 1. custody bit 1 indices are empty
/// 2. the number of indices is within the limit
/// 3. the two index sets are disjoint
/// 4. both index sets are sorted
/// 5. the aggregate signature is valid
pub fn validate_indexed_attestation_with_verifier<P: Preset>(
    state: &BeaconState<P>,
    indexed_attestation: &IndexedAttestation,
    mut verifier: impl Verifier,
) -> Result<()> {
    let bit_0_indices = &indexed_attestation.custody_bit_0_indices;
    let bit_1_indices = &indexed_attestation.custody_bit_1_indices;

    // > Verify no index has custody bit equal to 1 [to be removed in phase 1]
    ensure!(bit_1_indices.is_empty(), Error::CustodyBitOneIndicesPresent);

    // > Verify max number of indices
    let count = bit_0_indices.len() + bit_1_indices.len();
    let maximum = P::MaxIndicesPerAttestation::U64;

    ensure!(
        u64::try_from(count)? <= maximum,
        Error::TooManyAttestingIndices { count, maximum },
    );

    // > Verify index sets are disjoint
    ensure!(
        bit_0_indices
            .iter()
            .all(|index| !bit_1_indices.contains(index)),
        Error::CustodyBitIndicesOverlap,
    );

    // > Verify indices are sorted
    ensure!(
        is_sorted(bit_0_indices),
        Error::CustodyBitIndicesNotSorted { custody_bit: false },
    );

    ensure!(
        is_sorted(bit_1_indices),
        Error::CustodyBitIndicesNotSorted { custody_bit: true },
    );

    // > Verify aggregate signature
    let public_keys = [
        aggregate_public_key(state, bit_0_indices)?,
        aggregate_public_key(state, bit_1_indices)?,
    ];

    let message_hashes = [false, true].map(|custody_bit| {
        AttestationDataAndCustodyBit {
            data: indexed_attestation.data,
            custody_bit,
        }
        .hash_tree_root()
    });

    let domain = accessors::get_domain(
        state,
        DOMAIN_ATTESTATION,
        Some(indexed_attestation.data.target_epoch),
    );

    ensure!(
        verifier.verify_multiple(
            &public_keys,
            &message_hashes,
            indexed_attestation.signature,
            domain,
        )?,
        Error::InvalidAttestationSignature,
    );

    Ok(())
}

fn is_sorted(indices: &[ValidatorIndex]) -> bool {
    indices.iter().tuple_windows().all(|(a, b)| a <= b)
}

fn aggregate_public_key<P: Preset>(
    state: &BeaconState<P>,
    indices: &[ValidatorIndex],
) -> Result<PublicKeyBytes> {
    let public_keys = indices
        .iter()
        .map(|index| Ok(state.validators().get(*index)?.pubkey))
        .collect::<Result<Vec<_>>>()?;

    Ok(bls::aggregate_pubkeys(public_keys)?)
}
