use anyhow::{ensure, Result};
use bls::SignatureBytes;
use helper_functions::{
    accessors::{
        attestation_epoch, get_attestation_data_slot, get_beacon_proposer_index,
        get_current_epoch, get_indexed_attestation, get_randao_mix,
    },
    misc::compute_epoch_at_slot,
    mutators::{initiate_validator_exit, slash_validator},
    predicates::{
        is_active_validator, is_slashable_attestation_data, is_slashable_validator,
        validate_indexed_attestation_with_verifier,
    },
    signing::{RandaoEpoch, SignForSingleFork as _},
    verifier::{SingleVerifier, Verifier},
};
use itertools::Itertools as _;
use log::debug;
use ssz::SszHash as _;
use typenum::Unsigned as _;
use types::{
    config::Config,
    nonstandard::AttestationEpoch,
    phase0::{
        beacon_state::BeaconState,
        consts::FAR_FUTURE_EPOCH,
        containers::{
            Attestation, AttesterSlashing, BeaconBlockHeader, IndexedAttestation,
            PendingAttestation, ProposerSlashing, VoluntaryExit,
        },
        primitives::{ValidatorIndex, H256},
    },
    preset::Preset,
};

use crate::unphased::Error;

/// Checks `header` against the state at its slot and makes it the latest block header.
pub fn process_block_header<P: Preset>(
    state: &BeaconState<P>,
    header: BeaconBlockHeader,
) -> Result<BeaconState<P>> {
    process_block_header_with_verifier(state, header, SingleVerifier)
}

pub fn process_block_header_with_verifier<P: Preset>(
    state: &BeaconState<P>,
    header: BeaconBlockHeader,
    verifier: impl Verifier,
) -> Result<BeaconState<P>> {
    // > Verify that the slots match
    ensure!(
        header.slot == state.slot,
        Error::SlotMismatch {
            state_slot: state.slot,
            block_slot: header.slot,
        },
    );

    // > Verify that the parent matches
    let computed = state.latest_block_header.signing_root();

    ensure!(
        header.parent_root == computed,
        Error::ParentRootMismatch {
            computed,
            in_block: header.parent_root,
        },
    );

    // > Verify proposer is not slashed
    let proposer_index = get_beacon_proposer_index(state)?;

    ensure!(
        !state.registry.validator(proposer_index)?.slashed,
        Error::ProposerSlashed {
            index: proposer_index,
        },
    );

    validate_proposer_signature_with_verifier(state, header, verifier)?;

    // > Save current block as the new latest block
    let mut state = state.clone();

    state.latest_block_header = BeaconBlockHeader {
        // > `state_root` is zeroed and overwritten in the next `process_slot` call
        state_root: H256::zero(),
        signature: SignatureBytes::default(),
        ..header
    };

    Ok(state)
}

pub fn validate_proposer_signature<P: Preset>(
    state: &BeaconState<P>,
    header: BeaconBlockHeader,
) -> Result<()> {
    validate_proposer_signature_with_verifier(state, header, SingleVerifier)
}

/// Checks that `header` is signed by the proposer of the state's current slot.
pub fn validate_proposer_signature_with_verifier<P: Preset>(
    state: &BeaconState<P>,
    header: BeaconBlockHeader,
    verifier: impl Verifier,
) -> Result<()> {
    let proposer_index = get_beacon_proposer_index(state)?;
    let public_key = state.registry.validator(proposer_index)?.pubkey;

    ensure!(
        header.is_valid_signature(state, header.signature, public_key, verifier)?,
        Error::InvalidBlockSignature { proposer_index },
    );

    Ok(())
}

/// Mixes the hash of `randao_reveal` into the randao mix of the current epoch.
pub fn process_randao<P: Preset>(
    state: &BeaconState<P>,
    randao_reveal: SignatureBytes,
) -> Result<BeaconState<P>> {
    validate_randao_reveal(state, randao_reveal)?;

    let epoch = get_current_epoch(state);
    let mix = get_randao_mix(state, epoch) ^ hashing::hash(randao_reveal.as_bytes());

    let mut state = state.clone();
    *state.randao_mixes.mod_index_mut(epoch) = mix;
    Ok(state)
}

pub fn validate_randao_reveal<P: Preset>(
    state: &BeaconState<P>,
    randao_reveal: SignatureBytes,
) -> Result<()> {
    validate_randao_reveal_with_verifier(state, randao_reveal, SingleVerifier)
}

pub fn validate_randao_reveal_with_verifier<P: Preset>(
    state: &BeaconState<P>,
    randao_reveal: SignatureBytes,
    verifier: impl Verifier,
) -> Result<()> {
    let proposer_index = get_beacon_proposer_index(state)?;
    let public_key = state.registry.validator(proposer_index)?.pubkey;
    let epoch = RandaoEpoch::from(get_current_epoch(state));

    ensure!(
        epoch.is_valid_signature(state, randao_reveal, public_key, verifier)?,
        Error::InvalidRandaoReveal { proposer_index },
    );

    Ok(())
}

pub fn validate_attestation<P: Preset>(
    state: &BeaconState<P>,
    attestation: &Attestation,
) -> Result<()> {
    validate_attestation_with_verifier(state, attestation, SingleVerifier)
}

pub fn validate_attestation_with_verifier<P: Preset>(
    state: &BeaconState<P>,
    attestation: &Attestation,
    verifier: impl Verifier,
) -> Result<()> {
    let data = attestation.data;
    let crosslink = data.crosslink;
    let attestation_epoch = attestation_epoch(state, data.target_epoch)?;

    ensure!(
        crosslink.shard < P::ShardCount::U64,
        Error::CrosslinkShardOutOfRange {
            shard: crosslink.shard,
        },
    );

    let attestation_slot = get_attestation_data_slot(state, data)?;
    let low_slot = attestation_slot + P::MIN_ATTESTATION_INCLUSION_DELAY.get();
    let high_slot = attestation_slot + P::SlotsPerEpoch::U64;

    ensure!(
        (low_slot..=high_slot).contains(&state.slot),
        Error::AttestationOutsideInclusionRange {
            state_slot: state.slot,
            attestation_slot,
        },
    );

    let (in_state, parent) = match attestation_epoch {
        AttestationEpoch::Previous => (
            (state.previous_justified_epoch, state.previous_justified_root),
            state.previous_crosslinks.get(crosslink.shard)?,
        ),
        AttestationEpoch::Current => (
            (state.current_justified_epoch, state.current_justified_root),
            state.current_crosslinks.get(crosslink.shard)?,
        ),
    };
    let in_block = (data.source_epoch, data.source_root);

    ensure!(
        in_state == in_block,
        Error::AttestationSourceMismatch { in_state, in_block },
    );

    // > Check crosslink against expected parent crosslink
    let parent_root = parent.hash_tree_root();

    ensure!(
        crosslink.parent_root == parent_root,
        Error::CrosslinkParentRootMismatch {
            computed: parent_root,
            in_block: crosslink.parent_root,
        },
    );

    ensure!(
        crosslink.start_epoch == parent.end_epoch,
        Error::CrosslinkStartEpochMismatch {
            computed: parent.end_epoch,
            in_block: crosslink.start_epoch,
        },
    );

    let end_epoch = data
        .target_epoch
        .min(parent.end_epoch + P::MAX_EPOCHS_PER_CROSSLINK);

    ensure!(
        crosslink.end_epoch == end_epoch,
        Error::CrosslinkEndEpochMismatch {
            computed: end_epoch,
            in_block: crosslink.end_epoch,
        },
    );

    // > [to be removed in phase 1]
    ensure!(
        crosslink.data_root == H256::zero(),
        Error::CrosslinkDataRootNotZero {
            in_block: crosslink.data_root,
        },
    );

    // > Check signature
    let indexed_attestation = get_indexed_attestation(state, attestation)?;

    validate_indexed_attestation_with_verifier(state, &indexed_attestation, verifier)
}

/// Validates `attestation` and records it in the state's pending attestations.
pub fn process_attestation<P: Preset>(
    state: &BeaconState<P>,
    attestation: &Attestation,
) -> Result<BeaconState<P>> {
    validate_attestation(state, attestation)?;

    let mut state = state.clone();
    apply_attestation(&mut state, attestation)?;
    Ok(state)
}

fn apply_attestation<P: Preset>(
    state: &mut BeaconState<P>,
    attestation: &Attestation,
) -> Result<()> {
    let data = attestation.data;

    let pending_attestation = PendingAttestation {
        aggregation_bitfield: attestation.aggregation_bitfield.clone(),
        data,
        inclusion_delay: state.slot - get_attestation_data_slot(state, data)?,
        proposer_index: get_beacon_proposer_index(state)?,
    };

    let attestations = match attestation_epoch(state, data.target_epoch)? {
        AttestationEpoch::Previous => &mut state.previous_epoch_attestations,
        AttestationEpoch::Current => &mut state.current_epoch_attestations,
    };

    attestations.push(pending_attestation);

    Ok(())
}

pub fn validate_proposer_slashing<P: Preset>(
    state: &BeaconState<P>,
    proposer_slashing: &ProposerSlashing,
) -> Result<()> {
    validate_proposer_slashing_with_verifier(state, proposer_slashing, SingleVerifier)
}

pub fn validate_proposer_slashing_with_verifier<P: Preset>(
    state: &BeaconState<P>,
    proposer_slashing: &ProposerSlashing,
    mut verifier: impl Verifier,
) -> Result<()> {
    let ProposerSlashing {
        proposer_index,
        header_1,
        header_2,
    } = *proposer_slashing;

    let proposer = state.registry.validator(proposer_index)?;

    // > Verify that the epoch is the same
    let epoch_1 = compute_epoch_at_slot::<P>(header_1.slot);
    let epoch_2 = compute_epoch_at_slot::<P>(header_2.slot);

    ensure!(
        epoch_1 == epoch_2,
        Error::ProposerSlashingEpochMismatch { epoch_1, epoch_2 },
    );

    // > But the headers are different
    ensure!(
        header_1 != header_2,
        Error::ProposerSlashingHeadersIdentical { header: header_1 },
    );

    // > Check proposer is slashable
    ensure!(
        is_slashable_validator(proposer, get_current_epoch(state)),
        Error::ProposerNotSlashable {
            index: proposer_index,
        },
    );

    // > Signatures are valid
    for header in [header_1, header_2] {
        ensure!(
            header.is_valid_signature(state, header.signature, proposer.pubkey, &mut verifier)?,
            Error::InvalidBlockSignature { proposer_index },
        );
    }

    Ok(())
}

pub fn process_proposer_slashing<P: Preset>(
    config: &Config,
    state: &BeaconState<P>,
    proposer_slashing: &ProposerSlashing,
) -> Result<BeaconState<P>> {
    validate_proposer_slashing(state, proposer_slashing)?;

    debug!("slashing proposer {}", proposer_slashing.proposer_index);

    slash_validator(config, state, proposer_slashing.proposer_index, None)
}

pub fn validate_attester_slashing<P: Preset>(
    state: &BeaconState<P>,
    attester_slashing: &AttesterSlashing,
) -> Result<Vec<ValidatorIndex>> {
    validate_attester_slashing_with_verifier(state, attester_slashing, SingleVerifier)
}

/// Returns the validators that `attester_slashing` proves guilty, sorted in ascending order.
pub fn validate_attester_slashing_with_verifier<P: Preset>(
    state: &BeaconState<P>,
    attester_slashing: &AttesterSlashing,
    mut verifier: impl Verifier,
) -> Result<Vec<ValidatorIndex>> {
    let attestation_1 = &attester_slashing.attestation_1;
    let attestation_2 = &attester_slashing.attestation_2;

    let data_1 = attestation_1.data;
    let data_2 = attestation_2.data;

    ensure!(
        is_slashable_attestation_data(data_1, data_2),
        Error::AttestationDataNotSlashable { data_1, data_2 },
    );

    validate_indexed_attestation_with_verifier(state, attestation_1, &mut verifier)?;
    validate_indexed_attestation_with_verifier(state, attestation_2, verifier)?;

    let current_epoch = get_current_epoch(state);
    let indices_2 = attesting_indices(attestation_2).collect_vec();
    let mut slashable_indices = vec![];

    for attester_index in attesting_indices(attestation_1) {
        if indices_2.binary_search(&attester_index).is_err() {
            continue;
        }

        if is_slashable_validator(state.registry.validator(attester_index)?, current_epoch) {
            slashable_indices.push(attester_index);
        }
    }

    ensure!(!slashable_indices.is_empty(), Error::NoAttestersSlashed);

    Ok(slashable_indices)
}

pub fn process_attester_slashing<P: Preset>(
    config: &Config,
    state: &BeaconState<P>,
    attester_slashing: &AttesterSlashing,
) -> Result<BeaconState<P>> {
    let slashable_indices = validate_attester_slashing(state, attester_slashing)?;

    debug!("slashing attesters {slashable_indices:?}");

    slashable_indices
        .into_iter()
        .try_fold(state.clone(), |state, index| {
            slash_validator(config, &state, index, None)
        })
}

pub fn validate_voluntary_exit<P: Preset>(
    config: &Config,
    state: &BeaconState<P>,
    voluntary_exit: VoluntaryExit,
) -> Result<()> {
    validate_voluntary_exit_with_verifier(config, state, voluntary_exit, SingleVerifier)
}

pub fn validate_voluntary_exit_with_verifier<P: Preset>(
    config: &Config,
    state: &BeaconState<P>,
    voluntary_exit: VoluntaryExit,
    verifier: impl Verifier,
) -> Result<()> {
    let index = voluntary_exit.validator_index;
    let validator = state.registry.validator(index)?;
    let current_epoch = get_current_epoch(state);

    // > Verify the validator is active
    ensure!(
        is_active_validator(validator, current_epoch),
        Error::ValidatorNotActive {
            index,
            current_epoch,
        },
    );

    // > Verify the validator has not yet exited
    ensure!(
        validator.exit_epoch == FAR_FUTURE_EPOCH,
        Error::ValidatorAlreadyExited {
            index,
            exit_epoch: validator.exit_epoch,
        },
    );

    // > Exits must specify an epoch when they become valid; they are not valid before then
    ensure!(
        current_epoch >= voluntary_exit.epoch,
        Error::VoluntaryExitNotYetValid {
            current_epoch,
            epoch: voluntary_exit.epoch,
        },
    );

    // > Verify the validator has been active long enough
    ensure!(
        current_epoch >= validator.activation_epoch + config.persistent_committee_period,
        Error::ValidatorHasNotBeenActiveLongEnough {
            index,
            activation_epoch: validator.activation_epoch,
            current_epoch,
        },
    );

    // > Verify signature
    ensure!(
        voluntary_exit.is_valid_signature(
            state,
            voluntary_exit.signature,
            validator.pubkey,
            verifier,
        )?,
        Error::InvalidVoluntaryExitSignature {
            validator_index: index,
        },
    );

    Ok(())
}

pub fn process_voluntary_exit<P: Preset>(
    config: &Config,
    state: &BeaconState<P>,
    voluntary_exit: VoluntaryExit,
) -> Result<BeaconState<P>> {
    validate_voluntary_exit(config, state, voluntary_exit)?;

    // > Initiate exit
    initiate_validator_exit(config, state, voluntary_exit.validator_index)
}

fn attesting_indices(
    indexed_attestation: &IndexedAttestation,
) -> impl Iterator<Item = ValidatorIndex> + '_ {
    indexed_attestation
        .custody_bit_0_indices
        .iter()
        .chain(&indexed_attestation.custody_bit_1_indices)
        .copied()
        .sorted_unstable()
        .dedup()
}
