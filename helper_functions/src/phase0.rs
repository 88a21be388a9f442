//! Attestation accounting used at epoch boundaries.

use std::collections::BTreeSet;

use anyhow::Result;
use itertools::Itertools as _;
use ssz::SszHash as _;
use types::{
    nonstandard::AttestationEpoch,
    phase0::{
        beacon_state::BeaconState,
        containers::{Crosslink, PendingAttestation},
        primitives::{Epoch, Gwei, Shard, ValidatorIndex},
    },
    preset::Preset,
    Attestations,
};

use crate::accessors;

/// Pending attestations of `epoch`, which must be the previous or the current epoch.
pub fn get_matching_source_attestations<P: Preset>(
    state: &BeaconState<P>,
    epoch: Epoch,
) -> Result<&Attestations> {
    match accessors::attestation_epoch(state, epoch)? {
        AttestationEpoch::Previous => Ok(&state.previous_epoch_attestations),
        AttestationEpoch::Current => Ok(&state.current_epoch_attestations),
    }
}

pub fn get_matching_target_attestations<P: Preset>(
    state: &BeaconState<P>,
    epoch: Epoch,
) -> Result<Vec<PendingAttestation>> {
    let source_attestations = get_matching_source_attestations(state, epoch)?;
    let target_root = accessors::get_block_root(state, epoch)?;

    Ok(source_attestations
        .into_iter()
        .filter(|attestation| attestation.data.target_root == target_root)
        .cloned()
        .collect())
}

pub fn get_matching_head_attestations<P: Preset>(
    state: &BeaconState<P>,
    epoch: Epoch,
) -> Result<Vec<PendingAttestation>> {
    let mut head_attestations = vec![];

    for attestation in get_matching_source_attestations(state, epoch)? {
        let slot = accessors::get_attestation_data_slot(state, attestation.data)?;
        let beacon_block_root = accessors::get_block_root_at_slot(state, slot)?;

        if attestation.data.beacon_block_root == beacon_block_root {
            head_attestations.push(attestation.clone());
        }
    }

    Ok(head_attestations)
}

/// Union of the attesting indices of `attestations` without slashed validators.
///
/// The result is sorted and free of duplicates.
pub fn get_unslashed_attesting_indices<'attestations, P: Preset>(
    state: &BeaconState<P>,
    attestations: impl IntoIterator<Item = &'attestations PendingAttestation>,
) -> Result<Vec<ValidatorIndex>> {
    let mut output = BTreeSet::new();

    for attestation in attestations {
        output.extend(accessors::get_attesting_indices(
            state,
            attestation.data,
            &attestation.aggregation_bitfield,
        )?);
    }

    let mut unslashed = Vec::with_capacity(output.len());

    for index in output {
        if !state.validators().get(index)?.slashed {
            unslashed.push(index);
        }
    }

    Ok(unslashed)
}

pub fn get_attesting_balance<'attestations, P: Preset>(
    state: &BeaconState<P>,
    attestations: impl IntoIterator<Item = &'attestations PendingAttestation>,
) -> Result<Gwei> {
    let indices = get_unslashed_attesting_indices(state, attestations)?;
    accessors::get_total_balance(state, indices)
}

/// The crosslink for `shard` with the most attesting balance in `epoch`.
///
/// Only crosslinks that extend or repeat the current crosslink of `shard` are considered.
/// Ties are broken in favor of the greater data root. Without candidates the default crosslink
/// is returned along with no indices.
pub fn get_winning_crosslink_and_attesting_indices<P: Preset>(
    state: &BeaconState<P>,
    epoch: Epoch,
    shard: Shard,
) -> Result<(Crosslink, Vec<ValidatorIndex>)> {
    let attestations = get_matching_source_attestations(state, epoch)?
        .into_iter()
        .filter(|attestation| attestation.data.crosslink.shard == shard)
        .collect_vec();

    let current_root = state.current_crosslinks.get(shard)?.hash_tree_root();

    let candidates = attestations
        .iter()
        .map(|attestation| attestation.data.crosslink)
        .filter(|crosslink| {
            current_root == crosslink.parent_root || current_root == crosslink.hash_tree_root()
        })
        .unique();

    let mut winner = None;

    for crosslink in candidates {
        let supporting = attestations
            .iter()
            .copied()
            .filter(|attestation| attestation.data.crosslink == crosslink);

        let score = (get_attesting_balance(state, supporting)?, crosslink.data_root);

        if winner.is_none_or(|(_, best_score)| score > best_score) {
            winner = Some((crosslink, score));
        }
    }

    let Some((winning_crosslink, _)) = winner else {
        return Ok((Crosslink::default(), vec![]));
    };

    let winning_attestations = attestations
        .into_iter()
        .filter(|attestation| attestation.data.crosslink == winning_crosslink);

    let indices = get_unslashed_attesting_indices(state, winning_attestations)?;

    Ok((winning_crosslink, indices))
}
