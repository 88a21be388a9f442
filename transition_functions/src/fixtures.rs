use anyhow::Result;
use bls::SignatureBytes;
use helper_functions::{
    accessors::{get_crosslink_committee, get_current_epoch},
    signing::SignForSingleFork as _,
};
use ssz::{Bitfield, SszHash as _};
use types::{
    phase0::{
        beacon_state::BeaconState,
        containers::{
            Attestation, AttestationData, AttestationDataAndCustodyBit, Crosslink,
            PendingAttestation,
        },
        primitives::{Epoch, Shard, H256},
    },
    preset::Preset,
};

/// Data voting for the latest block and extending the current crosslink of `shard`.
///
/// Every slot processed without a block caches the same block root, so the latest header is both
/// the head and the target.
pub fn attestation_data<P: Preset>(
    state: &BeaconState<P>,
    epoch: Epoch,
    shard: Shard,
) -> Result<AttestationData> {
    let block_root = state.latest_block_header.signing_root();
    let parent = *state.current_crosslinks.get(shard)?;

    let (source_epoch, source_root) = if epoch == get_current_epoch(state) {
        (state.current_justified_epoch, state.current_justified_root)
    } else {
        (state.previous_justified_epoch, state.previous_justified_root)
    };

    Ok(AttestationData {
        beacon_block_root: block_root,
        source_epoch,
        source_root,
        target_epoch: epoch,
        target_root: block_root,
        crosslink: Crosslink {
            shard,
            parent_root: parent.hash_tree_root(),
            start_epoch: parent.end_epoch,
            end_epoch: epoch.min(parent.end_epoch + P::MAX_EPOCHS_PER_CROSSLINK),
            data_root: H256::zero(),
        },
    })
}

/// Unsigned attestations from the committee members at `positions`, one per shard.
pub fn pending_attestations<P: Preset>(
    state: &BeaconState<P>,
    epoch: Epoch,
    shards: impl IntoIterator<Item = Shard>,
    positions: &[usize],
) -> Result<Vec<PendingAttestation>> {
    shards
        .into_iter()
        .map(|shard| {
            let committee = get_crosslink_committee(state, epoch, shard)?;

            Ok(PendingAttestation {
                aggregation_bitfield: bitfield(committee.len(), positions),
                data: attestation_data(state, epoch, shard)?,
                inclusion_delay: 1,
                proposer_index: 0,
            })
        })
        .collect()
}

pub fn signed_attestation<P: Preset>(
    state: &BeaconState<P>,
    data: AttestationData,
    positions: &[usize],
) -> Result<Attestation> {
    let committee = get_crosslink_committee(state, data.target_epoch, data.crosslink.shard)?;

    let message = AttestationDataAndCustodyBit {
        data,
        custody_bit: false,
    };

    let signatures = positions
        .iter()
        .map(|position| message.sign(state, &interop::secret_key(committee[*position])))
        .collect::<Vec<SignatureBytes>>();

    Ok(Attestation {
        aggregation_bitfield: bitfield(committee.len(), positions),
        data,
        custody_bitfield: Bitfield::with_length(committee.len()),
        signature: bls::aggregate_signatures(signatures)?,
    })
}

fn bitfield(committee_size: usize, positions: &[usize]) -> Bitfield {
    Bitfield::from_bits((0..committee_size).map(|position| positions.contains(&position)))
}
