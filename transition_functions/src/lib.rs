pub use unphased::Error;

// Parts of the transition that do not depend on how attestations are tallied.
pub mod unphased {
    pub use epoch_intermediates::EpochDeltas;
    pub use epoch_processing::{
        should_process_justification_and_finalization, should_process_rewards_and_penalties,
    };
    pub use error::Error;
    pub use slot_processing::process_slot;

    pub(crate) use epoch_processing::{
        apply_deltas, reset_eth1_data_votes, update_effective_balances, update_historical_roots,
        update_randao_mixes, update_registry, weigh_justification_and_finalization,
    };
    pub(crate) use slot_processing::cache_roots;

    mod epoch_intermediates;
    mod epoch_processing;
    mod error;
    mod slot_processing;
}

pub mod phase0 {
    pub use block_processing::{
        process_attestation, process_attester_slashing, process_block_header,
        process_block_header_with_verifier, process_proposer_slashing, process_randao,
        process_voluntary_exit, validate_attestation, validate_attestation_with_verifier,
        validate_attester_slashing, validate_attester_slashing_with_verifier,
        validate_proposer_signature, validate_proposer_signature_with_verifier,
        validate_proposer_slashing, validate_proposer_slashing_with_verifier,
        validate_randao_reveal, validate_randao_reveal_with_verifier, validate_voluntary_exit,
        validate_voluntary_exit_with_verifier,
    };
    pub use epoch_intermediates::{
        epoch_deltas, EpochDeltasForReport, EpochDeltasForTransition, Phase0EpochDeltas,
    };
    pub use epoch_processing::{
        process_crosslinks, process_epoch, process_final_updates,
        process_justification_and_finalization, process_registry_updates,
        process_rewards_and_penalties, process_slashings,
    };
    pub use slot_processing::process_slots;

    pub(crate) mod epoch_intermediates;
    pub(crate) mod epoch_processing;
    pub(crate) mod slot_processing;

    mod block_processing;
}

#[cfg(test)]
mod fixtures;
