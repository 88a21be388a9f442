use ssz::SszHash as _;
use types::{phase0::beacon_state::BeaconState, preset::Preset};

/// Caches the roots of the state and its latest block header for the current slot.
///
/// The slot itself is not advanced.
#[must_use]
pub fn process_slot<P: Preset>(state: &BeaconState<P>) -> BeaconState<P> {
    let mut state = state.clone();
    cache_roots(&mut state);
    state
}

pub(crate) fn cache_roots<P: Preset>(state: &mut BeaconState<P>) {
    let slot = state.slot;

    // > Cache state root
    let previous_state_root = state.hash_tree_root();
    *state.state_roots.mod_index_mut(slot) = previous_state_root;

    // > Cache latest block header state root
    if state.latest_block_header.state_root.is_zero() {
        state.latest_block_header.state_root = previous_state_root;
    }

    // > Cache block root
    let previous_block_root = state.latest_block_header.signing_root();
    *state.block_roots.mod_index_mut(slot) = previous_block_root;
}
