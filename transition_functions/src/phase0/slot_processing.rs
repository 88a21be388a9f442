use anyhow::{ensure, Result};
use helper_functions::misc;
use types::{
    config::Config,
    phase0::{beacon_state::BeaconState, primitives::Slot},
    preset::Preset,
};

use crate::{phase0::epoch_processing, unphased};

/// Advances `state` to `slot`, processing every epoch boundary on the way.
pub fn process_slots<P: Preset>(
    config: &Config,
    state: &BeaconState<P>,
    slot: Slot,
) -> Result<BeaconState<P>> {
    ensure!(
        state.slot < slot,
        unphased::Error::SlotNotLater {
            current: state.slot,
            target: slot,
        },
    );

    let mut state = state.clone();

    while state.slot < slot {
        unphased::cache_roots(&mut state);

        // > Process epoch on the start slot of the next epoch
        if misc::is_epoch_start::<P>(state.slot + 1) {
            epoch_processing::process_epoch_in_place(config, &mut state)?;
        }

        state.slot += 1;
    }

    Ok(state)
}
