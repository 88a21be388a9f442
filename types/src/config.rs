use core::num::NonZeroU64;
use std::borrow::Cow;

use hex_literal::hex;
use nonzero_ext::nonzero;
use serde::{Deserialize, Serialize};

use crate::{
    phase0::primitives::{Gwei, UnixSeconds, Version, H32},
    preset::PresetName,
};

/// Configuration variables customizable at runtime.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    // Meta
    pub config_name: Cow<'static, str>,
    pub preset_base: PresetName,

    // Genesis
    pub genesis_fork_version: Version,
    pub min_genesis_active_validator_count: u64,
    pub min_genesis_time: UnixSeconds,

    // Time parameters
    pub min_validator_withdrawability_delay: u64,
    pub persistent_committee_period: u64,
    pub seconds_per_slot: NonZeroU64,

    // Validator cycle
    pub churn_limit_quotient: NonZeroU64,
    pub ejection_balance: Gwei,
    pub min_per_epoch_churn_limit: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl Config {
    #[must_use]
    pub const fn mainnet() -> Self {
        Self {
            // Meta
            config_name: Cow::Borrowed("mainnet"),
            preset_base: PresetName::Mainnet,

            // Genesis
            genesis_fork_version: H32(hex!("00000000")),
            min_genesis_active_validator_count: 1 << 16,
            min_genesis_time: 1_578_009_600,

            // Time parameters
            min_validator_withdrawability_delay: 256,
            persistent_committee_period: 2048,
            seconds_per_slot: nonzero!(6_u64),

            // Validator cycle
            churn_limit_quotient: nonzero!(1_u64 << 16),
            ejection_balance: 16_000_000_000,
            min_per_epoch_churn_limit: 4,
        }
    }

    #[must_use]
    pub fn minimal() -> Self {
        Self {
            // Meta
            config_name: Cow::Borrowed("minimal"),
            preset_base: PresetName::Minimal,

            // Genesis
            min_genesis_active_validator_count: 64,

            ..Self::mainnet()
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;

    #[test]
    fn missing_fields_default_to_mainnet() -> Result<()> {
        let config = serde_yaml::from_str::<Config>(
            "
            CONFIG_NAME: testnet
            PRESET_BASE: minimal
            EJECTION_BALANCE: 17000000000
            GENESIS_FORK_VERSION: '0x00000001'
            ",
        )?;

        assert_eq!(config.config_name, "testnet");
        assert_eq!(config.preset_base, PresetName::Minimal);
        assert_eq!(config.ejection_balance, 17_000_000_000);
        assert_eq!(config.genesis_fork_version, H32(hex!("00000001")));
        assert_eq!(config.churn_limit_quotient, Config::mainnet().churn_limit_quotient);

        Ok(())
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_yaml::from_str::<Config>("SHARD_COUNT: 8");
        assert!(result.is_err());
    }

    #[test]
    fn config_round_trips_through_json() -> Result<()> {
        let json = serde_json::to_string(&Config::minimal())?;
        assert_eq!(serde_json::from_str::<Config>(&json)?, Config::minimal());
        Ok(())
    }
}
