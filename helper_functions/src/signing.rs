use anyhow::{ensure, Result};
use bls::{PublicKeyBytes, SecretKey, SignatureBytes};
use ssz::SszHash;
use typenum::U1;
use types::{
    phase0::{
        beacon_state::BeaconState,
        consts::{DOMAIN_ATTESTATION, DOMAIN_BEACON_PROPOSER, DOMAIN_RANDAO, DOMAIN_VOLUNTARY_EXIT},
        containers::{AttestationDataAndCustodyBit, BeaconBlockHeader, VoluntaryExit},
        primitives::{Domain, DomainType, Epoch, H256},
    },
    preset::Preset,
};

use crate::{
    accessors,
    error::Error,
    misc,
    verifier::{SingleVerifier, Verifier},
};

// `Epoch` and `Slot` are the same type, so the epoch signed in a RANDAO reveal needs a wrapper.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RandaoEpoch(Epoch);

impl From<Epoch> for RandaoEpoch {
    fn from(epoch: Epoch) -> Self {
        Self(epoch)
    }
}

impl SszHash for RandaoEpoch {
    type PackingFactor = U1;

    fn hash_tree_root(&self) -> H256 {
        self.0.hash_tree_root()
    }
}

pub trait SignForSingleFork<P: Preset>: SszHash {
    const DOMAIN_TYPE: DomainType;

    fn epoch(&self) -> Epoch;

    fn signing_root(&self) -> H256 {
        self.hash_tree_root()
    }

    fn domain(&self, state: &BeaconState<P>) -> Domain {
        accessors::get_domain(state, Self::DOMAIN_TYPE, Some(self.epoch()))
    }

    fn sign(&self, state: &BeaconState<P>, secret_key: &SecretKey) -> SignatureBytes {
        bls::sign(self.signing_root(), secret_key, self.domain(state))
    }

    fn verify(
        &self,
        state: &BeaconState<P>,
        signature: SignatureBytes,
        public_key: PublicKeyBytes,
    ) -> Result<()> {
        ensure!(
            self.is_valid_signature(state, signature, public_key, SingleVerifier)?,
            Error::InvalidSignature,
        );

        Ok(())
    }

    /// Checks `signature` through `verifier`, leaving the choice of error to the caller.
    fn is_valid_signature(
        &self,
        state: &BeaconState<P>,
        signature: SignatureBytes,
        public_key: PublicKeyBytes,
        mut verifier: impl Verifier,
    ) -> Result<bool> {
        verifier.verify_singular(self.signing_root(), public_key, signature, self.domain(state))
    }
}

impl<P: Preset> SignForSingleFork<P> for AttestationDataAndCustodyBit {
    const DOMAIN_TYPE: DomainType = DOMAIN_ATTESTATION;

    fn epoch(&self) -> Epoch {
        self.data.target_epoch
    }
}

impl<P: Preset> SignForSingleFork<P> for BeaconBlockHeader {
    const DOMAIN_TYPE: DomainType = DOMAIN_BEACON_PROPOSER;

    fn epoch(&self) -> Epoch {
        misc::compute_epoch_at_slot::<P>(self.slot)
    }

    fn signing_root(&self) -> H256 {
        BeaconBlockHeader::signing_root(self)
    }
}

impl<P: Preset> SignForSingleFork<P> for RandaoEpoch {
    const DOMAIN_TYPE: DomainType = DOMAIN_RANDAO;

    fn epoch(&self) -> Epoch {
        self.0
    }
}

impl<P: Preset> SignForSingleFork<P> for VoluntaryExit {
    const DOMAIN_TYPE: DomainType = DOMAIN_VOLUNTARY_EXIT;

    fn epoch(&self) -> Epoch {
        self.epoch
    }

    fn signing_root(&self) -> H256 {
        VoluntaryExit::signing_root(self)
    }
}
