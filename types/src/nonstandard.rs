use strum::Display;

/// The two epochs whose attestations a state keeps.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display)]
#[strum(serialize_all = "lowercase")]
pub enum AttestationEpoch {
    Previous,
    Current,
}
