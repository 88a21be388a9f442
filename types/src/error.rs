use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("registry has {validators} validators but {balances} balances")]
    RegistryLengthMismatch { validators: usize, balances: usize },
}
