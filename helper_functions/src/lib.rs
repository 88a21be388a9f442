pub mod accessors;
pub mod error;
pub mod misc;
pub mod mutators;
pub mod phase0;
pub mod predicates;
pub mod signing;
pub mod verifier;

#[cfg(test)]
mod fixtures;
