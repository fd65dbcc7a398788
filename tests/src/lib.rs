//! Common test support for the PSBT signing engine: programmatic fixtures,
//! a mock host with fault injection, a seed-backed software driver and
//! reference sighash computation for cross-checking engine output.
//!

pub mod fixture;
