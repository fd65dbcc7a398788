//! PSBT (BIP-0174) key type identifiers used by the signing engine
//!

use num_enum::TryFromPrimitive;

/// PSBT global map key types
#[derive(Copy, Clone, PartialEq, Debug, TryFromPrimitive)]
#[repr(u8)]
pub enum GlobalKey {
    /// Serialized unsigned transaction
    UnsignedTx = 0x00,
}

/// PSBT per-input map key types
#[derive(Copy, Clone, PartialEq, Debug, TryFromPrimitive)]
#[repr(u8)]
pub enum InputKey {
    /// Full previous transaction (legacy inputs)
    NonWitnessUtxo = 0x00,

    /// Previous output only (segwit inputs)
    WitnessUtxo = 0x01,

    /// Existing signature for a key
    PartialSig = 0x02,

    /// Sighash type requested for this input
    SighashType = 0x03,

    /// Redeem script for P2SH spends
    RedeemScript = 0x04,
}

/// Sighash flag: commit to all outputs
pub const SIGHASH_ALL: u32 = 0x01;

/// Sighash flag: commit to no outputs
pub const SIGHASH_NONE: u32 = 0x02;

/// Sighash flag: commit to the output matching the input index
pub const SIGHASH_SINGLE: u32 = 0x03;

/// Sighash modifier: commit only to the signed input
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;
