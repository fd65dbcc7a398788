//! Protocol / APDU definitions for PSBT hardware signer communication
//!
//! This module provides a protocol specification and reference implementation for
//! communication with a PSBT signing device.
//!
//! APDUs use a primitive binary encoding to simplify implementation with unsupported
//! languages and platforms. Fixed fields are little-endian; counts use the Bitcoin
//! compact variable-length integer encoding so the sign-psbt command header matches
//! the serialization the host already produces for transactions.
//!

#![no_std]

use core::fmt::Debug;

pub use ledger_proto::{ApduError, ApduReq, ApduStatic};

pub mod fingerprint;
pub mod prelude;
pub mod psbt;
pub mod sign_psbt;
pub mod state;
pub mod status;
pub mod varint;

mod helpers;

/// PSBT signer APDU class
pub const HWW_APDU_CLA: u8 = 0xe1;

pub const HWW_PROTO_VERSION: u8 = 0x01;

/// PSBT signer APDU instruction codes
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(u8)]
pub enum Instruction {
    // General instructions
    /// Resume an interrupted command, advancing it by one host round trip
    Continue = 0x01,

    /// Start signing the legacy inputs of a PSBT
    SignPsbt = 0x04,

    /// Fetch the master key fingerprint
    GetMasterFingerprint = 0x05,
}
