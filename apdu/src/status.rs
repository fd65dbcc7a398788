//! Status words returned with every APDU response
//!

use encdec::{DecodeOwned, Encode};
use ledger_proto::ApduError;
use num_enum::TryFromPrimitive;
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

/// Response status words
///
/// Numeric values follow the ISO 7816 conventions used by the wider
/// hardware wallet ecosystem (`0x9000` success, `0x6Axx` data errors,
/// vendor range `0xB0xx`/`0xE0xx` for engine specific conditions).
#[derive(
    Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter, TryFromPrimitive,
)]
#[repr(u16)]
pub enum Status {
    /// Command completed
    Ok = 0x9000,

    /// Incorrect P1 or P2 parameter
    WrongP1P2 = 0x6A86,

    /// Request payload length does not match the expected encoding
    WrongDataLength = 0x6A87,

    /// Device is locked or the user rejected the operation
    SecurityStatusNotSatisfied = 0x6982,

    /// Provided data failed validation or an integrity check
    IncorrectData = 0x6A80,

    /// Engine is not in a state where this command is valid
    BadState = 0xB007,

    /// Signing failed
    SignatureFail = 0xB008,

    /// Command suspended, awaiting a host round trip continuation
    InterruptedExecution = 0xE000,
}

impl Encode for Status {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(2)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < 2 {
            return Err(ApduError::InvalidLength);
        }

        buff[..2].copy_from_slice(&(*self as u16).to_be_bytes());
        Ok(2)
    }
}

impl DecodeOwned for Status {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        if buff.len() < 2 {
            return Err(ApduError::InvalidLength);
        }

        match Self::try_from(u16::from_be_bytes([buff[0], buff[1]])) {
            Ok(v) => Ok((v, 2)),
            Err(_) => Err(ApduError::InvalidEncoding),
        }
    }
}
