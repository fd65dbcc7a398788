//! Engine state APDUs
//!

use encdec::{DecodeOwned, Encode};
use ledger_proto::ApduError;
use num_enum::TryFromPrimitive;
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

/// Engine state enumeration
/// used in [`crate::sign_psbt::StateResp`] to communicate signing progress
#[derive(
    Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter, TryFromPrimitive,
)]
#[repr(u8)]
pub enum SignState {
    Init = 0x00,
    GlobalMapVerified = 0x01,
    TxScan = 0x10,
    FetchMap = 0x11,
    SighashType = 0x12,
    FetchPrevout = 0x13,
    VerifyPrevout = 0x14,
    LegacyPass1 = 0x20,
    RedeemCheck = 0x21,
    LegacyPass2 = 0x22,
    Sign = 0x23,
    Complete = 0x40,
    Error = 0xFF,
}

impl Encode for SignState {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(1)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.is_empty() {
            return Err(ApduError::InvalidLength);
        }

        buff[0] = *self as u8;
        Ok(1)
    }
}

impl DecodeOwned for SignState {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        if buff.is_empty() {
            return Err(ApduError::InvalidLength);
        }

        match Self::try_from(buff[0]) {
            Ok(v) => Ok((v, 1)),
            Err(_) => Err(ApduError::InvalidEncoding),
        }
    }
}
