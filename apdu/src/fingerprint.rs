use encdec::{Decode, Encode};

use super::{ApduError, ApduStatic, Instruction, HWW_APDU_CLA};
use crate::helpers::arr;

/// Fetch the fingerprint of the device master key
#[derive(Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct GetMasterFingerprintReq {}

impl ApduStatic for GetMasterFingerprintReq {
    const CLA: u8 = HWW_APDU_CLA;
    const INS: u8 = Instruction::GetMasterFingerprint as u8;
}

#[derive(Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct MasterFingerprintResp {
    /// BIP-0032 fingerprint (first four bytes of hash160 of the master public key)
    #[encdec(with = "arr")]
    pub fingerprint: [u8; 4],
}
