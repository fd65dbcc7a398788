//! Prelude to simplify downstream use of APDU objects
//!

pub use crate::{
    fingerprint::{GetMasterFingerprintReq, MasterFingerprintResp},
    sign_psbt::{ContinueReq, SignPsbtReq, SignatureResp, StateResp},
    state::SignState,
    status::Status,
};
