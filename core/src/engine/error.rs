use crate::apdu::status::Status;

/// [Engine][super::Engine] errors
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
#[repr(u8)]
pub enum Error {
    /// Invalid argument length
    #[cfg_attr(feature = "thiserror", error("Invalid argument length"))]
    InvalidLength = 0x00,

    /// Unexpected event
    #[cfg_attr(feature = "thiserror", error("Unexpected event"))]
    UnexpectedEvent = 0x01,

    /// Device locked, signing operations unavailable
    #[cfg_attr(feature = "thiserror", error("device locked"))]
    DeviceLocked = 0x02,

    /// Continuation for a session superseded by a newer sign-psbt request
    #[cfg_attr(feature = "thiserror", error("stale session generation"))]
    StaleSession = 0x03,

    /// Declared entry count exceeds supported maximum
    #[cfg_attr(feature = "thiserror", error("too many map entries"))]
    TooManyEntries = 0x04,

    /// Declared input / output counts do not match the committed transaction
    #[cfg_attr(feature = "thiserror", error("transaction count mismatch"))]
    CountMismatch = 0x05,

    /// Host failed a map authentication or sortedness check
    #[cfg_attr(feature = "thiserror", error("map integrity check failed"))]
    IntegrityCheckFailed = 0x06,

    /// Mandatory sighash type key missing from an input map
    #[cfg_attr(feature = "thiserror", error("sighash type missing"))]
    MissingSighashType = 0x07,

    /// Previous transaction does not hash to the referenced outpoint
    #[cfg_attr(feature = "thiserror", error("previous transaction hash mismatch"))]
    PrevoutMismatch = 0x08,

    /// Redeem script does not match the committed P2SH scriptPubKey
    #[cfg_attr(feature = "thiserror", error("redeem script mismatch"))]
    RedeemScriptMismatch = 0x09,

    /// Previous output scriptPubKey exceeds the supported maximum
    #[cfg_attr(feature = "thiserror", error("scriptPubKey too long"))]
    ScriptTooLong = 0x0a,

    /// Input requires segwit signing, which is not supported
    #[cfg_attr(feature = "thiserror", error("segwit inputs unsupported"))]
    SegwitUnsupported = 0x0b,

    /// Key derivation failed
    #[cfg_attr(feature = "thiserror", error("key derivation failed"))]
    KeyDerivationFailed = 0x0c,

    /// Signing error
    #[cfg_attr(feature = "thiserror", error("signing failed"))]
    SignatureFail = 0x0d,

    /// Unknown / not-yet defined error (placeholder)
    #[cfg_attr(feature = "thiserror", error("unknown"))]
    Unknown = 0xf0,
}

impl Error {
    /// Map [Engine][super::Engine] errors to response [Status] words
    pub fn status(&self) -> Status {
        match self {
            Error::InvalidLength => Status::WrongDataLength,
            Error::UnexpectedEvent | Error::StaleSession | Error::SegwitUnsupported => {
                Status::BadState
            }
            Error::DeviceLocked => Status::SecurityStatusNotSatisfied,
            Error::TooManyEntries
            | Error::CountMismatch
            | Error::IntegrityCheckFailed
            | Error::MissingSighashType
            | Error::PrevoutMismatch
            | Error::RedeemScriptMismatch => Status::IncorrectData,
            Error::ScriptTooLong | Error::KeyDerivationFailed | Error::SignatureFail => {
                Status::SignatureFail
            }
            Error::Unknown => Status::BadState,
        }
    }
}
