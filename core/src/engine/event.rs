use encdec::Decode;

use ledger_proto::{ApduError, ApduStatic};

use hww_psbt_apdu::prelude::*;

/// [`Engine`][super::Engine] input events, typically decoded from request [APDUs][crate::apdu]
#[derive(Clone, Debug)]
pub enum Event {
    None,

    /// Fetch the master key fingerprint
    GetMasterFingerprint,

    /// Start a PSBT signing session
    PsbtInit(SignPsbtReq),

    /// Advance a signing session by one step
    PsbtStep {
        /// Session generation returned with the initial state response
        generation: u32,
    },
}

/// Helper for decoding APDUs to events
fn decode_event<'a, T>(buff: &'a [u8]) -> Result<Event, ApduError>
where
    T: Decode<'a, Error = ApduError>,
    Event: From<T::Output>,
{
    T::decode(buff).map(|(v, _n)| Event::from(v))
}

impl Event {
    /// Parse an incoming APDU to an engine event
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn parse(ins: u8, buff: &[u8]) -> Result<Self, ApduError> {
        match ins {
            GetMasterFingerprintReq::INS => decode_event::<GetMasterFingerprintReq>(buff),
            SignPsbtReq::INS => decode_event::<SignPsbtReq>(buff),
            ContinueReq::INS => decode_event::<ContinueReq>(buff),
            _ => Err(ApduError::InvalidEncoding),
        }
    }
}

impl From<GetMasterFingerprintReq> for Event {
    fn from(_: GetMasterFingerprintReq) -> Self {
        Event::GetMasterFingerprint
    }
}

impl From<SignPsbtReq> for Event {
    fn from(a: SignPsbtReq) -> Self {
        Event::PsbtInit(a)
    }
}

impl From<ContinueReq> for Event {
    fn from(a: ContinueReq) -> Self {
        Event::PsbtStep {
            generation: a.generation,
        }
    }
}
