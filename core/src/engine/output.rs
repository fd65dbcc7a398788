use encdec::Encode;

use ledger_proto::ApduError;

use crate::apdu;

use super::{input::InputState, DerSignature, State};

/// [`Engine`][super::Engine] outputs (in response to events), typically encoded to response [APDUs][crate::apdu]
#[derive(Clone, PartialEq, Debug)]
pub enum Output {
    None,

    /// Engine state and session generation
    State { state: State, generation: u32 },

    /// Master key fingerprint
    MasterFingerprint { fingerprint: [u8; 4] },

    /// DER signature for a signed input
    Signature {
        input_index: u32,
        signature: DerSignature,
    },
}

impl Output {
    /// Encode an [`Output`] object to a response APDU
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        match self {
            Output::None => Ok(0),
            Output::State { state, generation } => {
                apdu::sign_psbt::StateResp::new(state.state(), *generation).encode(buff)
            }
            Output::MasterFingerprint { fingerprint } => apdu::fingerprint::MasterFingerprintResp {
                fingerprint: *fingerprint,
            }
            .encode(buff),
            Output::Signature {
                input_index,
                signature,
            } => apdu::sign_psbt::SignatureResp::new(*input_index, signature).encode(buff),
        }
    }

    /// Fetch state for outputs containing this
    pub fn state(&self) -> Option<State> {
        match &self {
            Output::State { state, .. } => Some(*state),
            _ => None,
        }
    }
}

impl PartialEq<State> for Output {
    fn eq(&self, other: &State) -> bool {
        match self {
            Output::State { state, .. } => state == other,
            _ => false,
        }
    }
}

impl State {
    /// Map [engine](crate::engine) states to [apdu][apdu::state::SignState] states for transmission
    pub fn state(&self) -> apdu::state::SignState {
        use apdu::state::SignState;

        match self {
            State::Init => SignState::Init,
            State::GlobalMapVerified => SignState::GlobalMapVerified,
            State::Input(s) => match s {
                InputState::TxScan => SignState::TxScan,
                InputState::FetchMap => SignState::FetchMap,
                InputState::SighashType => SignState::SighashType,
                InputState::FetchPrevout => SignState::FetchPrevout,
                InputState::VerifyPrevout => SignState::VerifyPrevout,
                InputState::LegacyPass1 => SignState::LegacyPass1,
                InputState::RedeemCheck => SignState::RedeemCheck,
                InputState::LegacyPass2 => SignState::LegacyPass2,
                InputState::Sign => SignState::Sign,
            },
            State::Complete => SignState::Complete,
            State::Error => SignState::Error,
        }
    }
}
