//! The [Engine] implements resumable PSBT signing for hardware wallets.
//!
//! This handles [Event] inputs and returns [Output] responses to the caller,
//! see [apdu][crate::apdu] for APDU protocol / encoding specifications.
//!
//! A signing session never holds a transaction in memory: each step performs
//! at most one authenticated [Host] round trip, fetching or replaying the
//! data needed for that step and folding it into running hash contexts.

use heapless::Vec;
use sha2::{Digest as _, Sha256};
use strum::{Display, EnumIter, EnumString, EnumVariantNames};
use zeroize::Zeroize;

use hww_psbt_apdu::psbt::GlobalKey;
use hww_psbt_apdu::sign_psbt::SignPsbtReq;

mod event;
pub use event::Event;

mod output;
pub use output::Output;

mod error;
pub use error::Error;

mod host;
pub use host::{Host, MapDescriptor, ParseMode, TxReplay};

mod input;
use input::InputCtx;
pub use input::InputState;

mod signer;

/// Maximum entries in a PSBT map or map collection
pub const MAX_MAP_ENTRIES: usize = 252;

/// Maximum supported previous-output scriptPubKey length
pub const MAX_PREVOUT_SCRIPT_LEN: usize = 83;

/// Maximum DER-encoded ECDSA signature length
pub const MAX_DER_SIG_LEN: usize = 72;

/// DER signature container
pub type DerSignature = Vec<u8, MAX_DER_SIG_LEN>;

/// BIP-0032 hardened derivation flag
const HARDENED: u32 = 0x8000_0000;

const fn h(i: u32) -> u32 {
    i | HARDENED
}

/// Fixed signing path (m/44'/1'/0'/1/1), pending key-origin metadata support
pub const SIGN_PATH: [u32; 5] = [h(44), h(1), h(0), 1, 1];

/// Engine internal state enumeration
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum State {
    /// Idle state, no signing session running
    Init,

    /// Request header accepted and global map authenticated
    GlobalMapVerified,

    /// Processing a transaction input
    Input(InputState),

    /// Session failed, a new sign-psbt request is required
    Error,

    /// All inputs signed
    Complete,
}

/// BIP-0032 node scratch, filled by [Driver::derive_hd_node] and wiped
/// after every use
#[derive(Clone, Zeroize)]
pub struct HdNode {
    /// Private key bytes
    pub privkey: [u8; 32],
    /// Chain code
    pub chain_code: [u8; 32],
}

impl HdNode {
    /// Create a new (empty) node scratch
    pub const fn new() -> Self {
        Self {
            privkey: [0u8; 32],
            chain_code: [0u8; 32],
        }
    }
}

impl Default for HdNode {
    fn default() -> Self {
        Self::new()
    }
}

/// [`Driver`] trait provides platform key material support for [`Engine`] instances
pub trait Driver {
    /// BIP-0032 derivation for secp256k1 keys, filling the provided scratch
    fn derive_hd_node(&self, path: &[u32], node: &mut HdNode) -> Result<(), Error>;

    /// Fingerprint of the master public key
    fn master_fingerprint(&self) -> [u8; 4];
}

impl<T: Driver> Driver for &mut T {
    fn derive_hd_node(&self, path: &[u32], node: &mut HdNode) -> Result<(), Error> {
        T::derive_hd_node(self, path, node)
    }

    fn master_fingerprint(&self) -> [u8; 4] {
        T::master_fingerprint(self)
    }
}

/// Per-command session state, reset by every sign-psbt request
#[derive(Clone, Default)]
pub struct Session {
    /// Global map descriptor from the request header
    global_map: MapDescriptor,

    /// Declared input count and collection root
    n_inputs: usize,
    inputs_root: [u8; 20],

    /// Declared output count and collection root
    n_outputs: usize,
    outputs_root: [u8; 20],

    /// Master key fingerprint, cached at session start
    master_fingerprint: [u8; 4],

    /// Working context for the input currently being processed
    input: InputCtx,

    /// Key scratch for the sign step
    pub node: HdNode,
}

impl Session {
    fn reset(&mut self) {
        self.node.zeroize();
        *self = Self::default();
    }
}

/// [Engine] provides hardware-independent PSBT signing support
pub struct Engine<DRV: Driver> {
    state: State,
    unlocked: bool,

    /// Session generation, bumped by every sign-psbt request so stale
    /// continuations are detectable
    generation: u32,

    pub session: Session,

    drv: DRV,
}

impl<DRV: Driver> Engine<DRV> {
    /// Create a new signing engine instance with the provided driver
    pub fn new(drv: DRV) -> Self {
        Self {
            state: State::Init,
            unlocked: false,
            generation: 0,
            session: Session::default(),
            drv,
        }
    }

    /// Handle incoming engine events
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn update<H: Host>(&mut self, evt: &Event, host: &mut H) -> Result<Output, Error> {
        #[cfg(feature = "log")]
        log::debug!("event: {:02x?} (state: {:?})", evt, self.state);

        match evt {
            // Empty event, do nothing
            Event::None => Ok(Output::None),

            // Fetch the master key fingerprint
            Event::GetMasterFingerprint => {
                // Check for unlock state
                if !self.unlocked {
                    return Err(Error::DeviceLocked);
                }

                Ok(Output::MasterFingerprint {
                    fingerprint: self.drv.master_fingerprint(),
                })
            }

            // Start a signing session, superseding any session in flight
            Event::PsbtInit(req) => {
                if !self.unlocked {
                    return Err(Error::DeviceLocked);
                }

                match self.session_init(req, host) {
                    Ok(o) => Ok(o),
                    Err(e) => self.fail(e),
                }
            }

            // Advance the current session by one step
            Event::PsbtStep { generation } => {
                if !self.unlocked {
                    return Err(Error::DeviceLocked);
                }
                if *generation != self.generation {
                    return Err(Error::StaleSession);
                }

                match self.step(host) {
                    Ok(o) => Ok(o),
                    Err(e) => self.fail(e),
                }
            }
        }
    }

    /// Initialise a session from a sign-psbt request header
    #[cfg_attr(feature = "noinline", inline(never))]
    fn session_init<H: Host>(&mut self, req: &SignPsbtReq, host: &mut H) -> Result<Output, Error> {
        // Invalidate any session in flight
        self.generation = self.generation.wrapping_add(1);
        self.state = State::Init;
        self.session.reset();

        // Bound all declared counts before any map access
        if req.global_count > MAX_MAP_ENTRIES as u64
            || req.n_inputs > MAX_MAP_ENTRIES as u64
            || req.n_outputs > MAX_MAP_ENTRIES as u64
        {
            return Err(Error::TooManyEntries);
        }

        self.session.global_map = MapDescriptor {
            count: req.global_count as usize,
            keys_root: req.global_keys_root,
            values_root: req.global_values_root,
        };
        self.session.n_inputs = req.n_inputs as usize;
        self.session.inputs_root = req.inputs_root;
        self.session.n_outputs = req.n_outputs as usize;
        self.session.outputs_root = req.outputs_root;
        self.session.master_fingerprint = self.drv.master_fingerprint();

        // Authenticate global map key ordering
        host.check_map_sorted(&req.global_keys_root, req.global_count as usize)?;

        self.state = State::GlobalMapVerified;

        Ok(self.state_output())
    }

    /// Execute the action for the current state, advancing on success
    #[cfg_attr(feature = "noinline", inline(never))]
    fn step<H: Host>(&mut self, host: &mut H) -> Result<Output, Error> {
        let next = match self.state {
            // Begin processing the first input
            State::GlobalMapVerified => {
                if self.session.n_inputs == 0 {
                    self.scan_empty_tx(host)?;
                    self.state = State::Complete;
                    return Ok(self.state_output());
                }

                self.session.input.start(0);
                self.session.input.tx_scan(
                    host,
                    &self.session.global_map,
                    self.session.n_inputs,
                    self.session.n_outputs,
                )?;
                State::Input(InputState::FetchMap)
            }

            // Scan the unsigned transaction for a subsequent input
            State::Input(InputState::TxScan) => {
                self.session.input.tx_scan(
                    host,
                    &self.session.global_map,
                    self.session.n_inputs,
                    self.session.n_outputs,
                )?;
                State::Input(InputState::FetchMap)
            }

            State::Input(InputState::FetchMap) => {
                self.session
                    .input
                    .fetch_map(host, &self.session.inputs_root, self.session.n_inputs)?;
                State::Input(InputState::SighashType)
            }

            State::Input(InputState::SighashType) => {
                self.session.input.fetch_sighash_type(host)?;
                State::Input(InputState::FetchPrevout)
            }

            State::Input(InputState::FetchPrevout) => {
                self.session.input.fetch_prevout(host)?;
                State::Input(InputState::VerifyPrevout)
            }

            State::Input(InputState::VerifyPrevout) => {
                self.session.input.verify_prevout()?;
                State::Input(InputState::LegacyPass1)
            }

            // First preimage pass, P2SH inputs detour to redeem validation
            State::Input(InputState::LegacyPass1) => {
                self.session
                    .input
                    .legacy_pass1(host, &self.session.global_map)?;

                match self.session.input.has_redeem_script() {
                    true => State::Input(InputState::RedeemCheck),
                    false => State::Input(InputState::LegacyPass2),
                }
            }

            State::Input(InputState::RedeemCheck) => {
                self.session.input.redeem_check(host)?;
                State::Input(InputState::LegacyPass2)
            }

            State::Input(InputState::LegacyPass2) => {
                self.session
                    .input
                    .legacy_pass2(host, &self.session.global_map)?;
                State::Input(InputState::Sign)
            }

            State::Input(InputState::Sign) => return self.sign_input(),

            // Steps are not valid in other states
            _ => return Err(Error::UnexpectedEvent),
        };

        self.state = next;

        Ok(self.state_output())
    }

    /// Replay the committed transaction for a session declaring no inputs,
    /// re-checking the declared counts before completing
    #[cfg_attr(feature = "noinline", inline(never))]
    fn scan_empty_tx<H: Host>(&mut self, host: &mut H) -> Result<(), Error> {
        let mut hasher = Sha256::new();

        let r = host.replay_tx(
            &self.session.global_map,
            &[GlobalKey::UnsignedTx as u8],
            ParseMode::Txid {
                input_index: None,
                output_index: None,
            },
            &mut hasher,
        )?;

        if r.n_inputs != 0 || r.n_outputs != self.session.n_outputs {
            return Err(Error::CountMismatch);
        }

        Ok(())
    }

    /// Sign the computed sighash for the current input, then advance to the
    /// next input or complete the session
    #[cfg_attr(feature = "noinline", inline(never))]
    fn sign_input(&mut self) -> Result<Output, Error> {
        let input_index = self.session.input.index();
        let sighash = self.session.input.final_sighash();

        #[cfg(feature = "log")]
        log::debug!(
            "sign input {} (sighash type {:#04x})",
            input_index,
            self.session.input.sighash_type()
        );

        let signature =
            signer::sign_sighash(&self.drv, &SIGN_PATH, &sighash, &mut self.session.node)?;

        let next = input_index + 1;
        if (next as usize) < self.session.n_inputs {
            self.session.input.start(next);
            self.state = State::Input(InputState::TxScan);
        } else {
            self.state = State::Complete;
        }

        Ok(Output::Signature {
            input_index,
            signature,
        })
    }

    /// Record a session failure, wiping session state
    fn fail(&mut self, e: Error) -> Result<Output, Error> {
        #[cfg(feature = "log")]
        log::warn!("session failed in state {:?}: {:?}", self.state, e);

        self.session.reset();
        self.state = State::Error;

        Err(e)
    }

    /// Fetch current engine state
    pub fn state(&self) -> State {
        self.state
    }

    /// Fetch current session generation
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Check whether the engine is unlocked (ie. signing has been approved)
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Unlock the engine (allowing fingerprint requests and signing)
    pub fn unlock(&mut self) {
        self.unlocked = true;
    }

    /// Lock the engine (requires approval for fingerprint requests and signing)
    pub fn lock(&mut self) {
        self.unlocked = false;
    }

    /// Reset engine state, wiping any session in flight
    pub fn reset(&mut self) {
        self.session.reset();
        self.generation = self.generation.wrapping_add(1);
        self.state = State::Init;
    }

    fn state_output(&self) -> Output {
        Output::State {
            state: self.state,
            generation: self.generation,
        }
    }
}

