//! Per-input signing sub-state-machine
//!
//! Each transaction input walks the same sequence of host round trips:
//! re-scan the committed unsigned transaction for its outpoint, fetch and
//! classify its key/value map, decode the mandatory sighash type, replay and
//! verify the previous transaction, then build the legacy sighash preimage
//! over two passes with the script-code spliced in between. The final `Sign`
//! step is performed by the [Engine][super::Engine] as it requires key
//! material.
//!

use byteorder::{ByteOrder, LittleEndian};
use core::mem;

use heapless::Vec;
use ripemd::Ripemd160;
use sha2::{Digest as _, Sha256};
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

use crate::apdu::psbt::{GlobalKey, InputKey};
use crate::helpers::{finalize_sha256d, hash_update_varint};

use super::{
    Error, Host, MapDescriptor, ParseMode, MAX_MAP_ENTRIES, MAX_PREVOUT_SCRIPT_LEN,
};

/// P2SH scriptPubKey template opcodes
const OP_HASH160: u8 = 0xa9;
const OP_EQUAL: u8 = 0x87;

/// Per-input states, one host round trip each
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum InputState {
    /// Re-scan the unsigned transaction for this input's outpoint
    TxScan,
    /// Fetch and classify this input's key/value map
    FetchMap,
    /// Fetch the mandatory sighash type
    SighashType,
    /// Replay the previous transaction, recording the spent output
    FetchPrevout,
    /// Verify the previous transaction hash against the outpoint
    VerifyPrevout,
    /// First sighash preimage pass
    LegacyPass1,
    /// Validate and splice in the P2SH redeem script
    RedeemCheck,
    /// Second sighash preimage pass
    LegacyPass2,
    /// Derive key and sign the computed sighash
    Sign,
}

impl Default for InputState {
    fn default() -> Self {
        InputState::TxScan
    }
}

/// Working context for the input currently being signed, reset at the
/// start of each input
#[derive(Clone, Default)]
pub struct InputCtx {
    /// Index of the input being processed
    index: u32,

    /// Authenticated map descriptor for this input
    map: MapDescriptor,

    /// Outpoint referenced by the unsigned transaction
    prevout_hash: [u8; 32],
    prevout_n: u32,

    /// Key presence flags from map classification
    has_witness_utxo: bool,
    has_redeem_script: bool,
    has_sighash_type: bool,

    /// Requested sighash type (4-byte little-endian on the wire)
    sighash_type: u32,

    /// scriptPubKey of the spent output, possibly truncated
    prevout_script: Vec<u8, MAX_PREVOUT_SCRIPT_LEN>,
    /// Actual scriptPubKey length
    prevout_script_len: usize,

    /// Streaming hash context carried across steps
    hasher: Sha256,
}

impl InputCtx {
    /// Reset the context for input `index`
    pub fn start(&mut self, index: u32) {
        *self = Self {
            index,
            ..Default::default()
        };
    }

    /// Index of the input being processed
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Requested sighash type
    pub fn sighash_type(&self) -> u32 {
        self.sighash_type
    }

    /// Replay the committed unsigned transaction in txid mode, re-checking
    /// the declared counts and extracting this input's outpoint
    pub fn tx_scan<H: Host>(
        &mut self,
        host: &mut H,
        global_map: &MapDescriptor,
        n_inputs: usize,
        n_outputs: usize,
    ) -> Result<(), Error> {
        let mut hasher = Sha256::new();

        let r = host.replay_tx(
            global_map,
            &[GlobalKey::UnsignedTx as u8],
            ParseMode::Txid {
                input_index: Some(self.index),
                output_index: None,
            },
            &mut hasher,
        )?;

        // Counts committed in the request header must match the transaction
        if r.n_inputs != n_inputs || r.n_outputs != n_outputs {
            return Err(Error::CountMismatch);
        }

        self.prevout_hash = r.prevout_hash;
        self.prevout_n = r.prevout_n;

        Ok(())
    }

    /// Fetch this input's map, classifying keys by their type byte
    pub fn fetch_map<H: Host>(
        &mut self,
        host: &mut H,
        inputs_root: &[u8; 20],
        n_inputs: usize,
    ) -> Result<(), Error> {
        let mut has_witness_utxo = false;
        let mut has_redeem_script = false;
        let mut has_sighash_type = false;

        let map = host.get_item_map(
            inputs_root,
            n_inputs,
            self.index as usize,
            &mut |k: &[u8]| match k.first().copied().map(InputKey::try_from) {
                Some(Ok(InputKey::WitnessUtxo)) => has_witness_utxo = true,
                Some(Ok(InputKey::RedeemScript)) => has_redeem_script = true,
                Some(Ok(InputKey::SighashType)) => has_sighash_type = true,
                _ => (),
            },
        )?;

        if map.count > MAX_MAP_ENTRIES {
            return Err(Error::TooManyEntries);
        }

        self.map = map;
        self.has_witness_utxo = has_witness_utxo;
        self.has_redeem_script = has_redeem_script;
        self.has_sighash_type = has_sighash_type;

        Ok(())
    }

    /// Fetch and decode the mandatory sighash type
    pub fn fetch_sighash_type<H: Host>(&mut self, host: &mut H) -> Result<(), Error> {
        if !self.has_sighash_type {
            return Err(Error::MissingSighashType);
        }

        let mut buff = [0u8; 4];
        let n = host.get_map_value(&self.map, &[InputKey::SighashType as u8], &mut buff)?;
        if n != 4 {
            return Err(Error::InvalidLength);
        }

        self.sighash_type = LittleEndian::read_u32(&buff);

        Ok(())
    }

    /// Replay the previous transaction into the hash context, recording the
    /// scriptPubKey of the spent output
    pub fn fetch_prevout<H: Host>(&mut self, host: &mut H) -> Result<(), Error> {
        self.hasher = Sha256::new();

        let r = host.replay_tx(
            &self.map,
            &[InputKey::NonWitnessUtxo as u8],
            ParseMode::Txid {
                input_index: None,
                output_index: Some(self.prevout_n),
            },
            &mut self.hasher,
        )?;

        if self.prevout_n as usize >= r.n_outputs {
            return Err(Error::CountMismatch);
        }

        self.prevout_script = r.vout_script;
        self.prevout_script_len = r.vout_script_len;

        Ok(())
    }

    /// Verify the replayed previous transaction hashes to the referenced
    /// outpoint, then dispatch on input kind
    pub fn verify_prevout(&mut self) -> Result<(), Error> {
        let txid = finalize_sha256d(mem::take(&mut self.hasher));

        if txid != self.prevout_hash {
            return Err(Error::PrevoutMismatch);
        }

        // Oversized scripts are fatal, never truncated
        if self.prevout_script_len > MAX_PREVOUT_SCRIPT_LEN {
            return Err(Error::ScriptTooLong);
        }

        // Segwit signing is an extension point, not yet supported
        if self.has_witness_utxo {
            return Err(Error::SegwitUnsupported);
        }

        Ok(())
    }

    /// Whether the P2SH redeem-script path applies to this input
    pub fn has_redeem_script(&self) -> bool {
        self.has_redeem_script
    }

    /// First sighash preimage pass, appending the plain script-code when no
    /// redeem script is present
    pub fn legacy_pass1<H: Host>(
        &mut self,
        host: &mut H,
        global_map: &MapDescriptor,
    ) -> Result<(), Error> {
        self.hasher = Sha256::new();

        host.replay_tx(
            global_map,
            &[GlobalKey::UnsignedTx as u8],
            ParseMode::LegacyPass1 {
                input_index: self.index,
                sighash_type: self.sighash_type,
            },
            &mut self.hasher,
        )?;

        if !self.has_redeem_script {
            hash_update_varint(&mut self.hasher, self.prevout_script.len() as u64);
            self.hasher.update(&self.prevout_script);
        }

        Ok(())
    }

    /// Stream the redeem script into the preimage as script-code, validating
    /// it against the committed P2SH scriptPubKey
    pub fn redeem_check<H: Host>(&mut self, host: &mut H) -> Result<(), Error> {
        let key = [InputKey::RedeemScript as u8];

        let len = host.get_map_value_len(&self.map, &key)?;
        hash_update_varint(&mut self.hasher, len as u64);

        // Hash the script for P2SH validation while feeding the preimage
        let mut script_sha = Sha256::new();
        let hasher = &mut self.hasher;

        let n = host.stream_map_value(&self.map, &key, &mut |chunk: &[u8]| {
            hasher.update(chunk);
            script_sha.update(chunk);
        })?;
        if n != len {
            return Err(Error::InvalidLength);
        }

        // 22-byte P2SH template: OP_HASH160 <20-byte hash> OP_EQUAL
        let mut p2sh = [0u8; 22];
        p2sh[0] = OP_HASH160;
        p2sh[1..21].copy_from_slice(&Ripemd160::digest(script_sha.finalize()));
        p2sh[21] = OP_EQUAL;

        // Committed scriptPubKey must be exactly the P2SH encoding
        if self.prevout_script.len() != p2sh.len() || self.prevout_script[..] != p2sh[..] {
            return Err(Error::RedeemScriptMismatch);
        }

        Ok(())
    }

    /// Second sighash preimage pass
    pub fn legacy_pass2<H: Host>(
        &mut self,
        host: &mut H,
        global_map: &MapDescriptor,
    ) -> Result<(), Error> {
        host.replay_tx(
            global_map,
            &[GlobalKey::UnsignedTx as u8],
            ParseMode::LegacyPass2 {
                input_index: self.index,
                sighash_type: self.sighash_type,
            },
            &mut self.hasher,
        )?;

        Ok(())
    }

    /// Finalize the preimage to the 32-byte sighash
    pub fn final_sighash(&mut self) -> [u8; 32] {
        finalize_sha256d(mem::take(&mut self.hasher))
    }
}
