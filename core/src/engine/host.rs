//! Host interface for authenticated PSBT access
//!
//! The device never holds a PSBT or transaction in memory. Instead the host
//! stores the data and serves it back on demand, with every access
//! authenticated against the Merkle roots committed in the sign-psbt request
//! header. Each method on [Host] corresponds to one suspend / resume round
//! trip of the underlying transport.
//!

use sha2::Sha256;

use heapless::Vec;

use super::{Error, MAX_PREVOUT_SCRIPT_LEN};

/// Descriptor for one authenticated key / value map:
/// entry count plus commitment roots over keys and values
#[derive(Clone, PartialEq, Debug, Default)]
pub struct MapDescriptor {
    /// Number of key / value pairs in the map
    pub count: usize,
    /// Commitment root over the map keys
    pub keys_root: [u8; 20],
    /// Commitment root over the map values
    pub values_root: [u8; 20],
}

/// Transaction replay modes for [`Host::replay_tx`]
///
/// The host re-serializes the committed raw transaction in the requested
/// form, streaming it into the engine-owned hash context. The engine never
/// interprets transaction bytes itself, it only checks the resulting digests
/// and the extracted fields against its own expectations.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum ParseMode {
    /// Serialize the transaction as-is (recomputing its txid), extracting
    /// the outpoint of `input_index` and / or the scriptPubKey of
    /// `output_index` along the way
    Txid {
        input_index: Option<u32>,
        output_index: Option<u32>,
    },

    /// First half of the legacy sighash preimage for `input_index`: version,
    /// input count and inputs up to the signed one (scripts emptied), ending
    /// at the position where the script-code is spliced in
    LegacyPass1 {
        input_index: u32,
        sighash_type: u32,
    },

    /// Second half of the legacy sighash preimage: the signed input's
    /// sequence, the remaining inputs, the outputs section per the sighash
    /// flags, locktime and the 4-byte sighash type
    LegacyPass2 {
        input_index: u32,
        sighash_type: u32,
    },
}

/// Result of a [`Host::replay_tx`] round trip
#[derive(Clone, PartialEq, Debug, Default)]
pub struct TxReplay {
    /// Number of inputs in the replayed transaction
    pub n_inputs: usize,
    /// Number of outputs in the replayed transaction
    pub n_outputs: usize,

    /// Outpoint hash referenced by the target input (txid modes)
    pub prevout_hash: [u8; 32],
    /// Outpoint index referenced by the target input (txid modes)
    pub prevout_n: u32,

    /// scriptPubKey of the target output, truncated to the supported maximum
    pub vout_script: Vec<u8, MAX_PREVOUT_SCRIPT_LEN>,
    /// Actual scriptPubKey length, may exceed the buffer above
    pub vout_script_len: usize,
}

/// Host interface, one authenticated data round trip per method
pub trait Host {
    /// Check the keys committed under `keys_root` are lexicographically
    /// sorted and unique
    fn check_map_sorted(&mut self, keys_root: &[u8; 20], count: usize) -> Result<(), Error>;

    /// Fetch the map descriptor for item `index` of a map collection,
    /// invoking `on_key` once per key in the item's map
    fn get_item_map(
        &mut self,
        root: &[u8; 20],
        count: usize,
        index: usize,
        on_key: &mut dyn FnMut(&[u8]),
    ) -> Result<MapDescriptor, Error>;

    /// Fetch the value for `key` from an authenticated map, returning the
    /// number of bytes written to `out`
    fn get_map_value(
        &mut self,
        map: &MapDescriptor,
        key: &[u8],
        out: &mut [u8],
    ) -> Result<usize, Error>;

    /// Fetch the length of the value stored under `key` without fetching
    /// its content
    fn get_map_value_len(&mut self, map: &MapDescriptor, key: &[u8]) -> Result<usize, Error>;

    /// Stream the value stored under `key` in authenticated chunks,
    /// returning the total number of bytes streamed. Used for values too
    /// large to buffer, such as redeem scripts
    fn stream_map_value(
        &mut self,
        map: &MapDescriptor,
        key: &[u8],
        on_chunk: &mut dyn FnMut(&[u8]),
    ) -> Result<usize, Error>;

    /// Replay the raw transaction stored under `key` in `map`, streaming the
    /// serialization selected by `mode` into `hasher`
    fn replay_tx(
        &mut self,
        map: &MapDescriptor,
        key: &[u8],
        mode: ParseMode,
        hasher: &mut Sha256,
    ) -> Result<TxReplay, Error>;
}

impl<T: Host> Host for &mut T {
    fn check_map_sorted(&mut self, keys_root: &[u8; 20], count: usize) -> Result<(), Error> {
        <T as Host>::check_map_sorted(self, keys_root, count)
    }

    fn get_item_map(
        &mut self,
        root: &[u8; 20],
        count: usize,
        index: usize,
        on_key: &mut dyn FnMut(&[u8]),
    ) -> Result<MapDescriptor, Error> {
        <T as Host>::get_item_map(self, root, count, index, on_key)
    }

    fn get_map_value(
        &mut self,
        map: &MapDescriptor,
        key: &[u8],
        out: &mut [u8],
    ) -> Result<usize, Error> {
        <T as Host>::get_map_value(self, map, key, out)
    }

    fn get_map_value_len(&mut self, map: &MapDescriptor, key: &[u8]) -> Result<usize, Error> {
        <T as Host>::get_map_value_len(self, map, key)
    }

    fn stream_map_value(
        &mut self,
        map: &MapDescriptor,
        key: &[u8],
        on_chunk: &mut dyn FnMut(&[u8]),
    ) -> Result<usize, Error> {
        <T as Host>::stream_map_value(self, map, key, on_chunk)
    }

    fn replay_tx(
        &mut self,
        map: &MapDescriptor,
        key: &[u8],
        mode: ParseMode,
        hasher: &mut Sha256,
    ) -> Result<TxReplay, Error> {
        <T as Host>::replay_tx(self, map, key, mode, hasher)
    }
}
