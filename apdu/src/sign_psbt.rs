//! Sign-psbt command APDUs
//!
//! The sign-psbt request carries only a short header committing to the PSBT
//! content: entry counts and 20-byte Merkle roots over the global key/value
//! map and the input/output map collections. All map content is fetched and
//! authenticated lazily through host round trips while the command runs.
//!

use encdec::{Decode, Encode};
use ledger_proto::ApduStatic;

use crate::{state::SignState, varint, ApduError, Instruction, HWW_APDU_CLA};

/// Sign-psbt request APDU
///
/// ## Encoding:
/// ```text
/// | global_count (varint) | global keys root (20) | global values root (20) |
/// | n_inputs (varint)     | inputs root (20)      |
/// | n_outputs (varint)    | outputs root (20)     |
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct SignPsbtReq {
    /// Number of entries in the PSBT global map
    pub global_count: u64,
    /// Merkle root over the lexicographically sorted global map keys
    pub global_keys_root: [u8; 20],
    /// Merkle root over the global map values
    pub global_values_root: [u8; 20],

    /// Number of transaction inputs
    pub n_inputs: u64,
    /// Merkle root over the per-input key/value map commitments
    pub inputs_root: [u8; 20],

    /// Number of transaction outputs
    pub n_outputs: u64,
    /// Merkle root over the per-output key/value map commitments
    pub outputs_root: [u8; 20],
}

impl ApduStatic for SignPsbtReq {
    const CLA: u8 = HWW_APDU_CLA;
    const INS: u8 = Instruction::SignPsbt as u8;
}

impl Encode for SignPsbtReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        let n = varint::encoded_len(self.global_count)
            + 40
            + varint::encoded_len(self.n_inputs)
            + 20
            + varint::encoded_len(self.n_outputs)
            + 20;
        Ok(n)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < self.encode_len()? {
            return Err(ApduError::InvalidLength);
        }

        let mut index = 0;

        index += varint::write(&mut buff[index..], self.global_count)?;
        buff[index..][..20].copy_from_slice(&self.global_keys_root);
        index += 20;
        buff[index..][..20].copy_from_slice(&self.global_values_root);
        index += 20;

        index += varint::write(&mut buff[index..], self.n_inputs)?;
        buff[index..][..20].copy_from_slice(&self.inputs_root);
        index += 20;

        index += varint::write(&mut buff[index..], self.n_outputs)?;
        buff[index..][..20].copy_from_slice(&self.outputs_root);
        index += 20;

        Ok(index)
    }
}

impl<'a> Decode<'a> for SignPsbtReq {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        let mut index = 0;

        let root = |index: &mut usize| -> Result<[u8; 20], ApduError> {
            if buff.len() < *index + 20 {
                return Err(ApduError::InvalidLength);
            }
            let mut d = [0u8; 20];
            d.copy_from_slice(&buff[*index..][..20]);
            *index += 20;
            Ok(d)
        };

        let (global_count, n) = varint::read(&buff[index..])?;
        index += n;
        let global_keys_root = root(&mut index)?;
        let global_values_root = root(&mut index)?;

        let (n_inputs, n) = varint::read(&buff[index..])?;
        index += n;
        let inputs_root = root(&mut index)?;

        let (n_outputs, n) = varint::read(&buff[index..])?;
        index += n;
        let outputs_root = root(&mut index)?;

        Ok((
            Self {
                global_count,
                global_keys_root,
                global_values_root,
                n_inputs,
                inputs_root,
                n_outputs,
                outputs_root,
            },
            index,
        ))
    }
}

/// Continuation request APDU, advances a suspended sign-psbt command by
/// one step. Carries the session generation so steps meant for a
/// superseded session are rejected rather than silently applied.
#[derive(Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct ContinueReq {
    /// Session generation returned with the initial state response
    pub generation: u32,
}

impl ApduStatic for ContinueReq {
    const CLA: u8 = HWW_APDU_CLA;
    const INS: u8 = Instruction::Continue as u8;
}

/// Engine state response APDU
#[derive(Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct StateResp {
    /// Current engine state
    pub state: SignState,
    /// Session generation, echoed back in [`ContinueReq`]
    pub generation: u32,
}

impl StateResp {
    pub fn new(state: SignState, generation: u32) -> Self {
        Self { state, generation }
    }
}

/// Signature response APDU, emitted once per signed input
///
/// ## Encoding:
/// ```text
/// | input index (u32 le) | sig len (u8) | DER signature (variable) |
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct SignatureResp<'a> {
    /// Index of the signed input
    pub input_index: u32,
    /// DER-encoded ECDSA signature
    pub signature: &'a [u8],
}

impl<'a> SignatureResp<'a> {
    pub fn new(input_index: u32, signature: &'a [u8]) -> Self {
        Self {
            input_index,
            signature,
        }
    }
}

impl<'a> Encode for SignatureResp<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(5 + self.signature.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        let d = self.signature;

        if buff.len() < 5 + d.len() || d.len() > u8::MAX as usize {
            return Err(ApduError::InvalidLength);
        }

        let mut index = 0;

        buff[..4].copy_from_slice(&self.input_index.to_le_bytes());
        index += 4;

        buff[index] = d.len() as u8;
        index += 1;

        buff[index..][..d.len()].copy_from_slice(d);
        index += d.len();

        Ok(index)
    }
}

impl<'a> Decode<'a> for SignatureResp<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        if buff.len() < 5 {
            return Err(ApduError::InvalidLength);
        }

        let input_index = u32::from_le_bytes([buff[0], buff[1], buff[2], buff[3]]);

        let l = buff[4] as usize;
        if buff.len() < 5 + l {
            return Err(ApduError::InvalidLength);
        }

        let signature = &buff[5..][..l];

        Ok((
            Self {
                input_index,
                signature,
            },
            5 + l,
        ))
    }
}
