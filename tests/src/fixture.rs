//! Programmatic PSBT fixtures
//!
//! Fixtures hold the key/value maps a real PSBT would carry, plus the
//! commitment scheme the mock host authenticates against: a 20-byte root
//! over a list of elements, standing in for the production Merkle tree.
//!

use sha2::{Digest as _, Sha256};

use hww_psbt_apdu::psbt::{GlobalKey, InputKey, SIGHASH_ALL};
use hww_psbt_apdu::sign_psbt::SignPsbtReq;
use hww_psbt_core::engine::MapDescriptor;
use hww_psbt_core::helpers::{hash160, sha256d};

use crate::driver::TestDriver;

/// 20-byte commitment over a list of elements
pub fn root20<'a>(items: impl IntoIterator<Item = &'a [u8]>) -> [u8; 20] {
    let mut h = Sha256::new();
    let mut count = 0u64;

    for item in items {
        h.update((item.len() as u64).to_le_bytes());
        h.update(item);
        count += 1;
    }
    h.update(count.to_le_bytes());

    let mut d = [0u8; 20];
    d.copy_from_slice(&h.finalize()[..20]);
    d
}

/// Sorted key/value map, as stored in a PSBT
#[derive(Clone, Debug, Default)]
pub struct KvMap {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl KvMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, keeping keys sorted and unique
    pub fn insert(&mut self, key: &[u8], value: &[u8]) {
        match self.entries.binary_search_by(|(k, _)| k[..].cmp(key)) {
            Ok(i) => self.entries[i].1 = value.to_vec(),
            Err(i) => self.entries.insert(i, (key.to_vec(), value.to_vec())),
        }
    }

    /// Remove an entry by key
    pub fn remove(&mut self, key: &[u8]) {
        self.entries.retain(|(k, _)| k != key);
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| &v[..])
    }

    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.iter().map(|(k, _)| &k[..])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys_root(&self) -> [u8; 20] {
        root20(self.keys())
    }

    pub fn values_root(&self) -> [u8; 20] {
        root20(self.entries.iter().map(|(_, v)| &v[..]))
    }

    /// Descriptor the engine holds for this map
    pub fn descriptor(&self) -> MapDescriptor {
        MapDescriptor {
            count: self.len(),
            keys_root: self.keys_root(),
            values_root: self.values_root(),
        }
    }

    /// Commitment leaf for this map within a collection
    pub fn commitment(&self) -> Vec<u8> {
        let d = self.descriptor();

        let mut out = Vec::new();
        out.extend_from_slice(&(d.count as u64).to_le_bytes());
        out.extend_from_slice(&d.keys_root);
        out.extend_from_slice(&d.values_root);
        out
    }
}

/// Root over a collection of per-item maps
pub fn collection_root(maps: &[KvMap]) -> [u8; 20] {
    let leaves: Vec<Vec<u8>> = maps.iter().map(|m| m.commitment()).collect();
    root20(leaves.iter().map(|l| &l[..]))
}

/// In-memory PSBT content served by the mock host
#[derive(Clone, Debug, Default)]
pub struct PsbtFixture {
    pub global: KvMap,
    pub inputs: Vec<KvMap>,
    pub outputs: Vec<KvMap>,
}

impl PsbtFixture {
    /// Sign-psbt request header committing to this fixture
    pub fn header(&self) -> SignPsbtReq {
        SignPsbtReq {
            global_count: self.global.len() as u64,
            global_keys_root: self.global.keys_root(),
            global_values_root: self.global.values_root(),
            n_inputs: self.inputs.len() as u64,
            inputs_root: collection_root(&self.inputs),
            n_outputs: self.outputs.len() as u64,
            outputs_root: collection_root(&self.outputs),
        }
    }

    /// Committed unsigned transaction
    pub fn unsigned_tx(&self) -> &[u8] {
        self.global
            .get(&[GlobalKey::UnsignedTx as u8])
            .expect("fixture missing unsigned tx")
    }
}

fn push_varint(out: &mut Vec<u8>, n: u64) {
    let mut buff = [0u8; 9];
    let l = hww_psbt_apdu::varint::write(&mut buff, n).unwrap();
    out.extend_from_slice(&buff[..l]);
}

/// P2PKH scriptPubKey: OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG
pub fn p2pkh_script(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut s = vec![0x76, 0xa9, 0x14];
    s.extend_from_slice(pubkey_hash);
    s.extend_from_slice(&[0x88, 0xac]);
    s
}

/// 22-byte P2SH scriptPubKey: OP_HASH160 <20> OP_EQUAL
pub fn p2sh_script(script_hash: &[u8; 20]) -> Vec<u8> {
    let mut s = vec![0xa9];
    s.extend_from_slice(script_hash);
    s.push(0x87);
    s
}

/// Serialize a version-1 transaction with empty script sigs
pub fn build_tx(
    inputs: &[([u8; 32], u32, u32)],
    outputs: &[(u64, Vec<u8>)],
    locktime: u32,
) -> Vec<u8> {
    let mut out = Vec::new();

    out.extend_from_slice(&1u32.to_le_bytes());

    push_varint(&mut out, inputs.len() as u64);
    for (hash, n, sequence) in inputs {
        out.extend_from_slice(hash);
        out.extend_from_slice(&n.to_le_bytes());
        push_varint(&mut out, 0);
        out.extend_from_slice(&sequence.to_le_bytes());
    }

    push_varint(&mut out, outputs.len() as u64);
    for (value, script) in outputs {
        out.extend_from_slice(&value.to_le_bytes());
        push_varint(&mut out, script.len() as u64);
        out.extend_from_slice(script);
    }

    out.extend_from_slice(&locktime.to_le_bytes());

    out
}

/// Input map for a legacy spend: previous transaction plus sighash type
fn input_map(prev_tx: &[u8], sighash_type: u32) -> KvMap {
    let mut map = KvMap::new();
    map.insert(&[InputKey::NonWitnessUtxo as u8], prev_tx);
    map.insert(
        &[InputKey::SighashType as u8],
        &sighash_type.to_le_bytes(),
    );
    map
}

/// Build a fixture spending `prev_outs` (scriptPubKey per input), with each
/// input's previous transaction generated around the spent output
fn spend_fixture(spent_scripts: &[Vec<u8>], sighash_type: u32) -> PsbtFixture {
    let mut unsigned_inputs = Vec::new();
    let mut inputs = Vec::new();

    for (i, spk) in spent_scripts.iter().enumerate() {
        // Two-output previous transaction, the fixture spends output 1
        let prev_tx = build_tx(
            &[([0x10 + i as u8; 32], 0, 0xffff_ffff)],
            &[
                (90_000, p2pkh_script(&[0xee; 20])),
                (50_000 + i as u64, spk.clone()),
            ],
            0,
        );

        unsigned_inputs.push((sha256d(&prev_tx), 1, 0xffff_fffd));
        inputs.push(input_map(&prev_tx, sighash_type));
    }

    let unsigned_tx = build_tx(
        &unsigned_inputs,
        &[
            (30_000, p2pkh_script(&[0x99; 20])),
            (10_000, p2pkh_script(&[0x77; 20])),
        ],
        0,
    );

    let mut global = KvMap::new();
    global.insert(&[GlobalKey::UnsignedTx as u8], &unsigned_tx);

    PsbtFixture {
        global,
        inputs,
        outputs: vec![KvMap::new(), KvMap::new()],
    }
}

/// P2PKH spend fixture for `n_inputs` inputs, all spending outputs locked
/// to the driver's signing key, SIGHASH_ALL
pub fn p2pkh_fixture(drv: &TestDriver, n_inputs: usize) -> PsbtFixture {
    let spk = p2pkh_script(&hash160(&drv.sign_pubkey().serialize()));

    spend_fixture(&vec![spk; n_inputs], SIGHASH_ALL)
}

/// Single-input P2PKH fixture with an explicit sighash type
pub fn p2pkh_fixture_with_sighash(drv: &TestDriver, sighash_type: u32) -> PsbtFixture {
    let spk = p2pkh_script(&hash160(&drv.sign_pubkey().serialize()));

    spend_fixture(&[spk], sighash_type)
}

/// Single-input P2SH fixture spending an output committing to `redeem_script`
pub fn p2sh_fixture(redeem_script: &[u8]) -> PsbtFixture {
    let spk = p2sh_script(&hash160(redeem_script));

    let mut fixture = spend_fixture(&[spk], SIGHASH_ALL);
    fixture.inputs[0].insert(&[InputKey::RedeemScript as u8], redeem_script);

    fixture
}

/// Single-input fixture spending an output with an oversized scriptPubKey
pub fn oversized_script_fixture(script_len: usize) -> PsbtFixture {
    spend_fixture(&[vec![0x51; script_len]], SIGHASH_ALL)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kv_map_keeps_keys_sorted() {
        let mut map = KvMap::new();
        map.insert(&[0x03], b"c");
        map.insert(&[0x00], b"a");
        map.insert(&[0x04], b"d");
        map.insert(&[0x00], b"a2");

        let keys: Vec<_> = map.keys().collect();
        assert_eq!(keys, vec![&[0x00][..], &[0x03][..], &[0x04][..]]);
        assert_eq!(map.get(&[0x00]), Some(&b"a2"[..]));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn header_commits_to_content() {
        let fixture = p2sh_fixture(&[0x51]);
        let header = fixture.header();

        assert_eq!(header.global_count, 1);
        assert_eq!(header.n_inputs, 1);
        assert_eq!(header.n_outputs, 2);

        // Any content change must move the committed roots
        let mut other = fixture.clone();
        other.inputs[0].insert(&[InputKey::RedeemScript as u8], &[0x52]);
        assert_ne!(other.header().inputs_root, header.inputs_root);
    }
}
