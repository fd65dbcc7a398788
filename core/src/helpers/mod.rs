//! Hashing helpers shared across the [engine][crate::engine]
//!

use ripemd::Ripemd160;
use sha2::{Digest as _, Sha256};

use crate::apdu::varint;

/// Double SHA-256, as used for transaction ids and legacy sighashes
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);

    let mut d = [0u8; 32];
    d.copy_from_slice(&Sha256::digest(first));
    d
}

/// Finalize a streaming SHA-256 context and apply the second hash pass
pub fn finalize_sha256d(hasher: Sha256) -> [u8; 32] {
    let first = hasher.finalize();

    let mut d = [0u8; 32];
    d.copy_from_slice(&Sha256::digest(first));
    d
}

/// RIPEMD-160 over SHA-256, as used for script and key hashes
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);

    let mut d = [0u8; 20];
    d.copy_from_slice(&Ripemd160::digest(sha));
    d
}

/// Feed a compact varint into a running hash context
pub fn hash_update_varint(hasher: &mut Sha256, n: u64) {
    let mut buff = [0u8; 9];

    // 9-byte buffer always fits a varint
    if let Ok(l) = varint::write(&mut buff, n) {
        hasher.update(&buff[..l]);
    }
}
