//! Sighash signing with guaranteed key erasure
//!

use secp256k1::{Message, Secp256k1, SecretKey};
use zeroize::Zeroize;

use super::{DerSignature, Driver, Error, HdNode};

/// Derive the signing key and produce a DER-encoded ECDSA signature over
/// `sighash`.
///
/// The node scratch is wiped before the result propagates, whichever path
/// derivation or signing takes.
pub(crate) fn sign_sighash<DRV: Driver>(
    drv: &DRV,
    path: &[u32],
    sighash: &[u8; 32],
    node: &mut HdNode,
) -> Result<DerSignature, Error> {
    let r = drv
        .derive_hd_node(path, node)
        .and_then(|_| ecdsa_sign(&node.privkey, sighash));

    node.zeroize();

    r
}

/// Deterministic (RFC 6979) ECDSA over secp256k1, DER encoded
#[cfg_attr(feature = "noinline", inline(never))]
fn ecdsa_sign(privkey: &[u8; 32], sighash: &[u8; 32]) -> Result<DerSignature, Error> {
    let secp = Secp256k1::signing_only();

    let sk = SecretKey::from_slice(privkey).map_err(|_| Error::KeyDerivationFailed)?;
    let msg = Message::from_digest(*sighash);

    let sig = secp.sign_ecdsa(&msg, &sk);

    DerSignature::from_slice(&sig.serialize_der()).map_err(|_| Error::SignatureFail)
}
