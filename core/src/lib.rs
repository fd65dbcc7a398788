//! Bitcoin hardware wallet PSBT signing core
//!
//! This provides a common [Engine][engine] implementing legacy (pre-segwit)
//! PSBT input signing for execution on hardware wallets.
//!
//! Interactions with the [Engine][engine] are performed via [Event][engine::Event]s
//! and [Output][engine::Output]s, see [hww_psbt_apdu] for APDU objects and wire
//! encodings.
//!
//! ## Operations
//!
//! The master key fingerprint can be requested at any time via
//! [`GetMasterFingerprintReq`][hww_psbt_apdu::fingerprint::GetMasterFingerprintReq],
//! returning a [`MasterFingerprintResp`][hww_psbt_apdu::fingerprint::MasterFingerprintResp].
//!
//! ### Signing a PSBT
//!
//! A signing session starts with a
//! [`SignPsbtReq`][hww_psbt_apdu::sign_psbt::SignPsbtReq] carrying entry counts
//! and Merkle commitments over the PSBT maps, and is then advanced one host
//! round trip at a time via [`ContinueReq`][hww_psbt_apdu::sign_psbt::ContinueReq].
//! Map content is fetched lazily through the [`Host`][engine::Host] interface and
//! authenticated against the committed roots, so the device never holds a full
//! transaction in memory.
//!
//! Each step returns a [`StateResp`][hww_psbt_apdu::sign_psbt::StateResp] with the
//! engine state and session generation, or a
//! [`SignatureResp`][hww_psbt_apdu::sign_psbt::SignatureResp] when an input has
//! been signed. Issuing a new `SignPsbtReq` cancels any session in flight.
//!

#![cfg_attr(not(feature = "std"), no_std)]

pub use hww_psbt_apdu::{self as apdu};

pub mod engine;

pub mod helpers;
