//! Codec layer for the identifier ciphers.
//!
//! This module provides the pure deobfuscation primitives used by the
//! feed format parsers.
//!
//! # Submodules
//!
//! - [`cipher`][]: 64-symbol alphabet cipher of the legacy text feed
//! - [`crypto`][]: dynamic key derivation and XOR schedules of the PAS container

pub mod cipher;
pub mod crypto;
