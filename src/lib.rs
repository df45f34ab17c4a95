//! Artifact Signer - Ed25519 key generation, artifact signing and verification
//!
//! Publishers run `generate` once, `sign` each release artifact with the
//! private key, and ship the public key with their application so that
//! downloaded updates can be checked with `verify` before they are trusted.

// Enforce strict code quality and reliability
#![deny(
    // Safety
    unsafe_code,

    // Correctness
    missing_debug_implementations,
    unreachable_pub,

    // Future compatibility
    future_incompatible,

    // Rust 2018 idioms
    rust_2018_idioms,
)]
#![warn(
    // Documentation
    missing_docs,

    // Error handling best practices
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::unimplemented,
    clippy::todo,

    // Code clarity and maintainability
    clippy::cognitive_complexity,
    clippy::type_complexity,

    // Best practices
    clippy::clone_on_ref_ptr,
    clippy::wildcard_imports,
    clippy::enum_glob_use,
    clippy::if_not_else,
    clippy::needless_continue,
    clippy::explicit_iter_loop,
    clippy::explicit_into_iter_loop,
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod cli;
pub mod crypto;
pub mod exceptions;
pub mod exit_codes;
pub mod keys;
pub mod logger;
pub mod signer;
pub mod utils;
pub mod verifier;
pub mod version;

pub use exceptions::{FileKind, Result, SignerError};
pub use keys::{DEFAULT_PRIVATE_KEY_FILE, DEFAULT_PUBLIC_KEY_FILE, KeyManager, KeyPair};
pub use signer::{Signer, sign_artifact};
pub use verifier::{SignatureVerifier, verify_artifact};
