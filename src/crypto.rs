//! Ed25519ph primitives: key generation, streaming pre-hash, sign and verify
//!
//! Artifacts are hashed with SHA-512 in fixed-size chunks and the digest is
//! signed with the pre-hashed Ed25519 variant, so nothing larger than one
//! buffer is ever held in memory.

use crate::exceptions::{Result, SignerError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::{SIGNATURE_LENGTH, Signature, SigningKey, VerifyingKey};
use log::trace;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha512};
use std::io::Read;

/// Domain separation context bound into every signature
pub const SIGNING_CONTEXT: &[u8] = b"artifact-signer/v1";

/// Name recorded in key files
pub const ALGORITHM: &str = "Ed25519ph";

const BUFFER_SIZE: usize = 64 * 1024;

/// Generate a fresh Ed25519 key pair from the OS RNG
pub fn generate_keypair() -> (SigningKey, VerifyingKey) {
    let mut secret_key = [0u8; 32];
    OsRng.fill_bytes(&mut secret_key);
    let signing_key = SigningKey::from_bytes(&secret_key);
    let verifying_key = signing_key.verifying_key();
    (signing_key, verifying_key)
}

/// Feed an entire stream into a SHA-512 hasher
pub fn prehash_reader<R: Read>(mut reader: R) -> std::io::Result<(Sha512, u64)> {
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut hasher = Sha512::new();
    let mut total = 0u64;

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        total += bytes_read as u64;
    }

    trace!("Pre-hashed {} bytes", total);
    Ok((hasher, total))
}

/// Sign a pre-hashed message
pub fn sign_prehashed(prehashed: Sha512, signing_key: &SigningKey) -> Result<Signature> {
    signing_key
        .sign_prehashed(prehashed, Some(SIGNING_CONTEXT))
        .map_err(|e| SignerError::Crypto(format!("Signing failed: {e}")))
}

/// Verify a signature over a pre-hashed message
pub fn verify_prehashed(
    prehashed: Sha512,
    signature: &Signature,
    verifying_key: &VerifyingKey,
) -> bool {
    verifying_key
        .verify_prehashed(prehashed, Some(SIGNING_CONTEXT), signature)
        .is_ok()
}

/// Encode raw signature bytes as standard base64
pub fn encode_signature(signature: &Signature) -> String {
    STANDARD.encode(signature.to_bytes())
}

/// Decode a base64 signature string
pub fn decode_signature(encoded: &str) -> Result<Signature> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| SignerError::SignatureDecode(format!("not valid base64: {e}")))?;

    if bytes.len() != SIGNATURE_LENGTH {
        return Err(SignerError::SignatureDecode(format!(
            "expected {} bytes, got {}",
            SIGNATURE_LENGTH,
            bytes.len()
        )));
    }

    Signature::from_slice(&bytes).map_err(|e| SignerError::SignatureDecode(e.to_string()))
}
