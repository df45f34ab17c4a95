//! Artifact signing

use crate::crypto;
use crate::exceptions::{FileKind, Result};
use crate::keys::{self, fingerprint};
use crate::utils::{ensure_exists, open_input};
use ed25519_dalek::SigningKey;
use log::{debug, info};
use std::io::Read;
use std::path::Path;

/// Produces base64 signatures with a private key
#[derive(Debug)]
pub struct Signer {
    signing_key: SigningKey,
}

impl Signer {
    /// Sign with the given key
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Load the private key from a key file
    pub fn from_key_file(private_key_path: &Path) -> Result<Self> {
        Ok(Self::new(keys::load_signing_key(private_key_path)?))
    }

    /// Sign everything `reader` yields
    pub fn sign_reader<R: Read>(&self, reader: R) -> Result<String> {
        let (prehashed, total) = crypto::prehash_reader(reader)?;
        let signature = crypto::sign_prehashed(prehashed, &self.signing_key)?;
        debug!(
            "Signed {} bytes with key {}",
            total,
            fingerprint(&self.signing_key.verifying_key())
        );
        Ok(crypto::encode_signature(&signature))
    }

    /// Sign the contents of a file
    pub fn sign_file(&self, artifact: &Path) -> Result<String> {
        let file = open_input(artifact, FileKind::Artifact)?;
        self.sign_reader(file)
    }
}

/// Sign `artifact` with the private key stored at `private_key_path`
///
/// The artifact is checked before the key file is touched, so a missing
/// artifact is reported even when the key is missing too.
pub fn sign_artifact(artifact: &Path, private_key_path: &Path) -> Result<String> {
    ensure_exists(artifact, FileKind::Artifact)?;
    ensure_exists(private_key_path, FileKind::PrivateKey)?;

    let signer = Signer::from_key_file(private_key_path)?;
    let signature = signer.sign_file(artifact)?;
    info!("✍️ Signed {}", artifact.display());
    Ok(signature)
}
