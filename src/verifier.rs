//! Artifact signature verification

use crate::crypto;
use crate::exceptions::{FileKind, Result};
use crate::keys::{self, fingerprint};
use crate::utils::open_input;
use ed25519_dalek::{Signature, VerifyingKey};
use log::{debug, info};
use std::io::Read;
use std::path::Path;

/// Checks base64 signatures against a public key
///
/// `Ok(false)` means the inputs were well formed but the signature does not
/// match. Malformed keys or signature strings are errors instead.
#[derive(Debug)]
pub struct SignatureVerifier {
    verifying_key: VerifyingKey,
}

impl SignatureVerifier {
    /// Verify with the given key
    pub fn new(verifying_key: VerifyingKey) -> Self {
        Self { verifying_key }
    }

    /// Load the public key from a key file
    pub fn from_key_file(public_key_path: &Path) -> Result<Self> {
        Ok(Self::new(keys::load_verifying_key(public_key_path)?))
    }

    /// The key signatures are checked against
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Check `signature` against everything `reader` yields
    pub fn verify_reader<R: Read>(&self, signature: &str, reader: R) -> Result<bool> {
        let signature = crypto::decode_signature(signature)?;
        self.check(&signature, reader)
    }

    /// Check `signature` against the contents of a file
    pub fn verify_file(&self, signature: &str, artifact: &Path) -> Result<bool> {
        let signature = crypto::decode_signature(signature)?;
        let file = open_input(artifact, FileKind::Artifact)?;
        self.check(&signature, file)
    }

    fn check<R: Read>(&self, signature: &Signature, reader: R) -> Result<bool> {
        let (prehashed, total) = crypto::prehash_reader(reader)?;
        let valid = crypto::verify_prehashed(prehashed, signature, &self.verifying_key);
        debug!(
            "Checked {} bytes against key {}: {}",
            total,
            fingerprint(&self.verifying_key),
            if valid { "✅ VALID" } else { "❌ INVALID" }
        );
        Ok(valid)
    }
}

/// Verify `signature` over `artifact` with the public key at `public_key_path`
pub fn verify_artifact(artifact: &Path, public_key_path: &Path, signature: &str) -> Result<bool> {
    let verifier = SignatureVerifier::from_key_file(public_key_path)?;
    let valid = verifier.verify_file(signature, artifact)?;
    info!(
        "🔍 Signature of {} is {}",
        artifact.display(),
        if valid { "valid" } else { "not valid" }
    );
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exceptions::SignerError;
    use crate::keys::KeyManager;
    use crate::signer::sign_artifact;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        manager: KeyManager,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let manager = KeyManager::new(dir.path());
            manager.generate().unwrap();
            Self { dir, manager }
        }

        fn write(&self, name: &str, contents: &[u8]) -> std::path::PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, contents).unwrap();
            path
        }
    }

    #[test]
    fn test_hello_scenario() {
        let fx = Fixture::new();
        let v1 = fx.write("hello-v1.txt", b"hello-v1");
        let v2 = fx.write("hello-v2.txt", b"hello-v2");

        let signature = sign_artifact(&v1, &fx.manager.private_key_path()).unwrap();
        let public_key = fx.manager.public_key_path();

        assert!(verify_artifact(&v1, &public_key, &signature).unwrap());
        assert!(!verify_artifact(&v2, &public_key, &signature).unwrap());
    }

    #[test]
    fn test_single_byte_mutation_fails() {
        let fx = Fixture::new();
        let original: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let artifact = fx.write("blob.bin", &original);
        let signature = sign_artifact(&artifact, &fx.manager.private_key_path()).unwrap();
        let verifier = SignatureVerifier::from_key_file(&fx.manager.public_key_path()).unwrap();

        for position in [0, 1, 2047, 4095] {
            let mut mutated = original.clone();
            mutated[position] ^= 0x01;
            assert!(!verifier.verify_reader(&signature, &mutated[..]).unwrap());
        }

        // Appending a byte changes the stream too
        let mut extended = original.clone();
        extended.push(0);
        assert!(!verifier.verify_reader(&signature, &extended[..]).unwrap());
        assert!(verifier.verify_reader(&signature, &original[..]).unwrap());
    }

    #[test]
    fn test_other_key_pair_rejects() {
        let first = Fixture::new();
        let second = Fixture::new();
        let artifact = first.write("a.bin", b"artifact");
        let signature = sign_artifact(&artifact, &first.manager.private_key_path()).unwrap();

        assert!(
            !verify_artifact(&artifact, &second.manager.public_key_path(), &signature).unwrap()
        );
    }

    #[test]
    fn test_invalid_base64_is_error_not_false() {
        let fx = Fixture::new();
        let artifact = fx.write("a.bin", b"artifact");

        let err = verify_artifact(&artifact, &fx.manager.public_key_path(), "%%% not base64 %%%")
            .unwrap_err();
        assert!(matches!(err, SignerError::SignatureDecode(_)));
    }

    #[test]
    fn test_missing_inputs() {
        let fx = Fixture::new();
        let artifact = fx.write("a.bin", b"artifact");
        let signature = sign_artifact(&artifact, &fx.manager.private_key_path()).unwrap();

        let err = verify_artifact(&artifact, &fx.dir.path().join("none.pub"), &signature)
            .unwrap_err();
        assert!(matches!(
            err,
            SignerError::FileNotFound {
                kind: FileKind::PublicKey,
                ..
            }
        ));

        let err = verify_artifact(
            &fx.dir.path().join("none.bin"),
            &fx.manager.public_key_path(),
            &signature,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SignerError::FileNotFound {
                kind: FileKind::Artifact,
                ..
            }
        ));
    }

    #[test]
    fn test_verify_with_private_key_file() {
        let fx = Fixture::new();
        let artifact = fx.write("a.bin", b"artifact");
        let signature = sign_artifact(&artifact, &fx.manager.private_key_path()).unwrap();

        assert!(verify_artifact(&artifact, &fx.manager.private_key_path(), &signature).unwrap());
    }
}
