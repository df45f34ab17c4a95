//! Key management: key pair generation and the on-disk key file format
//!
//! A key file is a small pretty-printed JSON document holding the key
//! parameters field by field as lowercase hex:
//!
//! ```text
//! {
//!   "algorithm": "Ed25519ph",
//!   "public_key": "<64 hex chars>",
//!   "secret_key": "<64 hex chars>"
//! }
//! ```
//!
//! The public key file is the same document without `secret_key`.

use crate::crypto::{self, ALGORITHM};
use crate::exceptions::{FileKind, Result, SignerError};
use crate::utils::read_input_to_string;
use ed25519_dalek::{PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH, SigningKey, VerifyingKey};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Default file name of the private key written by `generate`
pub const DEFAULT_PRIVATE_KEY_FILE: &str = "artifact_signer.priv";

/// Default file name of the public key written by `generate`
pub const DEFAULT_PUBLIC_KEY_FILE: &str = "artifact_signer.pub";

const PRIVATE_KEY_MODE: u32 = 0o600;
const PUBLIC_KEY_MODE: u32 = 0o644;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeyDocument {
    algorithm: String,
    public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    secret_key: Option<String>,
}

/// An Ed25519 key pair
#[derive(Debug, Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let (signing_key, _) = crypto::generate_keypair();
        Self { signing_key }
    }

    /// Wrap an existing signing key
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// The private half
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// The public half
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Short hex fingerprint of the public key
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.verifying_key())
    }
}

/// First 8 bytes of a public key as hex, safe to log
pub fn fingerprint(verifying_key: &VerifyingKey) -> String {
    hex::encode(&verifying_key.as_bytes()[..8])
}

/// Serialize a private key (all parameters)
pub fn encode_private_key(signing_key: &SigningKey) -> Result<String> {
    let document = KeyDocument {
        algorithm: ALGORITHM.to_string(),
        public_key: hex::encode(signing_key.verifying_key().as_bytes()),
        secret_key: Some(hex::encode(signing_key.to_bytes())),
    };
    Ok(format!("{}\n", serde_json::to_string_pretty(&document)?))
}

/// Serialize a public key (public parameters only)
pub fn encode_public_key(verifying_key: &VerifyingKey) -> Result<String> {
    let document = KeyDocument {
        algorithm: ALGORITHM.to_string(),
        public_key: hex::encode(verifying_key.as_bytes()),
        secret_key: None,
    };
    Ok(format!("{}\n", serde_json::to_string_pretty(&document)?))
}

/// Parse a private key document
pub fn decode_private_key(text: &str) -> Result<SigningKey> {
    let document = parse_document(text)?;
    let secret_hex = document.secret_key.as_deref().ok_or_else(|| {
        SignerError::KeyParse("missing secret_key, not a private key".to_string())
    })?;

    let secret: [u8; SECRET_KEY_LENGTH] = decode_hex_field("secret_key", secret_hex)?;
    let signing_key = SigningKey::from_bytes(&secret);
    let public_key = decode_verifying_key(&document.public_key)?;

    if signing_key.verifying_key() != public_key {
        return Err(SignerError::KeyParse(
            "public_key does not match secret_key".to_string(),
        ));
    }

    Ok(signing_key)
}

/// Parse a public key document
///
/// A private key document is accepted too and yields its public half.
pub fn decode_public_key(text: &str) -> Result<VerifyingKey> {
    let document = parse_document(text)?;
    if document.secret_key.is_some() {
        return decode_private_key(text).map(|key| key.verifying_key());
    }
    decode_verifying_key(&document.public_key)
}

/// Load a private key file
pub fn load_signing_key(path: &Path) -> Result<SigningKey> {
    let text = read_input_to_string(path, FileKind::PrivateKey)?;
    let signing_key = decode_private_key(&text)?;
    debug!(
        "Loaded private key {} from {}",
        fingerprint(&signing_key.verifying_key()),
        path.display()
    );
    Ok(signing_key)
}

/// Load a public key file
pub fn load_verifying_key(path: &Path) -> Result<VerifyingKey> {
    let text = read_input_to_string(path, FileKind::PublicKey)?;
    let verifying_key = decode_public_key(&text)?;
    debug!(
        "Loaded public key {} from {}",
        fingerprint(&verifying_key),
        path.display()
    );
    Ok(verifying_key)
}

fn parse_document(text: &str) -> Result<KeyDocument> {
    let document: KeyDocument = serde_json::from_str(text)
        .map_err(|e| SignerError::KeyParse(format!("malformed key document: {e}")))?;

    if document.algorithm != ALGORITHM {
        return Err(SignerError::KeyParse(format!(
            "unsupported algorithm {:?}, expected {:?}",
            document.algorithm, ALGORITHM
        )));
    }

    Ok(document)
}

fn decode_verifying_key(public_hex: &str) -> Result<VerifyingKey> {
    let public: [u8; PUBLIC_KEY_LENGTH] = decode_hex_field("public_key", public_hex)?;
    VerifyingKey::from_bytes(&public)
        .map_err(|e| SignerError::KeyParse(format!("invalid public_key: {e}")))
}

fn decode_hex_field<const N: usize>(name: &str, value: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(value)
        .map_err(|e| SignerError::KeyParse(format!("{name} is not valid hex: {e}")))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        SignerError::KeyParse(format!("{name} must be {N} bytes, got {}", bytes.len()))
    })
}

/// Generates key pairs into a directory under the default file names
#[derive(Debug, Clone)]
pub struct KeyManager {
    dir: PathBuf,
}

impl KeyManager {
    /// Manage keys in `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Manage keys in the process working directory
    pub fn in_current_dir() -> Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    /// Where the private key is written
    pub fn private_key_path(&self) -> PathBuf {
        self.dir.join(DEFAULT_PRIVATE_KEY_FILE)
    }

    /// Where the public key is written
    pub fn public_key_path(&self) -> PathBuf {
        self.dir.join(DEFAULT_PUBLIC_KEY_FILE)
    }

    /// Generate a key pair and write both key files
    ///
    /// Fails with `OutputExists` before writing anything if either file is
    /// already present. Both files appear or neither does.
    pub fn generate(&self) -> Result<KeyPair> {
        let private_path = self.private_key_path();
        let public_path = self.public_key_path();

        for path in [&private_path, &public_path] {
            if path.exists() {
                return Err(SignerError::OutputExists(path.clone()));
            }
        }

        let pair = KeyPair::generate();
        let private_staged =
            self.stage(&encode_private_key(pair.signing_key())?, PRIVATE_KEY_MODE)?;
        let public_staged =
            self.stage(&encode_public_key(&pair.verifying_key())?, PUBLIC_KEY_MODE)?;

        persist_new(private_staged, &private_path)?;
        if let Err(e) = persist_new(public_staged, &public_path) {
            if let Err(cleanup) = fs::remove_file(&private_path) {
                warn!(
                    "Failed to remove {} after error: {}",
                    private_path.display(),
                    cleanup
                );
            }
            return Err(e);
        }

        info!(
            "🔑 Generated key pair {} in {}",
            pair.fingerprint(),
            self.dir.display()
        );
        Ok(pair)
    }

    /// Write `contents` to a temporary file next to the final location
    fn stage(&self, contents: &str, mode: u32) -> Result<NamedTempFile> {
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(contents.as_bytes())?;
        staged.as_file().sync_all()?;
        set_mode(staged.path(), mode)?;
        Ok(staged)
    }
}

fn persist_new(staged: NamedTempFile, path: &Path) -> Result<()> {
    staged.persist_noclobber(path).map_err(|e| {
        if e.error.kind() == ErrorKind::AlreadyExists {
            SignerError::OutputExists(path.to_path_buf())
        } else {
            SignerError::Io(e.error)
        }
    })?;
    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_writes_both_files() {
        let temp_dir = TempDir::new().unwrap();
        let manager = KeyManager::new(temp_dir.path());

        let pair = manager.generate().unwrap();

        let signing_key = load_signing_key(&manager.private_key_path()).unwrap();
        let verifying_key = load_verifying_key(&manager.public_key_path()).unwrap();
        assert_eq!(signing_key.to_bytes(), pair.signing_key().to_bytes());
        assert_eq!(verifying_key, pair.verifying_key());

        // Only the two key files, no leftover staging files
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_public_file_has_no_secret() {
        let temp_dir = TempDir::new().unwrap();
        let manager = KeyManager::new(temp_dir.path());
        let pair = manager.generate().unwrap();

        let public_text = fs::read_to_string(manager.public_key_path()).unwrap();
        let private_text = fs::read_to_string(manager.private_key_path()).unwrap();
        let secret_hex = hex::encode(pair.signing_key().to_bytes());

        assert!(!public_text.contains("secret_key"));
        assert!(!public_text.contains(&secret_hex));
        assert!(private_text.contains(&secret_hex));
        assert!(public_text.contains(&hex::encode(pair.verifying_key().as_bytes())));
    }

    #[test]
    fn test_generate_twice_keeps_original_files() {
        let temp_dir = TempDir::new().unwrap();
        let manager = KeyManager::new(temp_dir.path());
        manager.generate().unwrap();

        let private_before = fs::read(manager.private_key_path()).unwrap();
        let public_before = fs::read(manager.public_key_path()).unwrap();

        let err = manager.generate().unwrap_err();
        assert!(matches!(err, SignerError::OutputExists(_)));

        assert_eq!(fs::read(manager.private_key_path()).unwrap(), private_before);
        assert_eq!(fs::read(manager.public_key_path()).unwrap(), public_before);
    }

    #[test]
    fn test_generate_refuses_when_only_public_exists() {
        let temp_dir = TempDir::new().unwrap();
        let manager = KeyManager::new(temp_dir.path());
        fs::write(manager.public_key_path(), "keep me").unwrap();

        let err = manager.generate().unwrap_err();
        assert!(
            matches!(err, SignerError::OutputExists(ref p) if *p == manager.public_key_path())
        );

        assert!(!manager.private_key_path().exists());
        assert_eq!(
            fs::read_to_string(manager.public_key_path()).unwrap(),
            "keep me"
        );
    }

    #[test]
    fn test_generate_into_missing_dir_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let manager = KeyManager::new(temp_dir.path().join("absent"));

        let err = manager.generate().unwrap_err();
        assert!(matches!(err, SignerError::Io(_)));
        assert!(!manager.private_key_path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let manager = KeyManager::new(temp_dir.path());
        manager.generate().unwrap();

        let private_mode = fs::metadata(manager.private_key_path())
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        let public_mode = fs::metadata(manager.public_key_path())
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(private_mode, 0o600);
        assert_eq!(public_mode, 0o644);
    }

    #[test]
    fn test_private_document_accepted_as_public_key() {
        let pair = KeyPair::generate();
        let text = encode_private_key(pair.signing_key()).unwrap();

        assert_eq!(decode_public_key(&text).unwrap(), pair.verifying_key());
    }

    #[test]
    fn test_public_document_rejected_as_private_key() {
        let pair = KeyPair::generate();
        let text = encode_public_key(&pair.verifying_key()).unwrap();

        let err = decode_private_key(&text).unwrap_err();
        assert!(matches!(err, SignerError::KeyParse(_)));
    }

    #[test]
    fn test_mismatched_public_key_rejected() {
        let pair = KeyPair::generate();
        let other = KeyPair::generate();
        let text = encode_private_key(pair.signing_key())
            .unwrap()
            .replace(
                &hex::encode(pair.verifying_key().as_bytes()),
                &hex::encode(other.verifying_key().as_bytes()),
            );

        let err = decode_private_key(&text).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_malformed_documents_rejected() {
        let pair = KeyPair::generate();
        let public_hex = hex::encode(pair.verifying_key().as_bytes());

        let cases = [
            "not json at all".to_string(),
            format!(r#"{{"algorithm":"DSA","public_key":"{public_hex}"}}"#),
            r#"{"algorithm":"Ed25519ph","public_key":"zz"}"#.to_string(),
            r#"{"algorithm":"Ed25519ph","public_key":"abcd"}"#.to_string(),
            format!(r#"{{"algorithm":"Ed25519ph","public_key":"{public_hex}","extra":1}}"#),
        ];

        for case in &cases {
            let err = decode_public_key(case).unwrap_err();
            assert!(
                matches!(err, SignerError::KeyParse(_)),
                "expected KeyParse for {case}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_load_missing_key_files() {
        let temp_dir = TempDir::new().unwrap();

        let err = load_signing_key(&temp_dir.path().join("none.priv")).unwrap_err();
        assert!(matches!(
            err,
            SignerError::FileNotFound {
                kind: FileKind::PrivateKey,
                ..
            }
        ));

        let err = load_verifying_key(&temp_dir.path().join("none.pub")).unwrap_err();
        assert!(matches!(
            err,
            SignerError::FileNotFound {
                kind: FileKind::PublicKey,
                ..
            }
        ));
    }

    #[test]
    fn test_fingerprint_is_short_hex() {
        let pair = KeyPair::generate();
        let fp = pair.fingerprint();

        assert_eq!(fp.len(), 16);
        assert!(hex::encode(pair.verifying_key().as_bytes()).starts_with(&fp));
    }
}
