//! Error types for artifact-signer

use crate::exit_codes::EXIT_FAILURE;
use std::fmt;
use std::path::PathBuf;

/// Which input file an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// The file being signed or verified
    Artifact,
    /// A private key file
    PrivateKey,
    /// A public key file
    PublicKey,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Artifact => write!(f, "Artifact"),
            FileKind::PrivateKey => write!(f, "Private key"),
            FileKind::PublicKey => write!(f, "Public key"),
        }
    }
}

/// Main error type for signing operations
///
/// A signature that simply does not match is not an error; verification
/// reports it as `Ok(false)`.
#[derive(Debug)]
pub enum SignerError {
    /// Wrong argument count for a command
    Usage(String),

    /// Referenced artifact or key file does not exist
    FileNotFound {
        /// Role of the missing file
        kind: FileKind,
        /// Path as given by the caller
        path: PathBuf,
    },

    /// Key file content is not a valid key in the expected format
    KeyParse(String),

    /// Key generation would overwrite an existing file
    OutputExists(PathBuf),

    /// Signature string is not valid base64 or has the wrong length
    SignatureDecode(String),

    /// The signature primitive rejected the operation
    Crypto(String),

    /// IO error
    Io(std::io::Error),

    /// JSON encoding error
    Json(serde_json::Error),
}

impl SignerError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        EXIT_FAILURE
    }
}

impl fmt::Display for SignerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerError::Usage(msg) => write!(f, "Usage error: {msg}"),
            SignerError::FileNotFound { kind, path } => {
                write!(f, "{kind} {} doesn't exist", path.display())
            }
            SignerError::KeyParse(msg) => write!(f, "Key parse error: {msg}"),
            SignerError::OutputExists(path) => {
                write!(f, "Output file {} already exists", path.display())
            }
            SignerError::SignatureDecode(msg) => write!(f, "Invalid signature: {msg}"),
            SignerError::Crypto(msg) => write!(f, "Crypto error: {msg}"),
            SignerError::Io(err) => write!(f, "IO error: {err}"),
            SignerError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl std::error::Error for SignerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SignerError::Io(err) => Some(err),
            SignerError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SignerError {
    fn from(err: std::io::Error) -> Self {
        SignerError::Io(err)
    }
}

impl From<serde_json::Error> for SignerError {
    fn from(err: serde_json::Error) -> Self {
        SignerError::Json(err)
    }
}

/// Result type for signing operations
pub type Result<T> = std::result::Result<T, SignerError>;
