//! Utility functions for artifact-signer

use crate::exceptions::{FileKind, Result, SignerError};
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Fail with `FileNotFound` unless `path` exists
pub fn ensure_exists(path: &Path, kind: FileKind) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(SignerError::FileNotFound {
            kind,
            path: path.to_path_buf(),
        })
    }
}

/// Open an input file, reporting a missing file by its role
pub fn open_input(path: &Path, kind: FileKind) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            SignerError::FileNotFound {
                kind,
                path: path.to_path_buf(),
            }
        } else {
            SignerError::Io(e)
        }
    })
}

/// Read a whole input file as UTF-8 text
pub fn read_input_to_string(path: &Path, kind: FileKind) -> Result<String> {
    use std::io::Read;

    let mut contents = String::new();
    open_input(path, kind)?.read_to_string(&mut contents)?;
    Ok(contents)
}
