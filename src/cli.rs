//! CLI command handlers
//!
//! Each handler prints its own output and returns the process exit code.

use crate::exceptions::{Result, SignerError};
use crate::exit_codes::{EXIT_SUCCESS, EXIT_UNVERIFIED};
use crate::keys::{DEFAULT_PRIVATE_KEY_FILE, DEFAULT_PUBLIC_KEY_FILE, KeyManager};
use crate::signer::sign_artifact;
use crate::verifier::verify_artifact;
use log::debug;
use std::path::{Path, PathBuf};

/// Binary name shown in usage text
pub const COMMAND_NAME: &str = "artifact-signer";

/// Commands understood by the dispatcher
pub const COMMANDS: [&str; 3] = ["generate", "sign", "verify"];

/// Full usage text
pub fn usage_text() -> String {
    let cmd = COMMAND_NAME;
    let mut text = String::new();

    text.push_str(&format!(
        "\n\tArtifact Signer {}\n\tEd25519 signatures for release artifacts\n",
        crate::version::VERSION
    ));
    text.push_str("\n  Usage:\n");
    text.push_str(&format!("\n\t {cmd} [--log-level LEVEL] COMMAND\n"));
    text.push_str("\n  Commands:\n\n");

    text.push_str("\tgenerate [--dir DIR]\n");
    text.push_str(&format!("\t  e.g. {cmd} generate\n\n"));
    text.push_str("\t  Generates a public and a private key pair which is stored in the\n");
    text.push_str(&format!(
        "\t  current working directory (or DIR). The private key will be stored as {DEFAULT_PRIVATE_KEY_FILE}.\n"
    ));
    text.push_str(&format!(
        "\t  The public key will be saved as {DEFAULT_PUBLIC_KEY_FILE}.\n"
    ));
    text.push_str("\t  Ship this public key file with your application.\n\n");

    text.push_str("\tsign <artifact> <private_key_file>\n");
    text.push_str(&format!(
        "\t  e.g. {cmd} sign installer.msi {DEFAULT_PRIVATE_KEY_FILE}\n\n"
    ));
    text.push_str("\t  Signs the given artifact using the given private key.\n");
    text.push_str("\t  The output is a base64 signature for this artifact that should be\n");
    text.push_str("\t  published next to it, e.g. in your update feed.\n\n");

    text.push_str("\tverify <artifact> <public_key_file> <signature>\n");
    text.push_str(&format!(
        "\t  e.g. {cmd} verify installer.msi {DEFAULT_PUBLIC_KEY_FILE} MG9289E047A09383...==\n\n"
    ));
    text.push_str("\t  Verifies the given artifact using the given public key and a signature\n");
    text.push_str("\t  created with the 'sign' command above.\n");

    text
}

/// Print usage to stdout
pub fn print_usage() {
    println!("{}", usage_text());
}

/// Check that a command got exactly `expected` arguments
pub fn expect_args(command: &str, args: &[String], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(SignerError::Usage(format!(
            "'{command}' takes {expected} arguments, got {}",
            args.len()
        )))
    }
}

fn report(err: &SignerError) -> i32 {
    debug!("Command failed: {err:?}");
    match err {
        SignerError::Usage(_) => {
            eprintln!("\t{err}");
            eprintln!("{}", usage_text());
        }
        SignerError::FileNotFound { .. } | SignerError::OutputExists(_) => {
            eprintln!("\tError: {err}");
        }
        _ => eprintln!("Error: {err}"),
    }
    err.exit_code()
}

/// Report bad operands for `command`: usage on stderr, failure exit
pub fn usage_error(command: &str, reason: &str) -> i32 {
    report(&SignerError::Usage(format!("'{command}': {reason}")))
}

/// `generate`: write a new key pair into `dir` (or the working directory)
pub fn generate(dir: Option<&Path>) -> i32 {
    let manager = match dir {
        Some(dir) => KeyManager::new(dir),
        None => match KeyManager::in_current_dir() {
            Ok(manager) => manager,
            Err(e) => return report(&e),
        },
    };

    match manager.generate() {
        Ok(pair) => {
            println!("\tFinished generating keys");
            println!("\t  private key: {}", manager.private_key_path().display());
            println!("\t  public key:  {}", manager.public_key_path().display());
            debug!("Key fingerprint {}", pair.fingerprint());
            EXIT_SUCCESS
        }
        Err(e) => report(&e),
    }
}

/// `sign <artifact> <private_key_file>`: print the base64 signature
pub fn sign(args: &[String]) -> i32 {
    if let Err(e) = expect_args("sign", args, 2) {
        return report(&e);
    }

    let artifact = PathBuf::from(&args[0]);
    let private_key = PathBuf::from(&args[1]);

    match sign_artifact(&artifact, &private_key) {
        Ok(signature) => {
            println!("{signature}");
            EXIT_SUCCESS
        }
        Err(e) => report(&e),
    }
}

/// `verify <artifact> <public_key_file> <signature>`
pub fn verify(args: &[String]) -> i32 {
    if let Err(e) = expect_args("verify", args, 3) {
        return report(&e);
    }

    let artifact = PathBuf::from(&args[0]);
    let public_key = PathBuf::from(&args[1]);

    match verify_artifact(&artifact, &public_key, &args[2]) {
        Ok(true) => {
            println!("\tVerified! Artifact's signature is valid!");
            EXIT_SUCCESS
        }
        Ok(false) => {
            eprintln!("\tUnverified: Artifact signature is not valid.");
            EXIT_UNVERIFIED
        }
        Err(e) => report(&e),
    }
}

/// Route an unrecognized command: usage, success exit
pub fn unknown(command: &str) -> i32 {
    debug!("Unknown command {command:?}, showing usage");
    print_usage();
    EXIT_SUCCESS
}

/// Lowercase the first argument if it names a command in any case
pub fn normalize_command(arg: &str) -> Option<String> {
    let lowered = arg.to_lowercase();
    COMMANDS.contains(&lowered.as_str()).then_some(lowered)
}
