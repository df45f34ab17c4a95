//! artifact-signer binary

use artifact_signer::cli;
use artifact_signer::exit_codes::{EXIT_PANIC, EXIT_SUCCESS};
use artifact_signer::logger::JsonLogger;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::{env, panic, path::PathBuf, process};

const VERSION: &str = artifact_signer::version::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "artifact-signer",
    version = VERSION,
    about = "Generate key pairs, sign artifacts and verify artifact signatures",
    disable_help_subcommand = true
)]
struct Args {
    /// Log level (trace, debug, info, warn, error, off; prefix with json: for JSON lines)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a key pair in the working directory
    Generate {
        /// Directory for the key files (defaults to CWD)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Sign an artifact: sign <artifact> <private_key_file>
    Sign {
        #[arg(
            value_name = "ARTIFACT PRIVATE_KEY_FILE",
            num_args = 0..,
            allow_hyphen_values = true,
            trailing_var_arg = true
        )]
        args: Vec<String>,
    },
    /// Verify an artifact: verify <artifact> <public_key_file> <signature>
    Verify {
        #[arg(
            value_name = "ARTIFACT PUBLIC_KEY_FILE SIGNATURE",
            num_args = 0..,
            allow_hyphen_values = true,
            trailing_var_arg = true
        )]
        args: Vec<String>,
    },
    #[command(external_subcommand)]
    Other(Vec<String>),
}

fn main() {
    panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: {}", panic_info);
        process::exit(EXIT_PANIC);
    }));

    let result = panic::catch_unwind(run);

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(_) => {
            eprintln!("Fatal: Unhandled panic in artifact-signer");
            process::exit(EXIT_PANIC);
        }
    }
}

/// Command names are matched case-insensitively
fn normalized_args() -> Vec<OsString> {
    let mut normalized = false;
    env::args_os()
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 || normalized {
                return arg;
            }
            match arg.to_str().and_then(cli::normalize_command) {
                Some(command) => {
                    normalized = true;
                    OsString::from(command)
                }
                None => arg,
            }
        })
        .collect()
}

/// Map a clap rejection onto the usage exit codes
///
/// Help and version requests print as usual. Bad operands of a known
/// command are usage errors; anything else is treated as an unknown command.
fn parse_failure(err: &clap::Error, argv: &[OsString]) -> i32 {
    if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        let _ = err.print();
        return EXIT_SUCCESS;
    }

    let command = argv
        .iter()
        .skip(1)
        .filter_map(|arg| arg.to_str())
        .find(|arg| cli::COMMANDS.contains(arg));

    match command {
        Some(command) => cli::usage_error(
            command,
            err.kind().as_str().unwrap_or("invalid arguments"),
        ),
        None => {
            let first = argv.get(1).map(|arg| arg.to_string_lossy().into_owned());
            cli::unknown(first.as_deref().unwrap_or(""))
        }
    }
}

fn run() -> i32 {
    if env::args().nth(1).as_deref() == Some("--version") {
        println!("artifact-signer {}", artifact_signer::version::full_version());
        return EXIT_SUCCESS;
    }

    let argv = normalized_args();
    let args = match Args::try_parse_from(&argv) {
        Ok(args) => args,
        Err(e) => return parse_failure(&e, &argv),
    };

    let (level, source) = match args.log_level {
        Some(ref level) => JsonLogger::init_with_level(level, "CLI --log-level"),
        None => JsonLogger::init(),
    };
    log::debug!("Logging at {} (from {})", level, source);

    match args.command {
        None => {
            cli::print_usage();
            EXIT_SUCCESS
        }
        Some(Command::Generate { dir }) => cli::generate(dir.as_deref()),
        Some(Command::Sign { args }) => cli::sign(&args),
        Some(Command::Verify { args }) => cli::verify(&args),
        Some(Command::Other(words)) => cli::unknown(words.first().map_or("", String::as_str)),
    }
}
