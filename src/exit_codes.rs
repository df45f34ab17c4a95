//! Process exit codes for the artifact-signer binary
//!
//! Hard errors share one code. An unverified signature gets its own code
//! so it can be told apart from a broken invocation.

/// Successful execution (also used when usage text is shown on request)
pub const EXIT_SUCCESS: i32 = 0;

/// Any hard error: bad arguments, missing files, existing outputs,
/// unparsable keys or signatures, I/O failures
pub const EXIT_FAILURE: i32 = -1;

/// Inputs were valid but the signature does not match the artifact
pub const EXIT_UNVERIFIED: i32 = 1;

/// Panic or unrecoverable error
pub const EXIT_PANIC: i32 = 101;
