//! Fatal error reporting for the binary

use tracing::error;

use crate::activity::ActivityError;

/// Exit code for configuration problems
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for everything else
pub const EXIT_FAILURE: i32 = 1;

/// Pick the process exit code for `error`
pub fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<ActivityError>() {
        Some(ActivityError::InvalidWindow { .. }) => EXIT_CONFIG,
        _ if error.chain().any(|cause| cause.is::<toml::de::Error>()) => EXIT_CONFIG,
        _ => EXIT_FAILURE,
    }
}

/// Report a fatal error and exit
///
/// With `verbose >= 1` the full cause chain is printed.
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {}", error);
    eprintln!("Error: {error}");

    if verbose >= 1 {
        eprintln!("\nError chain:");
        for (i, cause) in error.chain().enumerate() {
            eprintln!("  {}: {}", i, cause);
        }
    }

    std::process::exit(exit_code(&error))
}
