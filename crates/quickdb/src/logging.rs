//! Logging setup
//!
//! The library only emits `tracing` events. Applications that have no
//! subscriber of their own can call [`init_logging`].

use std::sync::atomic::{AtomicBool, Ordering};

static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Install a formatted subscriber filtered at `level`
///
/// `RUST_LOG` takes precedence over `level`. Calling this again, or after
/// another subscriber was installed, is a no-op.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .is_ok(); // Err if a global subscriber already exists

    if installed {
        LOGGING_INITIALIZED.store(true, Ordering::SeqCst);
    }
}

/// Whether [`init_logging`] installed the global subscriber
pub fn is_logging_initialized() -> bool {
    LOGGING_INITIALIZED.load(Ordering::SeqCst)
}
