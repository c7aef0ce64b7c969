//! Signal handling using signal-hook.
//!
//! The first SIGINT, SIGTERM or SIGHUP sets the quit flag. The headless
//! surface reports it through `should_quit`, so the main loop finishes the
//! active scene through its normal quit path and the partial score is still
//! printed. A second signal exits immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;

#[cfg(unix)]
use signal_hook::consts::signal::SIGHUP;

/// Tracks if handler has been installed
static INSTALLED: AtomicBool = AtomicBool::new(false);

static QUIT_FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

/// Flag set by the signal handler.
///
/// Hand a clone to the surface so it can report quit requests.
pub fn quit_flag() -> Arc<AtomicBool> {
    Arc::clone(QUIT_FLAG.get_or_init(|| Arc::new(AtomicBool::new(false))))
}

/// Install signal handlers for graceful shutdown.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn install_signal_handler() -> Result<(), std::io::Error> {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let quit = quit_flag();
    for &sig in TERM_SIGNALS {
        // Registered first so it sees the flag before this signal sets it
        flag::register_conditional_shutdown(sig, 1, Arc::clone(&quit))?;
        flag::register(sig, Arc::clone(&quit))?;
    }

    #[cfg(unix)]
    {
        flag::register_conditional_shutdown(SIGHUP, 1, Arc::clone(&quit))?;
        flag::register(SIGHUP, Arc::clone(&quit))?;
    }

    Ok(())
}

/// Check if shutdown was requested.
pub fn shutdown_requested() -> bool {
    quit_flag().load(Ordering::SeqCst)
}

/// Clear shutdown state.
pub fn clear_shutdown() {
    quit_flag().store(false, Ordering::SeqCst);
}
