//! Ctrl+C handling for graceful shutdown.
//!
//! A single [`ShutdownHandler`] owns the `Arc<AtomicBool>` that walkers poll.
//! Pressing Ctrl+C sets it; walker threads stop taking new requests, hashing
//! tasks that have not started return immediately, and the walk ends with
//! `WalkError::Interrupted`.
//!
//! ```rust,no_run
//! use dupcrawl::duplicates::Crawler;
//! use dupcrawl::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let crawler = Crawler::with_defaults().with_shutdown_flag(handler.flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested and no signal hook.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether Ctrl+C was pressed or [`request_shutdown`](Self::request_shutdown) called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Set the flag by hand.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// The flag to hand to a [`Crawler`](crate::duplicates::Crawler) or walker.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

/// Handler whose flag the registered Ctrl+C hook sets. Installation runs
/// under this lock so concurrent callers all receive that same handler.
static GLOBAL_HANDLER: Mutex<Option<ShutdownHandler>> = Mutex::new(None);

/// Install the process-wide Ctrl+C hook, or return the one already installed.
///
/// Repeated calls (for instance from tests driving [`run_app`](crate::run_app)
/// several times) return the same handler with its flag cleared.
///
/// # Errors
///
/// Returns [`SignalError`] if the hook cannot be registered, including when
/// code outside this module already registered a Ctrl+C hook.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    let mut installed = GLOBAL_HANDLER
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(ref handler) = *installed {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.flag();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Stopping walk...");
        log::info!("Shutdown signal received");
    })
    .map_err(|e| {
        log::warn!("Ctrl+C will not stop the walk: {}", e);
        SignalError::from(e)
    })?;

    *installed = Some(handler.clone());
    Ok(handler)
}
