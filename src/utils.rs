use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;

/* ---------- */

/// Enables the pipeline to be gracefully shutdown.
///
/// If for some reasons, the pipeline isn't shutdown after the first signal,
/// users can send another signal to kill ungracefully the pipeline.
#[inline]
pub(crate) fn enable_graceful_shutdown(shutdown: &Shutdown) {
    for sig in TERM_SIGNALS {
        let _ = flag::register_conditional_shutdown(*sig, 1, shutdown.as_ref().clone());
        let _ = flag::register(*sig, shutdown.as_ref().clone());
    }
}

/* ---------- */

/// Describes the running status of a [`Pipeline`].
///
/// Every worker loop checks it between iterations and the consumer folds it
/// into its wait condition, so a stopped pipeline winds down instead of
/// waiting for work that never comes.
///
/// [`Pipeline`]: crate::Pipeline
#[derive(Debug, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    #[inline]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn stop(&self) {
        self.0.store(true, Ordering::SeqCst)
    }

    /// Returns whether or not the [`Pipeline`] is running.
    ///
    /// [`Pipeline`]: crate::Pipeline
    #[inline]
    pub fn is_running(&self) -> bool {
        !self.0.load(Ordering::SeqCst)
    }
}

impl AsRef<Arc<AtomicBool>> for Shutdown {
    #[inline]
    fn as_ref(&self) -> &Arc<AtomicBool> {
        &self.0
    }
}

impl Clone for Shutdown {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/* ---------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_is_shared() {
        let shutdown = Shutdown::new();
        let clone = shutdown.clone();

        assert!(shutdown.is_running());
        assert!(clone.is_running());

        clone.stop();
        assert!(!shutdown.is_running());
    }
}
