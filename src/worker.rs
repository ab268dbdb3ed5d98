use crate::utils::Shutdown;

/* ---------- */

/// One thread of the pipeline.
///
/// Workers are defined by one main method, [`Worker::run`], which runs the
/// actual loop. The default implementation first calls [`Worker::on_start`]
/// once, then calls [`Worker::on_update`] until it returns
/// [`ControlFlow::Break`] or the pipeline is stopped.
///
/// The pipeline's own workers, [`Producer`] and [`Consumer`], implement this
/// trait, and so can anything else that needs to run alongside them.
///
/// [`Producer`]: crate::Producer
/// [`Consumer`]: crate::Consumer
///
/// # Examples
///
/// A worker that counts to 10 and stops:
///
/// ```
/// # use conveyor::{ControlFlow, Shutdown, Worker};
/// #[derive(Default)]
/// struct Counter {
///     count: usize,
/// }
///
/// impl Worker for Counter {
///     fn on_update(&mut self) -> ControlFlow {
///         self.count += 1;
///
///         if self.count == 10 {
///             return ControlFlow::Break;
///         }
///
///         ControlFlow::Continue
///     }
/// }
///
/// let mut counter = Counter::default();
/// counter.run(Shutdown::default());
///
/// assert_eq!(counter.count, 10);
/// ```
pub trait Worker: Send {
    /// Convenient method to print or set stuff up before entering the worker loop.
    ///
    /// The first method to be called by the [`Worker::run`] default implementation.
    /// By default, this does nothing.
    #[inline]
    fn on_start(&mut self) {}

    /// Called on each iteration of the worker loop.
    ///
    /// Called in a loop by the [`Worker::run`] default implementation, until
    /// either [`ControlFlow::Break`] is returned or the pipeline is stopped.
    /// By default, this method just returns [`ControlFlow::Break`].
    #[inline]
    fn on_update(&mut self) -> ControlFlow {
        ControlFlow::Break
    }

    /// Main worker loop, spawned in a new thread by the [`Pipeline`].
    ///
    /// By default, this first calls [`Worker::on_start`] then [`Worker::on_update`]
    /// in a loop that spins until [`shutdown.is_running()`] returns `false`.
    ///
    /// [`Pipeline`]: crate::Pipeline
    /// [`shutdown.is_running()`]: crate::Shutdown::is_running
    #[inline]
    fn run(&mut self, shutdown: Shutdown) {
        self.on_start();

        while shutdown.is_running() {
            if let ControlFlow::Break = self.on_update() {
                break;
            }
        }
    }
}

/* ---------- */

/// Defines the control flow of [`Workers`].
///
/// [`Workers`]: crate::Worker
#[derive(Debug, PartialEq)]
pub enum ControlFlow {
    /// Tells the pipeline to continue the main worker loop.
    Continue,
    /// Tells the pipeline to break the main worker loop.
    Break,
}

/* ---------- */

#[cfg(test)]
mod tests {
    use super::*;

    struct Once(bool);

    impl Worker for Once {
        fn on_update(&mut self) -> ControlFlow {
            self.0 = true;
            ControlFlow::Break
        }
    }

    #[test]
    fn run_stops_on_break() {
        let mut worker = Once(false);

        worker.run(Shutdown::default());
        assert!(worker.0);
    }

    #[test]
    fn run_respects_shutdown() {
        struct Spinner(usize);

        impl Worker for Spinner {
            fn on_update(&mut self) -> ControlFlow {
                self.0 += 1;
                ControlFlow::Continue
            }
        }

        let shutdown = Shutdown::default();
        let mut worker = Spinner(0);

        shutdown.stop();
        worker.run(shutdown);
        assert_eq!(worker.0, 0, "a stopped pipeline shouldn't run updates");
    }
}
