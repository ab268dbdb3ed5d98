use tracing::info;

use crate::source::Item;

/* ---------- */

/// The destination receiving the batches drained from the buffer.
///
/// The consumer owns its sink for the whole run and the [`Pipeline`] hands it
/// back once the run completes, so a sink can accumulate state without any
/// locking of its own.
///
/// The trait is also implemented for closures, which is often all a test or a
/// small program needs:
///
/// ```
/// # use conveyor::{Pipeline, Item};
/// let mut total = 0;
/// Pipeline::new(5, 3, 1)
///     .run(|batch: &[Item]| total += batch.len())
///     .expect("failed to run the pipeline");
/// ```
///
/// [`Pipeline`]: crate::Pipeline
pub trait Sink: Send {
    /// Receives one non-empty drained batch.
    fn deliver(&mut self, batch: &[Item]);
}

impl<F: FnMut(&[Item]) + Send> Sink for F {
    #[inline]
    fn deliver(&mut self, batch: &[Item]) {
        self(batch)
    }
}

/* ---------- */

/// A [`Sink`] that logs every delivered batch and keeps running totals.
#[derive(Debug, Default)]
pub struct LogSink {
    batches: usize,
    items: usize,
}

impl LogSink {
    /// Returns a sink that hasn't received anything yet.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of batches delivered so far.
    #[inline]
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Returns the total number of items delivered so far.
    #[inline]
    pub fn items(&self) -> usize {
        self.items
    }
}

impl Sink for LogSink {
    fn deliver(&mut self, batch: &[Item]) {
        let ids = batch.iter().map(|item| item.id()).collect::<Vec<_>>();

        self.batches += 1;
        self.items += batch.len();
        info!(?ids, size = ids.len(), "delivered a batch");
    }
}

/* ---------- */
