use std::fmt;
use std::sync::Mutex;

/* ---------- */

/// One unit of work moving from the [`Source`] to a [`Sink`].
///
/// Items are opaque identifiers. The pipeline moves them around but never
/// duplicates, drops or inspects them.
///
/// [`Sink`]: crate::Sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item(u32);

impl Item {
    /// Returns the item's identifier.
    #[inline]
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Item {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/* ---------- */

/// The depletable pool of work items drained by the producers.
///
/// A source is created fully populated with items numbered `1..=size` and
/// only ever shrinks. Producers [`take`] items one at a time until the pool
/// runs out; a taken item stays accounted for as *in flight* until [`settle`]
/// confirms it reached the buffer, so the consumer can't conclude the run is
/// over while an item is still in a producer's hands.
///
/// [`take`]: Source::take
/// [`settle`]: Source::settle
#[derive(Debug)]
pub struct Source {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    remaining: Vec<Item>,
    in_flight: usize,
}

impl Source {
    /// Returns a source populated with `size` items, numbered `1..=size`.
    pub fn new(size: u32) -> Self {
        let remaining = (1..=size).map(Item).collect();

        Self {
            inner: Mutex::new(Inner {
                remaining,
                in_flight: 0,
            }),
        }
    }

    /// Takes the next item out of the pool, or `None` once the pool is depleted.
    ///
    /// Never blocks. `None` is the normal terminal condition for a producer,
    /// not an error. The taken item is counted as in flight until [`settle`]
    /// is called for it.
    ///
    /// [`settle`]: Source::settle
    pub fn take(&self) -> Option<Item> {
        let mut inner = self.lock();
        let item = inner.remaining.pop()?;

        inner.in_flight += 1;
        Some(item)
    }

    /// Confirms that one previously taken item reached the buffer.
    pub fn settle(&self) {
        let mut inner = self.lock();

        assert!(inner.in_flight > 0, "settled an item that was never taken");
        inner.in_flight -= 1;
    }

    /// Returns whether the pool itself is depleted.
    ///
    /// Items already taken but not yet settled don't count as remaining.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lock().remaining.is_empty()
    }

    /// Returns whether the pool is depleted *and* every taken item has settled.
    ///
    /// This is the query the consumer uses to stop waiting for more work:
    /// a merely empty pool isn't enough, an in-flight item may still land in
    /// the buffer afterwards.
    #[inline]
    pub fn is_drained(&self) -> bool {
        let inner = self.lock();
        inner.remaining.is_empty() && inner.in_flight == 0
    }

    /// Returns the number of items still in the pool.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.lock().remaining.len()
    }

    /// Returns the number of items taken but not yet settled.
    ///
    /// While this is non-zero, more inserts can still reach the buffer even
    /// if the pool itself is depleted or the pipeline was stopped.
    #[inline]
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a pipeline worker panicked mid-protocol,
        // which the pipeline reports from its joins.
        self.inner.lock().expect("source lock poisoned")
    }
}

/* ---------- */
