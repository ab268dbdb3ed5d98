use std::sync::{Condvar, Mutex, MutexGuard};

use tracing::debug;

use crate::source::Item;

/* ---------- */

/// The fixed-capacity holding area between the producers and the consumer.
///
/// A buffer cycles between empty and full for the whole run: producers
/// [`insert`] items one by one, blocking while it's full, and the consumer
/// atomically [`drains`] the whole content in one batch.
///
/// All waits are predicate loops around a [`Condvar`]: a woken thread always
/// re-checks the condition before proceeding, so spurious or stale wake-ups
/// are harmless.
///
/// [`insert`]: Buffer::insert
/// [`drains`]: Buffer::drain_all
#[derive(Debug)]
pub struct Buffer {
    slots: Mutex<Vec<Item>>,
    /// Signaled when an insert fills the last slot, and once by the
    /// pipeline's final nudge.
    full: Condvar,
    /// Broadcast after every drain. Broadcast, not single-notify: any number
    /// of producers may be blocked on a full buffer.
    emptied: Condvar,
    capacity: usize,
}

impl Buffer {
    /// Returns an empty buffer with room for `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "a buffer needs at least one slot");

        Self {
            slots: Mutex::new(Vec::with_capacity(capacity)),
            full: Condvar::new(),
            emptied: Condvar::new(),
            capacity,
        }
    }

    /// Appends `item`, blocking while the buffer is full.
    ///
    /// If this insert fills the last slot, one waiter on the "full" condition
    /// is notified. The wait has no timeout: a producer stuck here relies on
    /// the consumer draining eventually.
    pub fn insert(&self, item: Item) {
        let mut slots = self.lock();

        while slots.len() == self.capacity {
            slots = self.wait(&self.emptied, slots);
        }

        assert!(slots.len() < self.capacity);
        slots.push(item);

        if slots.len() == self.capacity {
            debug!(item = %item, "buffer full, notifying the consumer");
            self.full.notify_one();
        }
    }

    /// Atomically empties the buffer and returns its prior content.
    ///
    /// The returned batch may be empty. Every producer blocked on a full
    /// buffer is woken up.
    pub fn drain_all(&self) -> Vec<Item> {
        let mut slots = self.lock();
        let batch = std::mem::take(&mut *slots);

        self.emptied.notify_all();
        batch
    }

    /// Blocks until the buffer is full or `no_more_items` returns true.
    ///
    /// The query runs on every pass of the wait loop, under the buffer lock
    /// but never while waiting: the condvar releases the buffer lock for the
    /// whole suspension, and the query must release whatever lock it takes
    /// before returning.
    pub fn wait_until_full_or<F: FnMut() -> bool>(&self, mut no_more_items: F) {
        let mut slots = self.lock();

        while slots.len() < self.capacity {
            if no_more_items() {
                break;
            }

            slots = self.wait(&self.full, slots);
        }
    }

    /// Wakes up a consumer suspended in [`wait_until_full_or`] so it
    /// re-evaluates its exit condition.
    ///
    /// Takes the buffer lock first: the wake-up can't slip into the gap
    /// between a waiter's check and its wait.
    ///
    /// [`wait_until_full_or`]: Buffer::wait_until_full_or
    pub fn nudge(&self) {
        let _slots = self.lock();
        self.full.notify_one();
    }

    /// Returns the number of items the buffer can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of items currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether the buffer holds no item.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Item>> {
        self.slots.lock().expect("buffer lock poisoned")
    }

    fn wait<'a>(
        &self,
        condvar: &Condvar,
        guard: MutexGuard<'a, Vec<Item>>,
    ) -> MutexGuard<'a, Vec<Item>> {
        condvar.wait(guard).expect("buffer lock poisoned")
    }
}

/* ---------- */

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::source::Source;

    fn items(source_size: u32) -> Vec<Item> {
        let source = Source::new(source_size);
        std::iter::from_fn(|| source.take()).collect()
    }

    #[test]
    fn fill_and_drain() {
        let buffer = Buffer::new(3);
        let items = items(3);

        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 3);

        for item in &items {
            buffer.insert(*item);
        }
        assert_eq!(buffer.len(), 3);

        let batch = buffer.drain_all();
        assert_eq!(batch, items, "a drain returns the items in insert order");
        assert!(buffer.is_empty());
        assert!(buffer.drain_all().is_empty());
    }

    #[test]
    #[should_panic(expected = "at least one slot")]
    fn zero_capacity_is_a_bug() {
        Buffer::new(0);
    }

    #[test]
    fn insert_blocks_until_drained() {
        let buffer = Buffer::new(1);
        let mut items = items(2).into_iter();
        let (done, is_done) = crossbeam_channel::bounded(1);

        buffer.insert(items.next().unwrap());

        std::thread::scope(|scope| {
            let buffer = &buffer;
            let overflow = items.next().unwrap();

            scope.spawn(move || {
                buffer.insert(overflow);
                done.send(()).unwrap();
            });

            // The second insert can't complete while the buffer is full.
            assert!(is_done.recv_timeout(Duration::from_millis(100)).is_err());

            let batch = buffer.drain_all();
            assert_eq!(batch.len(), 1);

            is_done
                .recv_timeout(Duration::from_secs(5))
                .expect("the blocked insert should complete after the drain");
        });

        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn wait_returns_when_full() {
        let buffer = Buffer::new(1);

        buffer.insert(items(1)[0]);
        buffer.wait_until_full_or(|| unreachable!("a full buffer shouldn't query the source"));
    }

    #[test]
    fn wait_returns_when_no_more_items() {
        let buffer = Buffer::new(4);

        // Empty buffer, nothing coming: the wait must not suspend.
        buffer.wait_until_full_or(|| true);
    }

    #[test]
    fn nudge_wakes_a_suspended_waiter() {
        let buffer = Buffer::new(4);
        let (done, is_done) = crossbeam_channel::bounded(1);

        std::thread::scope(|scope| {
            let buffer = &buffer;
            let mut passes = 0;

            scope.spawn(move || {
                buffer.wait_until_full_or(move || {
                    passes += 1;
                    passes > 1
                });
                done.send(()).unwrap();
            });

            assert!(is_done.recv_timeout(Duration::from_millis(100)).is_err());

            // Re-nudge on a short period in case the waiter wasn't suspended
            // yet when the first nudge fired.
            let deadline = std::time::Instant::now() + Duration::from_secs(5);
            loop {
                buffer.nudge();
                if is_done.recv_timeout(Duration::from_millis(10)).is_ok() {
                    break;
                }
                assert!(
                    std::time::Instant::now() < deadline,
                    "the nudge should wake the waiter"
                );
            }
        });
    }
}
