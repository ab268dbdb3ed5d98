use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::buffer::Buffer;
use crate::settings::Settings;
use crate::sink::Sink;
use crate::source::Source;
use crate::utils::Shutdown;
use crate::worker::{ControlFlow, Worker};
use crate::Error;

/* ---------- */

/// Coordinates a full pipeline run.
///
/// A pipeline owns the startup/shutdown sequence: it creates the [`Source`]
/// and the [`Buffer`], spawns the consumer and the producers, waits for every
/// producer to terminate, nudges the consumer once so it re-evaluates its
/// exit condition, then waits for the consumer and hands the [`Sink`] back.
///
/// All parameters are fixed once [`run`] is called; a pipeline isn't
/// reconfigurable mid-flight.
///
/// [`run`]: Pipeline::run
///
/// # Examples
///
/// ```
/// # use conveyor::{LogSink, Pipeline};
/// let sink = Pipeline::new(30, 12, 3)
///     .run(LogSink::new())
///     .expect("failed to run the pipeline");
///
/// assert_eq!(sink.items(), 30);
/// ```
#[derive(Debug)]
pub struct Pipeline {
    source_size: u32,
    capacity: usize,
    producers: usize,
    producer_pace: Option<Duration>,
    consumer_pace: Option<Duration>,
    graceful_shutdown: bool,
}

impl Pipeline {
    /// Returns a pipeline moving `source_size` items through a buffer of
    /// `capacity` slots, drained by `producers` concurrent producers.
    #[inline]
    pub fn new(source_size: u32, capacity: usize, producers: usize) -> Self {
        Self {
            source_size,
            capacity,
            producers,
            producer_pace: None,
            consumer_pace: None,
            graceful_shutdown: false,
        }
    }

    /// Makes every producer sleep for `pace` between two items.
    ///
    /// Purely simulation pacing, the protocol doesn't rely on it.
    #[inline]
    pub fn producer_pace(mut self, pace: Duration) -> Self {
        self.producer_pace = Some(pace);
        self
    }

    /// Makes the consumer sleep for `pace` between two drain passes.
    ///
    /// Purely simulation pacing, the protocol doesn't rely on it.
    #[inline]
    pub fn consumer_pace(mut self, pace: Duration) -> Self {
        self.consumer_pace = Some(pace);
        self
    }

    /// Enables this pipeline to be gracefully shutdown with a `Ctrl+C` signal.
    ///
    /// If the gracefull shutdown doesn't have any effects, users can still
    /// send a second `Ctrl+C` signal to forcefully kill the pipeline.
    #[inline]
    pub fn enable_graceful_shutdown(mut self) -> Self {
        self.graceful_shutdown = true;
        self
    }

    /// Runs the pipeline to completion and returns the sink.
    ///
    /// Blocks until every producer and the consumer have terminated. On
    /// success, every item of the source has been delivered to `sink`.
    ///
    /// # Errors
    ///
    /// Fails without spawning anything when the layout is invalid: a zero
    /// buffer capacity, or a non-empty source with no producer to drain it
    /// (the consumer would wait forever). Also fails when a worker thread
    /// can't be spawned or panics mid-run.
    pub fn run<S: Sink>(self, sink: S) -> Result<S, Error> {
        if self.capacity == 0 {
            return Err(Error::config("the buffer needs at least one slot"));
        }

        if self.producers == 0 && self.source_size > 0 {
            return Err(Error::config(
                "a non-empty source needs at least one producer",
            ));
        }

        let shutdown = Shutdown::new();
        if self.graceful_shutdown {
            crate::utils::enable_graceful_shutdown(&shutdown);
        }

        let source = Source::new(self.source_size);
        let buffer = Buffer::new(self.capacity);

        info!(
            source = self.source_size,
            capacity = self.capacity,
            producers = self.producers,
            "starting the pipeline"
        );

        // Counts the producer threads still alive, so the consumer knows
        // when no further insert can possibly arrive.
        let producers_alive = Arc::new(AtomicUsize::new(self.producers));

        std::thread::scope(|scope| {
            let consumer_thread = {
                let mut consumer = Consumer::new(&source, &buffer, sink)
                    .watch_producers(producers_alive.clone());
                if let Some(pace) = self.consumer_pace {
                    consumer = consumer.with_pace(pace);
                }

                let consumer_shutdown = shutdown.clone();
                Settings::new()
                    .name("consumer")
                    .spawn_scoped(scope, move || {
                        consumer.run(consumer_shutdown);
                        consumer.into_sink()
                    })?
            };

            let mut producer_threads = Vec::with_capacity(self.producers);
            let mut spawn_error = None;

            for nth in 1..=self.producers {
                let mut producer = Producer::new(nth, &source, &buffer);
                if let Some(pace) = self.producer_pace {
                    producer = producer.with_pace(pace);
                }

                let producer_shutdown = shutdown.clone();
                let alive = AliveGuard(producers_alive.clone());
                let spawned = Settings::new()
                    .name(format!("producer-{nth}"))
                    .spawn_scoped(scope, move || {
                        let _alive = alive;
                        producer.run(producer_shutdown)
                    });

                match spawned {
                    Ok(thread) => producer_threads.push(thread),
                    Err(err) => {
                        spawn_error = Some(Error::ThreadSpawn(err));
                        break;
                    }
                }
            }

            if spawn_error.is_some() {
                // Abort: the consumer's wind-down keeps draining whatever
                // the already-spawned producers insert, so they all exit.
                shutdown.stop();
            }

            let mut producer_panicked = false;
            for thread in producer_threads {
                producer_panicked |= thread.join().is_err();
            }

            if producer_panicked {
                // A panicked producer leaves its item permanently in flight;
                // the alive counter, not the in-flight count, is what lets
                // the consumer stop in that case.
                shutdown.stop();
            }

            // The consumer may be suspended at the exact moment the last
            // producer exits without ever having filled the buffer.
            buffer.nudge();

            let consumer_result = consumer_thread.join();

            if let Some(err) = spawn_error {
                return Err(err);
            }

            if producer_panicked {
                return Err(Error::WorkerPanicked("producer"));
            }

            let sink = consumer_result.map_err(|_| Error::WorkerPanicked("consumer"))?;

            info!("pipeline complete");
            Ok(sink)
        })
    }
}

/* ---------- */

/// Decrements the alive counter when its thread exits, panicking included.
struct AliveGuard(Arc<AtomicUsize>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/* ---------- */

/// A worker that moves items from the [`Source`] into the [`Buffer`], one at
/// a time, until the source is depleted.
#[derive(Debug)]
pub struct Producer<'a> {
    id: usize,
    source: &'a Source,
    buffer: &'a Buffer,
    pace: Option<Duration>,
}

impl<'a> Producer<'a> {
    /// Returns a producer draining `source` into `buffer`.
    ///
    /// The `id` only shows up in the event log.
    #[inline]
    pub fn new(id: usize, source: &'a Source, buffer: &'a Buffer) -> Self {
        Self {
            id,
            source,
            buffer,
            pace: None,
        }
    }

    /// Makes this producer sleep for `pace` between two items.
    #[inline]
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }
}

impl Worker for Producer<'_> {
    fn on_update(&mut self) -> ControlFlow {
        let Some(item) = self.source.take() else {
            debug!(producer = self.id, "source depleted, stopping");
            return ControlFlow::Break;
        };

        debug!(producer = self.id, item = %item, "picked an item");

        // May block while the buffer is full; the consumer's drain wakes us.
        self.buffer.insert(item);
        self.source.settle();

        debug!(producer = self.id, item = %item, "placed the item");

        if let Some(pace) = self.pace {
            std::thread::sleep(pace);
        }

        ControlFlow::Continue
    }
}

/* ---------- */

/// The single worker that periodically empties the [`Buffer`] and delivers
/// the batches to its [`Sink`].
///
/// The consumer terminates once no more items can arrive *and* the buffer
/// was empty after its final drain, so a last partial batch is never
/// stranded. "No more items" normally means the source is drained; on a
/// stopped pipeline it means every item already taken has landed, so a
/// shutdown mid-run still delivers what the producers had in hand.
#[derive(Debug)]
pub struct Consumer<'a, S> {
    source: &'a Source,
    buffer: &'a Buffer,
    sink: S,
    pace: Option<Duration>,
    producers_alive: Option<Arc<AtomicUsize>>,
}

impl<'a, S: Sink> Consumer<'a, S> {
    /// Returns a consumer draining `buffer` into `sink`.
    #[inline]
    pub fn new(source: &'a Source, buffer: &'a Buffer, sink: S) -> Self {
        Self {
            source,
            buffer,
            sink,
            pace: None,
            producers_alive: None,
        }
    }

    /// Lets the consumer observe how many producer threads are still alive.
    ///
    /// Once the counter hits zero no insert can ever arrive again, even if a
    /// producer panicked with an item in flight.
    #[inline]
    pub(crate) fn watch_producers(mut self, alive: Arc<AtomicUsize>) -> Self {
        self.producers_alive = Some(alive);
        self
    }

    /// Makes this consumer sleep for `pace` between two drain passes.
    #[inline]
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }

    /// Consumes `self`, handing the sink back.
    #[inline]
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Returns whether no further insert can reach the buffer.
    fn no_more_items(&self, shutdown: &Shutdown) -> bool {
        if self.source.is_drained() {
            return true;
        }

        // Every producer thread exited: nothing can take or insert anymore.
        if self
            .producers_alive
            .as_ref()
            .is_some_and(|alive| alive.load(Ordering::SeqCst) == 0)
        {
            return true;
        }

        // Stopped pipeline: producers take nothing new, so once the items
        // already in their hands have landed, the buffer is final.
        !shutdown.is_running() && self.source.in_flight() == 0
    }

    fn step(&mut self, shutdown: &Shutdown) -> ControlFlow {
        self.buffer.wait_until_full_or(|| self.no_more_items(shutdown));

        // Drain whether we woke up full or out of items: a final partial
        // batch still has to be delivered.
        let batch = self.buffer.drain_all();
        if !batch.is_empty() {
            debug!(size = batch.len(), "drained the buffer");
            self.sink.deliver(&batch);
        }

        // Checked after the drain: the source running out isn't enough, the
        // buffer itself must have been left empty.
        if self.no_more_items(shutdown) && self.buffer.is_empty() {
            debug!("no more items and buffer empty, stopping");
            return ControlFlow::Break;
        }

        if shutdown.is_running() {
            if let Some(pace) = self.pace {
                std::thread::sleep(pace);
            }
        }

        ControlFlow::Continue
    }
}

impl<S: Sink> Worker for Consumer<'_, S> {
    // `run` is overridden so the blocking wait observes the shutdown flag,
    // and so a stop doesn't end the loop by itself: items the producers
    // already took still have to land and be delivered before exiting.
    fn run(&mut self, shutdown: Shutdown) {
        loop {
            if let ControlFlow::Break = self.step(&shutdown) {
                break;
            }
        }
    }
}

/* ---------- */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Item;

    fn collect(pipeline: Pipeline) -> Result<Vec<Vec<Item>>, Error> {
        let mut batches = Vec::new();

        pipeline.run(|batch: &[Item]| batches.push(batch.to_vec()))?;
        Ok(batches)
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let result = collect(Pipeline::new(5, 0, 1));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn zero_producers_with_items_is_rejected() {
        let result = collect(Pipeline::new(5, 3, 0));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn zero_producers_with_an_empty_source_is_fine() {
        let batches = collect(Pipeline::new(0, 3, 0)).expect("the pipeline should run");
        assert!(batches.is_empty());
    }

    #[test]
    fn stopped_consumer_delivers_in_flight_items() {
        let source = Source::new(2);
        let buffer = Buffer::new(8);
        let shutdown = Shutdown::default();

        // Mid-run snapshot: one item already placed, one still in a
        // producer's hands.
        let placed = source.take().expect("the source shouldn't be empty");
        buffer.insert(placed);
        source.settle();
        let in_flight = source.take().expect("the source shouldn't be empty");

        shutdown.stop();

        let mut delivered = Vec::new();
        std::thread::scope(|scope| {
            let (source, buffer) = (&source, &buffer);
            let consumer_shutdown = shutdown.clone();
            let sink = |batch: &[Item]| delivered.extend_from_slice(batch);

            let thread = scope.spawn(move || {
                Consumer::new(source, buffer, sink).run(consumer_shutdown);
            });

            // The stopped consumer must keep going until the in-flight item
            // lands, not exit on the flag alone.
            buffer.insert(in_flight);
            source.settle();
            buffer.nudge();

            thread.join().expect("the consumer shouldn't panic");
        });

        let mut ids = delivered.iter().map(|item| item.id()).collect::<Vec<_>>();
        ids.sort_unstable();
        assert_eq!(ids, [1, 2]);
    }

    #[test]
    fn single_producer_single_batch() {
        let batches = collect(Pipeline::new(3, 3, 1)).expect("the pipeline should run");

        let delivered = batches.into_iter().flatten().collect::<Vec<_>>();
        let mut ids = delivered.iter().map(|item| item.id()).collect::<Vec<_>>();
        ids.sort_unstable();

        assert_eq!(ids, [1, 2, 3]);
    }
}
