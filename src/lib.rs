//! A small and lightweight crate to hide most of the burden of setting up a
//! bounded-buffer producer/consumer pipeline.
//!
//! # Philosophy
//!
//! This crate models one specific, well-worn concurrency shape: a finite
//! [`Source`] of work items drained by several producer threads into a
//! fixed-capacity [`Buffer`], which a single consumer thread periodically
//! empties into a [`Sink`]. Everything of interest is the synchronization
//! protocol itself:
//!
//! - two independent locks, one per shared resource, never held across a wait.
//! - condition-based blocking with a re-check after every wake-up, so
//!   spurious or stale notifications are harmless.
//! - a termination handshake that delivers the last partial batch instead of
//!   stranding it: the consumer only stops once the source is drained *and*
//!   the buffer was empty after its final drain.
//!
//! It is not a general-purpose thread pool or queue library. The source size,
//! the buffer capacity and the producer count are fixed when the pipeline is
//! built.
//!
//! # Usage
//!
//! Move 30 items through a 12-slot buffer with 3 producers:
//!
//! ```
//! # use conveyor::{LogSink, Pipeline};
//! let sink = Pipeline::new(30, 12, 3)
//!     .run(LogSink::new())
//!     .expect("failed to run the pipeline");
//!
//! assert_eq!(sink.items(), 30);
//! ```
//!
//! Anything implementing [`Sink`] can receive the batches, closures included.
//! The pipeline hands the sink back when the run completes:
//!
//! ```
//! # use conveyor::{Item, Pipeline};
//! let mut delivered = Vec::new();
//!
//! Pipeline::new(5, 3, 1)
//!     .run(|batch: &[Item]| delivered.extend_from_slice(batch))
//!     .expect("failed to run the pipeline");
//!
//! assert_eq!(delivered.len(), 5);
//! ```
//!
//! # Pacing
//!
//! Real workloads take time; simulations fake it. [`Pipeline::producer_pace`]
//! and [`Pipeline::consumer_pace`] insert sleeps between iterations. They're
//! observability aids, the protocol is correct with or without them.
//!
//! # Observability
//!
//! Every pick, placement, full-buffer notification and delivered batch emits
//! a [`tracing`] event. Install a subscriber to watch a run interleave:
//!
//! ```text
//! DEBUG producer-2: conveyor::pipeline: picked an item producer=2 item=#27
//! DEBUG producer-2: conveyor::pipeline: placed the item producer=2 item=#27
//! DEBUG producer-1: conveyor::buffer: buffer full, notifying the consumer item=#24
//! INFO  consumer: conveyor::sink: delivered a batch ids=[30, 29, 28, 26, 25, 27, 24] size=7
//! ```
//!
//! The log order reflects actual execution interleaving; it is a debugging
//! aid, not a correctness contract.
//!
//! # Graceful shutdown
//!
//! [`Pipeline::enable_graceful_shutdown`] wires `Ctrl+C` to the pipeline's
//! [`Shutdown`] flag: producers stop taking new items, the consumer keeps
//! draining until every item already taken has landed and been delivered,
//! and the run joins cleanly. A second `Ctrl+C` kills the process outright.

#![warn(missing_docs)]

mod buffer;
mod error;
mod pipeline;
mod settings;
mod sink;
mod source;
mod utils;
mod worker;

pub use buffer::*;
pub use error::*;
pub use pipeline::*;
pub use settings::*;
pub use sink::*;
pub use source::*;
pub use utils::*;
pub use worker::*;
