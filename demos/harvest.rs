//! The harvest simulation: 30 items on the tree, a 12-slot crate, 3 pickers
//! and one loader, paced so the interleaving is visible in the log.
//!
//! Run it with `cargo run --example harvest`.

use std::time::Duration;

use conveyor::{LogSink, Pipeline};

/* ---------- */

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let sink = Pipeline::new(30, 12, 3)
        .producer_pace(Duration::from_millis(100))
        .consumer_pace(Duration::from_millis(150))
        .enable_graceful_shutdown()
        .run(LogSink::new())
        .expect("failed to run the pipeline");

    println!(
        "delivered {} items in {} batches",
        sink.items(),
        sink.batches()
    );
}
