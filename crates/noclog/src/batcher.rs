// Copyright 2025-Present the noclog authors
// SPDX-License-Identifier: Apache-2.0

//! Batching engine: accumulates records and flushes them to the sink.
//!
//! A single consumer loop owns the accumulation buffer, so no locking is
//! needed anywhere in the pipeline. Two triggers cause a flush, whichever
//! fires first:
//!
//! - **size**: the buffer reaches the configured entry count (the record
//!   that crosses the threshold is included in the flushed batch), or
//! - **time**: the flush interval elapses with a non-empty buffer.
//!
//! A flush snapshots the buffer, hands it to the sink as one batch, and
//! clears the buffer whether or not the sink succeeds. Sink failures are
//! logged and swallowed; the engine keeps ingesting. The design trades
//! durability for availability: there is no retry and no requeue.

use std::mem;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, timeout};
use tracing::{debug, error};

use crate::constants;
use crate::record::LogRecord;
use crate::sink::{LogSink, SinkBatch};

/// Creates the bounded queue between the listener and the batcher.
///
/// When the queue is full the producer's `send` blocks, which throttles
/// datagram reads; this is the pipeline's only backpressure mechanism.
/// An unbounded queue would hide a slow sink behind unbounded memory growth.
#[must_use]
pub fn channel(capacity: usize) -> (BatcherHandle, mpsc::Receiver<LogRecord>) {
    let (tx, rx) = mpsc::channel(capacity);
    (BatcherHandle { tx }, rx)
}

/// Producer-side handle for the batcher's input queue.
#[derive(Clone, Debug)]
pub struct BatcherHandle {
    tx: mpsc::Sender<LogRecord>,
}

impl BatcherHandle {
    /// Enqueues one record, waiting while the queue is at capacity.
    ///
    /// Fails only when the batcher has stopped.
    pub async fn send(
        &self,
        record: LogRecord,
    ) -> Result<(), mpsc::error::SendError<LogRecord>> {
        self.tx.send(record).await
    }
}

/// Flush tuning for the batcher. Thresholds are explicit configuration so
/// tests can shrink them; defaults live in [`crate::constants`].
#[derive(Debug, Clone, Copy)]
pub struct BatcherConfig {
    /// Time trigger: maximum age of a buffered record.
    pub flush_interval: Duration,
    /// Size trigger: flush as soon as the buffer holds this many records.
    pub max_batch_entries: usize,
    /// Upper bound on one flush attempt against the sink.
    pub flush_timeout: Duration,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        BatcherConfig {
            flush_interval: constants::DEFAULT_FLUSH_INTERVAL,
            max_batch_entries: constants::DEFAULT_BATCH_SIZE,
            flush_timeout: constants::FLUSH_TIMEOUT,
        }
    }
}

/// The single consumer of the input queue. Owns the buffer and the sink.
pub struct Batcher<S: LogSink> {
    sink: S,
    rx: mpsc::Receiver<LogRecord>,
    buffer: Vec<LogRecord>,
    config: BatcherConfig,
}

impl<S: LogSink + Send> Batcher<S> {
    #[must_use]
    pub fn new(sink: S, rx: mpsc::Receiver<LogRecord>, config: BatcherConfig) -> Batcher<S> {
        Batcher {
            sink,
            rx,
            buffer: Vec::with_capacity(config.max_batch_entries),
            config,
        }
    }

    /// Runs the consumer loop until the input channel closes, then drains
    /// whatever is still buffered and returns.
    ///
    /// One event is handled per iteration, so a size-triggered flush can
    /// never race a time-triggered one.
    pub async fn run(mut self) {
        debug!("batcher started");

        let mut ticker = interval(self.config.flush_interval);
        ticker.tick().await; // first tick is immediate, discard it

        loop {
            tokio::select! {
                maybe_record = self.rx.recv() => match maybe_record {
                    Some(record) => {
                        self.buffer.push(record);
                        if self.buffer.len() >= self.config.max_batch_entries {
                            self.flush().await;
                        }
                    }
                    None => {
                        // All producers are gone: drain and stop.
                        if !self.buffer.is_empty() {
                            self.flush().await;
                        }
                        break;
                    }
                },
                _ = ticker.tick() => {
                    if !self.buffer.is_empty() {
                        self.flush().await;
                    }
                }
            }
        }

        debug!("batcher stopped");
    }

    /// Snapshots and clears the buffer, then hands the snapshot to the sink.
    /// The buffer is empty after this returns, whatever the sink did.
    async fn flush(&mut self) {
        let records = mem::take(&mut self.buffer);
        let count = records.len();

        match timeout(self.config.flush_timeout, self.write_batch(&records)).await {
            Ok(()) => {}
            Err(_) => error!(
                "flush timed out after {:?}, dropping {} records",
                self.config.flush_timeout, count
            ),
        }
    }

    async fn write_batch(&self, records: &[LogRecord]) {
        let mut batch = match self.sink.begin_batch() {
            Ok(batch) => batch,
            Err(e) => {
                error!("failed to open sink batch, dropping {} records: {}", records.len(), e);
                return;
            }
        };

        for record in records {
            if let Err(e) = batch.append(record) {
                // One bad record does not abort the batch.
                error!("failed to append record to batch: {}", e);
            }
        }

        match batch.commit().await {
            Ok(()) => debug!("flushed batch of {} records", records.len()),
            Err(e) => error!("failed to commit batch of {} records: {}", records.len(), e),
        }
    }
}
