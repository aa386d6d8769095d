// Copyright 2025-Present the noclog authors
// SPDX-License-Identifier: Apache-2.0

//! Persistence seam for the batching engine.
//!
//! A sink is an opaque transactional target: open a batch against a fixed
//! named table, append records in column order, commit. Each step reports
//! failure independently; the engine logs and drops, it never retries.

use async_trait::async_trait;

use crate::record::LogRecord;

/// Errors surfaced by a sink at any stage of a batch.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("server rejected batch ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// A batch under construction. Appends are cheap and local; `commit`
/// performs the actual write.
#[async_trait]
pub trait SinkBatch {
    /// Appends one record's fields in fixed column order
    /// `(timestamp, origin, severity, categories, message)`.
    ///
    /// A failed append does not poison the batch; earlier appends stay in
    /// place and later ones are still accepted.
    fn append(&mut self, record: &LogRecord) -> Result<(), SinkError>;

    /// Submits the batch as one transactional unit.
    async fn commit(self) -> Result<(), SinkError>;
}

/// A persistence target that hands out batches against a fixed table.
///
/// The handle is reused across flushes and is only ever driven by the single
/// consumer loop, so implementations may assume sequential use.
pub trait LogSink {
    type Batch: SinkBatch + Send;

    /// Opens a new batch. On failure the engine drops the entire pending
    /// flush window.
    fn begin_batch(&self) -> Result<Self::Batch, SinkError>;
}
