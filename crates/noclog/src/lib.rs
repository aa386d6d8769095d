// Copyright 2025-Present the noclog authors
// SPDX-License-Identifier: Apache-2.0

//! # noclog
//!
//! Core pipeline for a NOC log-collection daemon: ingest line-oriented log
//! datagrams over UDP, parse the `topics,severity` tag convention carried in
//! each message, and bulk-insert the resulting records into ClickHouse.
//!
//! ## Architecture
//!
//! ```text
//!   UDP datagram
//!        │
//!        v
//!  ┌───────────┐     ┌───────────────┐     ┌──────────┐     ┌────────────┐
//!  │ Listener  │ ──> │ Bounded queue │ ──> │ Batcher  │ ──> │ ClickHouse │
//!  │ (+parse)  │     │ (backpressure)│     │ (buffer) │     │   (HTTP)   │
//!  └───────────┘     └───────────────┘     └──────────┘     └────────────┘
//! ```
//!
//! One producer (the listener) and one consumer (the batcher) communicate
//! over a bounded mpsc channel; a full queue blocks the producer, which is
//! the system's only backpressure mechanism. The batcher flushes its buffer
//! whenever it reaches the configured size or the flush interval elapses,
//! whichever comes first.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

/// Batching engine: bounded input queue, dual-trigger flush loop.
pub mod batcher;

/// ClickHouse sink over the HTTP interface (`FORMAT JSONEachRow`).
pub mod clickhouse;

/// Environment-driven configuration.
pub mod config;

/// Default thresholds, intervals, and capacities.
pub mod constants;

/// UDP listener producing parsed records.
pub mod listener;

/// Record data model and the tag-convention parser.
pub mod record;

/// Sink traits and errors.
pub mod sink;

pub use batcher::{channel, Batcher, BatcherConfig, BatcherHandle};
pub use clickhouse::{ClickHouseConfig, ClickHouseSink};
pub use config::{CollectorConfig, ConfigError};
pub use listener::{ListenerConfig, SyslogListener};
pub use record::{parse, LogRecord, Severity};
pub use sink::{LogSink, SinkBatch, SinkError};
