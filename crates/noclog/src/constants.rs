// Copyright 2025-Present the noclog authors
// SPDX-License-Identifier: Apache-2.0

//! Default limits for the collection pipeline.
//!
//! All of these are defaults only; the live values come from
//! [`crate::config::CollectorConfig`] so they can be overridden per
//! deployment (and shrunk in tests).

use std::time::Duration;

/// Records buffered before a size-triggered flush.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Maximum record age before a time-triggered flush.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(2);

/// Bounded queue capacity between the listener and the batcher. When the
/// queue is full the listener blocks, which throttles datagram reads; this
/// is the burst-protection boundary.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Upper bound on a single flush attempt, independent of the flush interval.
/// A stalled ClickHouse endpoint can delay the loop for at most this long.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Receive buffer for a single datagram. Syslog messages are far smaller,
/// but routers can emit multi-kilobyte firewall log lines.
pub const DATAGRAM_BUFFER_SIZE: usize = 40_960;
