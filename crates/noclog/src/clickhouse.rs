// Copyright 2025-Present the noclog authors
// SPDX-License-Identifier: Apache-2.0

//! ClickHouse sink over the HTTP interface.
//!
//! Batches are shipped as a single `INSERT ... FORMAT JSONEachRow` POST:
//! appending a record serializes one JSON line into the request body, and
//! commit sends the body with `user`/`password`/`database`/`query` as query
//! parameters. ClickHouse treats the whole POST as one insert, which is the
//! transactional unit the batcher expects.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::record::LogRecord;
use crate::sink::{LogSink, SinkBatch, SinkError};

/// Connection settings for one ClickHouse endpoint.
#[derive(Debug, Clone)]
pub struct ClickHouseConfig {
    /// HTTP interface base URL, e.g. `http://clickhouse:8123`.
    pub url: String,
    pub database: String,
    pub user: String,
    pub password: String,
    /// Target table; fixed for the lifetime of the process.
    pub table: String,
    /// Per-request timeout carried by the HTTP client.
    pub request_timeout: Duration,
}

/// Row shape matching the target table's column order.
#[derive(Serialize)]
struct LogRow<'a> {
    /// Unix seconds; ClickHouse parses integers into `DateTime` directly.
    timestamp: i64,
    origin: &'a str,
    severity: u8,
    categories: &'a [String],
    message: &'a str,
}

pub struct ClickHouseSink {
    client: reqwest::Client,
    config: Arc<ClickHouseConfig>,
}

impl ClickHouseSink {
    pub fn new(config: ClickHouseConfig) -> Result<ClickHouseSink, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(ClickHouseSink {
            client,
            config: Arc::new(config),
        })
    }
}

impl LogSink for ClickHouseSink {
    type Batch = ClickHouseBatch;

    fn begin_batch(&self) -> Result<ClickHouseBatch, SinkError> {
        Ok(ClickHouseBatch {
            client: self.client.clone(),
            config: Arc::clone(&self.config),
            body: Vec::new(),
            rows: 0,
        })
    }
}

/// An insert under construction: newline-delimited JSON rows.
pub struct ClickHouseBatch {
    client: reqwest::Client,
    config: Arc<ClickHouseConfig>,
    body: Vec<u8>,
    rows: usize,
}

#[async_trait]
impl SinkBatch for ClickHouseBatch {
    fn append(&mut self, record: &LogRecord) -> Result<(), SinkError> {
        let row = LogRow {
            timestamp: record.timestamp.timestamp(),
            origin: &record.origin,
            severity: record.severity.as_u8(),
            categories: &record.categories,
            message: &record.message,
        };
        serde_json::to_writer(&mut self.body, &row)?;
        self.body.push(b'\n');
        self.rows += 1;
        Ok(())
    }

    async fn commit(self) -> Result<(), SinkError> {
        if self.rows == 0 {
            return Ok(());
        }

        let query = format!(
            "INSERT INTO {} (timestamp, origin, severity, categories, message) FORMAT JSONEachRow",
            self.config.table
        );
        let response = self
            .client
            .post(&self.config.url)
            .query(&[
                ("user", self.config.user.as_str()),
                ("password", self.config.password.as_str()),
                ("database", self.config.database.as_str()),
                ("query", query.as_str()),
            ])
            .body(self.body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // ClickHouse puts the human-readable error in the body.
            let message = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!("wrote {} rows to {}", self.rows, self.config.table);
        Ok(())
    }
}
