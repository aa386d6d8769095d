// Copyright 2025-Present the noclog authors
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;
use std::process;

use tokio::time::{timeout, Duration};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use noclog::{batcher, Batcher, ClickHouseSink, CollectorConfig, SyslogListener};
use tokio_util::sync::CancellationToken;

// Leave room for one last in-flight flush after the listener stops.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
pub async fn main() {
    // Credentials come from a local .env file when present, the plain
    // environment otherwise.
    let _ = dotenv::dotenv();

    let log_level = env::var("NOCLOG_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());
    let env_filter = format!("h2=off,hyper=off,rustls=off,reqwest=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("logging subsystem enabled");

    let config = match CollectorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("error loading collector configuration: {e}");
            process::exit(1);
        }
    };

    let sink = match ClickHouseSink::new(config.clickhouse()) {
        Ok(sink) => sink,
        Err(e) => {
            error!("error creating ClickHouse sink: {e}");
            process::exit(1);
        }
    };

    let (handle, rx) = batcher::channel(config.queue_capacity);
    let batcher_task = tokio::spawn(Batcher::new(sink, rx, config.batcher()).run());

    let cancel_token = CancellationToken::new();
    let listener = match SyslogListener::new(&config.listener(), handle, cancel_token.clone()).await
    {
        Ok(listener) => listener,
        Err(e) => {
            error!("could not bind UDP socket on {}:{}: {e}", config.host, config.port);
            process::exit(1);
        }
    };
    match listener.local_addr() {
        Ok(addr) => info!("log collector listening on {addr}"),
        Err(_) => info!("log collector listening on {}:{}", config.host, config.port),
    }
    info!(
        "flushing to {} every {:?} or {} records",
        config.table, config.flush_interval, config.batch_size
    );

    let mut listener_task = tokio::spawn(listener.spin());

    tokio::select! {
        result = &mut listener_task => {
            match result {
                Ok(Ok(())) => debug!("listener stopped"),
                Ok(Err(e)) => {
                    // A socket read failure is the one failure class that
                    // stops the whole system.
                    error!("UDP read error: {e}");
                    process::exit(1);
                }
                Err(e) => {
                    error!("listener task failed: {e}");
                    process::exit(1);
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received, draining buffered records");
            cancel_token.cancel();
            // The listener blocks in recv_from; abort rather than wait for
            // one more datagram to notice the cancellation.
            listener_task.abort();
            let _ = listener_task.await;
        }
    }

    // With the listener gone the batcher's input channel closes; it flushes
    // whatever is buffered and exits.
    if timeout(DRAIN_TIMEOUT, batcher_task).await.is_err() {
        error!("batcher did not drain within {DRAIN_TIMEOUT:?}");
    }
}
