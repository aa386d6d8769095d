// Copyright 2025-Present the noclog authors
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use mockito::{Matcher, Server};
use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

use noclog::{
    batcher, Batcher, BatcherConfig, ClickHouseConfig, ClickHouseSink, ListenerConfig,
    SyslogListener,
};

fn clickhouse_config(url: String) -> ClickHouseConfig {
    ClickHouseConfig {
        url,
        database: "noc".to_string(),
        user: "collector".to_string(),
        password: "secret".to_string(),
        table: "mikrotik_logs".to_string(),
        request_timeout: Duration::from_secs(2),
    }
}

/// Wires the whole pipeline against a sink URL and returns the UDP address
/// datagrams should be sent to.
async fn start_pipeline(sink_url: String, max_batch_entries: usize) -> std::net::SocketAddr {
    let sink = ClickHouseSink::new(clickhouse_config(sink_url)).expect("failed to create sink");

    let config = BatcherConfig {
        // Far enough out that only the size trigger fires in these tests.
        flush_interval: Duration::from_secs(3600),
        max_batch_entries,
        flush_timeout: Duration::from_secs(5),
    };
    let (handle, rx) = batcher::channel(64);
    tokio::spawn(Batcher::new(sink, rx, config).run());

    let listener = SyslogListener::new(
        &ListenerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        handle,
        CancellationToken::new(),
    )
    .await
    .expect("failed to bind UDP socket");
    let addr = listener.local_addr().expect("no local addr");

    tokio::spawn(async move {
        let _ = listener.spin().await;
    });

    addr
}

#[tokio::test]
async fn syslog_datagram_reaches_clickhouse() {
    let mut mock_server = Server::new_async().await;

    let mock = mock_server
        .mock("POST", "/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("database".into(), "noc".into()),
            Matcher::UrlEncoded("user".into(), "collector".into()),
            Matcher::UrlEncoded("password".into(), "secret".into()),
            Matcher::Regex("FORMAT\\+JSONEachRow".into()),
        ]))
        .match_body(Matcher::Regex(r#""severity":2"#.into()))
        .with_status(200)
        .create_async()
        .await;

    let addr = start_pipeline(mock_server.url(), 1).await;

    let socket = UdpSocket::bind("127.0.0.1:0")
        .await
        .expect("unable to bind client socket");
    socket
        .send_to(b"network,critical,interface eth0 down", addr)
        .await
        .expect("unable to send datagram");

    let flushed = async {
        while !mock.matched_async().await {
            sleep(Duration::from_millis(100)).await;
        }
    };
    match timeout(Duration::from_secs(3), flushed).await {
        Ok(()) => mock.assert_async().await,
        Err(_) => panic!("timed out before mock ClickHouse received the insert"),
    }
}

#[tokio::test]
async fn engine_survives_insert_failures() {
    let mut mock_server = Server::new_async().await;

    // Every insert is rejected; the engine must keep flushing new batches
    // instead of dying or retaining old ones. The query string carries the
    // credentials and the INSERT statement, so the path alone never matches
    // without an explicit query matcher.
    let mock = mock_server
        .mock("POST", "/")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("Code: 243. DB::Exception: Cannot reserve space")
        .expect_at_least(2)
        .create_async()
        .await;

    let addr = start_pipeline(mock_server.url(), 1).await;

    let socket = UdpSocket::bind("127.0.0.1:0")
        .await
        .expect("unable to bind client socket");
    socket
        .send_to(b"system,error,critical router rebooted", addr)
        .await
        .expect("unable to send datagram");
    socket
        .send_to(b"system,info,account user admin logged in", addr)
        .await
        .expect("unable to send datagram");

    let flushed = async {
        while !mock.matched_async().await {
            sleep(Duration::from_millis(100)).await;
        }
    };
    match timeout(Duration::from_secs(3), flushed).await {
        Ok(()) => mock.assert_async().await,
        Err(_) => panic!("timed out before two independent insert attempts were seen"),
    }
}
