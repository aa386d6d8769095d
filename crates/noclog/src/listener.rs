// Copyright 2025-Present the noclog authors
// SPDX-License-Identifier: Apache-2.0

//! UDP listener: receives raw datagrams, parses them, and feeds the
//! batcher's bounded queue.
//!
//! The listener is the pipeline's single producer. Enqueueing blocks while
//! the queue is full, so a slow sink eventually slows datagram reads; that
//! coupling is deliberate. Arbitrary byte content never panics: payloads are
//! decoded lossily and anything unparseable becomes a fallback record.

use std::io;
use std::net::SocketAddr;

use tracing::trace;

use crate::batcher::BatcherHandle;
use crate::constants::DATAGRAM_BUFFER_SIZE;
use crate::record::parse;

/// Bind configuration for the listener.
pub struct ListenerConfig {
    /// Host to bind the UDP socket to (e.g. "0.0.0.0").
    pub host: String,
    /// Port to listen on (syslog convention is 514).
    pub port: u16,
}

// DatagramReader abstracts the socket so tests can replay fixed payloads.
enum DatagramReader {
    UdpSocket(tokio::net::UdpSocket),

    /// Replays a fixed payload once per read - test transport.
    #[allow(dead_code)]
    MirrorTest(Vec<u8>, SocketAddr),
}

impl DatagramReader {
    async fn read(&self) -> io::Result<(Vec<u8>, SocketAddr)> {
        match self {
            DatagramReader::UdpSocket(socket) => {
                let mut buf = [0; DATAGRAM_BUFFER_SIZE];
                let (amt, src) = socket.recv_from(&mut buf).await?;
                Ok((buf[..amt].to_vec(), src))
            }
            DatagramReader::MirrorTest(data, src) => Ok((data.clone(), *src)),
        }
    }
}

/// UDP server that parses datagrams into records and enqueues them.
pub struct SyslogListener {
    cancel_token: tokio_util::sync::CancellationToken,
    handle: BatcherHandle,
    reader: DatagramReader,
}

impl SyslogListener {
    /// Binds the UDP socket. Parsed records are forwarded to `handle`.
    pub async fn new(
        config: &ListenerConfig,
        handle: BatcherHandle,
        cancel_token: tokio_util::sync::CancellationToken,
    ) -> io::Result<SyslogListener> {
        let addr = format!("{}:{}", config.host, config.port);
        let socket = tokio::net::UdpSocket::bind(addr).await?;
        Ok(SyslogListener {
            cancel_token,
            handle,
            reader: DatagramReader::UdpSocket(socket),
        })
    }

    /// The address the socket actually bound to (useful with port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match &self.reader {
            DatagramReader::UdpSocket(socket) => socket.local_addr(),
            DatagramReader::MirrorTest(_, src) => Ok(*src),
        }
    }

    /// Main receive loop. Runs until cancelled or until a read fails; a read
    /// failure is fatal to the producer and is returned to the caller.
    pub async fn spin(self) -> io::Result<()> {
        while !self.cancel_token.is_cancelled() {
            self.consume_datagram().await?;
        }
        Ok(())
    }

    /// Receives and processes exactly one datagram.
    async fn consume_datagram(&self) -> io::Result<()> {
        let (buf, src) = self.reader.read().await?;

        let text = String::from_utf8_lossy(&buf);
        trace!("received {} bytes from {}", buf.len(), src);

        let record = parse(&text, src);
        if self.handle.send(record).await.is_err() {
            // The consumer is gone; nothing we enqueue can ever be flushed.
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "batcher input queue closed",
            ));
        }
        Ok(())
    }
}
