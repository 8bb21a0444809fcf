// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery channel to the log intake.
//!
//! A [`Channel`] owns one connection for the lifetime of a forwarding run.
//! Every [`Channel::send`] pushes the whole line to the socket before
//! returning, and the first failed send poisons the channel. The connection
//! is shut down exactly once: by [`Channel::close`], or on drop if the run
//! bailed out before reaching it.

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ForwarderConfig;

pub type TlsStream = StreamOwned<ClientConnection, TcpStream>;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    #[error("{0} did not resolve to any address")]
    NoAddress(String),

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to configure socket: {0}")]
    Socket(#[source] io::Error),

    #[error("invalid server name '{0}'")]
    InvalidServerName(String),

    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] io::Error),

    #[error("TLS configuration error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("no valid certificates found in native root store")]
    NoRootCertificates,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("write failed: {0}")]
    Io(#[from] io::Error),

    #[error("channel is poisoned by an earlier failed write")]
    Poisoned,
}

/// Byte stream a [`Channel`] writes to
pub trait Transport: Write {
    /// Ends the session and releases the connection.
    fn shutdown(&mut self) -> io::Result<()>;
}

impl Transport for TlsStream {
    fn shutdown(&mut self) -> io::Result<()> {
        self.conn.send_close_notify();
        while self.conn.wants_write() {
            self.conn.write_tls(&mut self.sock)?;
        }
        self.sock.shutdown(Shutdown::Both)
    }
}

/// Opens channels to the log intake
pub trait Connector {
    type Transport: Transport;

    fn connect(&self) -> Result<Channel<Self::Transport>, ConnectionError>;
}

pub struct Channel<T: Transport> {
    transport: T,
    endpoint: String,
    poisoned: bool,
    closed: bool,
    lines_sent: usize,
    bytes_sent: usize,
}

impl<T: Transport> Channel<T> {
    pub fn new(transport: T, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            poisoned: false,
            closed: false,
            lines_sent: 0,
            bytes_sent: 0,
        }
    }

    /// Writes `line` in full and flushes it to the socket.
    pub fn send(&mut self, line: &str) -> Result<(), SendError> {
        if self.poisoned {
            return Err(SendError::Poisoned);
        }
        if let Err(e) = self
            .transport
            .write_all(line.as_bytes())
            .and_then(|()| self.transport.flush())
        {
            self.poisoned = true;
            return Err(SendError::Io(e));
        }
        self.lines_sent += 1;
        self.bytes_sent += line.len();
        Ok(())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn lines_sent(&self) -> usize {
        self.lines_sent
    }

    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    pub fn close(mut self) -> io::Result<()> {
        debug!(
            "Closing channel to {} after {} lines ({} bytes)",
            self.endpoint, self.lines_sent, self.bytes_sent
        );
        self.closed = true;
        self.transport.shutdown()
    }
}

impl<T: Transport> Drop for Channel<T> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        debug!("Channel to {} dropped without close", self.endpoint);
        if let Err(e) = self.transport.shutdown() {
            debug!("Failed to shut down channel to {}: {e}", self.endpoint);
        }
    }
}

/// Connects to the intake over TLS 1.2+ with server certificate verification
/// and no client certificate.
pub struct TlsConnector {
    host: String,
    port: u16,
    server_name: ServerName<'static>,
    connect_timeout: Duration,
    io_timeout: Duration,
    tls: Arc<ClientConfig>,
}

impl TlsConnector {
    /// Uses the platform root certificates.
    pub fn new(config: &ForwarderConfig) -> Result<Self, ConnectionError> {
        Self::with_root_store(config, native_root_store()?)
    }

    pub fn with_root_store(
        config: &ForwarderConfig,
        roots: RootCertStore,
    ) -> Result<Self, ConnectionError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let tls = ClientConfig::builder_with_provider(provider)
            .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])?
            .with_root_certificates(roots)
            .with_no_client_auth();

        let host = config.host();
        let server_name = ServerName::try_from(host.clone())
            .map_err(|_| ConnectionError::InvalidServerName(host.clone()))?;

        Ok(Self {
            host,
            port: config.port,
            server_name,
            connect_timeout: config.connect_timeout,
            io_timeout: config.write_timeout,
            tls: Arc::new(tls),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn open_socket(&self) -> Result<TcpStream, ConnectionError> {
        let endpoint = self.endpoint();
        let addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|source| ConnectionError::Resolve {
                endpoint: endpoint.clone(),
                source,
            })?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(sock) => return Ok(sock),
                Err(source) => {
                    debug!("Failed to connect to {addr}: {source}");
                    last_error = Some(ConnectionError::Connect { addr, source });
                }
            }
        }
        Err(last_error.unwrap_or(ConnectionError::NoAddress(endpoint)))
    }
}

impl Connector for TlsConnector {
    type Transport = TlsStream;

    fn connect(&self) -> Result<Channel<TlsStream>, ConnectionError> {
        let endpoint = self.endpoint();
        info!("Connecting to {endpoint}");

        let sock = self.open_socket()?;
        sock.set_read_timeout(Some(self.io_timeout))
            .and_then(|()| sock.set_write_timeout(Some(self.io_timeout)))
            .and_then(|()| sock.set_nodelay(true))
            .map_err(ConnectionError::Socket)?;

        let conn = ClientConnection::new(Arc::clone(&self.tls), self.server_name.clone())?;
        let mut stream = StreamOwned::new(conn, sock);
        // finish the handshake now so certificate problems surface as connection errors
        while stream.conn.is_handshaking() {
            stream
                .conn
                .complete_io(&mut stream.sock)
                .map_err(ConnectionError::Handshake)?;
        }
        debug!(
            "TLS session established with {endpoint} using {:?}",
            stream.conn.protocol_version()
        );

        Ok(Channel::new(stream, endpoint))
    }
}

fn native_root_store() -> Result<RootCertStore, ConnectionError> {
    let mut root_cert_store = RootCertStore::empty();
    let native_certs = rustls_native_certs::load_native_certs();
    for err in &native_certs.errors {
        debug!("Failed to load native certificate: {err}");
    }
    let mut valid_count = 0;
    for cert in native_certs.certs {
        match root_cert_store.add(cert) {
            Ok(()) => valid_count += 1,
            Err(err) => {
                debug!("Failed to parse certificate: {:?}", err);
            }
        }
    }
    if valid_count == 0 {
        return Err(ConnectionError::NoRootCertificates);
    }
    Ok(root_cert_store)
}
