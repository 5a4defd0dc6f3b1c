// ── UDP transport ──
//
// One request datagram out, one response datagram back. The socket is
// bound per exchange and dropped when the call returns; there is no
// connection reuse and no retry at this layer.

use std::future::Future;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tracing::{debug, trace};

use crate::error::Error;

/// Default controller port.
pub const DEFAULT_PORT: u16 = 4000;
/// Default per-attempt receive timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
/// Receive buffer; responses are well under this.
pub const RECV_BUFFER_LEN: usize = 1024;

/// A single request/response exchange with the device.
///
/// Every `Err` means "no data for this attempt". Implementations must not
/// panic and must not retry on their own;
/// [`RetryingTransport`](crate::RetryingTransport) owns that policy.
pub trait Transport: Send + Sync + 'static {
    fn exchange(&self, frame: &[u8]) -> impl Future<Output = Result<Bytes, Error>> + Send;

    /// Setup-time sanity check, run once before polling starts.
    fn check(&self) -> impl Future<Output = Result<(), Error>> + Send {
        async { Ok(()) }
    }
}

/// Resolve `host:port` to the first matching socket address.
pub async fn resolve(host: &str, port: u16) -> Result<SocketAddr, Error> {
    let resolve_err = || Error::Resolve {
        host: host.to_owned(),
        port,
    };
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|_| resolve_err())?;
    addrs.next().ok_or_else(resolve_err)
}

/// UDP transport to one controller.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    host: String,
    port: u16,
    timeout: Duration,
}

impl UdpTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-attempt receive timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn addr_label(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Transport for UdpTransport {
    /// Fails with [`Error::Resolve`] when the host does not resolve.
    async fn check(&self) -> Result<(), Error> {
        resolve(&self.host, self.port).await.map(|_| ())
    }

    async fn exchange(&self, frame: &[u8]) -> Result<Bytes, Error> {
        let target = resolve(&self.host, self.port).await?;
        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local).await?;
        socket.send_to(frame, target).await?;
        trace!(%target, len = frame.len(), "request sent");

        let mut buf = vec![0u8; RECV_BUFFER_LEN];
        let Ok(received) = tokio::time::timeout(self.timeout, socket.recv_from(&mut buf)).await
        else {
            debug!(%target, "receive timed out");
            return Err(Error::Timeout {
                addr: self.addr_label(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            });
        };
        let (len, from) = received?;

        if len == 0 {
            return Err(Error::EmptyDatagram {
                addr: self.addr_label(),
            });
        }

        buf.truncate(len);
        trace!(%from, len, "response received");
        Ok(Bytes::from(buf))
    }
}
