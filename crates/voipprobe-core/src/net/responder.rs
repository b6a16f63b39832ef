//! Stateless echo responder
//!
//! Returns every received datagram verbatim to its sender. No handshake,
//! no validation, no per-peer state: correlation happens entirely on the
//! probe side, so anything that reaches this socket goes straight back.

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::ProbeError;

/// Read timeout so the loop can observe cancellation while idle
const IDLE_TIMEOUT: Duration = Duration::from_millis(200);

/// Receive buffer size; echoes whatever fits
const RECV_BUF_LEN: usize = 2048;

/// UDP echo service
#[derive(Debug)]
pub struct Responder {
    socket: UdpSocket,
}

impl Responder {
    /// Bind the echo socket; port 0 picks an ephemeral port
    pub fn bind(bind: &str, port: u16) -> Result<Self, ProbeError> {
        let addr = format!("{bind}:{port}");
        let socket = UdpSocket::bind(&addr).map_err(|source| ProbeError::Bind {
            addr: addr.clone(),
            source,
        })?;
        socket
            .set_read_timeout(Some(IDLE_TIMEOUT))
            .map_err(ProbeError::Socket)?;
        Ok(Self { socket })
    }

    /// The bound address (useful with an ephemeral port)
    pub fn local_addr(&self) -> Result<SocketAddr, ProbeError> {
        self.socket.local_addr().map_err(ProbeError::Socket)
    }

    /// Echo datagrams until cancellation is observed
    ///
    /// Transport errors are logged and the loop keeps going; a dropped
    /// echo just looks like loss to the probe, which is the phenomenon it
    /// measures anyway.
    pub fn run(&self, cancel: Arc<AtomicBool>) {
        info!(addr = ?self.socket.local_addr().ok(), "responder_listening");
        let mut buf = [0u8; RECV_BUF_LEN];
        while !cancel.load(Ordering::SeqCst) {
            match self.socket.recv_from(&mut buf) {
                Ok((len, peer)) => {
                    if let Err(e) = self.socket.send_to(&buf[..len], peer) {
                        warn!(error = %e, %peer, "echo_send_failed");
                    }
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) => {}
                Err(e) => warn!(error = %e, "recv_failed"),
            }
        }
        info!("responder_stopped");
    }
}
