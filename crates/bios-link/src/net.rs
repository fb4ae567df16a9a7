//! UDP transport for the export stream and command frames
//!
//! The simulator multicasts the export stream and accepts commands as
//! plain UDP datagrams. Each direction runs in its own task and talks to
//! the link actor through channels.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::actor::LinkCommand;
use crate::error::LinkError;

/// Multicast group the export stream is sent to
pub const DEFAULT_MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 50, 10);

/// Port the export stream is sent to
pub const DEFAULT_EXPORT_PORT: u16 = 5010;

/// Where the simulator listens for commands
pub const DEFAULT_COMMAND_ADDR: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 7778);

/// How long a receive may block before the shutdown flag is checked again
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// Pause after a failed receive before trying again
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(100);

const MAX_DATAGRAM: usize = 4096;

/// UDP socket that other export consumers can bind to the same port
fn shared_udp_socket(addr: SocketAddrV4) -> io::Result<std::net::UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&SocketAddr::V4(addr).into())?;
    Ok(socket.into())
}

/// Receives export datagrams and forwards them to the link actor
#[derive(Debug)]
pub struct ExportListener {
    socket: UdpSocket,
    recv_timeout: Duration,
    buffer: Vec<u8>,
}

impl ExportListener {
    /// Bind to `port` on all interfaces and join the multicast `group`
    ///
    /// The port is bound with address reuse so several listeners can share it.
    pub async fn join_multicast(
        group: Ipv4Addr,
        port: u16,
        interface: Ipv4Addr,
    ) -> Result<Self, LinkError> {
        if !group.is_multicast() {
            return Err(LinkError::Config(format!(
                "{} is not a multicast address",
                group
            )));
        }
        let socket = shared_udp_socket(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port))?;
        let socket = UdpSocket::from_std(socket)?;
        socket.join_multicast_v4(group, interface)?;
        info!("Joined export multicast group {}:{}", group, port);
        Ok(Self::from_socket(socket))
    }

    /// Bind a plain unicast listener, e.g. for replayed streams
    pub async fn bind(addr: SocketAddr) -> Result<Self, LinkError> {
        let socket = UdpSocket::bind(addr).await?;
        info!("Listening for export data on {}", socket.local_addr()?);
        Ok(Self::from_socket(socket))
    }

    fn from_socket(socket: UdpSocket) -> Self {
        Self {
            socket,
            recv_timeout: DEFAULT_RECV_TIMEOUT,
            buffer: vec![0u8; MAX_DATAGRAM],
        }
    }

    /// Change how often the shutdown flag is polled
    pub fn with_recv_timeout(mut self, recv_timeout: Duration) -> Self {
        self.recv_timeout = recv_timeout;
        self
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, LinkError> {
        Ok(self.socket.local_addr()?)
    }

    /// Main receive loop - runs until shutdown is flagged or the actor goes away
    ///
    /// Receive errors are logged and the loop keeps listening.
    pub async fn run(
        mut self,
        link_tx: mpsc::Sender<LinkCommand>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), LinkError> {
        info!("Starting export receive loop");

        while !*shutdown.borrow() {
            match tokio::time::timeout(self.recv_timeout, self.socket.recv(&mut self.buffer)).await
            {
                Ok(Ok(n)) if n > 0 => {
                    debug!("Received {} export bytes", n);
                    let data = self.buffer[..n].to_vec();
                    if link_tx.send(LinkCommand::ExportData(data)).await.is_err() {
                        debug!("Link actor gone, stopping export receive loop");
                        return Err(LinkError::ChannelClosed);
                    }
                }
                Ok(Ok(_)) => {} // empty datagram
                Ok(Err(e)) => {
                    warn!("Export receive error: {}", e);
                    tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                }
                Err(_) => {} // Timeout, check shutdown
            }
        }

        info!("Export receive loop ended");
        Ok(())
    }
}

/// Sends command frames to the simulator
#[derive(Debug)]
pub struct CommandSender {
    socket: UdpSocket,
    target: SocketAddr,
}

impl CommandSender {
    /// Bind an ephemeral local socket for sending to `target`
    pub async fn new(target: SocketAddr) -> Result<Self, LinkError> {
        let local: SocketAddr = if target.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((std::net::Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(local).await?;
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Send one frame as a single datagram
    pub async fn send(&self, frame: &[u8]) -> Result<(), LinkError> {
        self.socket.send_to(frame, self.target).await?;
        Ok(())
    }

    /// Forward frames in order until the channel closes
    pub async fn run(self, mut frames: mpsc::Receiver<Vec<u8>>) -> Result<(), LinkError> {
        info!("Sending commands to {}", self.target);
        while let Some(frame) = frames.recv().await {
            debug!("Sending {:?}", String::from_utf8_lossy(&frame));
            self.send(&frame).await?;
        }
        info!("Command sender stopped");
        Ok(())
    }
}
