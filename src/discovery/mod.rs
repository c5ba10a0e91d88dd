//! Station discovery
//!
//! One UDP socket plays two roles: the [`Advertiser`] periodically broadcasts
//! this node's announcement on it, and the [`DiscoveryListener`] receives
//! everyone's announcements from it and records them in the
//! [`ServiceDirectory`] via the node actor.

pub mod advertiser;
pub mod directory;
pub mod listener;

use std::net::SocketAddr;
use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

pub use advertiser::Advertiser;
pub use directory::ServiceDirectory;
pub use listener::DiscoveryListener;

/// Bind the shared broadcast socket.
///
/// The socket is address-reusable so several stations on one host can share
/// the broadcast port, and broadcast-enabled so the advertiser can send on it.
pub fn bind_broadcast_socket(addr: SocketAddr) -> std::io::Result<Arc<UdpSocket>> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_broadcast(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;

    let socket = UdpSocket::from_std(socket.into())?;
    Ok(Arc::new(socket))
}
