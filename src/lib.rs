//! Peer-to-peer live audio stations over unicast RTP
//!
//! A node advertises the stream it is currently playing to its local network,
//! discovers other nodes' advertisements, and lets peers subscribe to its
//! stream on a UDP port of their choosing.
//!
//! # Overview
//!
//! ```text
//!   Advertiser ──► UDP broadcast ──► DiscoveryListener (peers) ──► ServiceDirectory
//!
//!   SubscriptionClient ──TCP──► SubscriptionServer ──► SessionHandler
//!                                                          │
//!                                                          ▼
//!                                     NodeActor { FanoutRegistry } ──► BranchRouter
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rtp_station::{RtpBackend, StationConfig, UdpFanout};
//!
//! # async fn example() -> rtp_station::error::Result<()> {
//! let config = StationConfig::default()
//!     .hostname("192.168.1.20")
//!     .station_name("Living room on %hostname:%port");
//!
//! let router = Arc::new(UdpFanout::bind(config.pipeline.clone()).await?);
//! let mut backend = RtpBackend::start(config, router.clone()).await?;
//!
//! // Feed encoded packets to every subscriber
//! // router.publish(packet);
//!
//! for track in backend.library().browse().await? {
//!     println!("{} -> {}", track.name, track.uri);
//! }
//!
//! backend.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod library;
pub mod net;
pub mod node;
pub mod registry;
pub mod routing;
pub mod server;
pub mod session;

pub use backend::RtpBackend;
pub use client::{AudioOutput, PlaybackProvider, SubscriptionClient};
pub use config::{PipelineConfig, StationConfig};
pub use error::{Error, Result};
pub use library::{Library, Track, TrackRef};
pub use node::NodeHandle;
pub use registry::{FanoutRegistry, Subscriber};
pub use routing::{BranchId, BranchRouter, UdpFanout};
pub use server::SubscriptionServer;
