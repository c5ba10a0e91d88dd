//! Playback-side client
//!
//! [`SubscriptionClient`] asks a remote station to start or stop streaming to
//! a local UDP port. [`PlaybackProvider`] drives it on behalf of local
//! playback of an `rtp:<host>` track.

pub mod playback;
pub mod subscriber;

pub use playback::{AudioOutput, PlaybackProvider};
pub use subscriber::SubscriptionClient;
