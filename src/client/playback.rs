//! Live stream playback control

use crate::library::{parse_uri, uri::playback_uri};

use super::subscriber::SubscriptionClient;

/// Local audio output the received stream is played through
pub trait AudioOutput: Send + Sync {
    /// Point the output at a local stream URI (`rtp://<port>`) and start it
    fn set_uri(&self, uri: &str) -> bool;

    /// Stop whatever is playing
    fn stop_playback(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CurrentStream {
    uri: String,
    host: String,
    port: u16,
}

/// Plays discovered `rtp:<host>` tracks by subscribing to the remote station.
///
/// Live streams cannot seek, pause or resume.
pub struct PlaybackProvider<A> {
    client: SubscriptionClient,
    audio: A,
    current: Option<CurrentStream>,
}

impl<A: AudioOutput> PlaybackProvider<A> {
    pub fn new(client: SubscriptionClient, audio: A) -> Self {
        Self {
            client,
            audio,
            current: None,
        }
    }

    /// URI of the track currently playing
    pub fn current_uri(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.uri.as_str())
    }

    /// Local port the current stream arrives on
    pub fn current_port(&self) -> Option<u16> {
        self.current.as_ref().map(|c| c.port)
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    /// Switch to `uri`, subscribing to its station.
    ///
    /// The previous station is unsubscribed first so it does not keep one of
    /// its subscriber slots for a stream nobody plays.
    pub async fn change_track(&mut self, uri: &str) -> bool {
        if self.current_uri() == Some(uri) {
            return true;
        }

        if let Some(previous) = self.current.take() {
            if !self.client.unsubscribe(&previous.host, previous.port).await {
                tracing::warn!(uri = %previous.uri, "Previous stream not released");
            }
        }

        let host = parse_uri(uri).to_string();
        let port = match self.client.subscribe(&host).await {
            Ok(port) => port,
            Err(_) => return false,
        };

        if !self.audio.set_uri(&playback_uri(port)) {
            tracing::warn!(uri = uri, port = port, "Audio output refused stream");
            self.client.unsubscribe(&host, port).await;
            return false;
        }

        self.current = Some(CurrentStream {
            uri: uri.to_string(),
            host,
            port,
        });
        true
    }

    /// Stop playback and unsubscribe.
    ///
    /// State is only cleared when both steps succeed.
    pub async fn stop(&mut self) -> bool {
        let Some(current) = self.current.clone() else {
            return false;
        };

        if self.audio.stop_playback() && self.client.unsubscribe(&current.host, current.port).await
        {
            self.current = None;
            return true;
        }
        false
    }

    pub fn seek(&self, _time_position: u64) -> bool {
        false
    }

    pub fn pause(&self) -> bool {
        false
    }

    pub fn resume(&self) -> bool {
        false
    }

    pub fn time_position(&self) -> u64 {
        0
    }
}
