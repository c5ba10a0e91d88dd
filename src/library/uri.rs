//! `rtp:<host>` track addressing

/// Scheme naming discovered live streams
pub const URI_SCHEME: &str = "rtp";

/// Track URI for a station host
pub fn make_uri(host: &str) -> String {
    format!("{}:{}", URI_SCHEME, host)
}

/// Host part of a track URI.
///
/// Takes everything after the last `:`; no further validation.
pub fn parse_uri(uri: &str) -> &str {
    uri.rsplit(':').next().unwrap_or(uri)
}

/// Local playback URI for a stream received on `port`
pub fn playback_uri(port: u16) -> String {
    format!("{}://{}", URI_SCHEME, port)
}
