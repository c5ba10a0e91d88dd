//! Browsable library of discovered live streams
//!
//! Each discovered station is exposed as a track addressed `rtp:<host>`.
//! [`Library::browse`] lists them all; [`Library::lookup`] resolves one URI.

pub mod uri;

use crate::error::Result;
use crate::node::NodeHandle;

pub use uri::{make_uri, parse_uri, URI_SCHEME};

/// Reference to a browsable item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRef {
    pub uri: String,
    pub name: String,
    pub kind: RefKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Directory,
    Track,
}

/// A resolved live stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub uri: String,
    pub name: String,
}

/// Library view over the node's service directory
#[derive(Clone)]
pub struct Library {
    node: NodeHandle,
}

impl Library {
    pub fn new(node: NodeHandle) -> Self {
        Self { node }
    }

    /// Root directory all live streams live under
    pub fn root_directory() -> TrackRef {
        TrackRef {
            uri: format!("{}:", URI_SCHEME),
            name: "RTP".to_string(),
            kind: RefKind::Directory,
        }
    }

    /// Every discovered station as a track reference
    pub async fn browse(&self) -> Result<Vec<TrackRef>> {
        let mut refs: Vec<TrackRef> = self
            .node
            .peers()
            .await?
            .into_iter()
            .map(|(addr, name)| TrackRef {
                uri: make_uri(&addr),
                name,
                kind: RefKind::Track,
            })
            .collect();

        refs.sort_by(|a, b| a.uri.cmp(&b.uri));
        Ok(refs)
    }

    /// Resolve a track URI; empty if the station has not been discovered
    pub async fn lookup(&self, uri: &str) -> Result<Vec<Track>> {
        let addr = parse_uri(uri);

        Ok(self
            .node
            .lookup(addr)
            .await?
            .map(|name| Track {
                uri: uri.to_string(),
                name,
            })
            .into_iter()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::test_support::spawn_node;

    #[tokio::test]
    async fn test_browse() {
        let (node, _) = spawn_node(1);
        node.record("10.0.0.9", "Office").await.unwrap();
        node.record("10.0.0.7", "Kitchen").await.unwrap();

        let refs = Library::new(node).browse().await.unwrap();

        assert_eq!(
            refs,
            vec![
                TrackRef {
                    uri: "rtp:10.0.0.7".to_string(),
                    name: "Kitchen".to_string(),
                    kind: RefKind::Track
                },
                TrackRef {
                    uri: "rtp:10.0.0.9".to_string(),
                    name: "Office".to_string(),
                    kind: RefKind::Track
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_lookup() {
        let (node, _) = spawn_node(1);
        node.record("10.0.0.7", "Kitchen").await.unwrap();
        let library = Library::new(node);

        assert_eq!(
            library.lookup("rtp:10.0.0.7").await.unwrap(),
            vec![Track {
                uri: "rtp:10.0.0.7".to_string(),
                name: "Kitchen".to_string()
            }]
        );
        assert!(library.lookup("rtp:10.0.0.8").await.unwrap().is_empty());
    }

    #[test]
    fn test_root_directory() {
        let root = Library::root_directory();
        assert_eq!(root.uri, "rtp:");
        assert_eq!(root.name, "RTP");
        assert_eq!(root.kind, RefKind::Directory);
    }
}
