use async_trait::async_trait;

use signet_core::{KeyResolver, SignetError};

use crate::client::PeerClient;

/// Resolves a node name to its public key by calling the node's own
/// `GET /public_key` endpoint. No caching: key material is tiny and nodes
/// may be restarted with fresh keys at any time.
pub struct HttpKeyResolver {
    peers: PeerClient,
}

impl HttpKeyResolver {
    pub fn new(peers: PeerClient) -> Self {
        Self { peers }
    }
}

#[async_trait]
impl KeyResolver for HttpKeyResolver {
    async fn public_key_of(&self, name: &str) -> Result<String, SignetError> {
        let reply = self.peers.get(name, "public_key").await.map_err(|e| {
            SignetError::KeyResolution { node: name.into(), reason: e.to_string() }
        })?;
        reply["public_key"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| SignetError::KeyResolution {
                node: name.into(),
                reason: "reply carries no public_key field".into(),
            })
    }
}
