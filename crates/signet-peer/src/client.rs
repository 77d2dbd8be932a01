use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::warn;

use signet_core::{
    PrepareReply, PrepareRequest, SignetError, Transaction, TransactionChain, Transport,
    PEER_PORT, REQUEST_TIMEOUT_SECS, SUBMIT_ATTEMPTS,
};

// ── HttpTransport ─────────────────────────────────────────────────────────────

/// The production `Transport`: reqwest with a short per-request timeout so a
/// hung peer resolves before the lock watchdog window.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, SignetError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SignetError::Transport { peer: "-".into(), reason: e.to_string() })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, SignetError> {
        let transport_err = |reason: String| SignetError::Transport { peer: url.into(), reason };
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_err(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(transport_err(format!("status {}", resp.status())));
        }
        resp.json().await.map_err(|e| transport_err(e.to_string()))
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, SignetError> {
        let transport_err = |reason: String| SignetError::Transport { peer: url.into(), reason };
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_err(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(transport_err(format!("status {}", resp.status())));
        }
        resp.json().await.map_err(|e| transport_err(e.to_string()))
    }
}

// ── PeerClient ────────────────────────────────────────────────────────────────

/// Addresses peers by *name* at the well-known port and interprets the reply
/// shapes of the protocol endpoints. All outbound protocol traffic goes
/// through here.
#[derive(Clone)]
pub struct PeerClient {
    transport: Arc<dyn Transport>,
    port: u16,
}

impl PeerClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport, port: PEER_PORT }
    }

    /// Override the port (tests bind ephemeral listeners).
    pub fn with_port(transport: Arc<dyn Transport>, port: u16) -> Self {
        Self { transport, port }
    }

    pub fn url(&self, name: &str, path: &str) -> String {
        format!("http://{name}:{}/{path}", self.port)
    }

    pub async fn post(
        &self,
        name: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, SignetError> {
        self.transport.post_json(&self.url(name, path), body).await
    }

    pub async fn get(&self, name: &str, path: &str) -> Result<serde_json::Value, SignetError> {
        self.transport.get_json(&self.url(name, path)).await
    }

    // ── Typed protocol calls ─────────────────────────────────────────────────

    /// Hand a signed proposal to the recipient's pending queue.
    pub async fn receive_transaction(
        &self,
        name: &str,
        tx: &Transaction,
    ) -> Result<serde_json::Value, SignetError> {
        self.post(name, "receive_transaction/", &serde_json::to_value(tx).unwrap_or_default())
            .await
    }

    /// Ask a peer authority to vote on a commit round.
    pub async fn prepare_transaction(
        &self,
        name: &str,
        request: &PrepareRequest,
    ) -> Result<PrepareReply, SignetError> {
        let value = self
            .post(name, "prepare_transaction", &serde_json::to_value(request).unwrap_or_default())
            .await?;
        serde_json::from_value(value).map_err(|e| SignetError::Transport {
            peer: name.into(),
            reason: format!("unrecognized prepare reply: {e}"),
        })
    }

    /// Broadcast leg of the commit: deliver a fully signed transaction.
    pub async fn add_to_chain(
        &self,
        name: &str,
        tx: &Transaction,
    ) -> Result<serde_json::Value, SignetError> {
        self.post(name, "add_to_chain/", &serde_json::to_value(tx).unwrap_or_default()).await
    }

    pub async fn unlock_transaction(&self, name: &str) -> Result<serde_json::Value, SignetError> {
        self.post(name, "unlock_transaction/", &serde_json::json!({})).await
    }

    /// Push a whole chain to a peer's synchronize endpoint.
    pub async fn synchronize(
        &self,
        name: &str,
        chain: &TransactionChain,
    ) -> Result<serde_json::Value, SignetError> {
        self.post(name, "synchronize", &serde_json::to_value(chain).unwrap_or_default()).await
    }

    /// Round-trip a deposit skeleton through the depositor for signing.
    pub async fn sign_money_deposit(
        &self,
        name: &str,
        tx: &Transaction,
    ) -> Result<Transaction, SignetError> {
        let value = self
            .post(name, "sign_money_deposit", &serde_json::to_value(tx).unwrap_or_default())
            .await?;
        serde_json::from_value(value).map_err(|e| SignetError::Transport {
            peer: name.into(),
            reason: format!("unrecognized signed deposit: {e}"),
        })
    }

    /// Submit to a uniformly random authority, retrying with a fresh random
    /// pick on failure. The only success criterion is a 2xx reply.
    pub async fn submit_to_random_authority(
        &self,
        authorities: &[String],
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, SignetError> {
        for attempt in 1..=SUBMIT_ATTEMPTS {
            let pick = &authorities[rand::thread_rng().gen_range(0..authorities.len())];
            match self.post(pick, path, body).await {
                Ok(reply) => return Ok(reply),
                Err(e) => {
                    warn!(authority = %pick, attempt, error = %e, "authority submission failed")
                }
            }
        }
        Err(SignetError::AuthoritiesUnavailable { attempts: SUBMIT_ATTEMPTS })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Transport that fails the first `failures` calls, then echoes.
    struct FlakyTransport {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn post_json(
            &self,
            url: &str,
            _body: &serde_json::Value,
        ) -> Result<serde_json::Value, SignetError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(SignetError::Transport { peer: url.into(), reason: "down".into() });
            }
            Ok(serde_json::json!({ "message": "ok" }))
        }

        async fn get_json(&self, url: &str) -> Result<serde_json::Value, SignetError> {
            self.post_json(url, &serde_json::Value::Null).await
        }
    }

    #[test]
    fn urls_use_the_well_known_port() {
        let transport = Arc::new(FlakyTransport { failures: 0, calls: AtomicU32::new(0) });
        let peers = PeerClient::new(transport);
        assert_eq!(peers.url("authority_1", "public_key"), "http://authority_1:8000/public_key");
        assert_eq!(
            peers.url("bob", "receive_transaction/"),
            "http://bob:8000/receive_transaction/"
        );
    }

    #[tokio::test]
    async fn submit_retries_until_an_authority_answers() {
        let transport = Arc::new(FlakyTransport { failures: 2, calls: AtomicU32::new(0) });
        let peers = PeerClient::new(Arc::clone(&transport) as Arc<dyn Transport>);
        let authorities = vec!["authority_1".to_string()];
        let reply = peers
            .submit_to_random_authority(&authorities, "verify_transaction/", &serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(reply["message"], "ok");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn submit_gives_up_after_three_attempts() {
        let transport = Arc::new(FlakyTransport { failures: 10, calls: AtomicU32::new(0) });
        let peers = PeerClient::new(Arc::clone(&transport) as Arc<dyn Transport>);
        let authorities = vec!["authority_1".to_string(), "authority_2".to_string()];
        let err = peers
            .submit_to_random_authority(&authorities, "verify_transaction/", &serde_json::json!({}))
            .await;
        assert!(matches!(err, Err(SignetError::AuthoritiesUnavailable { attempts: 3 })));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }
}
