use anyhow::{bail, Context};

/// Thin HTTP client for driving one node's API from the command line.
///
/// Uses raw reqwest + serde_json rather than the node's internal peer
/// adapter: the CLI addresses a node by URL, not by peer name.
pub struct NodeClient {
    url: String,
    client: reqwest::Client,
}

impl NodeClient {
    pub fn new(url: &str) -> Self {
        Self { url: url.trim_end_matches('/').to_string(), client: reqwest::Client::new() }
    }

    async fn get(&self, path: &str) -> anyhow::Result<serde_json::Value> {
        let resp = self
            .client
            .get(format!("{}/{path}", self.url))
            .send()
            .await
            .with_context(|| format!("connecting to node at {}", self.url))?;
        let status = resp.status();
        let json: serde_json::Value = resp.json().await.context("parsing node response")?;
        if !status.is_success() {
            bail!("node returned {status}: {json}");
        }
        Ok(json)
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> anyhow::Result<serde_json::Value> {
        let resp = self
            .client
            .post(format!("{}/{path}", self.url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("connecting to node at {}", self.url))?;
        let status = resp.status();
        let json: serde_json::Value = resp.json().await.context("parsing node response")?;
        if !status.is_success() {
            bail!("node returned {status}: {json}");
        }
        Ok(json)
    }

    /// Propose a transfer to another participant.
    pub async fn send(&self, to: &str, amount: f64) -> anyhow::Result<serde_json::Value> {
        self.post("send_transaction/", serde_json::json!({ "container": to, "amount": amount }))
            .await
    }

    /// The node's pending proposal queue.
    pub async fn pending(&self) -> anyhow::Result<serde_json::Value> {
        self.get("show_transactions").await
    }

    /// Counter-sign and submit the pending entry at `number`.
    pub async fn accept(&self, number: usize) -> anyhow::Result<serde_json::Value> {
        self.post("accept_transaction/", serde_json::json!({ "number": number })).await
    }

    /// Mint a balance through an authority deposit round.
    pub async fn deposit(&self, name: &str, amount: f64) -> anyhow::Result<serde_json::Value> {
        self.post("deposit_money", serde_json::json!({ "name": name, "amount": amount })).await
    }

    pub async fn balance(&self) -> anyhow::Result<f64> {
        let reply = self.get("get_balance").await?;
        reply["balance"].as_f64().context("missing balance in node response")
    }

    pub async fn transactions(&self) -> anyhow::Result<serde_json::Value> {
        self.get("transactions").await
    }

    pub async fn verify_chain(&self) -> anyhow::Result<serde_json::Value> {
        self.get("verify_chain").await
    }

    /// Register `name` with the authority this client points at.
    pub async fn join(&self, name: &str) -> anyhow::Result<serde_json::Value> {
        self.post("join", serde_json::json!({ "name": name })).await
    }
}
