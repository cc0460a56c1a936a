//! Bitcoin side of the harness: per-actor wallets and the shared regtest
//! node that hands out balance and confirms it.

use crate::bitcoind;
use anyhow::Context;
use url::Url;

pub use bitcoin::Amount;

/// A named wallet on the shared regtest node, owned by one actor.
#[derive(Debug, Clone)]
pub struct Wallet {
    name: String,
    client: bitcoind::Client,
}

impl Wallet {
    pub fn new(name: &str, node_url: Url) -> Self {
        Wallet {
            name: format!("harness_{}", name),
            client: bitcoind::Client::new(node_url),
        }
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        let network = self.client.network().await?;
        anyhow::ensure!(
            network == "regtest",
            "refusing to run against network {}, only regtest is supported",
            network
        );

        self.client.create_wallet(&self.name).await?;

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn new_address(&self) -> anyhow::Result<String> {
        self.client
            .get_new_address(&self.name)
            .await
            .context("failed to derive a new address")
    }

    pub async fn balance(&self) -> anyhow::Result<Amount> {
        self.client.get_balance(&self.name).await
    }
}

/// Funding and mining capability of the shared regtest chain.
///
/// Both actors' wallets draw from the same chain, so funding is cumulative
/// and block generation advances the chain for everyone.
#[derive(Debug, Clone)]
pub struct Node {
    client: bitcoind::Client,
    miner_wallet: String,
}

impl Node {
    pub fn new(node_url: Url) -> Self {
        Node {
            client: bitcoind::Client::new(node_url),
            miner_wallet: "miner".to_string(),
        }
    }

    /// Create the miner wallet and mine past the coinbase maturity window
    /// so that funding transactions have spendable inputs.
    pub async fn init(&self) -> anyhow::Result<()> {
        self.client.create_wallet(&self.miner_wallet).await?;

        let reward_address = self.client.get_new_address(&self.miner_wallet).await?;
        self.client
            .generate_to_address(101, &reward_address)
            .await?;

        Ok(())
    }

    pub async fn fund(&self, address: &str, amount: Amount) -> anyhow::Result<()> {
        let txid = self
            .client
            .send_to_address(&self.miner_wallet, address, amount)
            .await?;

        tracing::info!("funded {} with {} in {}", address, amount, txid);

        self.generate(1).await?;

        Ok(())
    }

    /// Confirm whatever is pending by mining `nblocks` blocks.
    pub async fn generate(&self, nblocks: u32) -> anyhow::Result<()> {
        let reward_address = self.client.get_new_address(&self.miner_wallet).await?;
        self.client
            .generate_to_address(nblocks, &reward_address)
            .await?;

        Ok(())
    }
}
