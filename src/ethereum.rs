//! Ethereum side of the harness, backed by a dev-mode node whose unlocked
//! coinbase account acts as the faucet.

use crate::jsonrpc;
use anyhow::Context;
use serde_json::json;
use url::Url;

/// A pre-funded or to-be-funded account on the dev chain.
///
/// Dev-mode nodes manage keys for us, so a wallet is just an account
/// address plus a client.
#[derive(Debug, Clone)]
pub struct Wallet {
    account: String,
    client: jsonrpc::Client,
}

impl Wallet {
    pub fn new(account: &str, node_url: Url) -> Self {
        Wallet {
            account: account.to_string(),
            client: jsonrpc::Client::new(node_url),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Balance in wei.
    pub async fn balance(&self) -> anyhow::Result<u128> {
        let quantity: String = self
            .client
            .send(jsonrpc::Request::new(
                "eth_getBalance",
                vec![
                    jsonrpc::serialize(&self.account)?,
                    jsonrpc::serialize("latest")?,
                ],
            ))
            .await?;

        parse_quantity(&quantity)
    }
}

/// Funding capability of the shared dev chain; transfers come out of the
/// node's first unlocked account and are mined immediately.
#[derive(Debug, Clone)]
pub struct Node {
    client: jsonrpc::Client,
}

impl Node {
    pub fn new(node_url: Url) -> Self {
        Node {
            client: jsonrpc::Client::new(node_url),
        }
    }

    pub async fn fund(&self, address: &str, wei: u128) -> anyhow::Result<()> {
        let faucet = self.faucet_account().await?;

        let txid: String = self
            .client
            .send(jsonrpc::Request::new(
                "eth_sendTransaction",
                vec![jsonrpc::serialize(json!({
                    "from": faucet,
                    "to": address,
                    "value": format!("{:#x}", wei),
                }))?],
            ))
            .await?;

        tracing::info!("funded {} with {} wei in {}", address, wei, txid);

        Ok(())
    }

    async fn faucet_account(&self) -> anyhow::Result<String> {
        let accounts: Vec<String> = self
            .client
            .send(jsonrpc::Request::new("eth_accounts", vec![]))
            .await?;

        accounts
            .into_iter()
            .next()
            .context("dev node has no unlocked accounts to fund from")
    }
}

fn parse_quantity(hex: &str) -> anyhow::Result<u128> {
    let digits = hex
        .strip_prefix("0x")
        .with_context(|| format!("quantity {} is missing the 0x prefix", hex))?;

    let quantity = u128::from_str_radix(digits, 16)
        .with_context(|| format!("failed to parse {} as a quantity", hex))?;

    Ok(quantity)
}
