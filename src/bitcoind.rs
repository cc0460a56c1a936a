use crate::jsonrpc;
use anyhow::Context;
use bitcoin::Amount;
use serde::Deserialize;

/// Thin client for the subset of bitcoind's RPC interface the harness
/// needs: wallet management, funding, balances and block generation.
#[derive(Debug, Clone)]
pub struct Client {
    rpc_client: jsonrpc::Client,
}

impl Client {
    pub fn new(url: reqwest::Url) -> Self {
        Client {
            rpc_client: jsonrpc::Client::new(url),
        }
    }

    pub async fn network(&self) -> anyhow::Result<String> {
        let blockchain_info = self
            .rpc_client
            .send::<BlockchainInfo>(jsonrpc::Request::new("getblockchaininfo", vec![]))
            .await?;

        Ok(blockchain_info.chain)
    }

    pub async fn create_wallet(&self, wallet_name: &str) -> anyhow::Result<()> {
        let _: serde_json::Value = self
            .rpc_client
            .send(jsonrpc::Request::new(
                "createwallet",
                vec![jsonrpc::serialize(wallet_name)?],
            ))
            .await?;

        Ok(())
    }

    pub async fn get_new_address(&self, wallet_name: &str) -> anyhow::Result<String> {
        let address = self
            .rpc_client
            .send_with_path(
                format!("/wallet/{}", wallet_name),
                jsonrpc::Request::new("getnewaddress", vec![]),
            )
            .await?;

        Ok(address)
    }

    pub async fn get_balance(&self, wallet_name: &str) -> anyhow::Result<Amount> {
        let balance: f64 = self
            .rpc_client
            .send_with_path(
                format!("/wallet/{}", wallet_name),
                jsonrpc::Request::new("getbalance", vec![]),
            )
            .await?;

        let amount = Amount::from_btc(balance).context("balance is not a valid amount")?;

        Ok(amount)
    }

    pub async fn send_to_address(
        &self,
        wallet_name: &str,
        address: &str,
        amount: Amount,
    ) -> anyhow::Result<String> {
        let txid = self
            .rpc_client
            .send_with_path(
                format!("/wallet/{}", wallet_name),
                jsonrpc::Request::new(
                    "sendtoaddress",
                    vec![
                        jsonrpc::serialize(address)?,
                        jsonrpc::serialize(amount.to_btc())?,
                    ],
                ),
            )
            .await?;

        Ok(txid)
    }

    pub async fn generate_to_address(
        &self,
        nblocks: u32,
        address: &str,
    ) -> anyhow::Result<Vec<String>> {
        let block_hashes = self
            .rpc_client
            .send(jsonrpc::Request::new(
                "generatetoaddress",
                vec![jsonrpc::serialize(nblocks)?, jsonrpc::serialize(address)?],
            ))
            .await?;

        Ok(block_hashes)
    }
}

#[derive(Debug, Deserialize)]
struct BlockchainInfo {
    chain: String,
}
