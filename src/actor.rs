//! One party to a swap, as the test sees it: ledger wallets, a daemon
//! handle and the protocol-shaped verbs scenarios are written in.

use crate::{
    bitcoin,
    config::ActorConfig,
    ethereum, poll,
    swap::{ActionKind, SwapId, SwapRequest, SwapState},
    swapd,
};
use anyhow::Context;
use std::sync::RwLock;
use url::Url;

#[derive(Debug)]
pub struct Actor {
    name: String,
    swapd: swapd::Client,
    wallets: Wallets,
    config: ActorConfig,
    poll: poll::Settings,
    swap: RwLock<Option<ActiveSwap>>,
    starting_balances: RwLock<Option<Balances>>,
}

/// One wallet per supported ledger, all drawing from shared regtest nodes.
#[derive(Debug, Clone)]
pub struct Wallets {
    pub bitcoin: bitcoin::Wallet,
    pub ethereum: ethereum::Wallet,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ActiveSwap {
    protocol: String,
    id: SwapId,
}

#[derive(Clone, Copy, Debug)]
pub struct Balances {
    pub bitcoin: bitcoin::Amount,
    pub ether: u128,
}

/// The requested action is not in the daemon's currently offered set.
///
/// Usually a protocol-sequencing bug in the scenario itself rather than in
/// the daemon, hence the offered list in the message.
#[derive(Debug, thiserror::Error)]
#[error("action {requested} is not currently offered by the daemon, offered actions: {offered:?}")]
pub struct ActionNotAvailable {
    pub requested: ActionKind,
    pub offered: Vec<String>,
}

impl Actor {
    pub fn new(
        name: &str,
        swapd_url: Url,
        wallets: Wallets,
        config: ActorConfig,
        poll: poll::Settings,
    ) -> Self {
        Actor {
            name: name.to_string(),
            swapd: swapd::Client::new(swapd_url),
            wallets,
            config,
            poll,
            swap: RwLock::new(None),
            starting_balances: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn swapd(&self) -> &swapd::Client {
        &self.swapd
    }

    pub fn wallets(&self) -> &Wallets {
        &self.wallets
    }

    pub async fn peer_id(&self) -> anyhow::Result<String> {
        let info = self.swapd.info().await?;

        Ok(info.id)
    }

    /// Dial the counterparty's daemon and wait until our own daemon lists
    /// it as a peer. Swaps negotiated before connectivity exists never
    /// propagate, so scenarios call this first.
    pub async fn connect(&self, other: &Actor) -> anyhow::Result<()> {
        let other_info = other
            .swapd
            .info()
            .await
            .with_context(|| format!("failed to look up {}'s daemon", other.name))?;
        let address = other_info
            .listen_addresses
            .first()
            .with_context(|| format!("{}'s daemon has no listen addresses", other.name))?;

        self.swapd.dial(address).await?;

        poll::until(
            || self.swapd.peers(),
            |peers| peers.iter().any(|peer| peer.id == other_info.id),
            self.poll,
        )
        .await
        .with_context(|| format!("{} never connected to {}", self.name, other.name))?;

        tracing::info!("{} is connected to {}", self.name, other.name);

        Ok(())
    }

    pub async fn create_swap(
        &self,
        protocol: &str,
        request: &SwapRequest,
    ) -> anyhow::Result<SwapId> {
        let id = self.swapd.create_swap(protocol, request).await?;

        tracing::info!("{} created swap {}", self.name, id);

        *self.swap.write().expect("lock poisoned") = Some(ActiveSwap {
            protocol: protocol.to_string(),
            id,
        });

        Ok(id)
    }

    /// Wait until a swap is visible in this actor's own daemon.
    ///
    /// Counterpart-initiated swaps take a network round-trip to show up
    /// locally; everything after this call can rely on the swap existing.
    pub async fn wait_for_swap(&self) -> anyhow::Result<SwapId> {
        let swaps = poll::until(|| self.swapd.swaps(), |swaps| !swaps.is_empty(), self.poll)
            .await
            .with_context(|| format!("no swap ever appeared in {}'s daemon", self.name))?;

        let summary = swaps
            .into_iter()
            .next()
            .context("polled swap list is empty")?;

        tracing::info!("{} sees swap {}", self.name, summary.id);

        *self.swap.write().expect("lock poisoned") = Some(ActiveSwap {
            protocol: summary.protocol,
            id: summary.id,
        });

        Ok(summary.id)
    }

    pub async fn swap_state(&self) -> anyhow::Result<SwapState> {
        let ActiveSwap { protocol, id } = self.active_swap()?;

        self.swapd.swap_state(&protocol, id).await
    }

    /// Look the requested kind up in the daemon's currently offered
    /// actions, failing with [`ActionNotAvailable`] if it is absent.
    pub async fn next_action(&self, kind: ActionKind) -> anyhow::Result<swapd::Action> {
        let ActiveSwap { protocol, id } = self.active_swap()?;
        let actions = self.swapd.actions(&protocol, id).await?;

        let action = actions
            .iter()
            .find(|action| action.name == kind.name())
            .cloned()
            .ok_or_else(|| ActionNotAvailable {
                requested: kind,
                offered: actions.into_iter().map(|action| action.name).collect(),
            })?;

        Ok(action)
    }

    /// Resolve and execute `kind`, returning the raw response.
    pub async fn execute_action(&self, kind: ActionKind) -> anyhow::Result<swapd::ActionResponse> {
        let action = self.next_action(kind).await?;

        tracing::info!("{} executes {}", self.name, kind);

        self.swapd
            .execute(&action, &self.execution_parameters(kind))
            .await
    }

    /// Execute `kind` and require it to succeed; a non-2xx here means the
    /// daemon rejected an action it had offered.
    pub async fn assert_and_execute_next_action(
        &self,
        kind: ActionKind,
    ) -> anyhow::Result<swapd::ActionResponse> {
        let response = self.execute_action(kind).await?;

        anyhow::ensure!(
            response.status.is_success(),
            swapd::UnexpectedResponse {
                status: response.status,
                body: response.body.to_string(),
            }
        );

        Ok(response)
    }

    /// Ledger-specific parameters the daemon demands when executing an
    /// action, taken from this actor's configuration.
    pub fn execution_parameters(&self, kind: ActionKind) -> Vec<(String, String)> {
        let mut parameters = Vec::new();

        if let ActionKind::Redeem | ActionKind::Refund = kind {
            if let Some(address) = &self.config.bitcoin_redeem_address {
                parameters.push(("address".to_string(), address.clone()));
            }
            if let Some(fee_per_wu) = self.config.bitcoin_fee_per_wu {
                parameters.push(("fee_per_wu".to_string(), fee_per_wu.to_string()));
            }
        }

        parameters
    }

    pub async fn fund_bitcoin(
        &self,
        node: &bitcoin::Node,
        amount: bitcoin::Amount,
    ) -> anyhow::Result<()> {
        let address = self.wallets.bitcoin.new_address().await?;
        node.fund(&address, amount).await
    }

    pub async fn fund_ether(&self, node: &ethereum::Node, wei: u128) -> anyhow::Result<()> {
        node.fund(self.wallets.ethereum.account(), wei).await
    }

    /// Snapshot both ledger balances; the post-swap assertion reconciles
    /// against this snapshot.
    pub async fn record_balances(&self) -> anyhow::Result<Balances> {
        let balances = Balances {
            bitcoin: self.wallets.bitcoin.balance().await?,
            ether: self.wallets.ethereum.balance().await?,
        };

        *self.starting_balances.write().expect("lock poisoned") = Some(balances);

        Ok(balances)
    }

    /// Verify that each ledger balance moved by the traded quantity.
    ///
    /// Bitcoin is checked within the configured tolerance because the
    /// spending side also pays network fees; ether is exact since regtest
    /// dev chains run with a zero gas price.
    pub async fn assert_balances_after_swap(
        &self,
        bitcoin_delta_sat: i64,
        ether_delta_wei: i128,
    ) -> anyhow::Result<()> {
        let starting = *self.starting_balances.read().expect("lock poisoned");
        let starting = starting.context("balances were never recorded for this actor")?;

        let bitcoin_final = self.wallets.bitcoin.balance().await?;
        let tolerance = bitcoin::Amount::from_sat(self.config.balance_tolerance_sat);

        anyhow::ensure!(
            bitcoin_balance_reconciles(starting.bitcoin, bitcoin_delta_sat, bitcoin_final, tolerance),
            "{}'s bitcoin balance does not reconcile: started with {}, expected change of {} sat (tolerance {}), ended with {}",
            self.name,
            starting.bitcoin,
            bitcoin_delta_sat,
            tolerance,
            bitcoin_final,
        );

        let ether_final = self.wallets.ethereum.balance().await?;
        let ether_expected = starting.ether as i128 + ether_delta_wei;

        anyhow::ensure!(
            ether_final as i128 == ether_expected,
            "{}'s ether balance does not reconcile: started with {} wei, expected change of {} wei, ended with {} wei",
            self.name,
            starting.ether,
            ether_delta_wei,
            ether_final,
        );

        Ok(())
    }

    fn active_swap(&self) -> anyhow::Result<ActiveSwap> {
        self.swap
            .read()
            .expect("lock poisoned")
            .clone()
            .context("no active swap, create one or wait for one first")
    }
}

/// Fees only ever lower the final balance, so the actual balance must sit
/// in `[expected - tolerance, expected]`.
fn bitcoin_balance_reconciles(
    starting: bitcoin::Amount,
    delta_sat: i64,
    actual: bitcoin::Amount,
    tolerance: bitcoin::Amount,
) -> bool {
    let expected = starting.to_sat() as i128 + delta_sat as i128;
    let actual = actual.to_sat() as i128;
    let tolerance = tolerance.to_sat() as i128;

    actual >= expected - tolerance && actual <= expected
}
