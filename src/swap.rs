//! Wire-level values exchanged with a swap daemon.
//!
//! Everything in here mirrors what the daemon reports over HTTP. The
//! harness only ever reads these values, it never owns the swap itself.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SwapId(Uuid);

impl Default for SwapId {
    fn default() -> Self {
        SwapId(Uuid::new_v4())
    }
}

impl fmt::Display for SwapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SwapId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SwapId(Uuid::from_str(s)?))
    }
}

/// A ledger as the daemon identifies it, e.g. `bitcoin` on `regtest`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ledger {
    pub name: String,
    pub network: String,
}

impl Ledger {
    pub fn new(name: &str, network: &str) -> Self {
        Ledger {
            name: name.to_string(),
            network: network.to_string(),
        }
    }
}

/// An asset and its quantity in the asset's smallest unit, as a decimal
/// string. Quantities can exceed `u64` (wei), hence the string.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub quantity: String,
}

impl Asset {
    pub fn new(name: &str, quantity: impl fmt::Display) -> Self {
        Asset {
            name: name.to_string(),
            quantity: quantity.to_string(),
        }
    }
}

/// The immutable description of the trade, sent verbatim to the daemon.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwapRequest {
    pub alpha_ledger: Ledger,
    pub beta_ledger: Ledger,
    pub alpha_asset: Asset,
    pub beta_asset: Asset,
    /// Seconds since epoch at which the alpha HTLC expires.
    pub alpha_expiry: u32,
    /// Seconds since epoch at which the beta HTLC expires.
    pub beta_expiry: u32,
    pub alpha_ledger_refund_identity: String,
    /// Peer id of the counterparty's daemon.
    pub peer: String,
}

/// The daemon's view of one swap, fetched fresh on every poll.
///
/// Snapshots are monotone for the fields step predicates inspect; the
/// engine reads and compares them but never writes them back.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwapState {
    pub communication: Communication,
    pub alpha_ledger: LedgerState,
    pub beta_ledger: LedgerState,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Communication {
    pub status: CommunicationStatus,
    pub alpha_expiry: u32,
    pub beta_expiry: u32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommunicationStatus {
    Sent,
    Accepted,
    Declined,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerState {
    pub status: LedgerStatus,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LedgerStatus {
    None,
    Deployed,
    Funded,
    Redeemed,
    Refunded,
    IncorrectlyFunded,
}

/// The closed set of actions a daemon can offer on a swap.
///
/// Which of these are actually executable at any point in time is decided
/// by the daemon; the harness looks the kind up in the offered list by its
/// wire name instead of assuming it is callable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Accept,
    Decline,
    Deploy,
    Fund,
    Redeem,
    Refund,
}

impl ActionKind {
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::Accept => "accept",
            ActionKind::Decline => "decline",
            ActionKind::Deploy => "deploy",
            ActionKind::Fund => "fund",
            ActionKind::Redeem => "redeem",
            ActionKind::Refund => "refund",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
