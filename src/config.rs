//! Engine-facing settings for a harness run.
//!
//! All plain structured values, no behavior: scenarios either build these
//! in code via the `Default` impls or load them from a TOML file.

use crate::poll;
use anyhow::Context;
use serde::Deserialize;
use std::{path::Path, time::Duration};
use url::Url;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub poll: Poll,
    #[serde(default)]
    pub actor: ActorConfig,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct Poll {
    pub interval_ms: u64,
    pub deadline_secs: u64,
}

impl Default for Poll {
    fn default() -> Self {
        Poll {
            interval_ms: 500,
            deadline_secs: 60,
        }
    }
}

impl From<Poll> for poll::Settings {
    fn from(poll: Poll) -> Self {
        poll::Settings {
            interval: Duration::from_millis(poll.interval_ms),
            deadline: Duration::from_secs(poll.deadline_secs),
        }
    }
}

/// Per-actor overrides a scenario can dial in, e.g. a deliberately absurd
/// fee rate to provoke the daemon's validation.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ActorConfig {
    /// Fee rate in satoshi per weight unit passed along with Bitcoin
    /// redeem/refund actions.
    pub bitcoin_fee_per_wu: Option<u64>,
    /// Address the daemon should send redeemed/refunded bitcoin to.
    pub bitcoin_redeem_address: Option<String>,
    /// Slack allowed when reconciling Bitcoin balances after a swap,
    /// covering network fee variance.
    pub balance_tolerance_sat: u64,
}

impl Default for ActorConfig {
    fn default() -> Self {
        ActorConfig {
            bitcoin_fee_per_wu: None,
            bitcoin_redeem_address: None,
            balance_tolerance_sat: 100_000,
        }
    }
}

/// Where one actor's collaborators live.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Endpoints {
    pub swapd: Url,
    pub bitcoind: Url,
    pub ethereum_node: Url,
}

pub fn read<P: AsRef<Path>>(path: P) -> anyhow::Result<Settings> {
    let contents = std::fs::read_to_string(&path).with_context(|| {
        format!(
            "failed to read config file {}",
            path.as_ref().display()
        )
    })?;

    let settings = toml::from_str(&contents).context("failed to parse config file")?;

    Ok(settings)
}
