//! Bounded-retry polling against eventually-consistent external state.
//!
//! The daemon and the ledgers converge on their own clock; the only way to
//! observe them is to fetch a fresh snapshot and test a predicate on it.

use std::{
    fmt,
    time::{Duration, Instant},
};

/// How often to re-fetch and how long to keep trying.
///
/// The interval is fixed rather than exponential: state changes are driven
/// by the ledger's confirmation cadence, not by load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    pub interval: Duration,
    pub deadline: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            interval: Duration::from_millis(500),
            deadline: Duration::from_secs(60),
        }
    }
}

/// The predicate never became true within the deadline.
///
/// Carries the last snapshot we saw so a failing test reports what the
/// external state actually was instead of a bare timeout.
#[derive(Debug, thiserror::Error)]
#[error("predicate not satisfied within {deadline:?}, last observed state: {last_seen:?}")]
pub struct Timeout<S: fmt::Debug> {
    pub deadline: Duration,
    pub last_seen: Option<S>,
}

/// Poll `fetch` until `predicate` holds for the fetched state.
///
/// Returns the first satisfying state. Fetch errors are not retried: a
/// daemon that errors while being polled is a bug to surface, not a state
/// that is "not yet ready", and silently retrying it would report a
/// misleading timeout instead.
pub async fn until<S, F, Fut, P>(mut fetch: F, predicate: P, settings: Settings) -> anyhow::Result<S>
where
    S: fmt::Debug + Send + Sync + 'static,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<S>>,
    P: Fn(&S) -> bool,
{
    let started = Instant::now();
    let mut last_seen = None;

    loop {
        let state = fetch().await?;

        if predicate(&state) {
            return Ok(state);
        }

        tracing::debug!("state does not satisfy predicate yet: {:?}", state);
        last_seen = Some(state);

        if started.elapsed() + settings.interval >= settings.deadline {
            anyhow::bail!(Timeout {
                deadline: settings.deadline,
                last_seen,
            });
        }

        tokio::time::sleep(settings.interval).await;
    }
}
