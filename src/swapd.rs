//! Typed HTTP client for one actor's swap daemon.
//!
//! The daemon is a black box to the harness: we create swaps, read back the
//! state it reports and execute whichever actions it currently offers. Any
//! response that deviates from the expected shape is surfaced verbatim, so
//! a scenario failure points at the daemon rather than at the harness.

use crate::swap::{SwapId, SwapRequest, SwapState};
use anyhow::Context;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Client {
    inner: reqwest::Client,
    base: Url,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Info {
    pub id: String,
    pub listen_addresses: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Peer {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SwapSummary {
    pub id: SwapId,
    pub protocol: String,
}

/// An action the daemon currently offers on a swap. Executable by POSTing
/// to its href; offered only while its preconditions hold.
#[derive(Debug, Clone, Deserialize)]
pub struct Action {
    pub name: String,
    pub href: String,
}

/// The raw outcome of executing an action.
///
/// 4xx responses are data, not errors: scenarios assert on the exact
/// status code and problem title the daemon produced.
#[derive(Debug, Clone)]
pub struct ActionResponse {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

impl ActionResponse {
    /// The `title` field of an RFC 7807 style problem body, if present.
    pub fn title(&self) -> Option<&str> {
        self.body.get("title").and_then(|title| title.as_str())
    }
}

/// The daemon answered with a status or body the harness did not expect
/// where a well-formed 2xx was required.
#[derive(Debug, thiserror::Error)]
#[error("unexpected response from swap daemon: {status}: {body}")]
pub struct UnexpectedResponse {
    pub status: StatusCode,
    pub body: String,
}

impl Client {
    pub fn new(base: Url) -> Self {
        Client {
            inner: reqwest::Client::new(),
            base,
        }
    }

    pub async fn info(&self) -> anyhow::Result<Info> {
        self.get_json("/info").await
    }

    pub async fn dial(&self, address: &str) -> anyhow::Result<()> {
        let url = self.url("/dial")?;
        let response = self
            .inner
            .post(url)
            .json(&serde_json::json!({ "address": address }))
            .send()
            .await
            .context("failed to reach swap daemon")?;

        ensure_success(response).await?;

        Ok(())
    }

    pub async fn peers(&self) -> anyhow::Result<Vec<Peer>> {
        #[derive(Debug, Deserialize)]
        struct Peers {
            peers: Vec<Peer>,
        }

        let peers: Peers = self.get_json("/peers").await?;

        Ok(peers.peers)
    }

    /// Create a swap; the daemon reports where it lives via `Location`.
    pub async fn create_swap(
        &self,
        protocol: &str,
        request: &SwapRequest,
    ) -> anyhow::Result<SwapId> {
        let url = self.url(&format!("/swaps/{}", protocol))?;
        let response = self
            .inner
            .post(url)
            .json(request)
            .send()
            .await
            .context("failed to reach swap daemon")?;

        anyhow::ensure!(
            response.status() == StatusCode::CREATED,
            UnexpectedResponse {
                status: response.status(),
                body: response.text().await.unwrap_or_default(),
            }
        );

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .context("daemon did not report the swap's location")?
            .to_str()
            .context("swap location is not valid UTF-8")?;

        let id = location
            .rsplit('/')
            .next()
            .with_context(|| format!("cannot extract swap id from location {}", location))?
            .parse::<SwapId>()
            .with_context(|| format!("swap location {} does not end in a swap id", location))?;

        Ok(id)
    }

    pub async fn swaps(&self) -> anyhow::Result<Vec<SwapSummary>> {
        #[derive(Debug, Deserialize)]
        struct Swaps {
            swaps: Vec<SwapSummary>,
        }

        let swaps: Swaps = self.get_json("/swaps").await?;

        Ok(swaps.swaps)
    }

    pub async fn swap_state(&self, protocol: &str, id: SwapId) -> anyhow::Result<SwapState> {
        self.get_json(&format!("/swaps/{}/{}/state", protocol, id))
            .await
    }

    pub async fn actions(&self, protocol: &str, id: SwapId) -> anyhow::Result<Vec<Action>> {
        #[derive(Debug, Deserialize)]
        struct SwapResource {
            actions: Vec<Action>,
        }

        let resource: SwapResource = self.get_json(&format!("/swaps/{}/{}", protocol, id)).await?;

        Ok(resource.actions)
    }

    /// Execute an offered action, passing any ledger-specific execution
    /// parameters (e.g. a fee rate override) as query parameters.
    ///
    /// The response is returned whatever its status; deciding whether a
    /// 4xx is a failure belongs to the step that requested the action.
    pub async fn execute(
        &self,
        action: &Action,
        parameters: &[(String, String)],
    ) -> anyhow::Result<ActionResponse> {
        let url = self.url(&action.href)?;
        let response = self
            .inner
            .post(url)
            .query(parameters)
            .send()
            .await
            .context("failed to reach swap daemon")?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        // non-JSON bodies still reach assertions verbatim
        let body = if text.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        };

        Ok(ActionResponse { status, body })
    }

    async fn get_json<T>(&self, path: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.url(path)?;
        let response = self
            .inner
            .get(url)
            .send()
            .await
            .context("failed to reach swap daemon")?;

        let response = ensure_success(response).await?;

        let value = response
            .json()
            .await
            .with_context(|| format!("failed to deserialize response of GET {}", path))?;

        Ok(value)
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("cannot build daemon url for {}", path))
    }
}

async fn ensure_success(response: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!(UnexpectedResponse { status, body });
    }

    Ok(response)
}
