use anyhow::Context;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct Client {
    inner: reqwest::Client,
    url: reqwest::Url,
}

impl Client {
    pub fn new(url: reqwest::Url) -> Self {
        Client {
            inner: reqwest::Client::new(),
            url,
        }
    }

    pub async fn send<Res>(&self, request: Request) -> anyhow::Result<Res>
    where
        Res: DeserializeOwned,
    {
        self.send_with_url(self.url.clone(), request).await
    }

    pub async fn send_with_path<Res>(&self, path: String, request: Request) -> anyhow::Result<Res>
    where
        Res: DeserializeOwned,
    {
        let url = self.url.join(&path).context("invalid JSON-RPC path")?;
        self.send_with_url(url, request).await
    }

    async fn send_with_url<Res>(&self, url: reqwest::Url, request: Request) -> anyhow::Result<Res>
    where
        Res: DeserializeOwned,
    {
        let method = request.method.clone();

        let response = self
            .inner
            .post(url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("failed to send JSON-RPC request {}", method))?
            .json::<Response<Res>>()
            .await
            .with_context(|| format!("failed to deserialize response of {}", method))?;

        match response {
            Response {
                result: Some(result),
                ..
            } => Ok(result),
            Response {
                error: Some(error), ..
            } => Err(error.into()),
            _ => Err(anyhow::anyhow!(
                "JSON-RPC response to {} contained neither result nor error",
                method
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Request {
    jsonrpc: &'static str,
    id: &'static str,
    method: String,
    params: Vec<serde_json::Value>,
}

impl Request {
    pub fn new(method: &str, params: Vec<serde_json::Value>) -> Self {
        Request {
            jsonrpc: "1.0",
            id: "swapd-harness",
            method: method.to_string(),
            params,
        }
    }
}

pub fn serialize<T>(t: T) -> anyhow::Result<serde_json::Value>
where
    T: Serialize,
{
    let value = serde_json::to_value(t).context("failed to serialize JSON-RPC parameter")?;

    Ok(value)
}

#[derive(Debug, Deserialize)]
struct Response<R> {
    result: Option<R>,
    error: Option<Error>,
}

#[derive(Debug, Deserialize, thiserror::Error)]
#[error("JSON-RPC request failed with code {code}: {message}")]
pub struct Error {
    code: i32,
    message: String,
}
