use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use jsonrpc_lite::{JsonRpc, Params};
use phat_contract_primitives::Hash;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::trace;

use super::{ChainRpc, ContractQueryRequest, ContractQueryResponse, PhactoryInfo, WorkerRpc};
use crate::{Error, Result};

fn transport(err: reqwest::Error) -> Error {
    Error::Transport(err.to_string())
}

/// Worker endpoint reached over its JSON prpc interface.
#[derive(Clone, Debug)]
pub struct HttpWorkerClient {
    base: String,
    client: Client,
}

impl HttpWorkerClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_client(base, Client::new())
    }

    pub fn with_client(base: impl Into<String>, client: Client) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self { base, client }
    }

    async fn call<Req, Resp>(&self, method: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/prpc/PhactoryAPI.{method}?json", self.base);
        trace!(%url, "worker request");
        let resp = self.client.post(&url).json(body).send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Transport(format!("{method}: HTTP {status}: {text}")));
        }
        resp.json().await.map_err(transport)
    }
}

#[async_trait]
impl WorkerRpc for HttpWorkerClient {
    async fn get_info(&self) -> Result<PhactoryInfo> {
        self.call("GetInfo", &serde_json::json!({})).await
    }

    async fn contract_query(&self, request: ContractQueryRequest) -> Result<ContractQueryResponse> {
        self.call("ContractQuery", &request).await
    }
}

#[derive(Deserialize)]
struct Header {
    /// Hex quantity, e.g. `"0x1a2b"`.
    number: String,
}

/// Chain node reached over HTTP JSON-RPC.
#[derive(Debug)]
pub struct JsonRpcChainClient {
    url: String,
    client: Client,
    next_id: AtomicI64,
}

impl JsonRpcChainClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, Client::new())
    }

    pub fn with_client(url: impl Into<String>, client: Client) -> Self {
        Self { url: url.into(), client, next_id: AtomicI64::new(1) }
    }

    /// Calls `method`; a `null` result comes back as `None`.
    async fn request<P, R>(&self, method: &str, params: P) -> Result<Option<R>>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let rpc_req = JsonRpc::request_with_params(id, method, Params::from(json!(params)));
        let rpc_res: JsonRpc = self
            .client
            .post(&self.url)
            .json(&rpc_req)
            .send()
            .await
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;
        if let Some(err) = rpc_res.get_error() {
            return Err(Error::Transport(format!("{method}: rpc error {}: {}", err.code, err.message)));
        }
        match rpc_res.get_result() {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| Error::Transport(format!("{method}: malformed result: {e}"))),
        }
    }
}

#[async_trait]
impl ChainRpc for JsonRpcChainClient {
    async fn block_number(&self, hash: Hash) -> Result<u32> {
        let hash_hex = format!("0x{}", hex::encode(hash));
        let header: Header = self
            .request("chain_getHeader", [hash_hex.as_str()])
            .await?
            .ok_or_else(|| Error::Transport(format!("unknown block {hash_hex}")))?;
        parse_quantity(&header.number)
    }
}

fn parse_quantity(text: &str) -> Result<u32> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    u32::from_str_radix(digits, 16)
        .map_err(|e| Error::Transport(format!("bad block number {text}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_numbers_are_hex_quantities() {
        assert_eq!(parse_quantity("0x1a").unwrap(), 26);
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert!(parse_quantity("0xzz").is_err());
    }
}
