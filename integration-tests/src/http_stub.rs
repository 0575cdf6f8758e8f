//! Serves a [`LocalCluster`] over HTTP: the worker's prpc JSON endpoints and
//! the node's `chain_getHeader` JSON-RPC method.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use jsonrpc_lite::{Id, JsonRpc, Params};
use phat_contract_client::{
    rpc::{ContractQueryRequest, ContractQueryResponse, PhactoryInfo},
    ChainRpc, WorkerRpc,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, task::JoinHandle};
use tracing::{error, info};

use crate::LocalCluster;

type Reply<T> = Result<Json<T>, (StatusCode, String)>;

fn internal(err: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

async fn get_info(State(cluster): State<Arc<LocalCluster>>) -> Reply<PhactoryInfo> {
    cluster.get_info().await.map(Json).map_err(internal)
}

async fn contract_query(
    State(cluster): State<Arc<LocalCluster>>,
    Json(request): Json<ContractQueryRequest>,
) -> Reply<ContractQueryResponse> {
    cluster.contract_query(request).await.map(Json).map_err(internal)
}

async fn json_rpc(
    State(cluster): State<Arc<LocalCluster>>,
    Json(request): Json<JsonRpc>,
) -> Json<JsonRpc> {
    let id = request.get_id().unwrap_or(Id::None(()));
    if request.get_method() != Some("chain_getHeader") {
        return Json(JsonRpc::error(id, jsonrpc_lite::Error::method_not_found()));
    }

    let hash = match request.get_params() {
        Some(Params::Array(params)) => params.first().and_then(Value::as_str).and_then(|param| {
            let mut hash = [0u8; 32];
            hex::decode_to_slice(param.trim_start_matches("0x"), &mut hash).ok().map(|()| hash)
        }),
        _ => None,
    };
    let header = match hash {
        Some(hash) => cluster.block_number(hash).await.ok(),
        None => None,
    }
    .map_or(Value::Null, |number| json!({ "number": format!("{number:#x}") }));
    Json(JsonRpc::success(id, &header))
}

pub struct HttpStub {
    pub addr: SocketAddr,
    task: JoinHandle<()>,
}

impl HttpStub {
    /// Binds an ephemeral localhost port and serves `cluster` until dropped.
    pub async fn spawn(cluster: Arc<LocalCluster>) -> Result<Self> {
        let app = Router::new()
            .route("/prpc/PhactoryAPI.GetInfo", post(get_info))
            .route("/prpc/PhactoryAPI.ContractQuery", post(contract_query))
            .route("/", post(json_rpc))
            .with_state(cluster);

        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;
        info!(%addr, "http stub listening");
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!(error = %e, "http stub stopped");
            }
        });
        Ok(Self { addr, task })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for HttpStub {
    fn drop(&mut self) {
        self.task.abort();
    }
}
