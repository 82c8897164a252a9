//! HTTP API for the faucet service

use crate::registry::{AssetPolicy, ExplorerSet};
use crate::service::{DispenseRequest, FaucetService};
use crate::wallet::FaucetWallet;
use axum::{
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Fallback client identifier when no forwarded address is present.
/// Clients sharing it (or sharing a proxy address) share an allowance;
/// an accepted limitation.
const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Serialize)]
struct SendResponse {
    hash: String,
}

#[derive(Debug, Serialize)]
struct ConfigResponse {
    chains: Vec<ChainConfigView>,
}

#[derive(Debug, Serialize)]
struct ChainConfigView {
    id: u64,
    #[serde(rename = "blockExplorers")]
    block_explorers: ExplorerSet,
    faucet: FaucetConfigView,
}

#[derive(Debug, Serialize)]
struct FaucetConfigView {
    recalibrate: u64,
    assets: Vec<AssetPolicy>,
    /// The faucet wallet address for this chain, derived from its secret.
    address: String,
}

/// Build the service router.
pub fn router(service: Arc<FaucetService>) -> Router {
    Router::new()
        .route("/faucet/config", get(config_handler))
        .route("/faucet/send", post(send_handler))
        .route("/health", get(health_handler))
        .with_state(service)
}

/// `POST /faucet/send`
async fn send_handler(
    State(service): State<Arc<FaucetService>>,
    headers: HeaderMap,
    Json(request): Json<DispenseRequest>,
) -> impl IntoResponse {
    let client_id = client_id(&headers);
    info!(
        %client_id,
        chain_id = ?request.chain_id,
        address = ?request.address,
        receiver = ?request.receiver,
        "dispense request"
    );

    match service.dispense(&request, &client_id).await {
        Ok(hash) => Json(SendResponse { hash }).into_response(),
        Err(e) => e.into_response(),
    }
}

/// `GET /faucet/config`
///
/// Lists dispensing chains with their faucet policies and wallet addresses.
/// Faucet chains whose secret cannot be resolved are silently omitted.
async fn config_handler(State(service): State<Arc<FaucetService>>) -> Json<ConfigResponse> {
    let chains = service
        .registry()
        .faucet_chains()
        .filter_map(|chain| {
            let policy = chain.faucet.as_ref()?;
            let wallet = FaucetWallet::from_env(chain.id).ok()?;
            Some(ChainConfigView {
                id: chain.id,
                block_explorers: chain.block_explorers.clone(),
                faucet: FaucetConfigView {
                    recalibrate: policy.recalibrate,
                    assets: policy.assets.clone(),
                    address: wallet.address().to_string(),
                },
            })
        })
        .collect();

    Json(ConfigResponse { chains })
}

/// `GET /health`
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Client identity: the forwarded-address header value, else a sentinel.
fn client_id(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_id_from_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));
        assert_eq!(client_id(&headers), "203.0.113.9");
    }

    #[test]
    fn test_client_id_fallback() {
        assert_eq!(client_id(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn test_client_id_non_utf8_header_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap());
        assert_eq!(client_id(&headers), "unknown");
    }
}
