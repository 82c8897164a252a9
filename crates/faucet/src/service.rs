//! Request orchestration: validate, admit, check solvency, dispatch.

use crate::error::{FaucetError, FaucetResult};
use crate::limiter::RateLimiter;
use crate::registry::{AssetId, Chain, ChainRegistry};
use crate::rpc::RpcClient;
use crate::tx::{self, PreparedTransaction};
use crate::wallet::FaucetWallet;
use crate::fees;
use faucet_common::{to_base_units, Address};
use num_bigint::BigUint;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// An inbound dispense request. Fields are optional so that missing
/// parameters surface as a faucet error rather than a deserialization
/// failure.
#[derive(Debug, Clone, Deserialize)]
pub struct DispenseRequest {
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// `"native"` or an ERC20 contract address.
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub receiver: Option<String>,
}

pub struct FaucetService {
    registry: ChainRegistry,
    limiter: RateLimiter,
    rpc: RpcClient,
    /// One lock per dispensing chain: nonce fetch through broadcast must
    /// not interleave for the same faucet wallet.
    dispatch_locks: HashMap<u64, Mutex<()>>,
}

impl FaucetService {
    pub fn new(registry: ChainRegistry, limiter: RateLimiter, rpc: RpcClient) -> Self {
        let dispatch_locks =
            registry.faucet_chains().map(|c| (c.id, Mutex::new(()))).collect();
        Self { registry, limiter, rpc, dispatch_locks }
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// Run one request through the full pipeline and return the broadcast
    /// transaction hash.
    ///
    /// The pipeline runs exactly once; no stage is retried. A client that
    /// resubmits after a dispatch failure re-enters rate-limit accounting,
    /// so a failed send still consumes an allowance slot.
    pub async fn dispense(
        &self,
        request: &DispenseRequest,
        client_id: &str,
    ) -> FaucetResult<String> {
        let invalid = || FaucetError::InvalidRequest("Invalid parameters passed!".to_string());

        // Received -> Validated
        let chain_id = request.chain_id.ok_or_else(invalid)?;
        let asset_id: AssetId =
            request.address.as_deref().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
        let receiver: Address =
            request.receiver.as_deref().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;

        let chain = self
            .registry
            .chain(chain_id)
            .filter(|c| c.faucet.is_some())
            .ok_or_else(|| {
                FaucetError::InvalidRequest("Faucet config cannot be found!".to_string())
            })?;
        let asset = chain.asset(&asset_id).ok_or_else(|| {
            FaucetError::InvalidRequest("Asset config cannot be found!".to_string())
        })?;

        // Validated -> Admitted
        if !self.limiter.admit(client_id, asset.rate_limit.max_limit, asset.rate_limit.window())
        {
            return Err(FaucetError::RateLimited);
        }

        // Admitted -> Solvent
        let wallet = FaucetWallet::from_env(chain.id)?;
        let drip = to_base_units(&asset.drip_amount, asset.decimals)
            .map_err(|e| FaucetError::Internal(format!("bad drip amount in config: {e}")))?;
        let balance = self.balance(chain, &asset_id, &wallet.address()).await?;
        if drip >= balance {
            warn!(
                chain_id = chain.id,
                asset = %asset_id,
                %balance,
                "faucet balance too low to dispense"
            );
            return Err(FaucetError::InsufficientBalance);
        }

        // Solvent -> Dispatched. Serialized per chain so concurrent
        // dispenses cannot race on the wallet's nonce.
        let lock = self
            .dispatch_locks
            .get(&chain.id)
            .ok_or_else(|| FaucetError::Internal("missing dispatch lock".to_string()))?;
        let _guard = lock.lock().await;

        let gas_price =
            fees::estimate(&self.rpc, &chain.rpc_url).await.map_err(as_dispatch_failure)?;
        let prepared = match asset_id {
            AssetId::Native => PreparedTransaction::native_transfer(receiver, drip, gas_price),
            AssetId::Contract(token) => {
                PreparedTransaction::token_transfer(token, receiver, &drip, gas_price)?
            }
        };

        let nonce = self
            .rpc
            .transaction_count(&chain.rpc_url, &wallet.address())
            .await
            .map_err(as_dispatch_failure)?;
        let raw = prepared.encode_signed(&wallet, chain.id, nonce)?;
        let hash = self
            .rpc
            .send_raw_transaction(&chain.rpc_url, &raw)
            .await
            .map_err(as_dispatch_failure)?;

        info!(chain_id = chain.id, asset = %asset_id, %receiver, %hash, "dispensed");
        Ok(hash)
    }

    /// The faucet wallet's holdings of `asset` on `chain`, in base units.
    pub async fn balance(
        &self,
        chain: &Chain,
        asset: &AssetId,
        wallet: &Address,
    ) -> FaucetResult<BigUint> {
        match asset {
            AssetId::Native => self.rpc.native_balance(&chain.rpc_url, wallet).await,
            AssetId::Contract(token) => {
                let data = tx::erc20_balance_of_data(wallet);
                self.rpc.call_for_quantity(&chain.rpc_url, token, &data).await
            }
        }
    }
}

/// RPC failures from fee estimation onward surface as `DispatchFailed`
/// carrying the node's message verbatim. `FeeUnavailable` passes through
/// untouched.
fn as_dispatch_failure(err: FaucetError) -> FaucetError {
    match err {
        FaucetError::Rpc(msg) => FaucetError::DispatchFailed(msg),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn service() -> FaucetService {
        let registry = ChainRegistry::builtin();
        let ttl = registry.max_rate_limit_window();
        let limiter = RateLimiter::new(10_000, ttl, ttl);
        FaucetService::new(registry, limiter, RpcClient::new())
    }

    fn request(chain_id: Option<u64>, address: &str, receiver: &str) -> DispenseRequest {
        DispenseRequest {
            chain_id,
            address: Some(address.to_string()),
            receiver: Some(receiver.to_string()),
        }
    }

    const RECEIVER: &str = "0xd737192fb95e5d106a459a69faec4a7bd38c2a17";

    #[tokio::test]
    async fn test_missing_parameters_rejected() {
        let svc = service();
        let req = DispenseRequest { chain_id: None, address: None, receiver: None };
        let err = svc.dispense(&req, "1.1.1.1").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameters passed!");
    }

    #[tokio::test]
    async fn test_malformed_addresses_rejected() {
        let svc = service();
        let err = svc
            .dispense(&request(Some(43113), "not-an-address", RECEIVER), "1.1.1.2")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameters passed!");

        let err = svc
            .dispense(&request(Some(43113), "native", "0x1234"), "1.1.1.3")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameters passed!");
    }

    #[tokio::test]
    async fn test_unknown_chain_rejected() {
        let svc = service();
        let err =
            svc.dispense(&request(Some(1), "native", RECEIVER), "1.1.1.4").await.unwrap_err();
        assert_eq!(err.to_string(), "Faucet config cannot be found!");
    }

    #[tokio::test]
    async fn test_chain_without_faucet_policy_rejected() {
        // Echo is in the registry but carries no faucet policy; it must be
        // rejected before any wallet or RPC interaction.
        let svc = service();
        let err = svc
            .dispense(&request(Some(173750), "native", RECEIVER), "1.1.1.5")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Faucet config cannot be found!");
    }

    #[tokio::test]
    async fn test_unknown_asset_rejected() {
        let svc = service();
        let err = svc
            .dispense(
                &request(Some(43113), "0x0000000000000000000000000000000000000009", RECEIVER),
                "1.1.1.6",
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Asset config cannot be found!");
    }

    #[tokio::test]
    async fn test_failed_attempt_consumes_allowance() {
        // No PK_43113 in the environment: the first request passes admission
        // and then fails at the wallet stage. The second request from the
        // same client is already rate limited (max_limit is 1 on Fuji),
        // because admission happens before dispatch.
        let svc = service();
        let req = request(Some(43113), "native", RECEIVER);

        let first = svc.dispense(&req, "9.9.9.9").await.unwrap_err();
        assert!(matches!(first, FaucetError::WalletUnavailable));

        let second = svc.dispense(&req, "9.9.9.9").await.unwrap_err();
        assert!(matches!(second, FaucetError::RateLimited));
    }

    #[tokio::test]
    async fn test_validation_failures_do_not_consume_allowance() {
        let svc = service();

        // Unsupported asset requests never reach the limiter.
        for _ in 0..5 {
            let err = svc
                .dispense(
                    &request(Some(43113), "0x0000000000000000000000000000000000000009", RECEIVER),
                    "8.8.8.8",
                )
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Asset config cannot be found!");
        }

        // The client's full allowance is still available afterwards.
        let err = svc
            .dispense(&request(Some(43113), "native", RECEIVER), "8.8.8.8")
            .await
            .unwrap_err();
        assert!(matches!(err, FaucetError::WalletUnavailable));
    }

    #[test]
    fn test_solvency_comparison_is_strict() {
        // Equality counts as insufficient: drip >= balance rejects.
        let drip = to_base_units("0.05", 18).unwrap();
        let exactly_one_drip = drip.clone();
        assert!(drip >= exactly_one_drip);

        let one_more = &drip + 1u32;
        assert!(drip < one_more);
    }

    #[test]
    fn test_dispatch_lock_exists_per_faucet_chain() {
        let svc = service();
        assert!(svc.dispatch_locks.contains_key(&43113));
        assert!(!svc.dispatch_locks.contains_key(&173750));
    }

    #[test]
    fn test_limiter_window_from_policy() {
        let registry = ChainRegistry::builtin();
        let asset = registry.chain(43113).unwrap().asset(&AssetId::Native).unwrap();
        assert_eq!(asset.rate_limit.window(), Duration::from_millis(86_400_000));
    }
}
