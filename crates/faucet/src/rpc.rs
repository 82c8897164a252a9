//! Minimal JSON-RPC 2.0 client for the `eth_*` methods the faucet needs.

use crate::error::{FaucetError, FaucetResult};
use faucet_common::Address;
use num_bigint::BigUint;
use serde_json::{json, Value};

/// JSON-RPC client shared across all chains; each call targets the
/// endpoint of the chain being served.
#[derive(Clone, Default)]
pub struct RpcClient {
    http: reqwest::Client,
}

impl RpcClient {
    pub fn new() -> Self {
        Self { http: reqwest::Client::new() }
    }

    async fn call(&self, url: &str, method: &str, params: Value) -> FaucetResult<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });

        let response = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| FaucetError::Rpc(format!("request failed: {e}")))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| FaucetError::Rpc(format!("invalid response: {e}")))?;

        if let Some(error) = body.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| error.to_string());
            return Err(FaucetError::Rpc(message));
        }

        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }

    /// `eth_gasPrice`. Returns `None` when the node reports no price.
    pub async fn gas_price(&self, url: &str) -> FaucetResult<Option<BigUint>> {
        let result = self.call(url, "eth_gasPrice", json!([])).await?;
        Ok(parse_quantity(&result))
    }

    /// `eth_getBalance` of `address` at the latest block, in wei.
    pub async fn native_balance(&self, url: &str, address: &Address) -> FaucetResult<BigUint> {
        let result = self
            .call(url, "eth_getBalance", json!([address.to_string(), "latest"]))
            .await?;
        parse_quantity(&result)
            .ok_or_else(|| FaucetError::Rpc(format!("malformed balance: {result}")))
    }

    /// Read-only `eth_call` against `to`, returning the decoded quantity.
    /// Used for ERC20 `balanceOf`.
    pub async fn call_for_quantity(
        &self,
        url: &str,
        to: &Address,
        data: &[u8],
    ) -> FaucetResult<BigUint> {
        let call = json!({
            "to": to.to_string(),
            "data": format!("0x{}", hex::encode(data)),
        });
        let result = self.call(url, "eth_call", json!([call, "latest"])).await?;
        parse_quantity(&result)
            .ok_or_else(|| FaucetError::Rpc(format!("malformed call result: {result}")))
    }

    /// `eth_getTransactionCount` at the pending block; the next nonce.
    ///
    /// The pending tag counts queued transactions too, so back-to-back
    /// dispenses get consecutive nonces even while earlier sends are still
    /// waiting to be mined.
    pub async fn transaction_count(&self, url: &str, address: &Address) -> FaucetResult<u64> {
        let result = self
            .call(url, "eth_getTransactionCount", json!([address.to_string(), "pending"]))
            .await?;
        let quantity = parse_quantity(&result)
            .ok_or_else(|| FaucetError::Rpc(format!("malformed nonce: {result}")))?;
        u64::try_from(&quantity).map_err(|_| FaucetError::Rpc("nonce out of range".to_string()))
    }

    /// `eth_sendRawTransaction`; returns the node-reported transaction hash.
    pub async fn send_raw_transaction(&self, url: &str, raw: &[u8]) -> FaucetResult<String> {
        let result = self
            .call(url, "eth_sendRawTransaction", json!([format!("0x{}", hex::encode(raw))]))
            .await?;
        result
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| FaucetError::Rpc(format!("malformed tx hash: {result}")))
    }
}

/// Parse a JSON-RPC `0x`-prefixed hex quantity. An empty hex body counts
/// as zero; non-string or non-hex values are `None`.
fn parse_quantity(value: &Value) -> Option<BigUint> {
    let s = value.as_str()?;
    let digits = s.strip_prefix("0x")?;
    if digits.is_empty() {
        return Some(BigUint::from(0u32));
    }
    BigUint::parse_bytes(digits.as_bytes(), 16)
}
