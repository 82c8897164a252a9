//! Gas price estimation.
//!
//! The node-reported price is bumped by a fixed 1.25x to reduce the chance
//! of a stuck transaction. No dynamic back-off or priority-fee logic.

use crate::error::{FaucetError, FaucetResult};
use crate::rpc::RpcClient;
use num_bigint::BigUint;
use tracing::debug;

/// Fetch the current gas price and apply the safety multiplier.
///
/// Fails with `FeeUnavailable` when the node reports no price.
pub async fn estimate(rpc: &RpcClient, rpc_url: &str) -> FaucetResult<BigUint> {
    let reported = rpc.gas_price(rpc_url).await?.ok_or(FaucetError::FeeUnavailable)?;
    let adjusted = adjust_gas_price(&reported);
    debug!(%reported, %adjusted, "estimated gas price");
    Ok(adjusted)
}

/// `round(g * 1.25)` with half-up rounding, computed as `(g * 5 + 2) / 4`
/// so the result is exact for every `g`.
pub fn adjust_gas_price(gas_price: &BigUint) -> BigUint {
    (gas_price * 5u32 + 2u32) / 4u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjusted(g: u64) -> u64 {
        u64::try_from(&adjust_gas_price(&BigUint::from(g))).unwrap()
    }

    #[test]
    fn test_exact_multiples_of_four() {
        assert_eq!(adjusted(4), 5);
        assert_eq!(adjusted(25_000_000_000), 31_250_000_000); // 25 gwei -> 31.25 gwei
    }

    #[test]
    fn test_half_up_rounding() {
        // g * 1.25 = 1.25, 2.5, 3.75, 5.0 -> 1, 3, 4, 5
        assert_eq!(adjusted(1), 1);
        assert_eq!(adjusted(2), 3);
        assert_eq!(adjusted(3), 4);
        assert_eq!(adjusted(4), 5);
    }

    #[test]
    fn test_zero() {
        assert_eq!(adjusted(0), 0);
    }
}
