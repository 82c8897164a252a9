//! Static catalog of supported chains and their dispensable assets.
//!
//! The registry is loaded once at startup (from a JSON file or the built-in
//! catalog) and never mutated afterwards. Only chains carrying a faucet
//! policy are eligible for dispensing.

use faucet_common::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Identifies a dispensable asset: the chain's native coin or an ERC20
/// contract. Serialized as the `"native"` sentinel or a `0x` hex address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetId {
    Native,
    Contract(Address),
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Native => write!(f, "native"),
            AssetId::Contract(addr) => write!(f, "{addr}"),
        }
    }
}

impl FromStr for AssetId {
    type Err = faucet_common::AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "native" {
            Ok(AssetId::Native)
        } else {
            Ok(AssetId::Contract(s.parse()?))
        }
    }
}

impl Serialize for AssetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Fixed-window rate limit: at most `max_limit` requests per `window_size`
/// milliseconds for a single client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub max_limit: u32,
    /// Window duration in milliseconds.
    pub window_size: u64,
}

impl RateLimitPolicy {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_size)
    }
}

/// One dispensable asset on a chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetPolicy {
    pub address: AssetId,
    pub decimals: u32,
    /// Quantity dispensed per request, in human asset units (e.g. `"0.05"`).
    /// Kept as a decimal string so values like 0.05 stay exact.
    pub drip_amount: String,
    pub rate_limit: RateLimitPolicy,
}

/// Faucet settings for one chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaucetPolicy {
    /// Suggested UI recalibration interval in seconds. Informational only.
    pub recalibrate: u64,
    pub assets: Vec<AssetPolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explorer {
    pub name: String,
    pub url: String,
    #[serde(rename = "apiUrl", skip_serializing_if = "Option::is_none", default)]
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerSet {
    pub default: Explorer,
}

/// Immutable configuration for one supported chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    pub id: u64,
    pub name: String,
    pub rpc_url: String,
    pub native_currency: NativeCurrency,
    pub block_explorers: ExplorerSet,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub faucet: Option<FaucetPolicy>,
}

impl Chain {
    /// Look up the asset policy matching `asset`, if any.
    pub fn asset(&self, asset: &AssetId) -> Option<&AssetPolicy> {
        self.faucet.as_ref()?.assets.iter().find(|a| a.address == *asset)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainRegistry {
    pub chains: Vec<Chain>,
}

impl ChainRegistry {
    /// Load the registry from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let registry: ChainRegistry = serde_json::from_str(&raw)?;
        Ok(registry)
    }

    /// Look up a chain by id.
    pub fn chain(&self, chain_id: u64) -> Option<&Chain> {
        self.chains.iter().find(|c| c.id == chain_id)
    }

    /// Chains that carry a faucet policy, in catalog order.
    pub fn faucet_chains(&self) -> impl Iterator<Item = &Chain> {
        self.chains.iter().filter(|c| c.faucet.is_some())
    }

    /// Largest configured rate-limit window across all policies.
    ///
    /// The limiter's entry TTL must be at least this long, otherwise a live
    /// window could be evicted mid-flight and grant an extra allowance.
    pub fn max_rate_limit_window(&self) -> Duration {
        self.chains
            .iter()
            .flat_map(|c| c.faucet.iter())
            .flat_map(|f| f.assets.iter())
            .map(|a| a.rate_limit.window())
            .max()
            .unwrap_or(Duration::ZERO)
    }

    /// The built-in catalog: Avalanche Fuji with a faucet policy for the
    /// native coin and one ERC20, plus the Echo and Dispatch L1s, which are
    /// known chains but do not dispense.
    pub fn builtin() -> Self {
        const DAY_MS: u64 = 24 * 60 * 60 * 1000;
        ChainRegistry {
            chains: vec![
                Chain {
                    id: 43113,
                    name: "Avalanche Fuji".to_string(),
                    rpc_url: "https://api.avax-test.network/ext/bc/C/rpc".to_string(),
                    native_currency: NativeCurrency {
                        name: "Avalanche Fuji".to_string(),
                        symbol: "AVAX".to_string(),
                        decimals: 18,
                    },
                    block_explorers: ExplorerSet {
                        default: Explorer {
                            name: "SnowTrace".to_string(),
                            url: "https://testnet.snowtrace.io".to_string(),
                            api_url: Some("https://api-testnet.snowtrace.io".to_string()),
                        },
                    },
                    faucet: Some(FaucetPolicy {
                        recalibrate: 30,
                        assets: vec![
                            AssetPolicy {
                                address: AssetId::Native,
                                decimals: 18,
                                drip_amount: "0.05".to_string(),
                                rate_limit: RateLimitPolicy { max_limit: 1, window_size: DAY_MS },
                            },
                            AssetPolicy {
                                address: AssetId::Contract(
                                    "0x8D6f0E153B1D4Efb46c510278Db3678Bb1Cc823d"
                                        .parse()
                                        .expect("valid builtin token address"),
                                ),
                                decimals: 18,
                                drip_amount: "2".to_string(),
                                rate_limit: RateLimitPolicy { max_limit: 1, window_size: DAY_MS },
                            },
                        ],
                    }),
                },
                Chain {
                    id: 173750,
                    name: "Echo L1".to_string(),
                    rpc_url: "https://subnets.avax.network/echo/testnet/rpc".to_string(),
                    native_currency: NativeCurrency {
                        name: "Ech".to_string(),
                        symbol: "ECH".to_string(),
                        decimals: 18,
                    },
                    block_explorers: ExplorerSet {
                        default: Explorer {
                            name: "Explorer".to_string(),
                            url: "https://subnets-test.avax.network/echo".to_string(),
                            api_url: None,
                        },
                    },
                    faucet: None,
                },
                Chain {
                    id: 779672,
                    name: "Dispatch L1".to_string(),
                    rpc_url: "https://subnets.avax.network/dispatch/testnet/rpc".to_string(),
                    native_currency: NativeCurrency {
                        name: "DIS".to_string(),
                        symbol: "DIS".to_string(),
                        decimals: 18,
                    },
                    block_explorers: ExplorerSet {
                        default: Explorer {
                            name: "Explorer".to_string(),
                            url: "https://subnets-test.avax.network/dispatch".to_string(),
                            api_url: None,
                        },
                    },
                    faucet: None,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_native_asset_on_fuji() {
        let registry = ChainRegistry::builtin();
        let chain = registry.chain(43113).expect("fuji present");
        let matches: Vec<_> = chain
            .faucet
            .as_ref()
            .unwrap()
            .assets
            .iter()
            .filter(|a| a.address == AssetId::Native)
            .collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].drip_amount, "0.05");
        assert_eq!(matches[0].decimals, 18);
    }

    #[test]
    fn test_resolve_unknown_asset_is_not_found() {
        let registry = ChainRegistry::builtin();
        let chain = registry.chain(43113).unwrap();
        let unknown = AssetId::Contract(
            "0x0000000000000000000000000000000000000001".parse().unwrap(),
        );
        assert!(chain.asset(&unknown).is_none());
    }

    #[test]
    fn test_unknown_chain_is_not_found() {
        let registry = ChainRegistry::builtin();
        assert!(registry.chain(1).is_none());
    }

    #[test]
    fn test_non_faucet_chain_has_no_assets() {
        let registry = ChainRegistry::builtin();
        let echo = registry.chain(173750).unwrap();
        assert!(echo.faucet.is_none());
        assert!(echo.asset(&AssetId::Native).is_none());
    }

    #[test]
    fn test_max_rate_limit_window() {
        let registry = ChainRegistry::builtin();
        assert_eq!(registry.max_rate_limit_window(), Duration::from_millis(86_400_000));
    }

    #[test]
    fn test_asset_id_serde() {
        let native: AssetId = serde_json::from_str("\"native\"").unwrap();
        assert_eq!(native, AssetId::Native);

        let token: AssetId =
            serde_json::from_str("\"0x8D6f0E153B1D4Efb46c510278Db3678Bb1Cc823d\"").unwrap();
        assert!(matches!(token, AssetId::Contract(_)));

        assert!(serde_json::from_str::<AssetId>("\"nativ\"").is_err());
    }

    #[test]
    fn test_registry_json_round_trip() {
        let registry = ChainRegistry::builtin();
        let json = serde_json::to_string(&registry).unwrap();
        let back: ChainRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.chains.len(), 3);
        assert!(back.chain(43113).unwrap().faucet.is_some());
        assert!(back.chain(779672).unwrap().faucet.is_none());
    }
}
