//! Multi-chain testnet faucet service
//!
//! Dispenses configured assets (native coin or ERC20 tokens) on supported
//! chains with:
//! - Per-client fixed-window rate limiting
//! - On-chain faucet balance checks before every send
//! - Gas price estimation with a safety multiplier
//! - Legacy EIP-155 transaction construction, signing, and broadcast

pub mod api;
pub mod config;
pub mod error;
pub mod fees;
pub mod limiter;
pub mod registry;
pub mod rpc;
pub mod service;
pub mod tx;
pub mod wallet;

pub use config::ServiceConfig;
pub use error::{FaucetError, FaucetResult};
pub use limiter::RateLimiter;
pub use registry::{AssetId, AssetPolicy, Chain, ChainRegistry, FaucetPolicy, RateLimitPolicy};
pub use service::{DispenseRequest, FaucetService};
pub use wallet::FaucetWallet;
