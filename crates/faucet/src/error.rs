//! Error types for the faucet service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Faucet service errors.
///
/// Every variant maps to an HTTP response carrying a `{"message": ...}` body.
/// None of them are fatal to the process; each request fails independently.
#[derive(Error, Debug)]
pub enum FaucetError {
    /// Malformed parameters, unsupported chain, or unsupported asset.
    #[error("{0}")]
    InvalidRequest(String),

    /// The client exhausted its allowance for the current window.
    #[error("Too many requests, please try again later.")]
    RateLimited,

    /// No signing key is configured for the requested chain.
    #[error("Faucet wallet cannot be found!")]
    WalletUnavailable,

    /// The faucet wallet does not hold more than one drip of the asset.
    #[error("Faucet balance is not enough!")]
    InsufficientBalance,

    /// The node reported no gas price.
    #[error("could not fetch fee data from the chain RPC endpoint")]
    FeeUnavailable,

    /// Signing or broadcast failed; carries the upstream node's message.
    #[error("{0}")]
    DispatchFailed(String),

    /// JSON-RPC transport or decode failure outside the dispatch stage.
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for FaucetError {
    fn into_response(self) -> Response {
        let status = match &self {
            FaucetError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            FaucetError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FaucetError::InvalidRequest(_)
            | FaucetError::WalletUnavailable
            | FaucetError::InsufficientBalance
            | FaucetError::FeeUnavailable
            | FaucetError::DispatchFailed(_)
            | FaucetError::Rpc(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({ "message": self.to_string() }));
        (status, body).into_response()
    }
}

pub type FaucetResult<T> = Result<T, FaucetError>;
