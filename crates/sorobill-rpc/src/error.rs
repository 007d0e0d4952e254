//! RPC and estimation error types.

use sorobill_core::BillError;

/// Errors that can occur while talking to Soroban RPC or preparing a call.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Failed to connect to RPC endpoint
    #[error("network error: {0}")]
    Network(String),
    /// RPC returned a JSON-RPC error response
    #[error("RPC error (code {code}): {message}")]
    Rpc { code: i64, message: String },
    /// Invalid or unexpected response format from RPC
    #[error("invalid RPC response: {0}")]
    InvalidResponse(String),
    /// Source account not found on the network
    #[error("account not found: {0}")]
    AccountNotFound(String),
    /// Malformed account, contract or secret key
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
    /// Malformed invocation argument
    #[error("invalid argument '{arg}': {reason}")]
    InvalidArgument { arg: String, reason: String },
    /// No default RPC endpoint or passphrase for this network name
    #[error("unknown network '{0}'; use --rpc-url or set SOROBILL_RPC_URL")]
    UnknownNetwork(String),
    /// XDR serialization/deserialization error
    #[error("XDR error: {0}")]
    Xdr(String),
    /// The fee accounting itself failed
    #[error(transparent)]
    Bill(#[from] BillError),
}

impl From<reqwest::Error> for RpcError {
    fn from(e: reqwest::Error) -> Self {
        RpcError::Network(e.to_string())
    }
}
