//! Soroban RPC boundary for sorobill.
//!
//! Builds the unsigned invocation, talks to the node through [`SorobanRpc`],
//! and hands the simulation to `sorobill_core` for accounting.

pub mod args;
pub mod config;
pub mod error;
pub mod estimator;
pub mod rpc;
pub mod transaction;
pub mod types;

pub use args::{account_strkey, decode_address, decode_contract_address, parse_arg};
pub use config::{resolve_rpc_url, EstimatorConfig, InvocationConfig, BASE_FEE, RPC_URL_ENV};
pub use error::RpcError;
pub use estimator::{Estimate, Estimator, DEFAULT_LEDGER_WINDOW};
pub use rpc::{RpcClient, SorobanRpc};
pub use transaction::{build_transaction_envelope, envelope_to_base64};
pub use types::{AccountInfo, FeeDistribution, FeeStats, InclusionFeePercentile};
