//! Network resolution and caller-supplied estimate configuration.

use stellar_xdr::curr::{AccountId, ScAddress, ScSymbol, ScVal};

use crate::args::{decode_contract_address, decode_source_account};
use crate::error::RpcError;
use crate::types::InclusionFeePercentile;

/// Environment variable that overrides the network's default RPC URL.
pub const RPC_URL_ENV: &str = "SOROBILL_RPC_URL";

/// Minimum per-operation inclusion fee, in stroops.
pub const BASE_FEE: u32 = 100;

/// Resolve the RPC URL from explicit flag, env var, or network default.
pub fn resolve_rpc_url(explicit: Option<&str>, network: &str) -> Result<String, RpcError> {
    // 1. Explicit --rpc-url flag
    if let Some(url) = explicit {
        return Ok(url.to_string());
    }

    // 2. SOROBILL_RPC_URL env var
    if let Ok(url) = std::env::var(RPC_URL_ENV) {
        if !url.is_empty() {
            return Ok(url);
        }
    }

    // 3. Network default
    match network {
        "testnet" => Ok("https://soroban-testnet.stellar.org".to_string()),
        "mainnet" => Ok("https://soroban-rpc.mainnet.stellar.gateway.fm".to_string()),
        "futurenet" => Ok("https://rpc-futurenet.stellar.org".to_string()),
        other => Err(RpcError::UnknownNetwork(other.to_string())),
    }
}

/// The contract invocation to estimate.
#[derive(Debug, Clone)]
pub struct InvocationConfig {
    /// Account paying for and sequencing the transaction
    pub source_account: AccountId,
    /// Contract to invoke
    pub contract: ScAddress,
    pub function: ScSymbol,
    pub args: Vec<ScVal>,
    /// Inclusion fee bid placed in the envelope, in stroops
    pub fee: u32,
    /// Seconds from now until the transaction expires; 0 disables the bound
    pub timeout_seconds: u64,
}

impl InvocationConfig {
    /// Build a config from strkeys. `source` may be a G... address or an S... secret.
    pub fn new(
        source: &str,
        contract: &str,
        function: &str,
        args: Vec<ScVal>,
    ) -> Result<Self, RpcError> {
        let function_name: ScSymbol =
            function
                .to_string()
                .try_into()
                .map_err(|_| RpcError::InvalidArgument {
                    arg: function.to_string(),
                    reason: "function name must be at most 32 characters".to_string(),
                })?;
        Ok(InvocationConfig {
            source_account: decode_source_account(source)?,
            contract: decode_contract_address(contract)?,
            function: function_name,
            args,
            fee: BASE_FEE,
            timeout_seconds: 30,
        })
    }
}

/// Knobs for the estimate flow.
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// Extra instructions the node adds on top of the simulated count
    pub instruction_leeway: Option<u64>,
    /// Point of the Soroban inclusion fee distribution to quote
    pub inclusion_fee: InclusionFeePercentile,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            instruction_leeway: Some(3_000_000),
            inclusion_fee: InclusionFeePercentile::Max,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
