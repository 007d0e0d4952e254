//! Typed values returned across the RPC boundary.

use std::fmt;

use serde::Serialize;
use sorobill_core::Stroops;

use crate::error::RpcError;

/// Account information from the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    /// Account ID (G... address)
    pub account_id: String,
    /// Current sequence number
    pub sequence: i64,
}

/// Distribution of per-operation inclusion fees over recent ledgers, in stroops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeeDistribution {
    pub max: u64,
    pub min: u64,
    pub mode: u64,
    pub p10: u64,
    pub p20: u64,
    pub p30: u64,
    pub p40: u64,
    pub p50: u64,
    pub p60: u64,
    pub p70: u64,
    pub p80: u64,
    pub p90: u64,
    pub p95: u64,
    pub p99: u64,
    pub transaction_count: u64,
    pub ledger_count: u64,
}

/// Which point of the distribution to quote as the inclusion fee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InclusionFeePercentile {
    #[default]
    Max,
    P99,
    P90,
    P50,
    Mode,
    Min,
}

impl fmt::Display for InclusionFeePercentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InclusionFeePercentile::Max => "max",
            InclusionFeePercentile::P99 => "p99",
            InclusionFeePercentile::P90 => "p90",
            InclusionFeePercentile::P50 => "p50",
            InclusionFeePercentile::Mode => "mode",
            InclusionFeePercentile::Min => "min",
        };
        f.write_str(name)
    }
}

impl FeeDistribution {
    pub fn pick(&self, percentile: InclusionFeePercentile) -> u64 {
        match percentile {
            InclusionFeePercentile::Max => self.max,
            InclusionFeePercentile::P99 => self.p99,
            InclusionFeePercentile::P90 => self.p90,
            InclusionFeePercentile::P50 => self.p50,
            InclusionFeePercentile::Mode => self.mode,
            InclusionFeePercentile::Min => self.min,
        }
    }
}

/// Response of `getFeeStats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeeStats {
    /// Inclusion fees paid by Soroban transactions
    pub soroban_inclusion_fee: FeeDistribution,
    /// Inclusion fees paid by classic transactions
    pub inclusion_fee: FeeDistribution,
    pub latest_ledger: u64,
}

impl FeeStats {
    /// Inclusion fee to add to a Soroban resource fee.
    pub fn soroban_inclusion_fee(
        &self,
        percentile: InclusionFeePercentile,
    ) -> Result<Stroops, RpcError> {
        let fee = self.soroban_inclusion_fee.pick(percentile);
        i64::try_from(fee).map(Stroops).map_err(|_| {
            RpcError::InvalidResponse(format!(
                "{} inclusion fee {} is out of range",
                percentile, fee
            ))
        })
    }
}
