//! Stroop amounts and the final fee estimate.

use std::fmt;

use serde::Serialize;

use crate::error::BillError;
use crate::report::UsageReport;

/// Number of stroops in one XLM.
pub const STROOPS_PER_XLM: i64 = 10_000_000;

/// An exact amount of the network's smallest currency unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Stroops(pub i64);

impl Stroops {
    /// Display conversion to XLM. Not suitable for settlement.
    pub fn to_xlm(self) -> f64 {
        self.0 as f64 / STROOPS_PER_XLM as f64
    }

    pub fn checked_add(self, other: Stroops) -> Option<Stroops> {
        self.0.checked_add(other.0).map(Stroops)
    }
}

/// Exact decimal XLM, always with seven fractional digits.
impl fmt::Display for Stroops {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = STROOPS_PER_XLM as u64;
        write!(f, "{}{}.{:07}", sign, abs / per, abs % per)
    }
}

impl From<i64> for Stroops {
    fn from(v: i64) -> Self {
        Stroops(v)
    }
}

/// Resource fee plus inclusion fee.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeEstimate {
    pub resource_fee_stroops: Stroops,
    pub inclusion_fee_stroops: Stroops,
    pub total_fee_stroops: Stroops,
    pub total_fee_in_xlm: f64,
}

impl FeeEstimate {
    /// Combine a usage report with a separately quoted inclusion fee.
    pub fn new(report: &UsageReport, inclusion_fee: Stroops) -> Result<Self, BillError> {
        let resource = report.resource_fee_stroops;
        let total = resource
            .checked_add(inclusion_fee)
            .ok_or(BillError::FeeOverflow {
                resource: resource.0,
                inclusion: inclusion_fee.0,
            })?;
        Ok(FeeEstimate {
            resource_fee_stroops: resource,
            inclusion_fee_stroops: inclusion_fee,
            total_fee_stroops: total,
            total_fee_in_xlm: total.to_xlm(),
        })
    }
}
