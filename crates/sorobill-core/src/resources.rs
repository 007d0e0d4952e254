//! Resource extraction from `SorobanTransactionData` and simulation cost.

use stellar_xdr::curr::{LedgerKey, Limits, ReadXdr, SorobanTransactionData, WriteXdr};

use crate::error::BillError;
use crate::fee::Stroops;
use crate::simulation::Cost;

/// Ledger keys a transaction declares it will touch.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub read_only: Vec<LedgerKey>,
    pub read_write: Vec<LedgerKey>,
}

impl Footprint {
    /// Every key is read, including the read-write ones.
    pub fn entry_reads(&self) -> u64 {
        (self.read_only.len() + self.read_write.len()) as u64
    }

    pub fn entry_writes(&self) -> u64 {
        self.read_write.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.read_only.is_empty() && self.read_write.is_empty()
    }

    /// Serialized size of each key, read-write keys first.
    pub fn key_sizes(&self) -> Result<Vec<u64>, BillError> {
        self.read_write
            .iter()
            .chain(self.read_only.iter())
            .map(|key| {
                key.to_xdr(Limits::none())
                    .map(|bytes| bytes.len() as u64)
                    .map_err(|e| BillError::xdr("footprint key", e))
            })
            .collect()
    }

    /// Size of the largest key. Undefined, and an error, for an empty footprint.
    pub fn max_key_bytes(&self) -> Result<u64, BillError> {
        self.key_sizes()?
            .into_iter()
            .max()
            .ok_or(BillError::EmptyFootprint)
    }
}

/// The resource block a transaction declares, decoded from simulation output.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDeclaration {
    pub footprint: Footprint,
    /// Declared CPU instruction limit
    pub instructions: u32,
    /// Declared maximum bytes read from ledger
    pub read_bytes: u32,
    /// Declared maximum bytes written to ledger
    pub write_bytes: u32,
    /// Declared resource fee
    pub resource_fee: Stroops,
}

impl ResourceDeclaration {
    /// Decode a base64 `SorobanTransactionData` block.
    pub fn from_base64(encoded: &str) -> Result<Self, BillError> {
        let data = SorobanTransactionData::from_xdr_base64(encoded, Limits::none())
            .map_err(|e| BillError::xdr("transactionData", e))?;
        Ok(Self::from(data))
    }
}

impl From<SorobanTransactionData> for ResourceDeclaration {
    fn from(data: SorobanTransactionData) -> Self {
        let resources = data.resources;
        ResourceDeclaration {
            footprint: Footprint {
                read_only: resources.footprint.read_only.to_vec(),
                read_write: resources.footprint.read_write.to_vec(),
            },
            instructions: resources.instructions,
            read_bytes: resources.disk_read_bytes,
            write_bytes: resources.write_bytes,
            resource_fee: Stroops(data.resource_fee),
        }
    }
}

/// CPU and memory actually consumed by the simulated invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CostMetrics {
    pub cpu_insns: u64,
    pub mem_bytes: u64,
}

impl CostMetrics {
    pub fn from_cost(cost: Option<&Cost>) -> Result<Self, BillError> {
        let cost = cost.ok_or(BillError::MissingData("cost"))?;
        Ok(CostMetrics {
            cpu_insns: cost.cpu_insns.to_u64("cost.cpuInsns")?,
            mem_bytes: cost.mem_bytes.to_u64("cost.memBytes")?,
        })
    }
}
