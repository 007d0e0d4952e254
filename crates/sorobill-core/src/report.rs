//! Usage report composition.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use stellar_xdr::curr::{Limits, ReadXdr, ScVal};

use crate::error::BillError;
use crate::events::contract_event_bytes;
use crate::fee::Stroops;
use crate::resources::{CostMetrics, ResourceDeclaration};
use crate::simulation::SimulationResult;

/// Resource usage and resource fee of one simulated invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageReport {
    /// CPU instructions consumed
    pub cpu_insns: u64,
    /// Memory bytes consumed
    pub mem_bytes: u64,
    /// Ledger entries read (read-only + read-write)
    pub entry_reads: u64,
    /// Ledger entries written (read-write)
    pub entry_writes: u64,
    /// Declared maximum bytes read from ledger
    pub read_bytes: u32,
    /// Declared maximum bytes written to ledger
    pub write_bytes: u32,
    /// Contract event bytes plus return value bytes
    pub events_and_return_bytes: u64,
    /// Size of the unsigned envelope. A lower bound: signatures come later.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_txn_bytes: Option<u64>,
    /// Largest single footprint key
    pub max_key_bytes: u64,
    /// Declared resource fee
    pub resource_fee_stroops: Stroops,
    /// Declared resource fee in XLM, for display
    pub resource_fee_in_xlm: f64,
}

/// Build the usage report for a simulation.
///
/// `tx_xdr` is the base64 envelope that was simulated, if the caller has it.
pub fn sorobill(sim: &SimulationResult, tx_xdr: Option<&str>) -> Result<UsageReport, BillError> {
    if let Some(error) = &sim.error {
        return Err(BillError::SimulationFailed(error.clone()));
    }

    let event_bytes = contract_event_bytes(&sim.events)?;
    let return_bytes = return_value_bytes(sim)?;

    let transaction_data = sim
        .transaction_data
        .as_deref()
        .ok_or(BillError::MissingData("transactionData"))?;
    let declaration = ResourceDeclaration::from_base64(transaction_data)?;
    let metrics = CostMetrics::from_cost(sim.cost.as_ref())?;

    let min_txn_bytes = tx_xdr.map(decoded_len).transpose()?;
    let footprint = &declaration.footprint;

    let report = UsageReport {
        cpu_insns: metrics.cpu_insns,
        mem_bytes: metrics.mem_bytes,
        entry_reads: footprint.entry_reads(),
        entry_writes: footprint.entry_writes(),
        read_bytes: declaration.read_bytes,
        write_bytes: declaration.write_bytes,
        events_and_return_bytes: event_bytes + return_bytes,
        min_txn_bytes,
        max_key_bytes: footprint.max_key_bytes()?,
        resource_fee_stroops: declaration.resource_fee,
        resource_fee_in_xlm: declaration.resource_fee.to_xlm(),
    };
    log::debug!("usage report: {:?}", report);
    Ok(report)
}

/// Size of the first result's return value, 0 when there is none.
fn return_value_bytes(sim: &SimulationResult) -> Result<u64, BillError> {
    let Some(first) = sim.first_result() else {
        return Ok(0);
    };
    let bytes = STANDARD
        .decode(first.xdr.trim())
        .map_err(|e| BillError::base64("return value", e))?;
    ScVal::from_xdr(&bytes, Limits::none()).map_err(|e| BillError::xdr("return value", e))?;
    Ok(bytes.len() as u64)
}

/// Decoded length of a base64 envelope. Line-wrapped input is accepted.
fn decoded_len(tx_xdr: &str) -> Result<u64, BillError> {
    let compact: String = tx_xdr.split_whitespace().collect();
    STANDARD
        .decode(compact)
        .map(|bytes| bytes.len() as u64)
        .map_err(|e| BillError::base64("transaction envelope", e))
}

/// Format a usage report as human-readable text.
pub fn format_human_report(report: &UsageReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "  CPU:            {} instructions\n",
        format_number(report.cpu_insns)
    ));
    out.push_str(&format!(
        "  Memory:         {} bytes\n",
        format_number(report.mem_bytes)
    ));
    out.push_str(&format!(
        "  Entries:        {} read, {} written\n",
        report.entry_reads, report.entry_writes
    ));
    out.push_str(&format!(
        "  Ledger bytes:   {} read, {} written (declared)\n",
        format_number(report.read_bytes as u64),
        format_number(report.write_bytes as u64)
    ));
    out.push_str(&format!(
        "  Events+return:  {} bytes\n",
        format_number(report.events_and_return_bytes)
    ));
    match report.min_txn_bytes {
        Some(n) => out.push_str(&format!("  Min tx size:    {} bytes\n", format_number(n))),
        None => out.push_str("  Min tx size:    unknown\n"),
    }
    out.push_str(&format!(
        "  Max key size:   {} bytes\n",
        format_number(report.max_key_bytes)
    ));
    out.push_str(&format!(
        "  Resource fee:   {} stroops ({} XLM)\n",
        format_stroops(report.resource_fee_stroops),
        report.resource_fee_stroops
    ));
    out
}

/// Format a stroop amount with thousands separators, keeping its sign.
pub fn format_stroops(amount: Stroops) -> String {
    let sign = if amount.0 < 0 { "-" } else { "" };
    format!("{}{}", sign, format_number(amount.0.unsigned_abs()))
}

/// Format a number with thousands separators.
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
