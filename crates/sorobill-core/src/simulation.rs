//! Typed view of a `simulateTransaction` result.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stellar_xdr::curr::{Limits, ReadXdr, SorobanTransactionData};

use crate::error::BillError;
use crate::fee::Stroops;

/// The `result` object returned by `simulateTransaction`.
///
/// Only the fields the fee accounting reads are typed; everything else in the
/// RPC payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Diagnostic events as base64 XDR (`DiagnosticEvent`)
    #[serde(default)]
    pub events: Vec<String>,
    /// Invocation results; the first one carries the return value
    #[serde(default)]
    pub results: Vec<InvocationResult>,
    /// Soroban transaction data as base64 XDR (`SorobanTransactionData`)
    #[serde(default)]
    pub transaction_data: Option<String>,
    /// CPU and memory cost of the simulated invocation
    #[serde(default)]
    pub cost: Option<Cost>,
    /// Minimum resource fee quoted by the node, in stroops
    #[serde(default)]
    pub min_resource_fee: Option<RawInteger>,
    /// Latest ledger at simulation time
    #[serde(default)]
    pub latest_ledger: Option<RawInteger>,
    /// Error string set when the simulated invocation failed
    #[serde(default)]
    pub error: Option<String>,
    /// Set when archived entries must be restored before the call can land
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_preamble: Option<RestorePreamble>,
}

/// The `RestoreFootprint` transaction the node says must run first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorePreamble {
    /// Soroban transaction data for the restore, as base64 XDR
    pub transaction_data: String,
    #[serde(default)]
    pub min_resource_fee: Option<RawInteger>,
}

/// One entry of the `results` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    /// Return value as base64 XDR (`ScVal`)
    pub xdr: String,
    /// Authorization entries as base64 XDR
    #[serde(default)]
    pub auth: Vec<String>,
}

/// Cost metrics as reported by the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cost {
    pub cpu_insns: RawInteger,
    pub mem_bytes: RawInteger,
}

/// An integer the RPC may send either as a JSON number or a decimal string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawInteger {
    Number(serde_json::Number),
    Text(String),
}

impl RawInteger {
    /// Read the value as an exact `u64`, rejecting fractions and negatives.
    pub fn to_u64(&self, field: &'static str) -> Result<u64, BillError> {
        let parsed = match self {
            RawInteger::Number(n) => n.as_u64(),
            RawInteger::Text(s) => s.trim().parse::<u64>().ok(),
        };
        parsed.ok_or_else(|| BillError::InvalidNumber {
            field,
            value: self.to_string(),
        })
    }
}

impl std::fmt::Display for RawInteger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawInteger::Number(n) => write!(f, "{}", n),
            RawInteger::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl SimulationResult {
    /// Parse a simulation from JSON.
    ///
    /// Accepts either the bare `result` object or the whole JSON-RPC response
    /// (`{"jsonrpc": "2.0", "result": {...}}`).
    pub fn from_json(text: &str) -> Result<Self, BillError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Same as [`SimulationResult::from_json`] for an already parsed value.
    pub fn from_value(mut value: Value) -> Result<Self, BillError> {
        if let Some(error) = value.get("error").filter(|e| e.is_object()) {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown RPC error");
            return Err(BillError::SimulationFailed(message.to_string()));
        }
        if let Some(inner) = value.get_mut("result").map(Value::take) {
            if inner.is_object() {
                value = inner;
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    /// The first invocation result, if the simulation produced one.
    pub fn first_result(&self) -> Option<&InvocationResult> {
        self.results.first()
    }

    /// Resource fee declared by the restore preamble, if there is one.
    pub fn restore_fee(&self) -> Result<Option<Stroops>, BillError> {
        let Some(preamble) = &self.restore_preamble else {
            return Ok(None);
        };
        let data =
            SorobanTransactionData::from_xdr_base64(&preamble.transaction_data, Limits::none())
                .map_err(|e| BillError::xdr("restorePreamble.transactionData", e))?;
        Ok(Some(Stroops(data.resource_fee)))
    }
}
