//! JSON-RPC client for Soroban RPC endpoints.

use std::time::Duration;

use serde_json::{json, Value};
use sorobill_core::{LedgerTransaction, SimulationResult};

use crate::error::RpcError;
use crate::types::{AccountInfo, FeeDistribution, FeeStats};

/// The network calls fee estimation depends on.
///
/// Everything behind this trait does I/O; everything in `sorobill_core` is
/// computed from what these calls return.
pub trait SorobanRpc {
    /// Fetch account information (id + sequence number).
    fn get_account(&self, account_id: &str) -> Result<AccountInfo, RpcError>;

    /// Simulate an unsigned transaction envelope.
    fn simulate_transaction(
        &self,
        tx_xdr_base64: &str,
        instruction_leeway: Option<u64>,
    ) -> Result<SimulationResult, RpcError>;

    /// Fetch network-wide inclusion fee statistics.
    fn get_fee_stats(&self) -> Result<FeeStats, RpcError>;

    /// Sequence number of the latest closed ledger.
    fn get_latest_ledger(&self) -> Result<u64, RpcError>;

    /// Applied transactions starting at `start_ledger`.
    fn get_transactions(
        &self,
        start_ledger: u64,
        limit: u32,
    ) -> Result<Vec<LedgerTransaction>, RpcError>;
}

/// JSON-RPC client for communicating with a Soroban RPC server.
pub struct RpcClient {
    client: reqwest::blocking::Client,
    url: String,
}

impl RpcClient {
    /// Create a new RPC client pointing at the given URL.
    pub fn new(url: &str) -> Self {
        RpcClient {
            client: reqwest::blocking::Client::new(),
            url: url.to_string(),
        }
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(RpcClient {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a JSON-RPC request and return the parsed JSON body.
    fn send_request(&self, body: &Value) -> Result<Value, RpcError> {
        log::debug!("POST {} {}", self.url, body["method"]);
        let resp = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| RpcError::Network(format!("reading response body: {}", e)))?;

        if !status.is_success() {
            return Err(RpcError::Network(format!("HTTP {}: {}", status, text)));
        }

        serde_json::from_str(&text)
            .map_err(|e| RpcError::InvalidResponse(format!("invalid JSON: {}", e)))
    }
}

impl SorobanRpc for RpcClient {
    fn get_account(&self, account_id: &str) -> Result<AccountInfo, RpcError> {
        let body = build_jsonrpc_request("getAccount", json!({ "address": account_id }));
        let response = self.send_request(&body)?;
        parse_account_response(&response, account_id)
    }

    fn simulate_transaction(
        &self,
        tx_xdr_base64: &str,
        instruction_leeway: Option<u64>,
    ) -> Result<SimulationResult, RpcError> {
        let body = build_jsonrpc_request(
            "simulateTransaction",
            simulate_params(tx_xdr_base64, instruction_leeway),
        );
        let response = self.send_request(&body)?;
        parse_simulate_response(&response)
    }

    fn get_fee_stats(&self) -> Result<FeeStats, RpcError> {
        let body = build_jsonrpc_request("getFeeStats", json!({}));
        let response = self.send_request(&body)?;
        parse_fee_stats_response(&response)
    }

    fn get_latest_ledger(&self) -> Result<u64, RpcError> {
        let body = build_jsonrpc_request("getLatestLedger", json!({}));
        let response = self.send_request(&body)?;
        parse_latest_ledger_response(&response)
    }

    fn get_transactions(
        &self,
        start_ledger: u64,
        limit: u32,
    ) -> Result<Vec<LedgerTransaction>, RpcError> {
        let body = build_jsonrpc_request(
            "getTransactions",
            json!({
                "startLedger": start_ledger,
                "pagination": { "limit": limit }
            }),
        );
        let response = self.send_request(&body)?;
        parse_transactions_response(&response)
    }
}

/// Build a JSON-RPC 2.0 request body.
pub(crate) fn build_jsonrpc_request(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params
    })
}

pub(crate) fn simulate_params(tx_xdr_base64: &str, instruction_leeway: Option<u64>) -> Value {
    let mut params = json!({ "transaction": tx_xdr_base64 });
    if let Some(leeway) = instruction_leeway {
        params["resourceConfig"] = json!({ "instructionLeeway": leeway });
    }
    params
}

/// Return the `result` member, or the JSON-RPC error as `RpcError::Rpc`.
fn extract_result(response: &Value) -> Result<&Value, RpcError> {
    if let Some(error) = response.get("error") {
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error")
            .to_string();
        return Err(RpcError::Rpc { code, message });
    }

    response
        .get("result")
        .ok_or_else(|| RpcError::InvalidResponse("missing 'result' field".to_string()))
}

/// Read an integer the RPC may encode as a string or a number.
fn u64_field(obj: &Value, name: &str) -> Option<u64> {
    obj.get(name).and_then(|v| {
        v.as_u64()
            .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
    })
}

/// Parse a `getAccount` response into `AccountInfo`.
pub(crate) fn parse_account_response(
    response: &Value,
    account_id: &str,
) -> Result<AccountInfo, RpcError> {
    let result = match extract_result(response) {
        Ok(result) => result,
        // Account not found typically returns a specific error
        Err(RpcError::Rpc { code, message }) => {
            if message.contains("not found") || code == -32600 {
                return Err(RpcError::AccountNotFound(account_id.to_string()));
            }
            return Err(RpcError::Rpc { code, message });
        }
        Err(e) => return Err(e),
    };

    let id = result
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or(account_id)
        .to_string();

    let sequence = result
        .get("sequence")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            RpcError::InvalidResponse("missing or invalid 'sequence' field".to_string())
        })?;

    Ok(AccountInfo {
        account_id: id,
        sequence,
    })
}

/// Parse a `simulateTransaction` response into a typed simulation.
///
/// A `restorePreamble` is kept on the result; the bill is still computed.
pub(crate) fn parse_simulate_response(response: &Value) -> Result<SimulationResult, RpcError> {
    let result = extract_result(response)?;
    Ok(SimulationResult::from_value(result.clone())?)
}

fn parse_distribution(value: Option<&Value>) -> FeeDistribution {
    let Some(obj) = value else {
        return FeeDistribution::default();
    };
    let field = |name: &str| u64_field(obj, name).unwrap_or(0);
    FeeDistribution {
        max: field("max"),
        min: field("min"),
        mode: field("mode"),
        p10: field("p10"),
        p20: field("p20"),
        p30: field("p30"),
        p40: field("p40"),
        p50: field("p50"),
        p60: field("p60"),
        p70: field("p70"),
        p80: field("p80"),
        p90: field("p90"),
        p95: field("p95"),
        p99: field("p99"),
        transaction_count: field("transactionCount"),
        ledger_count: field("ledgerCount"),
    }
}

/// Parse a `getFeeStats` response.
pub(crate) fn parse_fee_stats_response(response: &Value) -> Result<FeeStats, RpcError> {
    let result = extract_result(response)?;

    let soroban = result.get("sorobanInclusionFee").ok_or_else(|| {
        RpcError::InvalidResponse("missing 'sorobanInclusionFee' field".to_string())
    })?;

    Ok(FeeStats {
        soroban_inclusion_fee: parse_distribution(Some(soroban)),
        inclusion_fee: parse_distribution(result.get("inclusionFee")),
        latest_ledger: u64_field(result, "latestLedger").unwrap_or(0),
    })
}

/// Parse a `getLatestLedger` response.
pub(crate) fn parse_latest_ledger_response(response: &Value) -> Result<u64, RpcError> {
    let result = extract_result(response)?;
    u64_field(result, "sequence").ok_or_else(|| {
        RpcError::InvalidResponse("missing or invalid 'sequence' field".to_string())
    })
}

/// Parse a `getTransactions` response.
pub(crate) fn parse_transactions_response(
    response: &Value,
) -> Result<Vec<LedgerTransaction>, RpcError> {
    let result = extract_result(response)?;

    let Some(entries) = result.get("transactions").and_then(|v| v.as_array()) else {
        return Ok(vec![]);
    };

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let field = |name: &str| {
                entry
                    .get(name)
                    .and_then(|v| v.as_str())
                    .map(String::from)
                    .ok_or_else(|| {
                        RpcError::InvalidResponse(format!("transaction {} has no '{}'", i, name))
                    })
            };
            Ok(LedgerTransaction {
                envelope_xdr: field("envelopeXdr")?,
                result_xdr: field("resultXdr")?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
