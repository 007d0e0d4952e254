//! Average charged fees over a window of ledger transactions.
//!
//! Soroban and classic transactions are averaged separately so an estimate
//! can be compared with what comparable invocations actually paid.

use serde::{Deserialize, Serialize};
use stellar_xdr::curr::{
    FeeBumpTransactionInnerTx, Limits, Operation, OperationBody, ReadXdr, TransactionEnvelope,
    TransactionResult, TransactionResultResult,
};

use crate::error::BillError;
use crate::fee::Stroops;

/// One applied transaction as returned by `getTransactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
    /// `TransactionEnvelope` as base64 XDR
    pub envelope_xdr: String,
    /// `TransactionResult` as base64 XDR
    pub result_xdr: String,
}

/// Operation and fee totals over successful transactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeeAggregate {
    pub successful_transactions: u64,
    /// `InvokeHostFunction` operations
    pub contract_invocations: u64,
    /// `ExtendFootprintTtl` and `RestoreFootprint` operations
    pub other_soroban_operations: u64,
    pub classic_operations: u64,
    pub total_soroban_fee: Stroops,
    pub total_classic_fee: Stroops,
    /// Charged fee per contract invocation, in stroops
    pub average_soroban_fee: f64,
    /// Charged fee per classic transaction, in stroops
    pub average_classic_fee: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperationKind {
    ContractInvocation,
    OtherSoroban,
    Classic,
}

fn classify(op: &Operation) -> OperationKind {
    match op.body {
        OperationBody::InvokeHostFunction(_) => OperationKind::ContractInvocation,
        OperationBody::ExtendFootprintTtl(_) | OperationBody::RestoreFootprint(_) => {
            OperationKind::OtherSoroban
        }
        _ => OperationKind::Classic,
    }
}

/// Operations of the transaction that actually executes; fee bumps are unwrapped.
fn operations(envelope: &TransactionEnvelope) -> &[Operation] {
    match envelope {
        TransactionEnvelope::TxV0(v0) => v0.tx.operations.as_slice(),
        TransactionEnvelope::Tx(v1) => v1.tx.operations.as_slice(),
        TransactionEnvelope::TxFeeBump(bump) => {
            let FeeBumpTransactionInnerTx::Tx(inner) = &bump.tx.inner_tx;
            inner.tx.operations.as_slice()
        }
    }
}

fn is_success(result: &TransactionResult) -> bool {
    matches!(
        result.result,
        TransactionResultResult::TxSuccess(_) | TransactionResultResult::TxFeeBumpInnerSuccess(_)
    )
}

/// Aggregate charged fees over a set of applied transactions.
///
/// Failed transactions are ignored. A transaction's fee is attributed to
/// Soroban when its first operation invokes a host function.
pub fn aggregate_fees(transactions: &[LedgerTransaction]) -> Result<FeeAggregate, BillError> {
    let mut agg = FeeAggregate::default();
    let mut soroban_fee: i128 = 0;
    let mut classic_fee: i128 = 0;
    let mut classic_fee_transactions: u64 = 0;

    for (i, tx) in transactions.iter().enumerate() {
        let envelope = TransactionEnvelope::from_xdr_base64(&tx.envelope_xdr, Limits::none())
            .map_err(|e| BillError::xdr(format!("envelope of transaction {}", i), e))?;
        let result = TransactionResult::from_xdr_base64(&tx.result_xdr, Limits::none())
            .map_err(|e| BillError::xdr(format!("result of transaction {}", i), e))?;

        if !is_success(&result) {
            continue;
        }
        agg.successful_transactions += 1;

        let ops = operations(&envelope);
        match ops.first().map(classify) {
            Some(OperationKind::ContractInvocation) => soroban_fee += result.fee_charged as i128,
            Some(_) => {
                classic_fee += result.fee_charged as i128;
                classic_fee_transactions += 1;
            }
            None => log::warn!("transaction {} has no operations", i),
        }

        for op in ops {
            match classify(op) {
                OperationKind::ContractInvocation => agg.contract_invocations += 1,
                OperationKind::OtherSoroban => agg.other_soroban_operations += 1,
                OperationKind::Classic => agg.classic_operations += 1,
            }
        }
    }

    agg.total_soroban_fee = Stroops(clamp_i64(soroban_fee));
    agg.total_classic_fee = Stroops(clamp_i64(classic_fee));
    if agg.contract_invocations > 0 {
        agg.average_soroban_fee = soroban_fee as f64 / agg.contract_invocations as f64;
    }
    if classic_fee_transactions > 0 {
        agg.average_classic_fee = classic_fee as f64 / classic_fee_transactions as f64;
    }

    log::debug!(
        "aggregated {} of {} transaction(s): avg soroban {:.1}, avg classic {:.1}",
        agg.successful_transactions,
        transactions.len(),
        agg.average_soroban_fee,
        agg.average_classic_fee
    );
    Ok(agg)
}

fn clamp_i64(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}
