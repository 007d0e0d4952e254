//! Build the unsigned `TransactionEnvelope` that gets simulated.

use std::time::{SystemTime, UNIX_EPOCH};

use stellar_xdr::curr::{
    HostFunction, InvokeContractArgs, InvokeHostFunctionOp, Limits, Memo, MuxedAccount,
    Operation, OperationBody, Preconditions, PublicKey, SequenceNumber, TimeBounds, TimePoint,
    Transaction, TransactionEnvelope, TransactionExt, TransactionV1Envelope, VecM, WriteXdr,
};

use crate::config::InvocationConfig;
use crate::error::RpcError;

/// Build an unsigned envelope invoking `config.function` on `config.contract`.
///
/// `sequence_number` is the sequence the transaction will carry, i.e. the
/// account's current sequence plus one. The envelope has no signatures and
/// no Soroban data; simulation fills those in.
pub fn build_transaction_envelope(
    config: &InvocationConfig,
    sequence_number: i64,
) -> Result<TransactionEnvelope, RpcError> {
    let args = config
        .args
        .clone()
        .try_into()
        .map_err(|e| RpcError::Xdr(format!("arguments: {}", e)))?;

    let invoke_op = InvokeHostFunctionOp {
        host_function: HostFunction::InvokeContract(InvokeContractArgs {
            contract_address: config.contract.clone(),
            function_name: config.function.clone(),
            args,
        }),
        auth: VecM::default(),
    };

    let operations = vec![Operation {
        source_account: None,
        body: OperationBody::InvokeHostFunction(invoke_op),
    }]
    .try_into()
    .map_err(|e| RpcError::Xdr(format!("operations: {}", e)))?;

    let PublicKey::PublicKeyTypeEd25519(account_key) = &config.source_account.0;

    let tx = Transaction {
        source_account: MuxedAccount::Ed25519(account_key.clone()),
        fee: config.fee,
        seq_num: SequenceNumber(sequence_number),
        cond: preconditions(config.timeout_seconds, unix_now()),
        memo: Memo::None,
        operations,
        ext: TransactionExt::V0,
    };

    Ok(TransactionEnvelope::Tx(TransactionV1Envelope {
        tx,
        signatures: VecM::default(),
    }))
}

/// Serialize a `TransactionEnvelope` to base64 XDR.
pub fn envelope_to_base64(envelope: &TransactionEnvelope) -> Result<String, RpcError> {
    envelope
        .to_xdr_base64(Limits::none())
        .map_err(|e| RpcError::Xdr(format!("serialize envelope: {}", e)))
}

fn preconditions(timeout_seconds: u64, now: u64) -> Preconditions {
    if timeout_seconds == 0 {
        return Preconditions::None;
    }
    Preconditions::Time(TimeBounds {
        min_time: TimePoint(0),
        max_time: TimePoint(now.saturating_add(timeout_seconds)),
    })
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
