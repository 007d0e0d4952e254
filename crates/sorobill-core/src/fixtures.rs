//! XDR values shared by the unit tests.

use stellar_xdr::curr::{
    AccountId, ContractDataDurability, ContractEvent, ContractEventBody, ContractEventType,
    ContractEventV0, ContractId, DiagnosticEvent, ExtensionPoint, Hash, LedgerFootprint,
    LedgerKey, LedgerKeyAccount, LedgerKeyContractCode, LedgerKeyContractData, Limits, PublicKey,
    ScAddress, ScVal, SorobanResources, SorobanTransactionData, SorobanTransactionDataExt,
    Uint256, VecM, WriteXdr,
};

pub(crate) fn contract_event(type_: ContractEventType, data_len: usize) -> ContractEvent {
    ContractEvent {
        ext: ExtensionPoint::V0,
        contract_id: None,
        type_,
        body: ContractEventBody::V0(ContractEventV0 {
            topics: VecM::default(),
            data: ScVal::Bytes(vec![7u8; data_len].try_into().unwrap()),
        }),
    }
}

pub(crate) fn diagnostic_event_b64(type_: ContractEventType, data_len: usize) -> String {
    DiagnosticEvent {
        in_successful_contract_call: true,
        event: contract_event(type_, data_len),
    }
    .to_xdr_base64(Limits::none())
    .unwrap()
}

/// 40 bytes serialized.
pub(crate) fn account_key(seed: u8) -> LedgerKey {
    LedgerKey::Account(LedgerKeyAccount {
        account_id: AccountId(PublicKey::PublicKeyTypeEd25519(Uint256([seed; 32]))),
    })
}

/// 36 bytes serialized.
pub(crate) fn code_key(seed: u8) -> LedgerKey {
    LedgerKey::ContractCode(LedgerKeyContractCode {
        hash: Hash([seed; 32]),
    })
}

/// 48 bytes serialized.
pub(crate) fn instance_key(seed: u8) -> LedgerKey {
    LedgerKey::ContractData(LedgerKeyContractData {
        contract: ScAddress::Contract(ContractId(Hash([seed; 32]))),
        key: ScVal::LedgerKeyContractInstance,
        durability: ContractDataDurability::Persistent,
    })
}

pub(crate) fn transaction_data(
    read_only: Vec<LedgerKey>,
    read_write: Vec<LedgerKey>,
    resource_fee: i64,
) -> SorobanTransactionData {
    SorobanTransactionData {
        ext: SorobanTransactionDataExt::V0,
        resources: SorobanResources {
            footprint: LedgerFootprint {
                read_only: read_only.try_into().unwrap(),
                read_write: read_write.try_into().unwrap(),
            },
            instructions: 9_000_000,
            disk_read_bytes: 2_048,
            write_bytes: 1_024,
        },
        resource_fee,
    }
}

pub(crate) fn transaction_data_b64(
    read_only: Vec<LedgerKey>,
    read_write: Vec<LedgerKey>,
    resource_fee: i64,
) -> String {
    transaction_data(read_only, read_write, resource_fee)
        .to_xdr_base64(Limits::none())
        .unwrap()
}

pub(crate) fn return_value_b64(value: ScVal) -> String {
    value.to_xdr_base64(Limits::none()).unwrap()
}
