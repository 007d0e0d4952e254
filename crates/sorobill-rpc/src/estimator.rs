//! Fee estimation orchestrator: account -> envelope -> simulate -> report -> fee.

use serde::Serialize;
use sorobill_core::{aggregate_fees, sorobill, FeeAggregate, FeeEstimate, Stroops, UsageReport};

use crate::args::account_strkey;
use crate::config::{EstimatorConfig, InvocationConfig};
use crate::error::RpcError;
use crate::rpc::SorobanRpc;
use crate::transaction::{build_transaction_envelope, envelope_to_base64};
use crate::types::{FeeStats, InclusionFeePercentile};

/// Ledgers looked back over when `aggregate` is given no start ledger.
pub const DEFAULT_LEDGER_WINDOW: u64 = 10;

/// Everything learned about one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    /// Sequence number the simulated transaction carried
    pub sequence: i64,
    /// Ledger the simulation ran against, when the node reported it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_ledger: Option<u64>,
    pub report: UsageReport,
    pub inclusion_fee_percentile: InclusionFeePercentile,
    pub fee: FeeEstimate,
    /// Resource fee of the restore that must run first, when entries are archived
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore_fee_stroops: Option<Stroops>,
}

/// Runs the estimate flow against any `SorobanRpc` implementation.
pub struct Estimator<R: SorobanRpc> {
    rpc: R,
    config: EstimatorConfig,
}

impl<R: SorobanRpc> Estimator<R> {
    pub fn new(rpc: R, config: EstimatorConfig) -> Self {
        Estimator { rpc, config }
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    /// Simulate the invocation and price it.
    ///
    /// Nothing is signed or submitted. A simulation that reports an error
    /// surfaces as `BillError::SimulationFailed`.
    pub fn estimate(&self, invocation: &InvocationConfig) -> Result<Estimate, RpcError> {
        let source = account_strkey(&invocation.source_account);
        let account = self.rpc.get_account(&source)?;
        let sequence = account.sequence.checked_add(1).ok_or_else(|| {
            RpcError::InvalidResponse(format!("sequence {} overflows", account.sequence))
        })?;
        log::info!("account {} at sequence {}", account.account_id, account.sequence);

        let envelope = build_transaction_envelope(invocation, sequence)?;
        let envelope_b64 = envelope_to_base64(&envelope)?;

        let sim = self
            .rpc
            .simulate_transaction(&envelope_b64, self.config.instruction_leeway)?;
        let report = sorobill(&sim, Some(&envelope_b64))?;
        let latest_ledger = sim
            .latest_ledger
            .as_ref()
            .map(|l| l.to_u64("latestLedger"))
            .transpose()?;
        log::info!(
            "simulated {}: resource fee {} stroops",
            invocation.function.0.to_utf8_string_lossy(),
            report.resource_fee_stroops.0
        );

        let restore_fee_stroops = sim.restore_fee()?;
        if let Some(restore) = restore_fee_stroops {
            log::warn!(
                "archived entries must be restored first (restore resource fee {} stroops)",
                restore.0
            );
        }

        let stats = self.rpc.get_fee_stats()?;
        let inclusion = stats.soroban_inclusion_fee(self.config.inclusion_fee)?;
        log::debug!(
            "inclusion fee {} stroops ({:?})",
            inclusion.0,
            self.config.inclusion_fee
        );
        let fee = FeeEstimate::new(&report, inclusion)?;

        Ok(Estimate {
            sequence,
            latest_ledger,
            report,
            inclusion_fee_percentile: self.config.inclusion_fee,
            fee,
            restore_fee_stroops,
        })
    }

    /// Current network inclusion fee distributions.
    pub fn fee_stats(&self) -> Result<FeeStats, RpcError> {
        self.rpc.get_fee_stats()
    }

    /// Average charged fees over up to `limit` recent transactions.
    ///
    /// Without `start_ledger`, starts `DEFAULT_LEDGER_WINDOW` ledgers back
    /// from the latest one.
    pub fn aggregate(
        &self,
        start_ledger: Option<u64>,
        limit: u32,
    ) -> Result<FeeAggregate, RpcError> {
        let start = match start_ledger {
            Some(start) => start,
            None => {
                let latest = self.rpc.get_latest_ledger()?;
                latest.saturating_sub(DEFAULT_LEDGER_WINDOW).max(1)
            }
        };
        let transactions = self.rpc.get_transactions(start, limit)?;
        log::info!(
            "aggregating {} transactions from ledger {}",
            transactions.len(),
            start
        );
        Ok(aggregate_fees(&transactions)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use sorobill_core::{
        BillError, Cost, InvocationResult, LedgerTransaction, RawInteger, RestorePreamble,
        SimulationResult,
    };
    use stellar_xdr::curr::{
        AccountId, ContractDataDurability, ContractEvent, ContractEventBody, ContractEventType,
        ContractEventV0, ContractId, DiagnosticEvent, ExtensionPoint, Hash, LedgerFootprint,
        LedgerKey, LedgerKeyAccount, LedgerKeyContractData, Limits, PublicKey, ReadXdr,
        ScAddress, ScVal, SorobanResources, SorobanTransactionData, SorobanTransactionDataExt,
        TransactionEnvelope, TransactionResult, TransactionResultExt, TransactionResultResult,
        Uint256, VecM, WriteXdr,
    };

    use crate::types::{AccountInfo, FeeDistribution};

    const ACCOUNT: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";
    const CONTRACT: &str = "CAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAABSC4";

    struct MockRpc {
        sequence: i64,
        simulation: SimulationResult,
        stats: FeeStats,
        latest_ledger: u64,
        transactions: Vec<LedgerTransaction>,
        simulated: RefCell<Vec<(String, Option<u64>)>>,
        requested_start: RefCell<Option<u64>>,
    }

    impl MockRpc {
        fn new(simulation: SimulationResult) -> Self {
            MockRpc {
                sequence: 41,
                simulation,
                stats: FeeStats {
                    soroban_inclusion_fee: FeeDistribution {
                        max: 210,
                        p50: 120,
                        ..FeeDistribution::default()
                    },
                    ..FeeStats::default()
                },
                latest_ledger: 1_000,
                transactions: vec![],
                simulated: RefCell::new(vec![]),
                requested_start: RefCell::new(None),
            }
        }
    }

    impl SorobanRpc for MockRpc {
        fn get_account(&self, account_id: &str) -> Result<AccountInfo, RpcError> {
            Ok(AccountInfo {
                account_id: account_id.to_string(),
                sequence: self.sequence,
            })
        }

        fn simulate_transaction(
            &self,
            tx_xdr_base64: &str,
            instruction_leeway: Option<u64>,
        ) -> Result<SimulationResult, RpcError> {
            self.simulated
                .borrow_mut()
                .push((tx_xdr_base64.to_string(), instruction_leeway));
            Ok(self.simulation.clone())
        }

        fn get_fee_stats(&self) -> Result<FeeStats, RpcError> {
            Ok(self.stats.clone())
        }

        fn get_latest_ledger(&self) -> Result<u64, RpcError> {
            Ok(self.latest_ledger)
        }

        fn get_transactions(
            &self,
            start_ledger: u64,
            _limit: u32,
        ) -> Result<Vec<LedgerTransaction>, RpcError> {
            *self.requested_start.borrow_mut() = Some(start_ledger);
            Ok(self.transactions.clone())
        }
    }

    /// 52 bytes serialized as a ContractEvent.
    fn contract_event_b64(type_: ContractEventType) -> String {
        DiagnosticEvent {
            in_successful_contract_call: true,
            event: ContractEvent {
                ext: ExtensionPoint::V0,
                contract_id: None,
                type_,
                body: ContractEventBody::V0(ContractEventV0 {
                    topics: VecM::default(),
                    data: ScVal::Bytes(vec![7u8; 24].try_into().unwrap()),
                }),
            },
        }
        .to_xdr_base64(Limits::none())
        .unwrap()
    }

    fn transaction_data_b64(resource_fee: i64) -> String {
        let read_only = vec![LedgerKey::ContractData(LedgerKeyContractData {
            contract: ScAddress::Contract(ContractId(Hash([0u8; 32]))),
            key: ScVal::LedgerKeyContractInstance,
            durability: ContractDataDurability::Persistent,
        })];
        let read_write = vec![LedgerKey::Account(LedgerKeyAccount {
            account_id: AccountId(PublicKey::PublicKeyTypeEd25519(Uint256([0u8; 32]))),
        })];
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
        .to_xdr_base64(Limits::none())
        .unwrap()
    }

    fn hello_simulation() -> SimulationResult {
        let symbol = ScVal::Symbol("Dev".to_string().try_into().unwrap());
        SimulationResult {
            events: vec![
                contract_event_b64(ContractEventType::Contract),
                contract_event_b64(ContractEventType::Diagnostic),
            ],
            results: vec![InvocationResult {
                xdr: symbol.to_xdr_base64(Limits::none()).unwrap(),
                auth: vec![],
            }],
            transaction_data: Some(transaction_data_b64(50_000)),
            cost: Some(Cost {
                cpu_insns: RawInteger::Text("1234567".to_string()),
                mem_bytes: RawInteger::Text("89012".to_string()),
            }),
            latest_ledger: Some(RawInteger::Text("999".to_string())),
            ..SimulationResult::default()
        }
    }

    fn hello_invocation() -> InvocationConfig {
        let dev = ScVal::Symbol("Dev".to_string().try_into().unwrap());
        InvocationConfig::new(ACCOUNT, CONTRACT, "hello", vec![dev]).unwrap()
    }

    #[test]
    fn estimate_runs_the_full_flow() {
        let estimator = Estimator::new(MockRpc::new(hello_simulation()), EstimatorConfig::default());
        let estimate = estimator.estimate(&hello_invocation()).unwrap();

        assert_eq!(estimate.sequence, 42);
        assert_eq!(estimate.latest_ledger, Some(999));

        let report = &estimate.report;
        assert_eq!(report.cpu_insns, 1_234_567);
        assert_eq!(report.mem_bytes, 89_012);
        assert_eq!(report.entry_reads, 2);
        assert_eq!(report.entry_writes, 1);
        assert_eq!(report.read_bytes, 2_048);
        assert_eq!(report.write_bytes, 1_024);
        // one 52-byte contract event plus a 12-byte symbol
        assert_eq!(report.events_and_return_bytes, 64);
        assert_eq!(report.max_key_bytes, 48);

        assert_eq!(estimate.fee.resource_fee_stroops, Stroops(50_000));
        assert_eq!(estimate.fee.inclusion_fee_stroops, Stroops(210));
        assert_eq!(estimate.fee.total_fee_stroops, Stroops(50_210));
    }

    #[test]
    fn estimate_simulates_the_built_envelope() {
        let estimator = Estimator::new(MockRpc::new(hello_simulation()), EstimatorConfig::default());
        let estimate = estimator.estimate(&hello_invocation()).unwrap();

        let simulated = estimator.rpc().simulated.borrow();
        assert_eq!(simulated.len(), 1);
        let (tx_b64, leeway) = &simulated[0];
        assert_eq!(*leeway, Some(3_000_000));

        let envelope = TransactionEnvelope::from_xdr_base64(tx_b64, Limits::none()).unwrap();
        match envelope {
            TransactionEnvelope::Tx(v1) => {
                assert_eq!(v1.tx.seq_num.0, 42);
                assert_eq!(v1.tx.fee, 100);
            }
            other => panic!("expected Tx variant, got {:?}", other),
        }

        let decoded_len = STANDARD.decode(tx_b64).unwrap().len() as u64;
        assert_eq!(estimate.report.min_txn_bytes, Some(decoded_len));
    }

    #[test]
    fn estimate_uses_configured_percentile_and_leeway() {
        let config = EstimatorConfig {
            instruction_leeway: None,
            inclusion_fee: InclusionFeePercentile::P50,
        };
        let estimator = Estimator::new(MockRpc::new(hello_simulation()), config);
        let estimate = estimator.estimate(&hello_invocation()).unwrap();

        assert_eq!(estimate.fee.inclusion_fee_stroops, Stroops(120));
        assert_eq!(estimate.fee.total_fee_stroops, Stroops(50_120));
        assert_eq!(estimator.rpc().simulated.borrow()[0].1, None);
    }

    #[test]
    fn estimate_prices_call_that_needs_restore() {
        let mut sim = hello_simulation();
        sim.restore_preamble = Some(RestorePreamble {
            transaction_data: transaction_data_b64(8_400),
            min_resource_fee: Some(RawInteger::Text("8400".to_string())),
        });
        let estimator = Estimator::new(MockRpc::new(sim), EstimatorConfig::default());
        let estimate = estimator.estimate(&hello_invocation()).unwrap();

        assert_eq!(estimate.restore_fee_stroops, Some(Stroops(8_400)));
        assert_eq!(estimate.fee.total_fee_stroops, Stroops(50_210));
        let json = serde_json::to_value(&estimate).unwrap();
        assert_eq!(json["restore_fee_stroops"], 8_400);
    }

    #[test]
    fn estimate_without_restore_omits_it() {
        let estimator = Estimator::new(MockRpc::new(hello_simulation()), EstimatorConfig::default());
        let estimate = estimator.estimate(&hello_invocation()).unwrap();
        assert_eq!(estimate.restore_fee_stroops, None);
        let json = serde_json::to_value(&estimate).unwrap();
        assert!(json.get("restore_fee_stroops").is_none(), "json: {}", json);
    }

    #[test]
    fn estimate_surfaces_simulation_error() {
        let sim = SimulationResult {
            error: Some("HostError: Error(Contract, #1)".to_string()),
            ..SimulationResult::default()
        };
        let estimator = Estimator::new(MockRpc::new(sim), EstimatorConfig::default());
        let err = estimator.estimate(&hello_invocation()).unwrap_err();
        match err {
            RpcError::Bill(BillError::SimulationFailed(msg)) => {
                assert!(msg.contains("Contract"), "msg: {}", msg)
            }
            other => panic!("expected SimulationFailed, got {:?}", other),
        }
    }

    #[test]
    fn estimate_is_repeatable() {
        let estimator = Estimator::new(MockRpc::new(hello_simulation()), EstimatorConfig::default());
        let first = estimator.estimate(&hello_invocation()).unwrap();
        let second = estimator.estimate(&hello_invocation()).unwrap();
        assert_eq!(first.report, second.report);
        assert_eq!(first.fee, second.fee);
    }

    fn soroban_transaction(fee_charged: i64) -> LedgerTransaction {
        let envelope = build_transaction_envelope(&hello_invocation(), 7).unwrap();
        let result = TransactionResult {
            fee_charged,
            result: TransactionResultResult::TxSuccess(VecM::default()),
            ext: TransactionResultExt::V0,
        };
        LedgerTransaction {
            envelope_xdr: envelope_to_base64(&envelope).unwrap(),
            result_xdr: result.to_xdr_base64(Limits::none()).unwrap(),
        }
    }

    #[test]
    fn aggregate_defaults_to_recent_window() {
        let mut rpc = MockRpc::new(SimulationResult::default());
        rpc.transactions = vec![soroban_transaction(1_000), soroban_transaction(3_000)];
        let estimator = Estimator::new(rpc, EstimatorConfig::default());

        let agg = estimator.aggregate(None, 100).unwrap();
        assert_eq!(*estimator.rpc().requested_start.borrow(), Some(990));
        assert_eq!(agg.successful_transactions, 2);
        assert_eq!(agg.contract_invocations, 2);
        assert_eq!(agg.total_soroban_fee, Stroops(4_000));
        assert_eq!(agg.average_soroban_fee, 2_000.0);
    }

    #[test]
    fn aggregate_honours_explicit_start() {
        let mut rpc = MockRpc::new(SimulationResult::default());
        rpc.latest_ledger = 5;
        let estimator = Estimator::new(rpc, EstimatorConfig::default());

        let agg = estimator.aggregate(Some(3), 10).unwrap();
        assert_eq!(*estimator.rpc().requested_start.borrow(), Some(3));
        assert_eq!(agg, FeeAggregate::default());

        estimator.aggregate(None, 10).unwrap();
        assert_eq!(*estimator.rpc().requested_start.borrow(), Some(1));
    }
}
