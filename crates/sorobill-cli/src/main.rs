use std::fs;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sorobill_core::{
    format_human_report, format_number, format_stroops, sorobill, BillError, FeeAggregate,
    SimulationResult, Stroops,
};
use sorobill_rpc::{
    parse_arg, resolve_rpc_url, Estimate, Estimator, EstimatorConfig, FeeDistribution, FeeStats,
    InclusionFeePercentile, InvocationConfig, RpcClient, RpcError,
};

/// Environment variable holding the source account or secret key.
const SOURCE_ENV: &str = "SOROBILL_SOURCE";

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "sorobill", about = "Soroban invocation fee estimator")]
#[command(version)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a contract call and estimate its total fee
    Estimate {
        /// Source account (G...) or secret key (S...); falls back to SOROBILL_SOURCE
        #[arg(long)]
        source: Option<String>,
        /// Contract address (C...)
        #[arg(long)]
        contract: String,
        /// Contract function to invoke
        #[arg(long)]
        function: String,
        /// Function argument as type:value (repeatable)
        #[arg(long = "arg")]
        args: Vec<String>,
        #[command(flatten)]
        network: NetworkArgs,
        /// Inclusion fee bid placed in the envelope, in stroops
        #[arg(long, default_value_t = sorobill_rpc::BASE_FEE)]
        fee: u32,
        /// Transaction validity window in seconds (0 for none)
        #[arg(long, default_value_t = 30)]
        timeout: u64,
        /// Extra instructions added on top of the simulated count
        #[arg(long, default_value_t = 3_000_000)]
        instruction_leeway: u64,
        /// Point of the Soroban inclusion fee distribution to quote
        #[arg(long, value_enum, default_value_t = InclusionFee::Max)]
        inclusion_fee: InclusionFee,
        /// Output JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Build a usage report from a saved simulateTransaction response
    Report {
        /// JSON file with the simulation result (bare or JSON-RPC envelope)
        #[arg(long)]
        simulation: String,
        /// Simulated transaction envelope as base64 XDR
        #[arg(long, conflicts_with = "tx_file")]
        tx: Option<String>,
        /// File containing the base64 transaction envelope
        #[arg(long)]
        tx_file: Option<String>,
        /// Output JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Show current network inclusion fee statistics
    FeeStats {
        #[command(flatten)]
        network: NetworkArgs,
        /// Output JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Average the fees charged over recent ledger transactions
    Aggregate {
        /// First ledger to read (default: a few ledgers before the latest)
        #[arg(long)]
        start_ledger: Option<u64>,
        /// Maximum number of transactions to read
        #[arg(long, default_value_t = 200)]
        limit: u32,
        #[command(flatten)]
        network: NetworkArgs,
        /// Output JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct NetworkArgs {
    /// Network name (testnet, mainnet, futurenet)
    #[arg(long, default_value = "testnet")]
    network: String,
    /// RPC endpoint URL (overrides SOROBILL_RPC_URL env and network default)
    #[arg(long)]
    rpc_url: Option<String>,
    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 30)]
    rpc_timeout: u64,
}

impl NetworkArgs {
    fn client(&self) -> Result<RpcClient, CliError> {
        let url = resolve_rpc_url(self.rpc_url.as_deref(), &self.network)?;
        log::debug!("using RPC endpoint {}", url);
        Ok(RpcClient::with_timeout(
            &url,
            Duration::from_secs(self.rpc_timeout),
        )?)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum InclusionFee {
    Max,
    P99,
    P90,
    P50,
    Mode,
    Min,
}

impl From<InclusionFee> for InclusionFeePercentile {
    fn from(fee: InclusionFee) -> Self {
        match fee {
            InclusionFee::Max => InclusionFeePercentile::Max,
            InclusionFee::P99 => InclusionFeePercentile::P99,
            InclusionFee::P90 => InclusionFeePercentile::P90,
            InclusionFee::P50 => InclusionFeePercentile::P50,
            InclusionFee::Mode => InclusionFeePercentile::Mode,
            InclusionFee::Min => InclusionFeePercentile::Min,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Bill(#[from] BillError),
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot encode output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("{0}")]
    Usage(String),
}

// ---------------------------------------------------------------------------
// ANSI helpers
// ---------------------------------------------------------------------------

struct Colors {
    red: &'static str,
    yellow: &'static str,
    cyan: &'static str,
    bold: &'static str,
    reset: &'static str,
}

const COLORS_ON: Colors = Colors {
    red: "\x1b[31m",
    yellow: "\x1b[33m",
    cyan: "\x1b[36m",
    bold: "\x1b[1m",
    reset: "\x1b[0m",
};

const COLORS_OFF: Colors = Colors {
    red: "",
    yellow: "",
    cyan: "",
    bold: "",
    reset: "",
};

fn choose_colors(no_color: bool) -> &'static Colors {
    if no_color {
        &COLORS_OFF
    } else {
        &COLORS_ON
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let c = choose_colors(cli.no_color);

    match run(cli.command, c) {
        Ok(out) => print!("{}", out),
        Err(e) => {
            eprintln!("{}{}error{}: {}", c.red, c.bold, c.reset, e);
            if let CliError::Bill(bill) = &e {
                if bill.is_decode_error() {
                    eprintln!(
                        "{}hint{}: the simulation or envelope is not valid XDR for this protocol",
                        c.cyan, c.reset
                    );
                }
            }
            process::exit(1);
        }
    }
}

fn run(command: Commands, c: &Colors) -> Result<String, CliError> {
    match command {
        Commands::Estimate {
            source,
            contract,
            function,
            args,
            network,
            fee,
            timeout,
            instruction_leeway,
            inclusion_fee,
            json,
        } => {
            let source = resolve_source(source.as_deref(), c)?;
            let args = args
                .iter()
                .map(|a| parse_arg(a))
                .collect::<Result<Vec<_>, _>>()?;
            let mut invocation = InvocationConfig::new(&source, &contract, &function, args)?;
            invocation.fee = fee;
            invocation.timeout_seconds = timeout;

            let config = EstimatorConfig {
                instruction_leeway: Some(instruction_leeway),
                inclusion_fee: inclusion_fee.into(),
            };
            let estimator = Estimator::new(network.client()?, config);
            let estimate = estimator.estimate(&invocation)?;

            if json {
                to_json(&estimate)
            } else {
                Ok(format_estimate(&contract, &function, &estimate, c))
            }
        }

        Commands::Report {
            simulation,
            tx,
            tx_file,
            json,
        } => {
            let sim = SimulationResult::from_json(&read_file(&simulation)?)?;
            let tx = match (tx, tx_file) {
                (Some(tx), _) => Some(tx),
                (None, Some(path)) => Some(read_file(&path)?),
                (None, None) => None,
            };
            let report = sorobill(&sim, tx.as_deref())?;
            let restore = sim.restore_fee()?;

            if json {
                if let Some(fee) = restore {
                    eprint!("{}", format_restore_warning(fee, c));
                }
                to_json(&report)
            } else {
                let mut out = format!(
                    "{}Usage report{}\n{}",
                    c.bold,
                    c.reset,
                    format_human_report(&report)
                );
                if let Some(fee) = restore {
                    out.push_str(&format_restore_warning(fee, c));
                }
                Ok(out)
            }
        }

        Commands::FeeStats { network, json } => {
            let estimator = Estimator::new(network.client()?, EstimatorConfig::default());
            let stats = estimator.fee_stats()?;
            if json {
                to_json(&stats)
            } else {
                Ok(format_fee_stats(&stats, c))
            }
        }

        Commands::Aggregate {
            start_ledger,
            limit,
            network,
            json,
        } => {
            if limit == 0 {
                return Err(CliError::Usage("--limit must be at least 1".to_string()));
            }
            let estimator = Estimator::new(network.client()?, EstimatorConfig::default());
            let agg = estimator.aggregate(start_ledger, limit)?;
            if json {
                to_json(&agg)
            } else {
                Ok(format_aggregate(&agg, c))
            }
        }
    }
}

/// Resolve the source from --source or SOROBILL_SOURCE.
fn resolve_source(explicit: Option<&str>, c: &Colors) -> Result<String, CliError> {
    if let Some(source) = explicit {
        if source.starts_with('S') {
            eprintln!(
                "{}warning{}: passing secret keys via CLI arguments may expose them in shell history",
                c.yellow, c.reset
            );
        }
        return Ok(source.to_string());
    }

    match std::env::var(SOURCE_ENV) {
        Ok(source) if !source.is_empty() => Ok(source),
        _ => Err(CliError::Usage(format!(
            "no source account provided. Use --source G... or set {}",
            SOURCE_ENV
        ))),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    Ok(out)
}

fn read_file(path: &str) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Human-readable output
// ---------------------------------------------------------------------------

fn format_estimate(contract: &str, function: &str, estimate: &Estimate, c: &Colors) -> String {
    let contract_short = if contract.is_ascii() && contract.len() > 10 {
        format!("{}...{}", &contract[..4], &contract[contract.len() - 4..])
    } else {
        contract.to_string()
    };

    let mut out = format!(
        "{}Estimate{} for {}.{}() at sequence {}\n",
        c.bold, c.reset, contract_short, function, estimate.sequence
    );
    if let Some(ledger) = estimate.latest_ledger {
        out.push_str(&format!("  Ledger:         {}\n", ledger));
    }
    out.push_str(&format_human_report(&estimate.report));

    let fee = &estimate.fee;
    out.push_str(&format!(
        "  Inclusion fee:  {} stroops ({})\n",
        format_stroops(fee.inclusion_fee_stroops),
        estimate.inclusion_fee_percentile
    ));
    out.push_str(&format!(
        "  {}Total fee:      {} stroops ({} XLM){}\n",
        c.bold,
        format_stroops(fee.total_fee_stroops),
        fee.total_fee_stroops,
        c.reset
    ));
    if let Some(restore) = estimate.restore_fee_stroops {
        out.push_str(&format_restore_warning(restore, c));
    }
    out
}

fn format_restore_warning(restore_fee: Stroops, c: &Colors) -> String {
    format!(
        "{}warning{}: archived entries must be restored first; the restore costs a further {} stroops ({} XLM) in resource fees\n",
        c.yellow,
        c.reset,
        format_stroops(restore_fee),
        restore_fee
    )
}

fn format_distribution(name: &str, dist: &FeeDistribution) -> String {
    format!(
        "  {:<9} min {}  mode {}  p50 {}  p90 {}  p99 {}  max {}  ({} txs over {} ledgers)\n",
        name,
        format_number(dist.min),
        format_number(dist.mode),
        format_number(dist.p50),
        format_number(dist.p90),
        format_number(dist.p99),
        format_number(dist.max),
        dist.transaction_count,
        dist.ledger_count
    )
}

fn format_fee_stats(stats: &FeeStats, c: &Colors) -> String {
    let mut out = format!(
        "{}Inclusion fees{} in stroops (latest ledger {})\n",
        c.bold, c.reset, stats.latest_ledger
    );
    out.push_str(&format_distribution("Soroban", &stats.soroban_inclusion_fee));
    out.push_str(&format_distribution("Classic", &stats.inclusion_fee));
    out
}

fn format_aggregate(agg: &FeeAggregate, c: &Colors) -> String {
    let mut out = format!(
        "{}Charged fees{} over {} successful transaction(s)\n",
        c.bold, c.reset, agg.successful_transactions
    );
    out.push_str(&format!(
        "  Contract calls: {} (avg {:.0} stroops)\n",
        agg.contract_invocations, agg.average_soroban_fee
    ));
    out.push_str(&format!(
        "  Other Soroban:  {}\n",
        agg.other_soroban_operations
    ));
    out.push_str(&format!(
        "  Classic ops:    {} (avg {:.0} stroops per tx)\n",
        agg.classic_operations, agg.average_classic_fee
    ));
    out.push_str(&format!(
        "  Total charged:  {} XLM Soroban, {} XLM classic\n",
        agg.total_soroban_fee, agg.total_classic_fee
    ));
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
