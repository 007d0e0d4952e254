//! Resource usage and fee accounting for simulated Soroban invocations.
//!
//! Everything here is a pure function of its inputs: no I/O, no shared state.

pub mod aggregate;
pub mod error;
pub mod events;
pub mod fee;
pub mod report;
pub mod resources;
pub mod simulation;

#[cfg(test)]
mod fixtures;

pub use aggregate::{aggregate_fees, FeeAggregate, LedgerTransaction};
pub use error::BillError;
pub use fee::{FeeEstimate, Stroops, STROOPS_PER_XLM};
pub use report::{format_human_report, format_number, format_stroops, sorobill, UsageReport};
pub use resources::{CostMetrics, Footprint, ResourceDeclaration};
pub use simulation::{Cost, InvocationResult, RawInteger, RestorePreamble, SimulationResult};
