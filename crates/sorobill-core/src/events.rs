//! Event accounting: bytes emitted by contract events during simulation.

use stellar_xdr::curr::{ContractEventType, DiagnosticEvent, Limits, ReadXdr, WriteXdr};

use crate::error::BillError;

/// Serialized size of every event, position for position.
///
/// Only `contract` events are billed; `system` and `diagnostic` events are
/// valued at zero rather than dropped so the output lines up with the input.
pub fn event_sizes(events: &[String]) -> Result<Vec<u64>, BillError> {
    events
        .iter()
        .enumerate()
        .map(|(i, encoded)| {
            let diagnostic = DiagnosticEvent::from_xdr_base64(encoded, Limits::none())
                .map_err(|e| BillError::xdr(format!("event {}", i), e))?;
            billable_size(&diagnostic, i)
        })
        .collect()
}

/// Total serialized size of the contract events in a simulation.
pub fn contract_event_bytes(events: &[String]) -> Result<u64, BillError> {
    let sizes = event_sizes(events)?;
    let total: u64 = sizes.iter().sum();
    log::debug!(
        "{} event(s), {} contract event byte(s)",
        sizes.len(),
        total
    );
    Ok(total)
}

fn billable_size(diagnostic: &DiagnosticEvent, index: usize) -> Result<u64, BillError> {
    if diagnostic.event.type_ != ContractEventType::Contract {
        return Ok(0);
    }
    let bytes = diagnostic
        .event
        .to_xdr(Limits::none())
        .map_err(|e| BillError::xdr(format!("event {}", index), e))?;
    Ok(bytes.len() as u64)
}
