//! Error types for the fee accounting transform.

/// Errors that can occur while turning a simulation into a usage report.
#[derive(Debug, thiserror::Error)]
pub enum BillError {
    /// A base64 payload could not be decoded
    #[error("invalid base64 in {what}: {source}")]
    Base64 {
        what: String,
        #[source]
        source: base64::DecodeError,
    },
    /// A binary XDR structure could not be decoded or re-encoded
    #[error("XDR error in {what}: {source}")]
    Xdr {
        what: String,
        #[source]
        source: stellar_xdr::curr::Error,
    },
    /// The simulation payload is not valid JSON or has the wrong shape
    #[error("invalid simulation JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// A field required to build the report is absent
    #[error("simulation is missing '{0}'")]
    MissingData(&'static str),
    /// A numeric field could not be read as an exact integer
    #[error("invalid integer in '{field}': {value}")]
    InvalidNumber { field: &'static str, value: String },
    /// The simulation itself reported an error
    #[error("simulation failed: {0}")]
    SimulationFailed(String),
    /// The footprint has no keys, so there is no maximum key size
    #[error("footprint is empty: max key size is undefined")]
    EmptyFootprint,
    /// Adding fee components overflowed the stroop range
    #[error("fee overflow: {resource} + {inclusion} stroops")]
    FeeOverflow { resource: i64, inclusion: i64 },
}

impl BillError {
    pub(crate) fn base64(what: impl Into<String>, source: base64::DecodeError) -> Self {
        BillError::Base64 {
            what: what.into(),
            source,
        }
    }

    pub(crate) fn xdr(what: impl Into<String>, source: stellar_xdr::curr::Error) -> Self {
        BillError::Xdr {
            what: what.into(),
            source,
        }
    }

    /// True for base64/XDR decode failures, which can never succeed on retry.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, BillError::Base64 { .. } | BillError::Xdr { .. })
    }
}
