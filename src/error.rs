use thiserror::Error;

/// Fatal pipeline errors.
///
/// Both variants occur before any report exists and abort the run. Every
/// other failure mode (tool errors, timeouts, enrichment degradation) is
/// recorded as data inside the report instead of surfacing here.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("contract file not found: {0}")]
    ContractNotFound(String),

    #[error("invalid audit level: {0} (use quick, standard, deep, or forensic)")]
    InvalidAuditLevel(String),
}
