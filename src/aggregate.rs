//! Deterministic report aggregation.
//!
//! Combines ordered tool results and enrichment metadata into one
//! immutable [`AuditReport`]. The severity total is a field-wise sum, so
//! it is independent of result order; the results themselves keep the
//! policy order they arrived in.

use chrono::Utc;

use crate::model::{AuditReport, EtherscanData, ReportMetadata, SeverityCount, ToolResult};
use crate::policy::LevelPlan;

/// Builds the final report.
///
/// `overall_pass` holds iff every tool passed on its own terms and the
/// aggregate has no critical or high findings; severity dominates the
/// per-tool flags.
pub fn combine(
    contract: &str,
    plan: &LevelPlan,
    results: Vec<ToolResult>,
    contract_address: Option<String>,
    etherscan_data: EtherscanData,
    partial: bool,
) -> AuditReport {
    let mut aggregate = SeverityCount::default();
    for result in &results {
        aggregate.merge(&result.severity_count);
    }

    let overall_pass = results.iter().all(|r| r.passed) && aggregate.is_clean();

    AuditReport {
        contract: contract.to_string(),
        audit_level: plan.level,
        timestamp: Utc::now().to_rfc3339(),
        results,
        metadata: ReportMetadata {
            contract_address,
            etherscan_data,
        },
        aggregate_severity_count: aggregate,
        overall_pass,
        partial,
        continuous_monitoring: plan.continuous_monitoring,
    }
}
