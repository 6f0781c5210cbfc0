//! The audit pipeline: validate, resolve, run tools, enrich, aggregate.
//!
//! The orchestrator is a straight-line sequence with two fatal
//! preconditions (missing contract, unknown level) and otherwise
//! unconditional continuation: every tool failure, timeout, or enrichment
//! degradation is carried into the report as data.

use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::aggregate;
use crate::error::AuditError;
use crate::etherscan::Enricher;
use crate::model::{AuditLevel, AuditReport, ToolResult};
use crate::policy::{self, LevelPlan};
use crate::runner;

pub struct Orchestrator {
    enricher: Box<dyn Enricher>,
    /// Overrides the per-level tool budget when set (CLI `--timeout` or
    /// the config file).
    tool_timeout: Option<Duration>,
}

impl Orchestrator {
    pub fn new(enricher: Box<dyn Enricher>) -> Self {
        Self {
            enricher,
            tool_timeout: None,
        }
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    /// Runs one complete audit.
    ///
    /// Fails only on the two fatal preconditions; once past those, a
    /// report is always produced, possibly with degraded fields, and a
    /// cancelled run still yields a partial report with every collected
    /// result.
    pub async fn run(
        &self,
        contract: &Path,
        level: &str,
        address: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<AuditReport, AuditError> {
        if !contract.is_file() {
            return Err(AuditError::ContractNotFound(
                contract.display().to_string(),
            ));
        }
        if contract.extension().map_or(true, |ext| ext != "sol") {
            warn!(contract = %contract.display(), "contract does not have a .sol extension");
        }

        let level: AuditLevel = level.parse()?;
        let plan = policy::resolve(level);

        info!(
            level = %level,
            tools = plan.tools.len(),
            contract = %contract.display(),
            "starting audit"
        );

        Ok(self.run_plan(contract, &plan, address, cancel).await)
    }

    /// Executes a resolved plan. Enrichment is independent of the tool
    /// loop, so the two run concurrently; results are assembled in policy
    /// order regardless.
    async fn run_plan(
        &self,
        contract: &Path,
        plan: &LevelPlan,
        address: Option<&str>,
        cancel: &CancellationToken,
    ) -> AuditReport {
        let ((results, partial), etherscan_data) = tokio::join!(
            run_tools(contract, plan, self.tool_timeout, cancel),
            self.enricher.fetch(address)
        );

        aggregate::combine(
            &contract.display().to_string(),
            plan,
            results,
            address.map(String::from),
            etherscan_data,
            partial,
        )
    }
}

/// Runs the plan's tools sequentially, stopping early on cancellation.
///
/// The in-flight tool future is dropped on cancellation, which kills the
/// underlying process; results already collected are kept.
async fn run_tools(
    contract: &Path,
    plan: &LevelPlan,
    override_timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> (Vec<ToolResult>, bool) {
    let mut results = Vec::with_capacity(plan.tools.len());

    for descriptor in &plan.tools {
        // An explicit override wins; otherwise the tool's own default
        // caps the level budget.
        let timeout = override_timeout.unwrap_or(descriptor.default_timeout.min(plan.tool_timeout));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(
                    completed = results.len(),
                    scheduled = plan.tools.len(),
                    "audit cancelled, emitting partial report"
                );
                return (results, true);
            }
            result = runner::run(contract, descriptor, timeout) => {
                info!(
                    tool = descriptor.name,
                    passed = result.passed,
                    findings = result.severity_count.total(),
                    "tool finished"
                );
                results.push(result);
            }
        }
    }

    (results, false)
}
