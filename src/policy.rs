//! Audit level policy: which tools run at each depth, and for how long.
//!
//! The mapping is a static table with no side effects. Tool sets are
//! monotonic: quick ⊆ standard ⊆ deep, and forensic runs deep's tools
//! plus a continuous-monitoring flag on the report.

use std::time::Duration;

use crate::catalog::{self, ToolDescriptor};
use crate::model::AuditLevel;

/// The resolved execution plan for one audit level.
#[derive(Debug, Clone)]
pub struct LevelPlan {
    pub level: AuditLevel,
    /// Tools in execution order. Report results follow this order exactly.
    pub tools: Vec<ToolDescriptor>,
    /// Per-tool budget; an in-flight process exceeding it is terminated.
    pub tool_timeout: Duration,
    pub continuous_monitoring: bool,
}

/// Resolves an audit level to its ordered tool plan.
///
/// Deterministic and order-stable across calls.
pub fn resolve(level: AuditLevel) -> LevelPlan {
    let (tools, timeout_secs, continuous_monitoring) = match level {
        AuditLevel::Quick => (vec![catalog::SLITHER], 300, false),
        AuditLevel::Standard => (vec![catalog::SLITHER, catalog::MYTHRIL], 600, false),
        AuditLevel::Deep => (
            vec![
                catalog::SLITHER,
                catalog::MYTHRIL,
                catalog::ECHIDNA,
                catalog::CERTORA,
            ],
            1800,
            false,
        ),
        AuditLevel::Forensic => (
            vec![
                catalog::SLITHER,
                catalog::MYTHRIL,
                catalog::ECHIDNA,
                catalog::CERTORA,
            ],
            1800,
            true,
        ),
    };

    LevelPlan {
        level,
        tools,
        tool_timeout: Duration::from_secs(timeout_secs),
        continuous_monitoring,
    }
}
