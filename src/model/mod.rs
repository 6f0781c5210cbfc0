//! Core data types for audit levels, tool results, and reports.
//!
//! This module contains the fundamental types used throughout solaudit:
//!
//! - [`AuditLevel`] - The requested audit depth
//! - [`Severity`] - Classification of a finding
//! - [`SeverityCount`] - Per-bucket finding totals
//! - [`ToolResult`] - The outcome of one analysis tool run
//! - [`EtherscanData`] - On-chain metadata (real, simulated, or degraded)
//! - [`AuditReport`] - The final aggregated report
//!
//! # Example
//!
//! ```
//! use solaudit::model::{AuditLevel, SeverityCount, ToolResult};
//!
//! let result = ToolResult::completed("Slither", SeverityCount::default(), 1.2);
//! assert!(result.passed);
//! assert_eq!(AuditLevel::Quick.as_str(), "quick");
//! ```

mod report;

pub use report::*;
