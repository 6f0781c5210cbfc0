use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AuditError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Quick,
    Standard,
    Deep,
    Forensic,
}

impl AuditLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditLevel::Quick => "quick",
            AuditLevel::Standard => "standard",
            AuditLevel::Deep => "deep",
            AuditLevel::Forensic => "forensic",
        }
    }
}

impl std::fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AuditLevel {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" => Ok(AuditLevel::Quick),
            "standard" => Ok(AuditLevel::Standard),
            "deep" => Ok(AuditLevel::Deep),
            "forensic" => Ok(AuditLevel::Forensic),
            _ => Err(AuditError::InvalidAuditLevel(s.to_string())),
        }
    }
}

/// Severity bucket for a single finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Informational,
}

impl Severity {
    /// Maps a tool-reported severity label onto one of the five buckets.
    ///
    /// Unrecognized labels land in `Informational` so a tool emitting a
    /// nonstandard level never loses a finding.
    pub fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" => Severity::Medium,
            "low" => Severity::Low,
            _ => Severity::Informational,
        }
    }
}

/// Finding totals per severity bucket.
///
/// All five buckets are always present, defaulting to zero, so report
/// consumers never have to handle a missing key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCount {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
    pub informational: u32,
}

impl SeverityCount {
    /// Increments the bucket for one finding.
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
            Severity::Informational => self.informational += 1,
        }
    }

    /// Field-wise addition of another count into this one.
    pub fn merge(&mut self, other: &SeverityCount) {
        self.critical += other.critical;
        self.high += other.high;
        self.medium += other.medium;
        self.low += other.low;
        self.informational += other.informational;
    }

    pub fn total(&self) -> u32 {
        self.critical + self.high + self.medium + self.low + self.informational
    }

    /// True when no critical or high findings are present.
    pub fn is_clean(&self) -> bool {
        self.critical == 0 && self.high == 0
    }
}

/// The outcome of running one analysis tool. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool: String,
    pub passed: bool,
    pub severity_count: SeverityCount,
    /// Wall-clock execution time in seconds, recorded on every path
    /// including failures and timeouts.
    pub execution_time: f64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub timeout: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ToolResult {
    /// Result for a tool that ran to completion with parseable output.
    ///
    /// `passed` reflects the tool's own success criterion: no critical
    /// or high findings.
    pub fn completed(
        tool: impl Into<String>,
        severity_count: SeverityCount,
        execution_time: f64,
    ) -> Self {
        Self {
            tool: tool.into(),
            passed: severity_count.is_clean(),
            severity_count,
            execution_time,
            timeout: false,
            note: None,
        }
    }

    /// Result for a tool that could not produce findings (missing binary,
    /// spawn failure, unparseable output).
    pub fn failed(tool: impl Into<String>, note: impl Into<String>, execution_time: f64) -> Self {
        Self {
            tool: tool.into(),
            passed: false,
            severity_count: SeverityCount::default(),
            execution_time,
            timeout: false,
            note: Some(note.into()),
        }
    }

    /// Result for a tool whose in-flight process exceeded its budget and
    /// was terminated.
    pub fn timed_out(tool: impl Into<String>, execution_time: f64) -> Self {
        Self {
            tool: tool.into(),
            passed: false,
            severity_count: SeverityCount::default(),
            execution_time,
            timeout: true,
            note: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    NotVerified,
    Unknown,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Verified => "verified",
            VerificationStatus::NotVerified => "not_verified",
            VerificationStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// On-chain metadata for the audited contract.
///
/// Exactly one provenance applies to a value at a time: populated from the
/// network, simulated (no API key), informational (no address), or degraded
/// by a request error. `note` records which. Fields the API cannot supply
/// stay `None`; they are never fabricated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtherscanData {
    pub verification_status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployer_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EtherscanData {
    fn empty() -> Self {
        Self {
            verification_status: VerificationStatus::Unknown,
            transaction_count: None,
            deployer_address: None,
            creation_date: None,
            api_endpoint: None,
            note: None,
            error: None,
        }
    }

    /// Informational variant: no address was supplied, nothing was fetched.
    pub fn no_address() -> Self {
        Self {
            note: Some(
                "No contract address provided. Pass --address to fetch on-chain data."
                    .to_string(),
            ),
            ..Self::empty()
        }
    }

    /// The supplied address failed the format check; nothing was fetched.
    pub fn invalid_address() -> Self {
        Self {
            error: Some("invalid_address".to_string()),
            note: Some("address must be 0x followed by 40 hex characters".to_string()),
            ..Self::empty()
        }
    }

    /// No API key configured: a placeholder that is explicit about not
    /// being real on-chain data.
    pub fn simulated() -> Self {
        Self {
            note: Some(
                "simulated data - set ETHERSCAN_API_KEY for real on-chain data".to_string(),
            ),
            ..Self::empty()
        }
    }

    /// A network request failed; the reason is preserved for the report.
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            note: Some("degraded: network failure".to_string()),
            ..Self::empty()
        }
    }
}

/// Report metadata block: the address as supplied plus whatever the
/// enricher produced for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub contract_address: Option<String>,
    pub etherscan_data: EtherscanData,
}

/// The final audit report. Built once per run and finalized only after
/// every scheduled tool has reported and enrichment completed or degraded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub contract: String,
    pub audit_level: AuditLevel,
    pub timestamp: String,
    pub results: Vec<ToolResult>,
    pub metadata: ReportMetadata,
    pub aggregate_severity_count: SeverityCount,
    pub overall_pass: bool,
    /// Set when the run was cancelled before every scheduled tool ran.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub partial: bool,
    /// Set for forensic audits; the monitoring process itself is external.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub continuous_monitoring: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_level_round_trip() {
        for level in ["quick", "standard", "deep", "forensic"] {
            let parsed: AuditLevel = level.parse().unwrap();
            assert_eq!(parsed.as_str(), level);
        }
    }

    #[test]
    fn test_audit_level_rejects_unknown() {
        let err = "paranoid".parse::<AuditLevel>().unwrap_err();
        assert!(matches!(err, AuditError::InvalidAuditLevel(_)));
    }

    #[test]
    fn test_severity_from_label() {
        assert_eq!(Severity::from_label("Critical"), Severity::Critical);
        assert_eq!(Severity::from_label("HIGH"), Severity::High);
        assert_eq!(Severity::from_label("medium"), Severity::Medium);
        assert_eq!(Severity::from_label("low"), Severity::Low);
        assert_eq!(Severity::from_label("optimization"), Severity::Informational);
    }

    #[test]
    fn test_severity_count_merge() {
        let mut a = SeverityCount {
            critical: 1,
            high: 2,
            medium: 0,
            low: 3,
            informational: 1,
        };
        let b = SeverityCount {
            critical: 0,
            high: 1,
            medium: 4,
            low: 0,
            informational: 2,
        };
        a.merge(&b);
        assert_eq!(a.critical, 1);
        assert_eq!(a.high, 3);
        assert_eq!(a.medium, 4);
        assert_eq!(a.low, 3);
        assert_eq!(a.informational, 3);
        assert_eq!(a.total(), 14);
    }

    #[test]
    fn test_severity_count_serializes_all_buckets() {
        let json = serde_json::to_value(SeverityCount::default()).unwrap();
        for key in ["critical", "high", "medium", "low", "informational"] {
            assert_eq!(json[key], 0, "bucket {} missing", key);
        }
    }

    #[test]
    fn test_tool_result_completed_pass_rule() {
        let clean = SeverityCount {
            medium: 2,
            low: 5,
            informational: 9,
            ..SeverityCount::default()
        };
        assert!(ToolResult::completed("Slither", clean, 0.5).passed);

        let high = SeverityCount {
            high: 1,
            ..SeverityCount::default()
        };
        assert!(!ToolResult::completed("Slither", high, 0.5).passed);
    }

    #[test]
    fn test_tool_result_timeout_serialization() {
        let result = ToolResult::timed_out("Mythril", 600.0);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["timeout"], true);
        assert!(json.get("note").is_none());

        let ok = ToolResult::completed("Mythril", SeverityCount::default(), 1.0);
        let json = serde_json::to_value(&ok).unwrap();
        assert!(json.get("timeout").is_none());
    }

    #[test]
    fn test_etherscan_data_variants() {
        let none = EtherscanData::no_address();
        assert_eq!(none.verification_status, VerificationStatus::Unknown);
        assert!(none.error.is_none());

        let invalid = EtherscanData::invalid_address();
        assert_eq!(invalid.error.as_deref(), Some("invalid_address"));

        let sim = EtherscanData::simulated();
        assert!(sim.note.unwrap().contains("simulated"));
        assert_ne!(sim.verification_status, VerificationStatus::Verified);

        let degraded = EtherscanData::degraded("connection refused");
        assert_eq!(degraded.note.as_deref(), Some("degraded: network failure"));
        assert_eq!(degraded.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_verification_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&VerificationStatus::NotVerified).unwrap(),
            "\"not_verified\""
        );
    }
}
