//! Parsers for analysis tool output.
//!
//! Each parser turns a tool's stdout into severity bucket totals. A parser
//! returns `None` for output it cannot make sense of; the runner records
//! that as a parse error on the result rather than failing the run.

use serde::Deserialize;

use crate::catalog::ParserKind;
use crate::model::{Severity, SeverityCount};

/// Parses a tool's stdout according to its declared output format.
pub fn parse_output(parser: ParserKind, stdout: &str) -> Option<SeverityCount> {
    match parser {
        ParserKind::SlitherJson => parse_slither(stdout),
        ParserKind::MythrilJson => parse_mythril(stdout),
        ParserKind::EchidnaJson => parse_echidna(stdout),
        ParserKind::CertoraText => parse_certora(stdout),
        ParserKind::MythxJson => parse_mythx(stdout),
    }
}

#[derive(Deserialize)]
struct SlitherOutput {
    results: Option<SlitherResults>,
}

#[derive(Deserialize)]
struct SlitherResults {
    #[serde(default)]
    detections: Vec<SlitherDetection>,
}

#[derive(Deserialize)]
struct SlitherDetection {
    severity: Option<String>,
}

fn parse_slither(stdout: &str) -> Option<SeverityCount> {
    let output: SlitherOutput = serde_json::from_str(stdout).ok()?;
    let mut counts = SeverityCount::default();

    if let Some(results) = output.results {
        for detection in results.detections {
            let label = detection.severity.unwrap_or_default();
            counts.record(Severity::from_label(&label));
        }
    }

    Some(counts)
}

#[derive(Deserialize)]
struct MythrilOutput {
    #[serde(default)]
    issues: Vec<MythrilIssue>,
}

#[derive(Deserialize)]
struct MythrilIssue {
    severity: Option<String>,
}

fn parse_mythril(stdout: &str) -> Option<SeverityCount> {
    let output: MythrilOutput = serde_json::from_str(stdout).ok()?;
    let mut counts = SeverityCount::default();

    for issue in output.issues {
        let label = issue.severity.unwrap_or_default();
        counts.record(Severity::from_label(&label));
    }

    Some(counts)
}

#[derive(Deserialize)]
struct EchidnaOutput {
    #[serde(default)]
    tests: Vec<EchidnaTest>,
}

#[derive(Deserialize)]
struct EchidnaTest {
    status: Option<String>,
}

/// A failed property test is a live counterexample against the contract's
/// invariants, so each one counts as a high finding.
fn parse_echidna(stdout: &str) -> Option<SeverityCount> {
    let output: EchidnaOutput = serde_json::from_str(stdout).ok()?;
    let mut counts = SeverityCount::default();

    for test in output.tests {
        match test.status.as_deref() {
            Some("failed") => counts.record(Severity::High),
            Some("error") => counts.record(Severity::Informational),
            _ => {}
        }
    }

    Some(counts)
}

/// Certora reports rule results as plain text. A violated rule is a failed
/// formal proof, counted as critical; anything else contributes nothing.
fn parse_certora(stdout: &str) -> Option<SeverityCount> {
    let mut counts = SeverityCount::default();

    for line in stdout.lines() {
        let line = line.to_lowercase();
        if line.contains("violated") {
            counts.record(Severity::Critical);
        }
    }

    Some(counts)
}

#[derive(Deserialize)]
struct MythxOutput {
    #[serde(default)]
    issues: Vec<MythxIssue>,
}

#[derive(Deserialize)]
struct MythxIssue {
    severity: Option<String>,
}

fn parse_mythx(stdout: &str) -> Option<SeverityCount> {
    let output: MythxOutput = serde_json::from_str(stdout).ok()?;
    let mut counts = SeverityCount::default();

    for issue in output.issues {
        let label = issue.severity.unwrap_or_default();
        counts.record(Severity::from_label(&label));
    }

    Some(counts)
}
