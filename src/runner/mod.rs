//! Bounded execution of analysis tools.
//!
//! [`run`] invokes one tool as a subprocess and always produces a
//! [`ToolResult`]: a missing binary, a timeout, a crash, or unparseable
//! output all become data on the result instead of an error. No invocation
//! can corrupt or block another; the orchestrator simply collects results
//! in order.
//!
//! Cancellation is handled by the caller dropping the in-flight future:
//! the child process is spawned with `kill_on_drop`, so abandoning the
//! future terminates it.

pub(crate) mod parse;

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use semver::Version;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::catalog::ToolDescriptor;
use crate::model::ToolResult;

/// Budget for a `--version` probe; tools that cannot print their version
/// inside this window are reported as unresponsive.
const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub const NOT_INSTALLED_NOTE: &str = "tool not installed";
pub const PARSE_ERROR_NOTE: &str = "parse error";

/// Runs one tool against the contract, bounded by `timeout`.
///
/// The in-flight process is killed when the budget is exceeded. The
/// returned result always carries the wall-clock execution time.
pub async fn run(contract: &Path, descriptor: &ToolDescriptor, timeout: Duration) -> ToolResult {
    let started = Instant::now();
    let args = descriptor.command_args(contract);

    debug!(tool = descriptor.name, program = descriptor.program, "invoking tool");

    let child = Command::new(descriptor.program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(tool = descriptor.name, "binary not found on PATH");
            return ToolResult::failed(descriptor.name, NOT_INSTALLED_NOTE, elapsed(started));
        }
        Err(err) => {
            warn!(tool = descriptor.name, error = %err, "failed to spawn tool");
            return ToolResult::failed(
                descriptor.name,
                format!("failed to start: {}", err),
                elapsed(started),
            );
        }
    };

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            warn!(tool = descriptor.name, error = %err, "tool wait failed");
            return ToolResult::failed(
                descriptor.name,
                format!("execution error: {}", err),
                elapsed(started),
            );
        }
        Err(_) => {
            warn!(
                tool = descriptor.name,
                timeout_secs = timeout.as_secs(),
                "tool exceeded its budget, terminated"
            );
            return ToolResult::timed_out(descriptor.name, elapsed(started));
        }
    };

    // A nonzero exit with parseable findings is still a valid result;
    // several tools exit nonzero whenever they report anything at all.
    let stdout = String::from_utf8_lossy(&output.stdout);
    match parse::parse_output(descriptor.parser, &stdout) {
        Some(counts) => {
            debug!(
                tool = descriptor.name,
                findings = counts.total(),
                exit = ?output.status.code(),
                "tool completed"
            );
            ToolResult::completed(descriptor.name, counts, elapsed(started))
        }
        None => {
            warn!(tool = descriptor.name, exit = ?output.status.code(), "unparseable tool output");
            ToolResult::failed(descriptor.name, PARSE_ERROR_NOTE, elapsed(started))
        }
    }
}

fn elapsed(started: Instant) -> f64 {
    started.elapsed().as_secs_f64()
}

/// Install/version status of one catalog tool.
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: &'static str,
    pub installed: bool,
    pub version: Option<Version>,
    /// True when the detected version meets the descriptor's minimum.
    pub supported: bool,
}

/// Probes whether a tool is installed and which version it reports.
pub async fn probe(descriptor: &ToolDescriptor) -> ToolStatus {
    let output = Command::new(descriptor.program)
        .args(descriptor.version_args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(VERSION_PROBE_TIMEOUT, output).await {
        Ok(Ok(output)) => output,
        _ => {
            return ToolStatus {
                name: descriptor.name,
                installed: false,
                version: None,
                supported: false,
            }
        }
    };

    // Some tools print their version to stderr.
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push(' ');
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    let version = extract_version(&text);
    let supported = match (&version, Version::parse(descriptor.min_version)) {
        (Some(found), Ok(min)) => *found >= min,
        _ => false,
    };

    ToolStatus {
        name: descriptor.name,
        installed: true,
        version,
        supported,
    }
}

/// Finds the first semver-looking token in version output.
fn extract_version(text: &str) -> Option<Version> {
    text.split_whitespace().find_map(|token| {
        let token = token
            .trim_start_matches('v')
            .trim_end_matches(|c: char| !c.is_ascii_digit());
        Version::parse(token).ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ParserKind;
    use std::path::PathBuf;

    fn descriptor(
        program: &'static str,
        args: &'static [&'static str],
        parser: ParserKind,
    ) -> ToolDescriptor {
        ToolDescriptor {
            name: "TestTool",
            program,
            args,
            parser,
            default_timeout: Duration::from_secs(30),
            version_args: &["--version"],
            min_version: "1.0.0",
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_local_failure() {
        let tool = descriptor("solaudit-no-such-tool", &["{contract}"], ParserKind::SlitherJson);
        let result = run(&PathBuf::from("Token.sol"), &tool, Duration::from_secs(5)).await;

        assert!(!result.passed);
        assert!(!result.timeout);
        assert_eq!(result.note.as_deref(), Some(NOT_INSTALLED_NOTE));
        assert_eq!(result.severity_count.total(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_in_flight_process() {
        let tool = descriptor("sleep", &["30"], ParserKind::CertoraText);
        let started = Instant::now();
        let result = run(&PathBuf::from("Token.sol"), &tool, Duration::from_millis(200)).await;

        assert!(!result.passed);
        assert!(result.timeout);
        assert!(result.execution_time >= 0.2);
        // The child was killed, not waited to completion.
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_parseable_output_produces_counts() {
        let tool = descriptor(
            "echo",
            &[r#"{"issues": [{"severity": "High"}, {"severity": "Low"}]}"#],
            ParserKind::MythrilJson,
        );
        let result = run(&PathBuf::from("Token.sol"), &tool, Duration::from_secs(5)).await;

        assert!(!result.passed);
        assert_eq!(result.severity_count.high, 1);
        assert_eq!(result.severity_count.low, 1);
        assert!(result.note.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_clean_output_passes() {
        let tool = descriptor("echo", &[r#"{"issues": []}"#], ParserKind::MythrilJson);
        let result = run(&PathBuf::from("Token.sol"), &tool, Duration::from_secs(5)).await;

        assert!(result.passed);
        assert_eq!(result.severity_count.total(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unparseable_output_is_parse_error() {
        let tool = descriptor("echo", &["definitely not json"], ParserKind::SlitherJson);
        let result = run(&PathBuf::from("Token.sol"), &tool, Duration::from_secs(5)).await;

        assert!(!result.passed);
        assert_eq!(result.note.as_deref(), Some(PARSE_ERROR_NOTE));
        assert!(result.execution_time >= 0.0);
    }

    #[test]
    fn test_extract_version_formats() {
        assert_eq!(
            extract_version("slither 0.10.0"),
            Some(Version::new(0, 10, 0))
        );
        assert_eq!(
            extract_version("Mythril version v0.23.15"),
            Some(Version::new(0, 23, 15))
        );
        assert_eq!(
            extract_version("Echidna 2.2.1\nfuzzing framework"),
            Some(Version::new(2, 2, 1))
        );
        assert_eq!(extract_version("no version here"), None);
    }
}
