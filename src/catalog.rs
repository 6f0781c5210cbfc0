//! Declarative catalog of analysis tool descriptors.
//!
//! Each tool is a data record describing how to invoke it and how to parse
//! its output. Adding a tool is a catalog entry, not a new type: the runner
//! and policy operate on [`ToolDescriptor`] values only.

use std::path::Path;
use std::time::Duration;

/// Which parser to apply to a tool's stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    SlitherJson,
    MythrilJson,
    EchidnaJson,
    CertoraText,
    MythxJson,
}

/// How to invoke one analysis tool. Immutable configuration data.
///
/// The `{contract}` placeholder in `args` is replaced with the contract
/// path at invocation time.
#[derive(Debug, Clone, Copy)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub program: &'static str,
    pub args: &'static [&'static str],
    pub parser: ParserKind,
    pub default_timeout: Duration,
    pub version_args: &'static [&'static str],
    /// Oldest tool release whose output contract we support.
    pub min_version: &'static str,
}

impl ToolDescriptor {
    /// Renders the argument list for a concrete contract path.
    pub fn command_args(&self, contract: &Path) -> Vec<String> {
        let contract = contract.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                if *arg == "{contract}" {
                    contract.to_string()
                } else {
                    (*arg).to_string()
                }
            })
            .collect()
    }
}

pub const SLITHER: ToolDescriptor = ToolDescriptor {
    name: "Slither",
    program: "slither",
    args: &["{contract}", "--json", "-"],
    parser: ParserKind::SlitherJson,
    default_timeout: Duration::from_secs(300),
    version_args: &["--version"],
    min_version: "0.9.0",
};

pub const MYTHRIL: ToolDescriptor = ToolDescriptor {
    name: "Mythril",
    program: "myth",
    args: &["analyze", "{contract}", "-o", "json"],
    parser: ParserKind::MythrilJson,
    default_timeout: Duration::from_secs(600),
    version_args: &["version"],
    min_version: "0.23.0",
};

pub const ECHIDNA: ToolDescriptor = ToolDescriptor {
    name: "Echidna",
    program: "echidna",
    args: &["{contract}", "--format", "json"],
    parser: ParserKind::EchidnaJson,
    default_timeout: Duration::from_secs(1800),
    version_args: &["--version"],
    min_version: "2.0.0",
};

pub const CERTORA: ToolDescriptor = ToolDescriptor {
    name: "Certora",
    program: "certoraRun",
    args: &["{contract}"],
    parser: ParserKind::CertoraText,
    default_timeout: Duration::from_secs(1800),
    version_args: &["--version"],
    min_version: "4.0.0",
};

pub const MYTHX: ToolDescriptor = ToolDescriptor {
    name: "MythX",
    program: "mythx",
    args: &["analyze", "{contract}", "--format", "json"],
    parser: ParserKind::MythxJson,
    default_timeout: Duration::from_secs(900),
    version_args: &["--version"],
    min_version: "0.20.0",
};

/// Every tool solaudit knows how to drive, whether or not an audit level
/// currently schedules it.
pub const CATALOG: &[ToolDescriptor] = &[SLITHER, MYTHRIL, ECHIDNA, CERTORA, MYTHX];

/// Looks up a descriptor by its display name, case-insensitively.
pub fn by_name(name: &str) -> Option<&'static ToolDescriptor> {
    CATALOG
        .iter()
        .find(|tool| tool.name.eq_ignore_ascii_case(name))
}
