use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use solaudit::{
    catalog::CATALOG,
    config::Config,
    error::AuditError,
    etherscan::EtherscanEnricher,
    orchestrator::Orchestrator,
    output::{print_report, print_tool_table, render_json, OutputFormat},
    runner,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration.
///
/// A completed audit exits 0 even when it contains findings; only the two
/// fatal preconditions are nonzero by default. `--fail-on-findings` opts
/// into the FINDINGS code when the report's overall_pass is false.
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const CONTRACT_NOT_FOUND: u8 = 2;
    pub const INVALID_LEVEL: u8 = 3;
    pub const FINDINGS: u8 = 4;
}

#[derive(Parser)]
#[command(name = "solaudit")]
#[command(
    author,
    version,
    about = "Audit a smart contract with static and dynamic analysis tools"
)]
struct Cli {
    /// Path to the Solidity contract file
    #[arg(long, required_unless_present = "list_tools")]
    contract: Option<PathBuf>,

    /// Audit depth level (quick, standard, deep, forensic)
    #[arg(long)]
    level: Option<String>,

    /// Contract address on Ethereum mainnet (0x...)
    #[arg(long)]
    address: Option<String>,

    /// Write the JSON report to a file instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Output format (text, json)
    #[arg(short, long)]
    format: Option<String>,

    /// Per-tool timeout in seconds, overriding the level's budget
    #[arg(long)]
    timeout: Option<u64>,

    /// Exit nonzero when overall_pass is false; without this flag a
    /// report with findings is still a successful run
    #[arg(long)]
    fail_on_findings: bool,

    /// Show the tool catalog with install and version status
    #[arg(long)]
    list_tools: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    if cli.list_tools {
        list_tools().await;
        return Ok(exit_codes::SUCCESS);
    }

    let contract = match cli.contract {
        Some(path) => path,
        None => anyhow::bail!("--contract is required"),
    };
    let level = cli.level.unwrap_or_else(|| config.default_level.clone());
    let format_str = cli.format.unwrap_or_else(|| config.default_format.clone());
    let format = OutputFormat::from_str(&format_str).map_err(|e| anyhow::anyhow!(e))?;
    let is_interactive = format == OutputFormat::Text;

    let enricher = EtherscanEnricher::new(Config::etherscan_api_key())
        .with_base_url(config.etherscan_api_url.clone())
        .with_timeout(Duration::from_secs(config.etherscan_timeout_secs));

    let mut orchestrator = Orchestrator::new(Box::new(enricher));
    if let Some(secs) = cli.timeout.or(config.tool_timeout_secs) {
        orchestrator = orchestrator.with_tool_timeout(Duration::from_secs(secs));
    }

    // Ctrl-C cancels the run; collected results still become a partial report.
    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.cancel();
        }
    });

    let progress = if is_interactive {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Running {} audit of {}...", level, contract.display()));
        Some(pb)
    } else {
        None
    };

    let outcome = orchestrator
        .run(&contract, &level, cli.address.as_deref(), &cancel)
        .await;

    if let Some(ref pb) = progress {
        pb.finish_and_clear();
    }

    let report = match outcome {
        Ok(report) => report,
        Err(err) => {
            eprintln!("Error: {}", err);
            return Ok(match err {
                AuditError::ContractNotFound(_) => exit_codes::CONTRACT_NOT_FOUND,
                AuditError::InvalidAuditLevel(_) => exit_codes::INVALID_LEVEL,
            });
        }
    };

    if let Some(path) = cli.output {
        let json = render_json(&report)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write report to {}", path))?;
        if is_interactive {
            println!("Report written to: {}", path);
        }
    } else {
        print_report(&report, format)?;
    }

    if cli.fail_on_findings && !report.overall_pass {
        return Ok(exit_codes::FINDINGS);
    }

    Ok(exit_codes::SUCCESS)
}

async fn list_tools() {
    println!("Known analysis tools:");
    println!();

    let mut statuses = Vec::new();
    for tool in CATALOG {
        statuses.push((runner::probe(tool).await, tool.min_version));
    }

    print_tool_table(&statuses);
}
