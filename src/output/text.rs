use crate::model::{AuditReport, ToolResult};
use crate::runner::ToolStatus;
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Tool")]
    tool: String,
    #[tabled(rename = "Passed")]
    passed: String,
    #[tabled(rename = "Critical")]
    critical: u32,
    #[tabled(rename = "High")]
    high: u32,
    #[tabled(rename = "Medium")]
    medium: u32,
    #[tabled(rename = "Low")]
    low: u32,
    #[tabled(rename = "Info")]
    informational: u32,
    #[tabled(rename = "Time (s)")]
    time: String,
    #[tabled(rename = "Note")]
    note: String,
}

impl ResultRow {
    fn from_result(result: &ToolResult) -> Self {
        let note = if result.timeout {
            "timed out".to_string()
        } else {
            result.note.clone().unwrap_or_default()
        };

        Self {
            tool: result.tool.clone(),
            passed: if result.passed { "yes" } else { "no" }.to_string(),
            critical: result.severity_count.critical,
            high: result.severity_count.high,
            medium: result.severity_count.medium,
            low: result.severity_count.low,
            informational: result.severity_count.informational,
            time: format!("{:.2}", result.execution_time),
            note,
        }
    }
}

pub fn print_text(report: &AuditReport) -> Result<()> {
    println!();
    println!("Audit of {} ({} level)", report.contract, report.audit_level);
    println!("Completed at: {}", report.timestamp);
    if report.partial {
        println!();
        println!(
            "PARTIAL REPORT: cancelled after {} of the scheduled tools completed.",
            report.results.len()
        );
    }
    println!();

    if report.results.is_empty() {
        println!("No tool results.");
    } else {
        let rows: Vec<ResultRow> = report.results.iter().map(ResultRow::from_result).collect();
        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    println!();
    let totals = &report.aggregate_severity_count;
    println!(
        "Findings: {} critical, {} high, {} medium, {} low, {} informational",
        totals.critical, totals.high, totals.medium, totals.low, totals.informational
    );
    println!(
        "Overall: {}",
        if report.overall_pass { "PASS" } else { "FAIL" }
    );
    if report.continuous_monitoring {
        println!("Continuous monitoring: flagged for this contract (forensic level)");
    }

    let metadata = &report.metadata;
    println!();
    match &metadata.contract_address {
        Some(address) => println!("Contract address: {}", address),
        None => println!("Contract address: (not provided)"),
    }
    let data = &metadata.etherscan_data;
    println!("Verification status: {}", data.verification_status);
    if let Some(count) = data.transaction_count {
        println!("Transactions: {}", count);
    }
    if let Some(deployer) = &data.deployer_address {
        println!("Deployer: {}", deployer);
    }
    if let Some(date) = &data.creation_date {
        println!("Created: {}", date);
    }
    if let Some(note) = &data.note {
        println!("Note: {}", note);
    }
    if let Some(error) = &data.error {
        println!("Enrichment error: {}", error);
    }

    Ok(())
}

#[derive(Tabled)]
struct ToolRow {
    #[tabled(rename = "Tool")]
    tool: String,
    #[tabled(rename = "Installed")]
    installed: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Minimum")]
    minimum: String,
    #[tabled(rename = "Supported")]
    supported: String,
}

/// Prints the catalog install/version table for `--list-tools`.
pub fn print_tool_table(statuses: &[(ToolStatus, &'static str)]) {
    let rows: Vec<ToolRow> = statuses
        .iter()
        .map(|(status, minimum)| ToolRow {
            tool: status.name.to_string(),
            installed: if status.installed { "yes" } else { "no" }.to_string(),
            version: status
                .version
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string()),
            minimum: minimum.to_string(),
            supported: if status.supported { "yes" } else { "no" }.to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}
