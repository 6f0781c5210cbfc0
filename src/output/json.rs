use crate::model::AuditReport;
use anyhow::Result;

pub fn render_json(report: &AuditReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn print_json(report: &AuditReport) -> Result<()> {
    println!("{}", render_json(report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AuditLevel, EtherscanData, SeverityCount, ToolResult};
    use crate::{aggregate, policy};

    #[test]
    fn test_report_json_shape() {
        let plan = policy::resolve(AuditLevel::Quick);
        let report = aggregate::combine(
            "contracts/Token.sol",
            &plan,
            vec![ToolResult::completed(
                "Slither",
                SeverityCount::default(),
                0.4,
            )],
            None,
            EtherscanData::no_address(),
            false,
        );

        let json: serde_json::Value =
            serde_json::from_str(&render_json(&report).unwrap()).unwrap();

        assert_eq!(json["contract"], "contracts/Token.sol");
        assert_eq!(json["audit_level"], "quick");
        assert_eq!(json["results"][0]["tool"], "Slither");
        assert_eq!(json["results"][0]["severity_count"]["critical"], 0);
        assert_eq!(json["overall_pass"], true);
        assert!(json["metadata"]["contract_address"].is_null());
        assert_eq!(
            json["metadata"]["etherscan_data"]["verification_status"],
            "unknown"
        );
        // ISO-8601 timestamp
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }
}
