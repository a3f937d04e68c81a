//! Output rendering for the validate and summary commands.
//!
//! Supports `human` (default) and `json` outputs. The JSON form of
//! `validate` nests records by namespace and carries per-namespace
//! summaries; `summary` prints the summaries alone.

use crate::models::{Check, Severity, ValidationRecord, ValidationSummary};
use crate::validations::ValidationReport;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::collections::BTreeMap;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

fn colors_on_stderr() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if colors_on_stderr() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if colors_on_stderr() {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}

fn severity_badge(severity: Severity, color: bool) -> String {
    let (label, icon) = match severity {
        Severity::Error => ("⟦error⟧", "✖"),
        Severity::Warning => ("⟦warn⟧", "▲"),
        Severity::Unknown => ("⟦unknown⟧", "◆"),
    };
    if !color {
        return format!("{} {}", icon, label);
    }
    match severity {
        Severity::Error => format!("{} {}", icon.red(), label.red().bold()),
        Severity::Warning => format!("{} {}", icon.yellow(), label.yellow().bold()),
        Severity::Unknown => format!("{} {}", icon.blue(), label.blue().bold()),
    }
}

/// One human-readable line per check.
fn check_line(record: &ValidationRecord, check: &Check, color: bool) -> String {
    let object = format!("{}/{}/{}", record.object_type, record.namespace, record.name);
    let object = if color { object.bold().to_string() } else { object };
    format!(
        "{} {} ❲{}❳ {} — {}",
        severity_badge(check.severity, color),
        object,
        check.code,
        check.path,
        check.message
    )
}

fn summary_line(s: &ValidationSummary) -> String {
    format!(
        "— Summary {} — errors={} warnings={} objects={}",
        s.namespace, s.errors, s.warnings, s.object_count
    )
}

fn print_summaries(summaries: &BTreeMap<String, ValidationSummary>, color: bool) {
    for summary in summaries.values() {
        let line = summary_line(summary);
        if color {
            println!("{}", line.bold());
        } else {
            println!("{}", line);
        }
    }
}

/// Print a full report in the requested format.
pub fn print_report(report: &ValidationReport, output: &str) -> serde_json::Result<()> {
    match output {
        "json" => println!("{}", serde_json::to_string_pretty(&compose_report_json(report)?)?),
        _ => {
            let color = use_colors(output);
            for record in report.validations().records() {
                for check in &record.checks {
                    println!("{}", check_line(record, check, color));
                }
            }
            let summaries = report.summaries();
            if summaries.is_empty() {
                println!("no objects validated");
            }
            print_summaries(&summaries, color);
        }
    }
    Ok(())
}

/// Print only the per-namespace summaries.
pub fn print_summary(report: &ValidationReport, output: &str) -> serde_json::Result<()> {
    match output {
        "json" => println!("{}", serde_json::to_string_pretty(&compose_summary_json(report))?),
        _ => print_summaries(&report.summaries(), use_colors(output)),
    }
    Ok(())
}

/// Compose report JSON object (pure) for testing/snapshot purposes.
pub fn compose_report_json(report: &ValidationReport) -> serde_json::Result<JsonVal> {
    serde_json::to_value(report)
}

/// Compose summary JSON object (pure) for testing/snapshot purposes.
pub fn compose_summary_json(report: &ValidationReport) -> JsonVal {
    let summaries = report.summaries();
    let totals = json!({
        "errors": summaries.values().map(|s| s.errors).sum::<usize>(),
        "warnings": summaries.values().map(|s| s.warnings).sum::<usize>(),
        "objects": summaries.values().map(|s| s.object_count).sum::<usize>(),
    });
    json!({"summaries": summaries, "total": totals})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CheckKind;
    use crate::models::{ConfigObjectRef, ObjectType};
    use crate::validations::{Aggregator, ReportPolicy, ValidationSet};

    fn report() -> ValidationReport {
        let mut agg = Aggregator::new();
        agg.merge(ValidationSet::single(
            ConfigObjectRef::new(ObjectType::VirtualService, "reviews", "bookinfo"),
            vec![
                CheckKind::VirtualServiceGatewayNotFound.at("spec/gateways[0]"),
                CheckKind::VirtualServiceSubsetNotFound.at("spec/http[0]/route[0]/destination"),
            ],
            false,
        ));
        agg.merge(ValidationSet::single(
            ConfigObjectRef::new(ObjectType::Pod, "cart-v1", "eshop"),
            vec![],
            true,
        ));
        agg.finalize(&ReportPolicy::default())
    }

    #[test]
    fn test_compose_report_json_shape() {
        let out = compose_report_json(&report()).unwrap();
        let rec = &out["validations"]["bookinfo"]["virtualservice"]["reviews"];
        assert_eq!(rec["valid"], false);
        assert_eq!(rec["checks"][0]["code"], "KIA1102");
        assert_eq!(rec["checks"][1]["path"], "spec/http[0]/route[0]/destination");
        assert_eq!(out["validations"]["eshop"]["pod"]["cart-v1"]["valid"], true);
        assert_eq!(out["summaries"]["bookinfo"]["errors"], 1);
        assert_eq!(out["summaries"]["bookinfo"]["objectCount"], 1);
    }

    #[test]
    fn test_compose_summary_json_totals() {
        let out = compose_summary_json(&report());
        assert_eq!(out["total"]["errors"], 1);
        assert_eq!(out["total"]["warnings"], 1);
        assert_eq!(out["total"]["objects"], 2);
        assert_eq!(out["summaries"]["eshop"]["objectCount"], 1);
    }

    #[test]
    fn test_check_line_without_color() {
        let r = report();
        let record = r.validations().records().next().unwrap();
        let line = check_line(record, &record.checks[0], false);
        assert_eq!(
            line,
            "✖ ⟦error⟧ virtualservice/bookinfo/reviews ❲KIA1102❳ spec/gateways[0] — VirtualService is pointing to a non-existent gateway"
        );
    }
}
