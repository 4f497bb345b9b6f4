use std::path::Path;

use colored::*;
use serde::Serialize;

use crate::checker::{CheckReport, Diagnostic};

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Sarif,
}

/// Renders the report in the requested format.
pub fn render(
    report: &CheckReport,
    format: OutputFormat,
    models_file: &Path,
    types_file: &Path,
    quiet: bool,
) -> String {
    match format {
        OutputFormat::Text => render_text(report, quiet),
        OutputFormat::Json => render_json(report, models_file, types_file),
        OutputFormat::Sarif => render_sarif(report, models_file),
    }
}

/// Human-readable report. `quiet` drops the success line and the summary.
pub fn render_text(report: &CheckReport, quiet: bool) -> String {
    if report.is_clean() {
        if quiet {
            return String::new();
        }
        return format!(
            "{} {}\n",
            "✅".green(),
            "All model fields are accounted for in TypeScript types.".green()
        );
    }

    let mut out = format!("{}\n", "Missing TypeScript fields found:".red().bold());
    for diagnostic in &report.diagnostics {
        out.push('\n');
        out.push_str(&diagnostic.to_string());
        out.push('\n');
    }

    if !quiet {
        let missing_interfaces = report
            .diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::MissingInterface { .. }))
            .count();
        let missing_fields = report.diagnostics.len() - missing_interfaces;
        out.push_str(&format!(
            "\n🚩 {} missing interface(s)  ⚠️  {} missing field(s) across {} model(s)\n",
            missing_interfaces.to_string().red().bold(),
            missing_fields.to_string().yellow(),
            report.models_checked
        ));
    }
    out
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    models_file: String,
    types_file: String,
    models_checked: usize,
    diagnostics: &'a [Diagnostic],
}

pub fn render_json(report: &CheckReport, models_file: &Path, types_file: &Path) -> String {
    let out = JsonOutput {
        models_file: models_file.display().to_string(),
        types_file: types_file.display().to_string(),
        models_checked: report.models_checked,
        diagnostics: &report.diagnostics,
    };
    serde_json::to_string_pretty(&out).unwrap_or_default()
}

/// SARIF 2.1.0, one result per diagnostic, located at the model declaration.
pub fn render_sarif(report: &CheckReport, models_file: &Path) -> String {
    let mut seen_rules: Vec<&str> = Vec::new();
    for diagnostic in &report.diagnostics {
        if !seen_rules.contains(&diagnostic.rule_id()) {
            seen_rules.push(diagnostic.rule_id());
        }
    }

    let rules_json: Vec<serde_json::Value> = seen_rules
        .iter()
        .map(|r| {
            serde_json::json!({
                "id": r,
                "shortDescription": { "text": rule_description(r) }
            })
        })
        .collect();

    let uri = models_file.display().to_string();
    let results_json: Vec<serde_json::Value> = report
        .diagnostics
        .iter()
        .map(|d| {
            serde_json::json!({
                "ruleId": d.rule_id(),
                "level": "error",
                "message": { "text": d.to_string() },
                "locations": [{
                    "physicalLocation": {
                        "artifactLocation": {
                            "uri": uri,
                            "uriBaseId": "%SRCROOT%"
                        },
                        "region": { "startLine": d.line().max(1) }
                    }
                }]
            })
        })
        .collect();

    let sarif = serde_json::json!({
        "$schema": "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "type-checker",
                    "version": env!("CARGO_PKG_VERSION"),
                    "rules": rules_json
                }
            },
            "results": results_json
        }]
    });

    serde_json::to_string_pretty(&sarif).unwrap_or_default()
}

fn rule_description(rule: &str) -> &'static str {
    match rule {
        "MISSING_INTERFACE" => "No TypeScript interface matches the model",
        _ => "Model field has no TypeScript counterpart",
    }
}
