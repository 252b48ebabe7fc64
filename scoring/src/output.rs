//! Output formatting for test results, scorecards and batch reports.

use prompt_harness_core::{TestResult, ValidationResult};
use serde::Serialize;

use crate::{BatchSummary, Scorecard};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Markdown,
    Table,
}

#[derive(Serialize)]
struct Report<'a> {
    summary: BatchSummary,
    results: &'a [TestResult],
}

/// Formats one test result in the requested output format.
pub fn format_result(result: &TestResult, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(result)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(result).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => {
            let mut out = String::new();
            out.push_str(&format!(
                "# {} Test {}\n\n",
                result.kind().label(),
                result.test_id
            ));
            result_to_markdown(result, &mut out);
            Ok(out)
        }
        OutputFormat::Table => Ok(result_to_table(result)),
    }
}

/// Formats an offline scorecard in the requested output format.
pub fn format_scorecard(
    label: &str,
    card: &Scorecard,
    format: OutputFormat,
) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(card)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(card).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => {
            let mut out = format!("# Scorecard: {label}\n\n");
            validation_to_markdown(&card.validation, &mut out);
            if !card.metrics.is_empty() {
                out.push_str("\n## Extracted Metrics\n\n");
                for (name, value) in card.metrics.iter() {
                    out.push_str(&format!("- {name}: {value}\n"));
                }
            }
            for warning in card.warnings() {
                out.push_str(&format!("\n> warning: {warning}\n"));
            }
            Ok(out)
        }
        OutputFormat::Table => Ok(validation_row(label, &card.validation, None)),
    }
}

/// Formats a batch report: summary plus per-test details.
pub fn format_report(results: &[TestResult], format: OutputFormat) -> Result<String, String> {
    let summary = BatchSummary::from_results(results);
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&Report { summary, results })
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => serde_yaml::to_string(&Report { summary, results })
            .map_err(|e| format!("YAML serialization failed: {e}")),
        OutputFormat::Markdown => Ok(report_to_markdown(&summary, results)),
        OutputFormat::Table => {
            let mut out = String::new();
            for result in results {
                out.push_str(&result_to_table(result));
            }
            out.push_str(&format!(
                "{} tests, {} passing, average score {:.2}\n",
                summary.total, summary.passing, summary.average_quality_score
            ));
            Ok(out)
        }
    }
}

fn report_to_markdown(summary: &BatchSummary, results: &[TestResult]) -> String {
    if results.is_empty() {
        return "No test results available\n".to_string();
    }

    let label = if results.iter().all(|r| r.kind() == results[0].kind()) {
        results[0].kind().label()
    } else {
        "Prompt"
    };

    let mut out = String::new();
    out.push_str(&format!("# {label} Prompt Testing Report\n\n"));
    out.push_str("## Executive Summary\n\n");
    out.push_str(&format!("- **Total Tests:** {}\n", summary.total));
    out.push_str(&format!(
        "- **Average Quality Score:** {:.2}\n",
        summary.average_quality_score
    ));
    out.push_str(&format!("- **Passing:** {}\n", summary.passing));
    out.push_str(&format!(
        "- **High Quality (>= 80%):** {}\n",
        summary.high_quality
    ));
    if !summary.provider_failures.is_empty() {
        let failures: Vec<String> = summary
            .provider_failures
            .iter()
            .map(|(kind, count)| format!("{kind} x{count}"))
            .collect();
        out.push_str(&format!("- **Provider Failures:** {}\n", failures.join(", ")));
    }

    out.push_str("\n## Detailed Results\n");
    for (idx, result) in results.iter().enumerate() {
        out.push_str(&format!("\n### Test {} - {}\n\n", idx + 1, result.test_id));
        result_to_markdown(result, &mut out);
        out.push_str("\n---\n");
    }

    out
}

fn result_to_markdown(result: &TestResult, out: &mut String) {
    out.push_str(&format!("- **Model:** {}\n", result.request.model_id()));
    out.push_str(&format!("- **Timestamp:** {}\n", result.timestamp.to_rfc3339()));
    out.push_str(&format!("- **Latency:** {} ms\n", result.response.latency_ms));
    if let Some(kind) = result.provider_error() {
        out.push_str(&format!("- **Provider Error:** {kind}\n"));
        if let Some(ref detail) = result.response.provider_error_detail {
            out.push_str(&format!("- **Error Detail:** {detail}\n"));
        }
    }
    validation_to_markdown(&result.validation, out);
    if !result.metrics.is_empty() {
        out.push_str("\n#### Financial Metrics Found\n\n");
        for (name, value) in result.metrics.iter() {
            out.push_str(&format!("- {name}: {value}\n"));
        }
    }
}

fn validation_to_markdown(validation: &ValidationResult, out: &mut String) {
    out.push_str(&format!(
        "- **Quality Score:** {:.2} ({})\n",
        validation.quality_score, validation.quality_tier
    ));
    out.push_str(&format!(
        "- **Section Coverage:** {:.2}\n",
        validation.section_coverage
    ));
    out.push_str(&format!(
        "- **Element Coverage:** {:.2}\n",
        validation.element_coverage
    ));
    out.push_str(&format!(
        "- **Response Length:** {} characters\n",
        validation.response_length
    ));

    if !validation.missing_requirements.is_empty() {
        out.push_str("\n#### Missing Requirements\n\n");
        for req in &validation.missing_requirements {
            out.push_str(&format!("- {req}\n"));
        }
    }
    if !validation.recommendations.is_empty() {
        out.push_str("\n#### Recommendations\n\n");
        for rec in &validation.recommendations {
            out.push_str(&format!("- {rec}\n"));
        }
    }
}

fn result_to_table(result: &TestResult) -> String {
    let error = result.provider_error().map(|kind| kind.to_string());
    validation_row(&result.test_id, &result.validation, error.as_deref())
}

fn validation_row(label: &str, validation: &ValidationResult, error: Option<&str>) -> String {
    let status = if validation.passed { "PASS" } else { "FAIL" };
    let mut out = format!(
        "{:<36} {:<4} {:<7} score={:.2} sec={:.2} elem={:.2} len={}",
        label,
        status,
        validation.quality_tier.to_string(),
        validation.quality_score,
        validation.section_coverage,
        validation.element_coverage,
        validation.response_length,
    );
    if let Some(error) = error {
        out.push_str(&format!("  [{error}]"));
    }
    out.push('\n');
    out
}
