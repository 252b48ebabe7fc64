//! Prompt assembly.
//!
//! A prompt is a role preamble, the company context, the analysis framework
//! and a closing instruction. The framework is either a file named in the
//! configuration or the built-in default for the analysis kind.

use prompt_harness_core::AnalysisKind;

/// Characters of the framework kept in a result's prompt preview.
pub const PREVIEW_CHARS: usize = 200;

const TAM_FRAMEWORK: &str = "\
## Opening Overview
Define the market, the product category and the buyer. State the market size \
as a range with a central estimate and a confidence interval.

## Bottom-Up Analysis
Build the estimate from customer segments: number of potential customers per \
segment, ACV and LTV, and the resulting revenue pool. Show the calculation.

## Top-Down Analysis
Start from published industry totals (Gartner, IDC, McKinsey or similar) and \
narrow to the addressable share. Cite every source.

## Hybrid Analysis
Reconcile the bottom-up and top-down figures and explain the gap.

## Market Capture Analysis
Estimate realistic penetration and market share over 3-year and 5-year \
horizons, with a revenue projection, market CAGR and geographic scope \
(global, international, regional or national).

## Final Deliverables
Summarize TAM, SAM and SOM in a table, list constraints and enablers, and \
include a sensitivity analysis with scenario ranges.";

const DCF_FRAMEWORK: &str = "\
## Model Construction
Build a 10-year model with a revenue projection, EBITDA margins, capex, \
depreciation and working capital (AR, AP, inventory) assumptions.

## DCF Summary Table
Present free cash flow, NPV and terminal value in a summary table.

## WACC Calculation
Derive WACC from beta, cost of equity, cost of debt and the debt/equity mix.

## Three-Statement Model
Link the income statement, balance sheet and cash flow statement.

## Scenario Analysis
Provide bull, base and bear cases with revenue for each.

## Sensitivity Analysis
Show enterprise value sensitivity to WACC and terminal growth rate.

## Historical Benchmarking
Compare assumptions with historical performance and peer companies.

## Key Value Drivers
Identify the drivers with the largest effect on valuation.

## Final Deliverables
State equity value, per-share value and the implied upside, and describe the \
Excel workbook structure that reproduces the model.";

/// Built-in analysis framework for `kind`.
pub fn default_framework(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::Tam => TAM_FRAMEWORK,
        AnalysisKind::Dcf => DCF_FRAMEWORK,
    }
}

fn preamble(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::Tam => {
            "You are a financial analyst estimating the Total Addressable Market (TAM) for a company."
        }
        AnalysisKind::Dcf => {
            "You are a senior financial analyst building a 10-year Discounted Cash Flow (DCF) valuation for a company."
        }
    }
}

fn closing(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::Tam => {
            "Write the analysis at the level of detail an investment committee expects, using the section headings above."
        }
        AnalysisKind::Dcf => {
            "Write the valuation at the level of detail institutional investors expect, using the section headings above."
        }
    }
}

/// Truncates `text` to [`PREVIEW_CHARS`] characters, marking the cut with
/// `...`.
///
/// # Examples
///
/// ```
/// use prompt_harness_runner::prompt::preview;
///
/// assert_eq!(preview("short"), "short");
/// assert_eq!(preview(&"x".repeat(250)).chars().count(), 203);
/// ```
pub fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Builds prompts for one analysis kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBuilder {
    kind: AnalysisKind,
    framework: String,
}

impl PromptBuilder {
    /// Uses `framework` when given, the built-in framework otherwise.
    pub fn new(kind: AnalysisKind, framework: Option<String>) -> Self {
        Self {
            kind,
            framework: framework.unwrap_or_else(|| default_framework(kind).to_string()),
        }
    }

    pub fn kind(&self) -> AnalysisKind {
        self.kind
    }

    pub fn framework(&self) -> &str {
        &self.framework
    }

    /// Full prompt for `company_context`.
    pub fn build(&self, company_context: &str) -> String {
        format!(
            "{}\n\nCompany Context: {}\n\nFollow this framework:\n\n{}\n\n{}",
            preamble(self.kind),
            company_context,
            self.framework.trim(),
            closing(self.kind)
        )
    }

    /// Preview of the framework stored with each result.
    pub fn preview(&self) -> String {
        preview(&self.framework)
    }
}
