//! Declarative extraction rules for TAM and DCF responses.
//!
//! Each rule names the metric it fills, the pattern and capture group that
//! locate a candidate literal, the parser that turns the literal into a
//! value, and the headings that anchor it. Rules for the same metric are
//! listed in priority order.
//!
//! Ranges are separate [`RangeRule`]s: one match fills both bounds or
//! neither.

use std::sync::LazyLock;

use prompt_harness_core::{AnalysisKind, MetricValue};
use regex::Regex;

use super::number::{parse_amount, parse_amount_range, parse_percent};

/// Dollar amount with an optional magnitude suffix.
const AMOUNT: &str = r"\$\s?\d(?:[\d,]*\d)?(?:\.\d+)?(?:\s?(?:trillion|billion|million|thousand|bn|mm|tn|[TBMK])\b)?";

/// Percentage literal.
const PERCENT: &str = r"\d+(?:\.\d+)?\s?%";

/// How a captured literal becomes a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueParser {
    /// Monetary amount with suffix normalization (see [`parse_amount`]).
    Amount,
    /// Percentage converted to a fraction (see [`parse_percent`]).
    Percent,
    /// Lower-cased text.
    Text,
}

impl ValueParser {
    pub fn parse(&self, raw: &str) -> Option<MetricValue> {
        match self {
            Self::Amount => parse_amount(raw).map(MetricValue::Number),
            Self::Percent => parse_percent(raw).map(MetricValue::Number),
            Self::Text => {
                let text = raw.trim().to_lowercase();
                (!text.is_empty()).then_some(MetricValue::Text(text))
            }
        }
    }
}

/// One extraction rule.
#[derive(Debug, Clone)]
pub struct MetricRule {
    pub field: &'static str,
    pub pattern: Regex,
    pub group: usize,
    pub parser: ValueParser,
    /// Lower-case headings that anchor this metric in a structured report.
    pub anchors: &'static [&'static str],
}

impl MetricRule {
    fn new(
        field: &'static str,
        pattern: &str,
        group: usize,
        parser: ValueParser,
        anchors: &'static [&'static str],
    ) -> Self {
        let pattern = pattern
            .replace("{AMOUNT}", AMOUNT)
            .replace("{PERCENT}", PERCENT);
        Self {
            field,
            pattern: Regex::new(&format!("(?i){pattern}")).expect("static regex must compile"),
            group,
            parser,
            anchors,
        }
    }
}

/// Rule for a `low to high` amount range filling two metrics at once.
#[derive(Debug, Clone)]
pub struct RangeRule {
    pub low_field: &'static str,
    pub high_field: &'static str,
    /// Group 1 captures the low literal, group 2 the high literal.
    pub pattern: Regex,
    pub anchors: &'static [&'static str],
    /// Only candidates after one of `anchors` count.
    pub require_anchor: bool,
}

impl RangeRule {
    fn new(
        fields: (&'static str, &'static str),
        pattern: &str,
        anchors: &'static [&'static str],
        require_anchor: bool,
    ) -> Self {
        let pattern = pattern.replace("{AMOUNT}", AMOUNT);
        Self {
            low_field: fields.0,
            high_field: fields.1,
            pattern: Regex::new(&format!("(?i){pattern}")).expect("static regex must compile"),
            anchors,
            require_anchor,
        }
    }

    pub fn parse(&self, low: &str, high: &str) -> Option<(f64, f64)> {
        parse_amount_range(low, high)
    }
}

const MARKET_ANCHORS: &[&str] = &["market size", "total addressable market", "final deliverables"];
const CAPTURE_ANCHORS: &[&str] = &["market capture analysis"];
const WACC_ANCHORS: &[&str] = &["wacc calculation"];
const SCENARIO_ANCHORS: &[&str] = &["scenario analysis"];
const SUMMARY_ANCHORS: &[&str] = &["dcf summary table", "final deliverables"];
const NO_ANCHORS: &[&str] = &[];

static TAM_RANGES: LazyLock<Vec<RangeRule>> = LazyLock::new(|| {
    let fields = ("tam_low", "tam_high");
    vec![
        RangeRule::new(
            fields,
            r"(?:market size|total addressable market|\bTAM\b)[^$\n]{0,80}?({AMOUNT})\s*(?:to|-|–)\s*({AMOUNT})",
            MARKET_ANCHORS,
            false,
        ),
        RangeRule::new(
            fields,
            r"({AMOUNT})\s*(?:to|-|–)\s*({AMOUNT})",
            MARKET_ANCHORS,
            true,
        ),
    ]
});

static TAM_RULES: LazyLock<Vec<MetricRule>> = LazyLock::new(|| {
    use ValueParser::{Amount, Percent, Text};
    vec![
        MetricRule::new(
            "tam_central",
            r"(?:central|point|base|mid(?:point)?)\s+estimate[^$\n]{0,40}?({AMOUNT})",
            1,
            Amount,
            MARKET_ANCHORS,
        ),
        MetricRule::new(
            "tam_central",
            r"\bTAM\b\s*(?:of|:|=|is|estimate:?)\s*({AMOUNT})",
            1,
            Amount,
            MARKET_ANCHORS,
        ),
        MetricRule::new(
            "confidence_interval",
            r"(\d{1,2}(?:\.\d+)?\s?%)\s*(?:confidence|CI\b)",
            1,
            Percent,
            MARKET_ANCHORS,
        ),
        MetricRule::new(
            "confidence_interval",
            r"confidence (?:level|interval)[^%\n]{0,20}?(\d{1,2}(?:\.\d+)?\s?%)",
            1,
            Percent,
            MARKET_ANCHORS,
        ),
        MetricRule::new("cagr", r"\bCAGR\b[^%\n]{0,40}?({PERCENT})", 1, Percent, NO_ANCHORS),
        MetricRule::new("cagr", r"({PERCENT})\s*CAGR\b", 1, Percent, NO_ANCHORS),
        MetricRule::new(
            "market_share",
            r"market share[^%\n]{0,40}?({PERCENT})",
            1,
            Percent,
            CAPTURE_ANCHORS,
        ),
        MetricRule::new(
            "penetration_rate",
            r"penetration(?: rate)?[^%\n]{0,40}?({PERCENT})",
            1,
            Percent,
            CAPTURE_ANCHORS,
        ),
        MetricRule::new(
            "geographic_scope",
            r"\b(global|international|regional|national)\b",
            1,
            Text,
            NO_ANCHORS,
        ),
    ]
});

static DCF_RULES: LazyLock<Vec<MetricRule>> = LazyLock::new(|| {
    use ValueParser::{Amount, Percent};
    vec![
        MetricRule::new("wacc", r"\bWACC\b[^%\n]{0,60}?({PERCENT})", 1, Percent, WACC_ANCHORS),
        MetricRule::new(
            "wacc",
            r"weighted average cost of capital[^%\n]{0,60}?({PERCENT})",
            1,
            Percent,
            WACC_ANCHORS,
        ),
        MetricRule::new(
            "scenario_base_revenue",
            r"base[\s-]case[^$\n]{0,80}?({AMOUNT})",
            1,
            Amount,
            SCENARIO_ANCHORS,
        ),
        MetricRule::new(
            "scenario_bull_revenue",
            r"\bbull(?:[\s-]case)?\b[^$\n]{0,80}?({AMOUNT})",
            1,
            Amount,
            SCENARIO_ANCHORS,
        ),
        MetricRule::new(
            "scenario_bear_revenue",
            r"\bbear(?:[\s-]case)?\b[^$\n]{0,80}?({AMOUNT})",
            1,
            Amount,
            SCENARIO_ANCHORS,
        ),
        MetricRule::new(
            "terminal_growth",
            r"(?:terminal|perpetuity)[\s-]growth(?: rate)?[^%\n]{0,40}?({PERCENT})",
            1,
            Percent,
            SUMMARY_ANCHORS,
        ),
        MetricRule::new(
            "discount_rate",
            r"discount rate[^%\n]{0,40}?({PERCENT})",
            1,
            Percent,
            WACC_ANCHORS,
        ),
        MetricRule::new(
            "cost_of_equity",
            r"cost of equity[^%\n]{0,60}?({PERCENT})",
            1,
            Percent,
            WACC_ANCHORS,
        ),
        MetricRule::new(
            "cost_of_debt",
            r"cost of debt[^%\n]{0,60}?({PERCENT})",
            1,
            Percent,
            WACC_ANCHORS,
        ),
        MetricRule::new(
            "equity_value",
            r"equity value[^$\n]{0,40}?({AMOUNT})",
            1,
            Amount,
            SUMMARY_ANCHORS,
        ),
        MetricRule::new(
            "per_share_value",
            r"(?:per[\s-]share(?: value)?|share price|price per share)[^$\n]{0,40}?(\$\s?\d(?:[\d,]*\d)?(?:\.\d+)?)",
            1,
            Amount,
            SUMMARY_ANCHORS,
        ),
        MetricRule::new("cagr", r"\bCAGR\b[^%\n]{0,40}?({PERCENT})", 1, Percent, NO_ANCHORS),
        MetricRule::new("cagr", r"({PERCENT})\s*CAGR\b", 1, Percent, NO_ANCHORS),
    ]
});

/// Returns the ordered range rules for an analysis kind.
pub fn range_rules_for(kind: AnalysisKind) -> &'static [RangeRule] {
    match kind {
        AnalysisKind::Tam => &TAM_RANGES,
        AnalysisKind::Dcf => &[],
    }
}

/// Returns the ordered rule set for an analysis kind.
pub fn rules_for(kind: AnalysisKind) -> &'static [MetricRule] {
    match kind {
        AnalysisKind::Tam => &TAM_RULES,
        AnalysisKind::Dcf => &DCF_RULES,
    }
}
