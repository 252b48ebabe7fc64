//! Metric extraction from free-form model output.
//!
//! The extractor walks an ordered rule list (see [`rules`]) and fills each
//! metric from the first rule that yields a parseable value. When one rule
//! matches several times, the candidate closest after one of the rule's
//! anchor headings is preferred; without any anchor in the text the earliest
//! candidate wins. Literals that match a pattern but fail to parse are
//! skipped and recorded in [`ExtractionDiagnostics`].
//!
//! Range rules run first. A range match fills its low and high metrics
//! together, so the two bounds always come from the same sentence.

mod number;
pub mod rules;

use prompt_harness_core::{AnalysisKind, ExtractedMetrics, MetricValue};
use serde::Serialize;
use tracing::debug;

pub use number::{parse_amount, parse_amount_range, parse_percent};
pub use rules::{MetricRule, RangeRule, ValueParser, range_rules_for, rules_for};

/// A literal that matched an extraction pattern but could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedMetric {
    pub field: String,
    pub raw: String,
}

/// Counters collected while extracting metrics from one response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionDiagnostics {
    pub rules_evaluated: usize,
    pub candidates_seen: usize,
    pub anchored_picks: usize,
    pub malformed: Vec<MalformedMetric>,
}

impl ExtractionDiagnostics {
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.malformed.is_empty() {
            let fields: Vec<&str> = self.malformed.iter().map(|m| m.field.as_str()).collect();
            warnings.push(format!(
                "Skipped {} malformed metric literals ({})",
                self.malformed.len(),
                fields.join(", ")
            ));
        }

        warnings
    }
}

/// Metrics plus the diagnostics gathered while extracting them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub metrics: ExtractedMetrics,
    pub diagnostics: ExtractionDiagnostics,
}

/// Rule-driven metric extractor for one analysis kind.
///
/// # Examples
///
/// ```
/// use prompt_harness_core::AnalysisKind;
/// use prompt_harness_scoring::metrics::MetricExtractor;
///
/// let extractor = MetricExtractor::new(AnalysisKind::Tam);
/// let text = "Market Size: $10 billion to $20 billion, central estimate \
///             $15 billion (95% confidence interval)";
/// let metrics = extractor.extract(text).metrics;
///
/// assert_eq!(metrics.number("tam_low"), Some(1e10));
/// assert_eq!(metrics.number("tam_high"), Some(2e10));
/// assert_eq!(metrics.number("tam_central"), Some(1.5e10));
/// assert_eq!(metrics.number("confidence_interval"), Some(0.95));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MetricExtractor {
    ranges: &'static [RangeRule],
    rules: &'static [MetricRule],
}

impl MetricExtractor {
    pub fn new(kind: AnalysisKind) -> Self {
        Self {
            ranges: range_rules_for(kind),
            rules: rules_for(kind),
        }
    }

    pub fn rules(&self) -> &'static [MetricRule] {
        self.rules
    }

    /// Extracts every metric the rules can find. Never fails.
    pub fn extract(&self, text: &str) -> Extraction {
        let mut extraction = Extraction::default();
        if text.trim().is_empty() {
            return extraction;
        }

        // ASCII lowering keeps byte offsets aligned with `text`.
        let lowered = text.to_ascii_lowercase();

        for range in self.ranges {
            if extraction.metrics.contains(range.low_field)
                || extraction.metrics.contains(range.high_field)
            {
                continue;
            }
            extraction.diagnostics.rules_evaluated += 1;
            if let Some((low, high)) =
                apply_range(range, text, &lowered, &mut extraction.diagnostics)
            {
                debug!(low_field = range.low_field, low, high, "Extracted range");
                extraction.metrics.insert(range.low_field, MetricValue::Number(low));
                extraction.metrics.insert(range.high_field, MetricValue::Number(high));
            }
        }

        for rule in self.rules {
            if extraction.metrics.contains(rule.field) {
                continue;
            }
            extraction.diagnostics.rules_evaluated += 1;
            if let Some(value) = apply_rule(rule, text, &lowered, &mut extraction.diagnostics) {
                debug!(field = rule.field, value = %value, "Extracted metric");
                extraction.metrics.insert(rule.field, value);
            }
        }

        extraction
    }
}

fn apply_rule(
    rule: &MetricRule,
    text: &str,
    lowered: &str,
    diagnostics: &mut ExtractionDiagnostics,
) -> Option<MetricValue> {
    let candidates: Vec<(usize, &str)> = rule
        .pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(rule.group))
        .map(|m| (m.start(), m.as_str()))
        .collect();
    if candidates.is_empty() {
        return None;
    }
    diagnostics.candidates_seen += candidates.len();

    let anchors = anchor_positions(rule.anchors, lowered);

    for (rank, (start, raw)) in order_candidates(&candidates, &anchors).into_iter().enumerate() {
        match rule.parser.parse(raw) {
            Some(value) => {
                if rank == 0 && anchor_distance(start, &anchors).is_some() {
                    diagnostics.anchored_picks += 1;
                }
                return Some(value);
            }
            None => {
                debug!(field = rule.field, raw, "Skipping malformed metric literal");
                diagnostics.malformed.push(MalformedMetric {
                    field: rule.field.to_string(),
                    raw: raw.to_string(),
                });
            }
        }
    }

    None
}

fn apply_range(
    range: &RangeRule,
    text: &str,
    lowered: &str,
    diagnostics: &mut ExtractionDiagnostics,
) -> Option<(f64, f64)> {
    let anchors = anchor_positions(range.anchors, lowered);
    let candidates: Vec<(usize, (&str, &str))> = range
        .pattern
        .captures_iter(text)
        .filter_map(|caps| Some((caps.get(1)?, caps.get(2)?)))
        .map(|(low, high)| (low.start(), (low.as_str(), high.as_str())))
        .filter(|(start, _)| !range.require_anchor || anchor_distance(*start, &anchors).is_some())
        .collect();
    if candidates.is_empty() {
        return None;
    }
    diagnostics.candidates_seen += candidates.len();

    for (rank, (start, (low, high))) in order_candidates(&candidates, &anchors).into_iter().enumerate()
    {
        match range.parse(low, high) {
            Some(bounds) => {
                if rank == 0 && anchor_distance(start, &anchors).is_some() {
                    diagnostics.anchored_picks += 1;
                }
                return Some(bounds);
            }
            None => {
                debug!(field = range.low_field, low, high, "Skipping malformed range");
                diagnostics.malformed.push(MalformedMetric {
                    field: format!("{}..{}", range.low_field, range.high_field),
                    raw: format!("{low} to {high}"),
                });
            }
        }
    }

    None
}

fn anchor_positions(anchors: &[&str], lowered: &str) -> Vec<usize> {
    anchors
        .iter()
        .flat_map(|anchor| lowered.match_indices(anchor).map(|(pos, _)| pos))
        .collect()
}

/// Anchored candidates first (nearest anchor first), then the rest in text
/// order.
fn order_candidates<T: Copy>(candidates: &[(usize, T)], anchors: &[usize]) -> Vec<(usize, T)> {
    let mut ordered = candidates.to_vec();
    ordered.sort_by_key(|(start, _)| match anchor_distance(*start, anchors) {
        Some(distance) => (0, distance, *start),
        None => (1, 0, *start),
    });
    ordered
}

fn anchor_distance(start: usize, anchors: &[usize]) -> Option<usize> {
    anchors
        .iter()
        .filter(|anchor| **anchor <= start)
        .map(|anchor| start - anchor)
        .min()
}
