//! Checklist merging with configurable conflict resolution.
//!
//! Deployments usually start from a built-in profile and adjust it: add a
//! section the house prompt asks for, tighten one element pattern, or swap
//! the whole checklist. [`merge_checklists`] combines a base checklist with
//! an overlay using a [`MergeStrategy`].
//!
//! # Example
//!
//! ```
//! use prompt_harness_core::*;
//!
//! let base = ScoringProfile::tam().checklist;
//! let overlay = ChecklistConfig {
//!     sections: vec!["Risk Factors".into()],
//!     elements: Vec::new(),
//!     signals: Vec::new(),
//! };
//!
//! let merged = merge_checklists(&base, &overlay, MergeStrategy::PreferOverlay);
//! assert_eq!(merged.sections.len(), base.sections.len() + 1);
//! assert_eq!(merged.sections.last().map(String::as_str), Some("Risk Factors"));
//! ```

use serde::{Deserialize, Serialize};

use crate::ChecklistConfig;

/// Checklist merge behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Keep base entries when both sides define the same name.
    PreferBase,
    /// Keep overlay entries when both sides define the same name.
    #[default]
    PreferOverlay,
    /// Each non-empty overlay list replaces the base list outright.
    Replace,
}

/// Merges an overlay checklist onto a base checklist.
///
/// Sections are deduplicated case-insensitively, elements and signals by
/// name. Base order is kept; new overlay entries are appended in overlay
/// order.
///
/// # Examples
///
/// ```
/// use prompt_harness_core::*;
///
/// let base = ScoringProfile::tam().checklist;
/// let overlay = ChecklistConfig {
///     sections: Vec::new(),
///     elements: vec![ElementRequirement::new("sources", r"Gartner|Forrester")],
///     signals: Vec::new(),
/// };
///
/// let kept = merge_checklists(&base, &overlay, MergeStrategy::PreferBase);
/// let sources = kept.elements.iter().find(|e| e.name == "sources").unwrap();
/// assert_ne!(sources.pattern, "Gartner|Forrester");
///
/// let replaced = merge_checklists(&base, &overlay, MergeStrategy::PreferOverlay);
/// let sources = replaced.elements.iter().find(|e| e.name == "sources").unwrap();
/// assert_eq!(sources.pattern, "Gartner|Forrester");
/// ```
pub fn merge_checklists(
    base: &ChecklistConfig,
    overlay: &ChecklistConfig,
    strategy: MergeStrategy,
) -> ChecklistConfig {
    if strategy == MergeStrategy::Replace {
        return ChecklistConfig {
            sections: pick_list(&base.sections, &overlay.sections),
            elements: pick_list(&base.elements, &overlay.elements),
            signals: pick_list(&base.signals, &overlay.signals),
        };
    }

    let prefer_overlay = strategy == MergeStrategy::PreferOverlay;

    let mut sections = base.sections.clone();
    for section in &overlay.sections {
        let key = section.trim().to_lowercase();
        match sections
            .iter()
            .position(|existing| existing.trim().to_lowercase() == key)
        {
            Some(idx) if prefer_overlay => sections[idx] = section.clone(),
            Some(_) => {}
            None => sections.push(section.clone()),
        }
    }

    ChecklistConfig {
        sections,
        elements: merge_named(&base.elements, &overlay.elements, prefer_overlay, |e| {
            e.name.as_str()
        }),
        signals: merge_named(&base.signals, &overlay.signals, prefer_overlay, |s| {
            s.name.as_str()
        }),
    }
}

fn pick_list<T: Clone>(base: &[T], overlay: &[T]) -> Vec<T> {
    if overlay.is_empty() {
        base.to_vec()
    } else {
        overlay.to_vec()
    }
}

fn merge_named<T: Clone>(
    base: &[T],
    overlay: &[T],
    prefer_overlay: bool,
    name: impl Fn(&T) -> &str,
) -> Vec<T> {
    let mut merged = base.to_vec();
    for entry in overlay {
        match merged.iter().position(|existing| name(existing) == name(entry)) {
            Some(idx) if prefer_overlay => merged[idx] = entry.clone(),
            Some(_) => {}
            None => merged.push(entry.clone()),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementRequirement, ScoringProfile, SignalRule};

    fn overlay() -> ChecklistConfig {
        ChecklistConfig {
            sections: vec!["FINAL DELIVERABLES".into(), "Risk Factors".into()],
            elements: vec![ElementRequirement::new("moat", r"moat|defensib")],
            signals: vec![SignalRule::new("has_tables", r"\|", "Use tables")],
        }
    }

    #[test]
    fn test_prefer_overlay_replaces_matching_entries_in_place() {
        let base = ScoringProfile::tam().checklist;
        let merged = merge_checklists(&base, &overlay(), MergeStrategy::PreferOverlay);

        assert_eq!(merged.sections.len(), 7);
        assert_eq!(merged.sections[5], "FINAL DELIVERABLES");
        assert_eq!(merged.sections[6], "Risk Factors");
        assert_eq!(merged.elements.len(), 11);
        assert_eq!(merged.signals.len(), 2);
        let tables = merged.signals.iter().find(|s| s.name == "has_tables").unwrap();
        assert_eq!(tables.recommendation, "Use tables");
    }

    #[test]
    fn test_prefer_base_keeps_base_entries() {
        let base = ScoringProfile::tam().checklist;
        let merged = merge_checklists(&base, &overlay(), MergeStrategy::PreferBase);

        assert_eq!(merged.sections[5], "Final Deliverables");
        let tables = merged.signals.iter().find(|s| s.name == "has_tables").unwrap();
        assert_ne!(tables.recommendation, "Use tables");
    }

    #[test]
    fn test_replace_swaps_non_empty_lists_only() {
        let base = ScoringProfile::dcf().checklist;
        let overlay = ChecklistConfig {
            sections: vec!["Valuation".into()],
            elements: Vec::new(),
            signals: Vec::new(),
        };
        let merged = merge_checklists(&base, &overlay, MergeStrategy::Replace);

        assert_eq!(merged.sections, vec!["Valuation".to_string()]);
        assert_eq!(merged.elements, base.elements);
        assert_eq!(merged.signals, base.signals);
    }
}
