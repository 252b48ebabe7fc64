//! Core types and scoring profiles for the financial-analysis prompt harness.
//!
//! This crate defines the data model shared by every other crate in the
//! workspace:
//!
//! - [`AnalysisRequest`]: a validated request (company context, model,
//!   analysis kind).
//! - [`RawResponse`]: provider text or a classified [`ProviderErrorKind`].
//! - [`ExtractedMetrics`]: named numeric/text values pulled from a response.
//! - [`ValidationResult`]: coverage, quality score, missing requirements and
//!   recommendations.
//! - [`TestResult`]: the immutable record of one test invocation.
//! - [`ResultBundle`]: a versioned export of many results.
//!
//! Scoring configuration lives in [`ScoringProfile`]: the checklist of
//! required sections/elements/signals plus weights and thresholds. Built-in
//! TAM and DCF profiles are provided; [`validate_profile`] catches broken
//! configuration and [`merge_checklists`] overlays deployment tweaks.
//!
//! # Example
//!
//! ```
//! use prompt_harness_core::*;
//!
//! let request = AnalysisRequest::new(
//!     "A healthcare SaaS platform for small medical practices",
//!     ModelId::Gemini,
//!     AnalysisKind::Tam,
//! )
//! .unwrap();
//! assert_eq!(request.kind().label(), "TAM");
//!
//! let profile = ScoringProfile::builtin(request.kind());
//! assert!(validate_profile(&profile).is_empty());
//! ```

mod merge;
mod package;
mod profile;
mod types;
mod validate;

pub use merge::{MergeStrategy, merge_checklists};
pub use package::ResultBundle;
pub use profile::*;
pub use types::*;
pub use validate::{ConfigError, validate_checklist, validate_profile, validate_scoring};
