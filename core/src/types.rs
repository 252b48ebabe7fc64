//! Data model for prompt test runs.
//!
//! These types describe one test invocation end to end: the
//! [`AnalysisRequest`] submitted by a caller, the [`RawResponse`] returned by
//! a model provider, the [`ExtractedMetrics`] and [`ValidationResult`]
//! computed from the response text, and the [`TestResult`] record that ties
//! them together. Every type serializes with camelCase field names so that
//! exported records are self-describing.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version of the result record contract (semver).
///
/// Embedded in every [`ResultBundle`](crate::ResultBundle) so that exported
/// files can be checked for compatibility.
pub const RESULT_CONTRACT_VERSION: &str = "1.0.0";

/// Model selector for a test run.
///
/// # Examples
///
/// ```
/// use prompt_harness_core::ModelId;
///
/// let model: ModelId = "Gemini".parse().unwrap();
/// assert_eq!(model, ModelId::Gemini);
/// assert_eq!(model.to_string(), "gemini");
/// assert!("gpt".parse::<ModelId>().is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ModelId {
    /// Qwen served through the OpenRouter chat-completions API.
    #[default]
    Qwen,
    /// Google Gemini served through the `generateContent` API.
    Gemini,
}

impl ModelId {
    /// Every supported model, in display order.
    pub const ALL: [ModelId; 2] = [ModelId::Qwen, ModelId::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Qwen => "qwen",
            Self::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qwen" => Ok(Self::Qwen),
            "gemini" => Ok(Self::Gemini),
            _ => Err(RequestError::UnknownModel(s.trim().to_string())),
        }
    }
}

/// Kind of financial analysis requested from the model.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    /// Total Addressable Market estimate.
    #[default]
    Tam,
    /// Discounted Cash Flow valuation.
    Dcf,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 2] = [AnalysisKind::Tam, AnalysisKind::Dcf];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tam => "tam",
            Self::Dcf => "dcf",
        }
    }

    /// Upper-case label used in reports (`"TAM"`, `"DCF"`).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tam => "TAM",
            Self::Dcf => "DCF",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tam" => Ok(Self::Tam),
            "dcf" => Ok(Self::Dcf),
            _ => Err(RequestError::UnknownKind(s.trim().to_string())),
        }
    }
}

/// Rejection reasons for malformed analysis requests.
///
/// These are raised before any provider call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Company context is missing or whitespace-only.
    #[error("company context cannot be empty")]
    MissingCompanyContext,
    /// Model selector does not name a supported model.
    #[error("unknown model selector: {0}")]
    UnknownModel(String),
    /// Analysis kind is not `tam` or `dcf`.
    #[error("unknown analysis kind: {0}")]
    UnknownKind(String),
}

/// A validated request to run one prompt test.
///
/// Fields are private so a request can only be built through
/// [`AnalysisRequest::new`] or [`AnalysisRequest::parse`], both of which
/// reject blank company contexts.
///
/// # Examples
///
/// ```
/// use prompt_harness_core::{AnalysisKind, AnalysisRequest, ModelId, RequestError};
///
/// let request = AnalysisRequest::parse(Some("  A fintech startup "), "qwen", AnalysisKind::Tam).unwrap();
/// assert_eq!(request.company_context(), "A fintech startup");
/// assert_eq!(request.model_id(), ModelId::Qwen);
///
/// assert_eq!(
///     AnalysisRequest::parse(None, "qwen", AnalysisKind::Tam),
///     Err(RequestError::MissingCompanyContext)
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawAnalysisRequest")]
pub struct AnalysisRequest {
    company_context: String,
    model_id: ModelId,
    kind: AnalysisKind,
}

/// Wire form of [`AnalysisRequest`], validated on the way in.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysisRequest {
    company_context: String,
    model_id: ModelId,
    #[serde(default)]
    kind: AnalysisKind,
}

impl TryFrom<RawAnalysisRequest> for AnalysisRequest {
    type Error = RequestError;

    fn try_from(raw: RawAnalysisRequest) -> Result<Self, Self::Error> {
        Self::new(raw.company_context, raw.model_id, raw.kind)
    }
}

impl AnalysisRequest {
    pub fn new(
        company_context: impl Into<String>,
        model_id: ModelId,
        kind: AnalysisKind,
    ) -> Result<Self, RequestError> {
        let company_context = company_context.into();
        let trimmed = company_context.trim();
        if trimmed.is_empty() {
            return Err(RequestError::MissingCompanyContext);
        }
        Ok(Self {
            company_context: trimmed.to_string(),
            model_id,
            kind,
        })
    }

    /// Builds a request from loosely typed input such as form fields.
    ///
    /// The company context is checked before the model selector.
    pub fn parse(
        company_context: Option<&str>,
        model: &str,
        kind: AnalysisKind,
    ) -> Result<Self, RequestError> {
        let context = company_context.ok_or(RequestError::MissingCompanyContext)?;
        if context.trim().is_empty() {
            return Err(RequestError::MissingCompanyContext);
        }
        let model_id = model.parse::<ModelId>()?;
        Self::new(context, model_id, kind)
    }

    pub fn company_context(&self) -> &str {
        &self.company_context
    }

    pub fn model_id(&self) -> ModelId {
        self.model_id
    }

    pub fn kind(&self) -> AnalysisKind {
        self.kind
    }
}

/// Classified reason a provider call produced no usable text.
///
/// Serialized with the variant name (e.g. `"AuthError"`), which is also the
/// `Display` form shown in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderErrorKind {
    /// Missing, invalid or unauthorized API key.
    AuthError,
    /// Provider throttled the request.
    RateLimitError,
    /// Connection could not be established or was dropped.
    NetworkError,
    /// Request exceeded its deadline.
    Timeout,
    /// Provider answered with an error status or an unusable body.
    ProviderServerError,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthError => "AuthError",
            Self::RateLimitError => "RateLimitError",
            Self::NetworkError => "NetworkError",
            Self::Timeout => "Timeout",
            Self::ProviderServerError => "ProviderServerError",
        }
    }

    /// Returns `true` when repeating the call may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::AuthError)
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text returned by a provider, or the classified failure that replaced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResponse {
    pub text: String,
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_error: Option<ProviderErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_error_detail: Option<String>,
}

impl RawResponse {
    pub fn success(text: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            text: text.into(),
            latency_ms,
            provider_error: None,
            provider_error_detail: None,
        }
    }

    /// Builds a failed response. The text is always empty.
    pub fn failure(kind: ProviderErrorKind, detail: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            text: String::new(),
            latency_ms,
            provider_error: Some(kind),
            provider_error_detail: Some(detail.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.provider_error.is_some()
    }

    /// Response length in Unicode scalar values.
    pub fn response_length(&self) -> usize {
        self.text.chars().count()
    }
}

/// A single extracted metric value.
///
/// Serialized untagged: numbers as JSON numbers, text as JSON strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Metrics pulled out of a response, keyed by metric name.
///
/// A missing key means the metric was not found in the text; it never
/// stands for zero.
///
/// # Examples
///
/// ```
/// use prompt_harness_core::{ExtractedMetrics, MetricValue};
///
/// let mut metrics = ExtractedMetrics::default();
/// metrics.insert("wacc", MetricValue::Number(0.095));
/// assert_eq!(metrics.number("wacc"), Some(0.095));
/// assert_eq!(metrics.number("tam_low"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedMetrics(BTreeMap<String, MetricValue>);

impl ExtractedMetrics {
    pub fn insert(&mut self, name: impl Into<String>, value: MetricValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.0.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(MetricValue::as_number)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(MetricValue::as_text)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Quality tier assigned to one validation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    High,
    Medium,
    Low,
    Failed,
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Match count for one required element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementHit {
    pub name: String,
    pub matches: usize,
}

/// Presence of one informational signal (tables, calculations, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalIndicator {
    pub name: String,
    pub present: bool,
}

/// Outcome of scoring one response against a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub quality_score: f64,
    pub section_coverage: f64,
    pub element_coverage: f64,
    pub response_length: usize,
    /// Missing section headings first, then missing element names.
    pub missing_requirements: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub sections_found: Vec<String>,
    #[serde(default)]
    pub element_hits: Vec<ElementHit>,
    #[serde(default)]
    pub indicators: Vec<SignalIndicator>,
    pub quality_tier: QualityTier,
    pub passed: bool,
}

/// Record of one completed test invocation.
///
/// Created once by the result assembler and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub test_id: String,
    pub timestamp: DateTime<Utc>,
    pub request: AnalysisRequest,
    /// First characters of the framework prompt that was sent.
    pub prompt_preview: String,
    pub response: RawResponse,
    pub metrics: ExtractedMetrics,
    pub validation: ValidationResult,
    /// Hex SHA-256 digest of the response text.
    pub response_digest: String,
    /// Non-fatal extraction warnings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl TestResult {
    pub fn quality_score(&self) -> f64 {
        self.validation.quality_score
    }

    pub fn kind(&self) -> AnalysisKind {
        self.request.kind()
    }

    pub fn provider_error(&self) -> Option<ProviderErrorKind> {
        self.response.provider_error
    }
}
