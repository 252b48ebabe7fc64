//! Harness configuration.
//!
//! Defines the YAML-serializable configuration for providers, retries,
//! per-analysis scoring profiles, the result log and the HTTP server. Every
//! section has defaults, so an empty file (or no file at all) yields a
//! working configuration. API keys are never stored here: each provider
//! names the environment variable that holds its key.
//!
//! # Example YAML
//!
//! ```yaml
//! providers:
//!   qwen:
//!     model: qwen/qwen2.5-vl-32b-instruct:free
//!     api_key_env: OPENROUTER_API_KEY
//!   gemini:
//!     model: gemini-1.5-pro
//!     timeout_secs: 45
//! retry:
//!   max_attempts: 3
//!   backoff_ms: 2000
//! profiles:
//!   tam:
//!     framework_path: prompts/tam.md
//!     merge_strategy: prefer_overlay
//!     checklist:
//!       sections: ["Risk Factors"]
//!   dcf:
//!     request_timeout_secs: 120
//!     scoring:
//!       min_response_length: 2000
//! results:
//!   log_path: results/test_results.jsonl
//! server:
//!   bind: 127.0.0.1:5000
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use prompt_harness_core::{
    AnalysisKind, ChecklistConfig, MergeStrategy, ModelId, ScoringConfig, ScoringProfile,
    merge_checklists, validate_profile,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DatabaseError, Result};

/// Connection settings for one model provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Per-request HTTP timeout.
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl ProviderConfig {
    /// Default OpenRouter settings serving Qwen.
    pub fn openrouter() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "qwen/qwen2.5-vl-32b-instruct:free".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            timeout_secs: 60,
            max_tokens: 4000,
            temperature: 0.7,
        }
    }

    /// Default Google Generative Language settings serving Gemini.
    pub fn gemini() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-pro".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 60,
            max_tokens: 4000,
            temperature: 0.7,
        }
    }

    /// Reads the API key from the configured environment variable.
    ///
    /// Returns `None` when the variable is unset or blank.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::openrouter()
    }
}

/// Settings for both supported providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub qwen: ProviderConfig,
    pub gemini: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            qwen: ProviderConfig::openrouter(),
            gemini: ProviderConfig::gemini(),
        }
    }
}

impl ProvidersConfig {
    pub fn get(&self, model: ModelId) -> &ProviderConfig {
        match model {
            ModelId::Qwen => &self.qwen,
            ModelId::Gemini => &self.gemini,
        }
    }
}

/// Retry policy for provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 2000,
        }
    }
}

/// Per-analysis settings: prompt framework, deadline and scoring overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    /// Framework prompt file; the built-in framework is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework_path: Option<PathBuf>,
    /// Overall deadline for one test, retries included.
    pub request_timeout_secs: u64,
    pub merge_strategy: MergeStrategy,
    /// Checklist entries merged onto the built-in checklist.
    pub checklist: ChecklistConfig,
    /// Scoring thresholds; the built-in values are used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring: Option<ScoringConfig>,
}

impl ProfileSettings {
    fn with_timeout(request_timeout_secs: u64) -> Self {
        Self {
            framework_path: None,
            request_timeout_secs,
            merge_strategy: MergeStrategy::default(),
            checklist: ChecklistConfig::default(),
            scoring: None,
        }
    }
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self::with_timeout(60)
    }
}

/// Settings for both analysis kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilesConfig {
    pub tam: ProfileSettings,
    pub dcf: ProfileSettings,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            tam: ProfileSettings::with_timeout(60),
            dcf: ProfileSettings::with_timeout(90),
        }
    }
}

impl ProfilesConfig {
    pub fn get(&self, kind: AnalysisKind) -> &ProfileSettings {
        match kind {
            AnalysisKind::Tam => &self.tam,
            AnalysisKind::Dcf => &self.dcf,
        }
    }
}

/// Result log and export locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsConfig {
    /// Append-only JSON-lines log; results stay in memory when unset.
    pub log_path: Option<PathBuf>,
    /// Directory used for exports given without an explicit path.
    pub export_dir: PathBuf,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            log_path: Some(PathBuf::from("results/test_results.jsonl")),
            export_dir: PathBuf::from("results"),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Top-level harness configuration.
///
/// # Examples
///
/// ```
/// use prompt_harness_core::{AnalysisKind, ModelId};
/// use prompt_harness_db::HarnessConfig;
///
/// let config: HarnessConfig = serde_yaml::from_str("retry: { max_attempts: 5 }").unwrap();
/// assert_eq!(config.retry.max_attempts, 5);
/// assert_eq!(config.retry.backoff_ms, 2000);
/// assert_eq!(config.profiles.get(AnalysisKind::Dcf).request_timeout_secs, 90);
/// assert_eq!(config.providers.get(ModelId::Gemini).api_key_env, "GEMINI_API_KEY");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub providers: ProvidersConfig,
    pub retry: RetryConfig,
    pub profiles: ProfilesConfig,
    pub results: ResultsConfig,
    pub server: ServerConfig,
}

impl HarnessConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::DatabaseError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Loads `path` when given, the defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Builds the effective scoring profile for `kind`: the built-in
    /// profile with the configured overlay and thresholds applied.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidProfile`](crate::DatabaseError::InvalidProfile) when
    /// the merged profile fails validation.
    pub fn scoring_profile(&self, kind: AnalysisKind) -> Result<ScoringProfile> {
        let settings = self.profiles.get(kind);
        let mut profile = ScoringProfile::builtin(kind);
        profile.checklist =
            merge_checklists(&profile.checklist, &settings.checklist, settings.merge_strategy);
        if let Some(ref scoring) = settings.scoring {
            profile.scoring = scoring.clone();
        }

        let errors = validate_profile(&profile);
        if !errors.is_empty() {
            return Err(DatabaseError::InvalidProfile {
                kind: kind.to_string(),
                errors,
            });
        }
        debug!(
            kind = %kind,
            sections = profile.checklist.sections.len(),
            elements = profile.checklist.elements.len(),
            "Built scoring profile"
        );
        Ok(profile)
    }

    /// Reads the configured framework prompt for `kind`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkUnreadable`](crate::DatabaseError::FrameworkUnreadable)
    /// when a configured file cannot be read.
    pub fn framework_text(&self, kind: AnalysisKind) -> Result<Option<String>> {
        let Some(ref path) = self.profiles.get(kind).framework_path else {
            return Ok(None);
        };
        std::fs::read_to_string(path)
            .map(Some)
            .map_err(|source| DatabaseError::FrameworkUnreadable {
                path: path.clone(),
                source,
            })
    }
}
