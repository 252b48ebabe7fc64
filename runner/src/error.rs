use prompt_harness_core::ConfigError;
use prompt_harness_db::DatabaseError;
use thiserror::Error;

/// Errors raised while setting up a runner. Test execution itself never
/// fails: provider problems are recorded in the result.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Configuration could not be loaded or compiled.
    #[error(transparent)]
    Config(#[from] DatabaseError),

    /// A scoring profile failed to compile.
    #[error("invalid {kind} profile: {}", .errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Profile {
        kind: String,
        errors: Vec<ConfigError>,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
