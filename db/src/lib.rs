//! Configuration and persistence for the prompt test harness.
//!
//! This crate loads the YAML [`HarnessConfig`], keeps completed test results
//! in an append-only [`ResultStore`] and exports them as JSON bundles.
//!
//! # Quick start
//!
//! ```no_run
//! use prompt_harness_core::AnalysisKind;
//! use prompt_harness_db::{HarnessConfig, ResultStore};
//!
//! let config = HarnessConfig::load("harness.yml").unwrap();
//! let profile = config.scoring_profile(AnalysisKind::Tam).unwrap();
//!
//! let store = ResultStore::open_or_in_memory(config.results.log_path.as_deref()).unwrap();
//! println!("{} stored results", store.len());
//!
//! let receipt = store
//!     .export_to_file(Some(AnalysisKind::Tam), "results/tam_test_results.json")
//!     .unwrap();
//! println!("wrote {} ({})", receipt.path.display(), receipt.checksum);
//! # let _ = profile;
//! ```

mod config;
mod error;
mod export;
mod store;

pub use config::{
    HarnessConfig, ProfileSettings, ProfilesConfig, ProviderConfig, ProvidersConfig, ResultsConfig,
    RetryConfig, ServerConfig,
};
pub use error::{DatabaseError, Result};
pub use export::{ExportReceipt, default_export_name, file_checksum};
pub use store::ResultStore;
