//! Command handlers -- one module per subcommand

pub mod analyze;
pub mod config;
pub mod history;
pub mod start;

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use pwa_report_core::analytics::{NoopAnalytics, TracingAnalytics};
use pwa_report_core::config::ReportConfig;
use pwa_report_core::error::{ConfigError, ReportError};
use pwa_report_core::store::{JsonFileStore, MemoryStore};
use pwa_report_core::{AnalyticsSink, DynSuite, ManifestSuite, StateStore};
use pwa_report_engine::{Orchestrator, ReportSession};
use pwa_report_probes::{
    HttpFetcher, HttpManifestResolver, HttpSecuritySuite, HttpServiceWorkerSuite,
    ManifestRuleEngine,
};

use crate::error::CliError;

/// Load the configuration, falling back to defaults when the file is absent.
///
/// Env overrides and validation apply in both cases, so a missing file and an
/// empty file behave the same.
pub async fn load_config(path: &Path) -> Result<ReportConfig, CliError> {
    match ReportConfig::load(path).await {
        Ok(config) => Ok(config),
        Err(ReportError::Config(ConfigError::FileNotFound { .. })) => {
            debug!(path = %path.display(), "config file not found, using defaults");
            let mut config = ReportConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
        Err(e) => Err(e.into()),
    }
}

/// State store selected by `[store].backend`.
pub fn build_store(config: &ReportConfig) -> Arc<dyn StateStore> {
    match config.store.backend.as_str() {
        "file" => Arc::new(JsonFileStore::new(&config.store.path)),
        _ => Arc::new(MemoryStore::new()),
    }
}

/// Analytics sink selected by `[analytics].enabled`.
pub fn build_analytics(config: &ReportConfig) -> Arc<dyn AnalyticsSink> {
    if config.analytics.enabled {
        Arc::new(TracingAnalytics)
    } else {
        Arc::new(NoopAnalytics)
    }
}

/// Wire the HTTP probes, store and analytics into a [`ReportSession`].
pub fn build_session(config: &ReportConfig) -> Result<ReportSession, CliError> {
    let fetcher = HttpFetcher::from_config(&config.probes)?;
    let unverified = HttpFetcher::unverified_from_config(&config.probes)?;

    let manifest: Arc<dyn DynSuite> = Arc::new(ManifestSuite::new(ManifestRuleEngine::new()));
    let service_worker: Arc<dyn DynSuite> = Arc::new(HttpServiceWorkerSuite::new(fetcher.clone())?);
    let security: Arc<dyn DynSuite> = Arc::new(HttpSecuritySuite::new(fetcher.clone(), unverified)?);

    let orchestrator = Orchestrator::builder()
        .resolver(Arc::new(HttpManifestResolver::new(fetcher)?))
        .suite(manifest)
        .suite(service_worker)
        .suite(security)
        .store(build_store(config))
        .build()?;

    Ok(ReportSession::new(
        Arc::new(orchestrator),
        build_analytics(config),
        &config.analysis,
    ))
}
