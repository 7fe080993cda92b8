use chrono::NaiveDate;
use farmhouse::config::AppConfig;
use farmhouse::stays::{Family, InMemoryStore, RepositoryError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Registers the configured households, each at the season score.
pub(crate) fn seed_store(
    store: &InMemoryStore,
    config: &AppConfig,
) -> Result<Vec<Family>, RepositoryError> {
    let families = config
        .seed
        .families
        .iter()
        .map(|name| store.register_family(name.as_str(), config.economy.season_score))
        .collect::<Result<Vec<_>, _>>()?;
    if !families.is_empty() {
        info!(
            families = families.len(),
            score = config.economy.season_score,
            "seeded households"
        );
    }
    Ok(families)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
