use crate::cli::ServeArgs;
use crate::infra::{seed_store, AppState};
use crate::routes::with_stay_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use farmhouse::config::AppConfig;
use farmhouse::error::AppError;
use farmhouse::stays::{InMemoryStore, StayError, StayService};
use farmhouse::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryStore::new());
    seed_store(&store, &config).map_err(StayError::from)?;
    let stay_service = Arc::new(StayService::new(store, config.economy.clone()));

    let app = with_stay_routes(stay_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "farmhouse booking service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
