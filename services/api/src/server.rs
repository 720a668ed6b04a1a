use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryNotifier, InMemoryPipelineRepository};
use crate::routes::with_pipeline_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use intern_hub::config::AppConfig;
use intern_hub::error::AppError;
use intern_hub::telemetry;
use intern_hub::workflows::hiring::HiringService;
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

    let hiring_service = Arc::new(HiringService::new(
        Arc::new(InMemoryPipelineRepository::default()),
        Arc::new(InMemoryNotifier::default()),
        config.pipeline,
    ));

    let app = with_pipeline_routes(hiring_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        offer_gate = ?config.pipeline.offer_gate,
        %addr,
        "intern hub pipeline service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
