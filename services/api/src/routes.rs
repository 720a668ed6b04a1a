use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use intern_hub::config::OfferGate;
use intern_hub::workflows::hiring::{
    hiring_router, HiringRound, HiringService, NotificationPublisher, PipelineRepository,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_pipeline_routes<R, N>(service: Arc<HiringService<R, N>>) -> axum::Router
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let offer_gate = service.config().offer_gate;
    hiring_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/pipeline/rounds",
            axum::routing::get(move || rounds_endpoint(offer_gate)),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Static round catalogue plus the active offer gate, for clients rendering the pipeline.
pub(crate) async fn rounds_endpoint(offer_gate: OfferGate) -> Json<serde_json::Value> {
    let rounds: Vec<serde_json::Value> = HiringRound::ordered()
        .into_iter()
        .map(|round| {
            json!({
                "round": round,
                "sequence": round.sequence(),
                "terminal": round.is_terminal(),
            })
        })
        .collect();
    let gate = match offer_gate {
        OfferGate::Strict => "strict",
        OfferGate::Advisory => "advisory",
    };
    Json(json!({ "rounds": rounds, "offer_gate": gate }))
}
