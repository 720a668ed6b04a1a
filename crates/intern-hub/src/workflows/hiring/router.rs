use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{HiringRound, OutcomeSubmission, RoundStatus, SubjectId};
use super::onboarding::{DocumentId, DocumentUpload, OfferId, OfferRequest, SignedArtifact};
use super::repository::{NotificationPublisher, PipelineRepository};
use super::service::{HiringService, PipelineError};
use super::session::{SessionContext, SessionRole};
use crate::workflows::intake::CandidateSubmission;

pub const ACTOR_HEADER: &str = "x-actor";
pub const ROLE_HEADER: &str = "x-role";

type SharedService<R, N> = Arc<HiringService<R, N>>;

/// Router builder exposing the hiring pipeline under `/api/v1`.
pub fn hiring_router<R, N>(service: SharedService<R, N>) -> Router
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/candidates",
            post(register_handler::<R, N>).get(active_candidates_handler::<R, N>),
        )
        .route("/api/v1/candidates/import", post(import_handler::<R, N>))
        .route(
            "/api/v1/candidates/:candidate_id/convert",
            post(convert_handler::<R, N>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/withdraw",
            post(withdraw_handler::<R, N>),
        )
        .route("/api/v1/subjects/:subject_id", get(subject_handler::<R, N>))
        .route(
            "/api/v1/subjects/:subject_id/rounds",
            get(pipeline_handler::<R, N>).post(submit_outcome_handler::<R, N>),
        )
        .route(
            "/api/v1/subjects/:subject_id/rounds/:round",
            get(round_status_handler::<R, N>),
        )
        .route(
            "/api/v1/interns/:intern_id/documents",
            get(documents_handler::<R, N>).post(upload_document_handler::<R, N>),
        )
        .route(
            "/api/v1/interns/:intern_id/documents/checklist",
            get(checklist_handler::<R, N>),
        )
        .route(
            "/api/v1/documents/:document_id/verify",
            post(verify_document_handler::<R, N>),
        )
        .route(
            "/api/v1/documents/:document_id/reject",
            post(reject_document_handler::<R, N>),
        )
        .route(
            "/api/v1/interns/:intern_id/offers",
            get(offers_handler::<R, N>).post(generate_offer_handler::<R, N>),
        )
        .route(
            "/api/v1/offers/:offer_id/finalize",
            post(finalize_offer_handler::<R, N>),
        )
        .route("/api/v1/offers/:offer_id/send", post(send_offer_handler::<R, N>))
        .route(
            "/api/v1/offers/:offer_id/accept",
            post(accept_offer_handler::<R, N>),
        )
        .route(
            "/api/v1/offers/:offer_id/reject",
            post(reject_offer_handler::<R, N>),
        )
        .with_state(service)
}

/// Read the caller from `x-actor`/`x-role`; the role defaults to recruiter.
pub(crate) fn session_from_headers(headers: &HeaderMap) -> Result<SessionContext, Response> {
    let actor = headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            error_body(
                StatusCode::UNAUTHORIZED,
                format!("{ACTOR_HEADER} header is required"),
            )
        })?;

    let role = match headers.get(ROLE_HEADER) {
        None => SessionRole::Recruiter,
        Some(value) => value
            .to_str()
            .map_err(|_| error_body(StatusCode::BAD_REQUEST, "x-role header is not valid text"))?
            .parse::<SessionRole>()
            .map_err(|message| error_body(StatusCode::BAD_REQUEST, message))?,
    };

    Ok(SessionContext::new(actor, role))
}

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({ "error": message.into() });
    (status, Json(payload)).into_response()
}

pub(crate) fn status_for(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::SequenceViolation { .. }
        | PipelineError::InvalidTransition { .. }
        | PipelineError::ActiveOfferExists { .. }
        | PipelineError::Conflict(_) => StatusCode::CONFLICT,
        PipelineError::NotFound { .. } => StatusCode::NOT_FOUND,
        PipelineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::DocumentsIncomplete { .. } => StatusCode::PRECONDITION_FAILED,
        PipelineError::Import(_) => StatusCode::BAD_REQUEST,
        PipelineError::RemoteService(_) => StatusCode::SERVICE_UNAVAILABLE,
        PipelineError::ConversionFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let payload = match &self {
            PipelineError::DocumentsIncomplete { outstanding, .. } => json!({
                "error": self.to_string(),
                "outstanding": outstanding,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(payload)).into_response()
    }
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, PipelineError>) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(error) => error.into_response(),
    }
}

macro_rules! session_or_return {
    ($headers:expr) => {
        match session_from_headers(&$headers) {
            Ok(session) => session,
            Err(response) => return response,
        }
    };
}

pub(crate) async fn register_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Json(submission): Json<CandidateSubmission>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    respond(
        StatusCode::CREATED,
        service.register_candidate(&session, submission),
    )
}

pub(crate) async fn active_candidates_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    respond(StatusCode::OK, service.active_candidates(&session))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImportParams {
    college: String,
}

pub(crate) async fn import_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Query(params): Query<ImportParams>,
    body: String,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    if params.college.trim().is_empty() {
        return error_body(StatusCode::UNPROCESSABLE_ENTITY, "college is required");
    }
    respond(
        StatusCode::OK,
        service.import_candidates(&session, params.college.trim(), body.as_bytes()),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConvertRequest {
    #[serde(default)]
    join_date: Option<NaiveDate>,
}

pub(crate) async fn convert_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
    request: Option<Json<ConvertRequest>>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    let join_date = request.and_then(|Json(request)| request.join_date);
    respond(
        StatusCode::CREATED,
        service.convert_to_intern(&session, &SubjectId(candidate_id), join_date),
    )
}

pub(crate) async fn withdraw_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    respond(
        StatusCode::OK,
        service.withdraw_candidate(&session, &SubjectId(candidate_id)),
    )
}

pub(crate) async fn subject_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Path(subject_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    respond(StatusCode::OK, service.subject(&session, &SubjectId(subject_id)))
}

pub(crate) async fn pipeline_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Path(subject_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    respond(StatusCode::OK, service.pipeline(&session, &SubjectId(subject_id)))
}

pub(crate) async fn submit_outcome_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Path(subject_id): Path<String>,
    Json(submission): Json<OutcomeSubmission>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    respond(
        StatusCode::OK,
        service.submit_outcome(&session, &SubjectId(subject_id), submission),
    )
}

#[derive(Debug, Serialize)]
struct RoundStatusView {
    subject_id: SubjectId,
    round: HiringRound,
    status: RoundStatus,
    locked: bool,
}

pub(crate) async fn round_status_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Path((subject_id, round)): Path<(String, String)>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    let round = match round.parse::<HiringRound>() {
        Ok(round) => round,
        Err(err) => return error_body(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
    };
    let subject_id = SubjectId(subject_id);

    let view = service
        .current_round_status(&session, &subject_id, round)
        .and_then(|status| {
            let locked = service.is_round_locked(&session, &subject_id, round)?;
            Ok(RoundStatusView {
                subject_id: subject_id.clone(),
                round,
                status,
                locked,
            })
        });
    respond(StatusCode::OK, view)
}

pub(crate) async fn documents_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Path(intern_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    respond(StatusCode::OK, service.documents(&session, &SubjectId(intern_id)))
}

pub(crate) async fn upload_document_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Path(intern_id): Path<String>,
    Json(upload): Json<DocumentUpload>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    respond(
        StatusCode::CREATED,
        service.upload_document(&session, &SubjectId(intern_id), upload),
    )
}

pub(crate) async fn checklist_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Path(intern_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    respond(
        StatusCode::OK,
        service.document_checklist(&session, &SubjectId(intern_id)),
    )
}

pub(crate) async fn verify_document_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Path(document_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    respond(
        StatusCode::OK,
        service.verify_document(&session, &DocumentId(document_id)),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectDocumentRequest {
    reason: String,
}

pub(crate) async fn reject_document_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Path(document_id): Path<String>,
    Json(request): Json<RejectDocumentRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    respond(
        StatusCode::OK,
        service.reject_document(&session, &DocumentId(document_id), &request.reason),
    )
}

pub(crate) async fn offers_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Path(intern_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    respond(StatusCode::OK, service.offers(&session, &SubjectId(intern_id)))
}

pub(crate) async fn generate_offer_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Path(intern_id): Path<String>,
    Json(request): Json<OfferRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    respond(
        StatusCode::CREATED,
        service.generate_offer(&session, &SubjectId(intern_id), request),
    )
}

pub(crate) async fn finalize_offer_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Path(offer_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    respond(StatusCode::OK, service.finalize_offer(&session, &OfferId(offer_id)))
}

pub(crate) async fn send_offer_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Path(offer_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    respond(StatusCode::OK, service.send_offer(&session, &OfferId(offer_id)))
}

pub(crate) async fn accept_offer_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Path(offer_id): Path<String>,
    Json(artifact): Json<SignedArtifact>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    respond(
        StatusCode::OK,
        service.accept_offer(&session, &OfferId(offer_id), artifact),
    )
}

pub(crate) async fn reject_offer_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    headers: HeaderMap,
    Path(offer_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = session_or_return!(headers);
    respond(StatusCode::OK, service.reject_offer(&session, &OfferId(offer_id)))
}
