use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{ApplicationDraft, ApplicationId, DocumentId, StudentId};
use super::lifecycle::StatusChange;
use super::repository::{
    ApplicationRepository, ApplicationStatusView, DocumentRepository, NoticePublisher,
    RepositoryError,
};
use super::service::{
    ApplicationServiceError, DocumentUpload, ScholarshipApplicationService, VerificationDecision,
};

type SharedService<R, D, N> = Arc<ScholarshipApplicationService<R, D, N>>;

/// Router builder exposing the applicant and staff endpoints.
pub fn application_router<R, D, N>(service: SharedService<R, D, N>) -> Router
where
    R: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
    N: NoticePublisher + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(create_handler::<R, D, N>))
        .route(
            "/api/v1/applications/:application_id",
            get(get_handler::<R, D, N>).put(update_handler::<R, D, N>),
        )
        .route(
            "/api/v1/students/:student_id/applications",
            get(list_handler::<R, D, N>),
        )
        .route(
            "/api/v1/applications/:application_id/checklist",
            get(checklist_handler::<R, D, N>),
        )
        .route(
            "/api/v1/applications/:application_id/submit",
            post(submit_handler::<R, D, N>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            post(status_handler::<R, D, N>),
        )
        .route(
            "/api/v1/applications/:application_id/documents",
            get(documents_handler::<R, D, N>).post(upload_handler::<R, D, N>),
        )
        .route(
            "/api/v1/documents/:document_id/verification",
            post(verification_handler::<R, D, N>),
        )
        .route("/api/v1/document-types", get(document_types_handler::<R, D, N>))
        .with_state(service)
}

pub(crate) async fn create_handler<R, D, N>(
    State(service): State<SharedService<R, D, N>>,
    axum::Json(draft): axum::Json<ApplicationDraft>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
    N: NoticePublisher + 'static,
{
    match service.create_draft(draft) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<R, D, N>(
    State(service): State<SharedService<R, D, N>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
    N: NoticePublisher + 'static,
{
    match service.get(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<R, D, N>(
    State(service): State<SharedService<R, D, N>>,
    Path(application_id): Path<String>,
    axum::Json(draft): axum::Json<ApplicationDraft>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
    N: NoticePublisher + 'static,
{
    match service.update_draft(&ApplicationId(application_id), draft) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R, D, N>(
    State(service): State<SharedService<R, D, N>>,
    Path(student_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
    N: NoticePublisher + 'static,
{
    match service.list_applications(&StudentId(student_id)) {
        Ok(records) => {
            let views: Vec<ApplicationStatusView> =
                records.iter().map(|record| record.status_view()).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn checklist_handler<R, D, N>(
    State(service): State<SharedService<R, D, N>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
    N: NoticePublisher + 'static,
{
    match service.checklist(&ApplicationId(application_id)) {
        Ok(checklist) => (StatusCode::OK, axum::Json(checklist)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R, D, N>(
    State(service): State<SharedService<R, D, N>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
    N: NoticePublisher + 'static,
{
    match service.submit(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, D, N>(
    State(service): State<SharedService<R, D, N>>,
    Path(application_id): Path<String>,
    axum::Json(change): axum::Json<StatusChange>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
    N: NoticePublisher + 'static,
{
    match service.advance(&ApplicationId(application_id), change) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn documents_handler<R, D, N>(
    State(service): State<SharedService<R, D, N>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
    N: NoticePublisher + 'static,
{
    match service.documents(&ApplicationId(application_id)) {
        Ok(documents) => (StatusCode::OK, axum::Json(documents)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn upload_handler<R, D, N>(
    State(service): State<SharedService<R, D, N>>,
    Path(application_id): Path<String>,
    axum::Json(upload): axum::Json<DocumentUpload>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
    N: NoticePublisher + 'static,
{
    match service.upload_document(&ApplicationId(application_id), upload) {
        Ok(document) => (StatusCode::CREATED, axum::Json(document)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn verification_handler<R, D, N>(
    State(service): State<SharedService<R, D, N>>,
    Path(document_id): Path<u64>,
    axum::Json(decision): axum::Json<VerificationDecision>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
    N: NoticePublisher + 'static,
{
    match service.verify_document(DocumentId(document_id), decision) {
        Ok(document) => (StatusCode::OK, axum::Json(document)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn document_types_handler<R, D, N>(
    State(service): State<SharedService<R, D, N>>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
    N: NoticePublisher + 'static,
{
    match service.required_types() {
        Ok(types) => (StatusCode::OK, axum::Json(types)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: ApplicationServiceError) -> Response {
    let status = match &error {
        ApplicationServiceError::Intake(_) | ApplicationServiceError::Upload(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ApplicationServiceError::Submission(_) | ApplicationServiceError::Transition(_) => {
            StatusCode::CONFLICT
        }
        ApplicationServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ApplicationServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ApplicationServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
