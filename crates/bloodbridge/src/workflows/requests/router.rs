use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::session::{Session, SessionError};
use crate::workflows::donors::{DonorSearchQuery, RequestCriteria};

use super::domain::{DonationRequest, DonationRequestForm, DonationRequestId, DonationStatus};
use super::repository::{DonationRequestRepository, DonorDirectory, RepositoryError};
use super::service::{DonationRequestService, DonationRequestServiceError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusUpdate {
    pub(crate) donation_status: DonationStatus,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusFilter {
    #[serde(default)]
    pub(crate) status: Option<DonationStatus>,
}

/// Router builder exposing donor suggestion, search and request lifecycle endpoints.
pub fn donation_router<D, R>(service: Arc<DonationRequestService<D, R>>) -> Router
where
    D: DonorDirectory + 'static,
    R: DonationRequestRepository + 'static,
{
    Router::new()
        .route("/api/v1/donors/suggestions", post(suggestions_handler::<D, R>))
        .route("/api/v1/donors/search", get(search_handler::<D, R>))
        .route(
            "/api/v1/donation-requests",
            post(submit_handler::<D, R>).get(list_all_handler::<D, R>),
        )
        .route(
            "/api/v1/me/donation-requests",
            get(my_requests_handler::<D, R>),
        )
        .route(
            "/api/v1/public/donation-requests",
            get(pending_requests_handler::<D, R>),
        )
        .route(
            "/api/v1/donation-requests/:request_id",
            get(request_handler::<D, R>).put(edit_handler::<D, R>),
        )
        .route(
            "/api/v1/donation-requests/:request_id/status",
            patch(status_handler::<D, R>),
        )
        .route(
            "/api/v1/donation-requests/:request_id/accept",
            post(accept_handler::<D, R>),
        )
        .with_state(service)
}

pub(crate) async fn suggestions_handler<D, R>(
    State(service): State<Arc<DonationRequestService<D, R>>>,
    axum::Json(criteria): axum::Json<RequestCriteria>,
) -> Response
where
    D: DonorDirectory + 'static,
    R: DonationRequestRepository + 'static,
{
    let suggestions = service.suggest(&criteria, Utc::now());
    (StatusCode::OK, axum::Json(json!({ "suggestions": suggestions }))).into_response()
}

pub(crate) async fn search_handler<D, R>(
    State(service): State<Arc<DonationRequestService<D, R>>>,
    Query(query): Query<DonorSearchQuery>,
) -> Response
where
    D: DonorDirectory + 'static,
    R: DonationRequestRepository + 'static,
{
    match service.search(&query) {
        Ok(donors) => (
            StatusCode::OK,
            axum::Json(json!({ "count": donors.len(), "donors": donors })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<D, R>(
    State(service): State<Arc<DonationRequestService<D, R>>>,
    headers: HeaderMap,
    axum::Json(form): axum::Json<DonationRequestForm>,
) -> Response
where
    D: DonorDirectory + 'static,
    R: DonationRequestRepository + 'static,
{
    let session = Session::from_headers(&headers);
    match service.submit(&session, form, Utc::now()) {
        Ok(request) => (StatusCode::CREATED, axum::Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn request_handler<D, R>(
    State(service): State<Arc<DonationRequestService<D, R>>>,
    Path(request_id): Path<String>,
) -> Response
where
    D: DonorDirectory + 'static,
    R: DonationRequestRepository + 'static,
{
    match service.get(&DonationRequestId(request_id)) {
        Ok(request) => (StatusCode::OK, axum::Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn my_requests_handler<D, R>(
    State(service): State<Arc<DonationRequestService<D, R>>>,
    headers: HeaderMap,
    Query(filter): Query<StatusFilter>,
) -> Response
where
    D: DonorDirectory + 'static,
    R: DonationRequestRepository + 'static,
{
    let session = Session::from_headers(&headers);
    list_response(service.my_requests(&session, filter.status))
}

pub(crate) async fn pending_requests_handler<D, R>(
    State(service): State<Arc<DonationRequestService<D, R>>>,
) -> Response
where
    D: DonorDirectory + 'static,
    R: DonationRequestRepository + 'static,
{
    list_response(service.pending_requests())
}

pub(crate) async fn list_all_handler<D, R>(
    State(service): State<Arc<DonationRequestService<D, R>>>,
    headers: HeaderMap,
    Query(filter): Query<StatusFilter>,
) -> Response
where
    D: DonorDirectory + 'static,
    R: DonationRequestRepository + 'static,
{
    let session = Session::from_headers(&headers);
    list_response(service.list_all(&session, filter.status))
}

pub(crate) async fn edit_handler<D, R>(
    State(service): State<Arc<DonationRequestService<D, R>>>,
    Path(request_id): Path<String>,
    headers: HeaderMap,
    axum::Json(form): axum::Json<DonationRequestForm>,
) -> Response
where
    D: DonorDirectory + 'static,
    R: DonationRequestRepository + 'static,
{
    let session = Session::from_headers(&headers);
    match service.edit(&DonationRequestId(request_id), &session, form) {
        Ok(request) => (StatusCode::OK, axum::Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<D, R>(
    State(service): State<Arc<DonationRequestService<D, R>>>,
    Path(request_id): Path<String>,
    headers: HeaderMap,
    axum::Json(update): axum::Json<StatusUpdate>,
) -> Response
where
    D: DonorDirectory + 'static,
    R: DonationRequestRepository + 'static,
{
    let session = Session::from_headers(&headers);
    match service.update_status(
        &DonationRequestId(request_id),
        update.donation_status,
        &session,
    ) {
        Ok(request) => (StatusCode::OK, axum::Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn accept_handler<D, R>(
    State(service): State<Arc<DonationRequestService<D, R>>>,
    Path(request_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    D: DonorDirectory + 'static,
    R: DonationRequestRepository + 'static,
{
    let session = Session::from_headers(&headers);
    match service.accept(&DonationRequestId(request_id), &session, Utc::now()) {
        Ok(request) => (StatusCode::OK, axum::Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

fn list_response(
    result: Result<Vec<DonationRequest>, DonationRequestServiceError>,
) -> Response {
    match result {
        Ok(requests) => (
            StatusCode::OK,
            axum::Json(json!({ "count": requests.len(), "requests": requests })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

impl DonationRequestServiceError {
    /// HTTP status reported for this error by the router and by `AppError`.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Session(SessionError::Anonymous) => StatusCode::UNAUTHORIZED,
            Self::Session(SessionError::Blocked { .. })
            | Self::NotADonor
            | Self::OwnRequest
            | Self::NotPermitted => StatusCode::FORBIDDEN,
            Self::Session(SessionError::Loading) | Self::Directory(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Repository(RepositoryError::Conflict)
            | Self::Repository(RepositoryError::Stale { .. })
            | Self::InvalidTransition { .. }
            | Self::NotEditable { .. } => StatusCode::CONFLICT,
            Self::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn error_response(error: DonationRequestServiceError) -> Response {
    let payload = json!({ "error": error.to_string() });
    (error.status_code(), axum::Json(payload)).into_response()
}
