//! HTTP API over the transfer workflow
//!
//! Thin axum layer: resolve the acting user against the directory, call
//! the workflow, render `TransferError` as `{ code, message }` with its
//! suggested HTTP status. The GUI itself lives elsewhere; this is its
//! backend surface.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::core_types::{ContigId, ProjectId, RequestId};

use super::error::TransferError;
use super::status::RequestStatus;
use super::types::{ContigTransferRequest, Person, Project};
use super::workflow::TransferWorkflow;

/// Shared application state
pub struct AppState {
    pub workflow: TransferWorkflow,
}

pub fn transfer_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/requests", post(create_request))
        .route("/api/v1/requests/{id}", get(get_request))
        .route("/api/v1/requests/{id}/review", post(review_request))
        .route("/api/v1/requests/{id}/execute", post(execute_request))
        .route("/api/v1/requests/{id}/cancel", post(cancel_request))
        .route("/api/v1/requests/{id}/permissions", get(request_permissions))
        .route("/api/v1/projects/{id}/requests", get(project_requests))
        .route("/api/v1/projects/{id}/lock", post(lock_project))
        .route("/api/v1/projects/{id}/unlock", post(unlock_project))
        .route("/api/v1/users/{username}/requests", get(user_requests))
        .layer(Extension(state))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

fn error_response(e: TransferError) -> Response {
    let status =
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorBody {
            code: e.code(),
            message: e.to_string(),
        }),
    )
        .into_response()
}

async fn resolve_person(state: &AppState, username: &str) -> Result<Person, TransferError> {
    state
        .workflow
        .store()
        .person(username)
        .await?
        .ok_or_else(|| TransferError::UnknownUser(username.to_string()))
}

// === Requests ===

#[derive(Debug, Deserialize)]
struct CreateRequestBody {
    user: String,
    contig_id: ContigId,
    new_project_id: ProjectId,
    #[serde(default)]
    comment: Option<String>,
}

async fn create_request(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<CreateRequestBody>,
) -> Response {
    let requester = match resolve_person(&state, &body.user).await {
        Ok(p) => p,
        Err(e) => return error_response(e),
    };

    match state
        .workflow
        .create(&requester, body.contig_id, body.new_project_id, body.comment)
        .await
    {
        Ok(request) => (StatusCode::CREATED, Json(request)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_request(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<RequestId>,
) -> Response {
    match state.workflow.store().request(id).await {
        Ok(Some(request)) => Json(request).into_response(),
        Ok(None) => error_response(TransferError::NoSuchRequest(id)),
        Err(e) => error_response(e),
    }
}

/// Requested review outcome; DONE is reachable only through execute.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
enum ReviewAction {
    Approved,
    Refused,
    Cancelled,
}

impl From<ReviewAction> for RequestStatus {
    fn from(action: ReviewAction) -> Self {
        match action {
            ReviewAction::Approved => RequestStatus::Approved,
            ReviewAction::Refused => RequestStatus::Refused,
            ReviewAction::Cancelled => RequestStatus::Cancelled,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReviewBody {
    user: String,
    status: ReviewAction,
    #[serde(default)]
    comment: Option<String>,
}

async fn review_request(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<RequestId>,
    Json(body): Json<ReviewBody>,
) -> Response {
    let reviewer = match resolve_person(&state, &body.user).await {
        Ok(p) => p,
        Err(e) => return error_response(e),
    };

    match state
        .workflow
        .review(id, &reviewer, body.status.into(), body.comment)
        .await
    {
        Ok(request) => Json(request).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct ActorBody {
    user: String,
}

async fn execute_request(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<RequestId>,
    Json(body): Json<ActorBody>,
) -> Response {
    let executor = match resolve_person(&state, &body.user).await {
        Ok(p) => p,
        Err(e) => return error_response(e),
    };

    match state.workflow.execute(id, &executor).await {
        Ok(request) => Json(request).into_response(),
        Err(e) => error_response(e),
    }
}

async fn cancel_request(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<RequestId>,
    Json(body): Json<ActorBody>,
) -> Response {
    let actor = match resolve_person(&state, &body.user).await {
        Ok(p) => p,
        Err(e) => return error_response(e),
    };

    match state.workflow.cancel(id, &actor).await {
        Ok(request) => Json(request).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    user: String,
}

#[derive(Debug, Serialize)]
struct Permissions {
    can_approve: bool,
    can_refuse: bool,
    can_execute: bool,
    can_cancel: bool,
}

/// Advisory checks mirroring the enforced policy, for UI affordances.
async fn request_permissions(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<RequestId>,
    Query(query): Query<UserQuery>,
) -> Response {
    let person = match resolve_person(&state, &query.user).await {
        Ok(p) => p,
        Err(e) => return error_response(e),
    };

    let workflow = &state.workflow;
    let result = async {
        Ok::<_, TransferError>(Permissions {
            can_approve: workflow.can_approve(id, &person).await?,
            can_refuse: workflow.can_refuse(id, &person).await?,
            can_execute: workflow.can_execute(id, &person).await?,
            can_cancel: workflow.can_cancel(id, &person).await?,
        })
    }
    .await;

    match result {
        Ok(permissions) => Json(permissions).into_response(),
        Err(e) => error_response(e),
    }
}

// === Listings ===

#[derive(Debug, Serialize)]
struct RequestList {
    requests: Vec<ContigTransferRequest>,
}

async fn project_requests(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<ProjectId>,
) -> Response {
    match state.workflow.store().requests_for_project(id).await {
        Ok(requests) => Json(RequestList { requests }).into_response(),
        Err(e) => error_response(e),
    }
}

async fn user_requests(
    Extension(state): Extension<Arc<AppState>>,
    Path(username): Path<String>,
) -> Response {
    match state.workflow.store().requests_for_user(&username).await {
        Ok(requests) => Json(RequestList { requests }).into_response(),
        Err(e) => error_response(e),
    }
}

// === Locks ===

#[derive(Debug, Deserialize)]
struct LockBody {
    user: String,
    /// Assign the project's declared owner as holder instead of `user`
    #[serde(default)]
    for_owner: bool,
}

fn project_response(project: Project) -> Response {
    Json(project).into_response()
}

async fn lock_project(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<ProjectId>,
    Json(body): Json<LockBody>,
) -> Response {
    let actor = match resolve_person(&state, &body.user).await {
        Ok(p) => p,
        Err(e) => return error_response(e),
    };

    let locks = state.workflow.locks();
    let result = if body.for_owner {
        locks.lock_for_owner(id, &actor).await
    } else {
        locks.lock(id, &actor).await
    };

    match result {
        Ok(project) => project_response(project),
        Err(e) => error_response(e),
    }
}

async fn unlock_project(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<ProjectId>,
    Json(body): Json<ActorBody>,
) -> Response {
    let actor = match resolve_person(&state, &body.user).await {
        Ok(p) => p,
        Err(e) => return error_response(e),
    };

    match state.workflow.locks().unlock(id, &actor).await {
        Ok(project) => project_response(project),
        Err(e) => error_response(e),
    }
}
