// handler/jobs.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{jobdtos::*, ApiResponse},
    error::{ErrorMessage, HttpError},
    middleware::{auth, JWTAuthMiddleware},
    models::{jobmodel::*, usermodel::UserRole},
    AppState,
};

pub fn jobs_handler() -> Router {
    // Listings stay public; everything that mutates requires auth.
    let public_routes = Router::new()
        .route("/open", get(list_open_jobs))
        .route("/search", get(search_jobs))
        .route("/category", get(list_by_category))
        .route("/:job_id", get(get_job_details));

    let protected_routes = Router::new()
        .route("/", post(create_job))
        .route("/my-jobs", get(get_my_jobs))
        .route("/:job_id", put(update_job).delete(delete_job))
        .route("/:job_id/status", put(update_job_status))
        .route("/:job_id/proposals", post(submit_proposal).get(get_job_proposals))
        .route("/proposals/my", get(get_my_proposals))
        .route("/proposals/:proposal_id/accept", post(accept_proposal))
        .layer(middleware::from_fn(auth));

    Router::new().merge(public_routes).merge(protected_routes)
}

fn require_role(auth: &JWTAuthMiddleware, role: UserRole) -> Result<(), HttpError> {
    if auth.user.role != role {
        return Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }
    Ok(())
}

// Job handlers

pub async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Json(body): Json<CreateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, UserRole::Client)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state
        .job_service
        .create_job(auth.user.id, body)
        .await
        .map_err(HttpError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Job created successfully", job)),
    ))
}

pub async fn get_job_details(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.get_job(job_id).await?;

    Ok(Json(ApiResponse::success("Job retrieved successfully", job)))
}

pub async fn update_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<UpdateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state
        .job_service
        .update_job(job_id, auth.user.id, body)
        .await?;

    Ok(Json(ApiResponse::success("Job updated successfully", job)))
}

pub async fn update_job_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<UpdateJobStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, UserRole::Client)?;

    let new_status =
        JobStatus::parse(&body.status).map_err(HttpError::bad_request)?;

    let job = app_state
        .job_service
        .update_job_status(job_id, auth.user.id, new_status)
        .await?;

    Ok(Json(ApiResponse::success(
        "Job status updated successfully",
        job,
    )))
}

pub async fn delete_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .job_service
        .delete_job(job_id, auth.user.id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_open_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.job_service.list_open_jobs().await?;

    Ok(Json(ApiResponse::success(
        "Open jobs retrieved successfully",
        jobs,
    )))
}

pub async fn list_by_category(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<ListByCategoryQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let category = JobCategory::parse(&query.category).map_err(HttpError::bad_request)?;

    let jobs = app_state.job_service.list_by_category(category).await?;

    Ok(Json(ApiResponse::success(
        "Jobs retrieved successfully",
        jobs,
    )))
}

pub async fn search_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<SearchJobsQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let category = match &query.category {
        Some(raw) if !raw.trim().is_empty() => {
            Some(JobCategory::parse(raw).map_err(HttpError::bad_request)?)
        }
        _ => None,
    };

    let jobs = app_state
        .job_service
        .search(query.keyword.as_deref(), category)
        .await?;

    Ok(Json(ApiResponse::success(
        "Search results retrieved successfully",
        jobs,
    )))
}

pub async fn get_my_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.listing_service.my_jobs(&auth.user).await?;

    Ok(Json(ApiResponse::success(
        "Jobs retrieved successfully",
        jobs,
    )))
}

// Proposal handlers

pub async fn submit_proposal(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<SubmitProposalDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, UserRole::Student)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let proposal = app_state
        .proposal_service
        .submit_proposal(job_id, auth.user.id, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Proposal submitted successfully",
            proposal,
        )),
    ))
}

pub async fn get_job_proposals(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let proposals = app_state.proposal_service.list_for_job(job_id).await?;

    Ok(Json(ApiResponse::success(
        "Proposals retrieved successfully",
        proposals,
    )))
}

pub async fn get_my_proposals(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let proposals = app_state
        .proposal_service
        .list_by_student(auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Proposals retrieved successfully",
        proposals,
    )))
}

pub async fn accept_proposal(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(proposal_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, UserRole::Client)?;

    let job = app_state
        .proposal_service
        .accept_proposal(proposal_id, &auth.user.email)
        .await?;

    Ok(Json(ApiResponse::success(
        "Proposal accepted successfully",
        job,
    )))
}
