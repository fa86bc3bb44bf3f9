// handler/payments.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{paymentdtos::*, ApiResponse},
    error::{ErrorMessage, HttpError},
    middleware::{auth, JWTAuthMiddleware},
    models::usermodel::UserRole,
    AppState,
};

pub fn payments_handler() -> Router {
    let public_routes = Router::new().route("/process-mock", post(process_mock_payment));

    let protected_routes = Router::new()
        .route("/escrow", post(create_escrow_payment))
        .route("/:payment_id/release", post(release_payment))
        .route("/:payment_id/refund", post(refund_payment))
        .route("/job/:job_id", get(get_job_payment))
        .layer(middleware::from_fn(auth));

    Router::new().merge(public_routes).merge(protected_routes)
}

pub async fn create_escrow_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Json(body): Json<CreateEscrowDto>,
) -> Result<impl IntoResponse, HttpError> {
    if auth.user.role != UserRole::Client {
        return Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let payment = app_state
        .payment_service
        .create_escrow_payment(body.job_id, body.amount, &body.method)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Escrow payment created successfully",
            payment,
        )),
    ))
}

pub async fn release_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    if auth.user.role != UserRole::Client {
        return Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let payment = app_state
        .payment_service
        .release_payment(payment_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Payment released successfully",
        payment,
    )))
}

pub async fn refund_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    if auth.user.role != UserRole::Client {
        return Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let payment = app_state
        .payment_service
        .refund_payment(payment_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Payment refunded successfully",
        payment,
    )))
}

pub async fn get_job_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let payment = app_state.payment_service.get_payment_for_job(job_id).await?;

    Ok(Json(ApiResponse::success(
        "Payment retrieved successfully",
        payment,
    )))
}

pub async fn process_mock_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ProcessMockPaymentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let success = app_state
        .payment_service
        .process_mock_payment(&body.method, &body.account_details, body.amount)
        .await?;

    Ok(Json(ApiResponse::success(
        "Mock payment processed",
        MockPaymentResultDto { success },
    )))
}
