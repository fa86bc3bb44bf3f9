use std::sync::Arc;

use axum::{
    extract::Query,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::userdb::UserExt,
    dtos::{userdtos::*, ApiResponse},
    error::{ErrorMessage, HttpError},
    mail::mails,
    models::usermodel::UserRole,
    utils::{password, token},
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/verify", get(verify_email))
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let role = match body.role.trim().to_lowercase().as_str() {
        "client" => UserRole::Client,
        "student" => UserRole::Student,
        other => {
            return Err(HttpError::bad_request(format!(
                "Unknown role: '{}'. Supported values: client, student",
                other
            )))
        }
    };

    if app_state.db_client.email_exists(&body.email).await
        .map_err(|e| HttpError::server_error(e.to_string()))?
    {
        return Err(HttpError::conflict(ErrorMessage::EmailExist.to_string()));
    }

    let hashed_password =
        password::hash(&body.password).map_err(|e| HttpError::server_error(e.to_string()))?;

    let verification_token = Uuid::new_v4().to_string();

    let user = app_state
        .db_client
        .save_user(
            body.name.clone(),
            body.email.clone(),
            hashed_password,
            role,
            verification_token.clone(),
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    // Best-effort: a failed verification email never fails registration.
    if let Err(e) = mails::send_verification_email(
        app_state.mailer.as_ref(),
        &user.email,
        &user.name,
        &verification_token,
        &app_state.env.app_url,
    )
    .await
    {
        tracing::warn!("Verification email failed for {}: {}", user.email, e);
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Registration successful, please verify your email",
            FilterUserDto::filter_user(&user),
        )),
    ))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .get_user(None, Some(&body.email), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    let stored_password = user
        .password
        .as_deref()
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    let password_matched = password::compare(&body.password, stored_password)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        return Err(HttpError::unauthorized(
            ErrorMessage::WrongCredentials.to_string(),
        ));
    }

    let token = token::create_token(
        &user.id,
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage * 60,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let cookie_duration = time::Duration::minutes(app_state.env.jwt_maxage);
    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .max_age(cookie_duration)
        .http_only(true)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error("Failed to build cookie"))?,
    );

    let response = Json(UserLoginResponseDto {
        status: "success".to_string(),
        token,
        user: FilterUserDto::filter_user(&user),
    });

    Ok((headers, response))
}

pub async fn verify_email(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .mark_user_verified(&query.token)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Verification token is invalid or already used"))?;

    Ok(Json(ApiResponse::success(
        "Email verified successfully",
        FilterUserDto::filter_user(&user),
    )))
}
