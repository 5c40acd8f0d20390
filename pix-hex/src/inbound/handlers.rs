//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use pix_types::{
    AppError, CreateUserRequest, PayPixRequest, PixKeyCodec, PixKeyResponse, PixRepository,
    RequestPixRequest, SignupResponse, UserResponse,
};

use super::auth::AuthenticatedUser;
use crate::PixService;

/// Application state shared across handlers.
pub struct AppState<R: PixRepository, K: PixKeyCodec> {
    pub service: PixService<R, K>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    /// Status code for each error kind.
    ///
    /// Every pix failure answers 401, which is what existing clients of the
    /// payment flow expect.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::SelfPay
            | AppError::InsufficientFunds { .. }
            | AppError::NotFound(_)
            | AppError::InvalidKey
            | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            AppError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Sign up a wallet holder and return their API key.
#[tracing::instrument(skip(state, req), fields(first_name = %req.first_name))]
pub async fn create_user<R: PixRepository, K: PixKeyCodec>(
    State(state): State<Arc<AppState<R, K>>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, api_key) = state.service.create_user(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user: user.into(),
            api_key,
        }),
    ))
}

/// Profile and wallet of the caller.
#[tracing::instrument(skip(state), fields(user_id = %user_id))]
pub async fn me<R: PixRepository, K: PixKeyCodec>(
    State(state): State<Arc<AppState<R, K>>>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.service.get_user(user_id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Open a payment request for the caller.
#[tracing::instrument(skip(state, req), fields(user_id = %user_id, value = req.value))]
pub async fn request_pix<R: PixRepository, K: PixKeyCodec>(
    State(state): State<Arc<AppState<R, K>>>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
    Json(req): Json<RequestPixRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let key = state.service.request(req.value, user_id).await?;
    Ok((StatusCode::CREATED, Json(PixKeyResponse { key })))
}

/// Pay a payment request from the caller's wallet.
#[tracing::instrument(skip(state, req), fields(user_id = %user_id))]
pub async fn pay_pix<R: PixRepository, K: PixKeyCodec>(
    State(state): State<Arc<AppState<R, K>>>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
    Json(req): Json<PayPixRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.service.pay(&req.key, user_id).await?;
    Ok(Json(response))
}

/// Settled pix the caller received or paid, newest first.
#[tracing::instrument(skip(state), fields(user_id = %user_id))]
pub async fn transactions<R: PixRepository, K: PixKeyCodec>(
    State(state): State<Arc<AppState<R, K>>>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, ApiError> {
    let history = state.service.transactions(user_id).await?;
    Ok(Json(history))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pix_errors_answer_401() {
        for err in [
            AppError::SelfPay,
            AppError::InsufficientFunds {
                available: 0,
                requested: 1,
            },
            AppError::NotFound("missing".into()),
            AppError::InvalidKey,
        ] {
            assert_eq!(ApiError(err).status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_other_errors_status() {
        assert_eq!(
            ApiError(AppError::BadRequest("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(AppError::Internal("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
