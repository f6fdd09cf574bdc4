use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use validator::Validate;

use crate::core::{AttemptOutcome, ThrottleStatus};
use crate::models::{ErrorResponse, SignInRequest, SignInResponse, ThrottleStatusResponse};
use crate::routes::{validation_failed, AppState};
use crate::services::BackendError;

/// Configure sign-in and throttle routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/auth/sign-in", web::post().to(sign_in))
        .route("/auth/throttle/{client_id}", web::get().to(throttle_status))
        .route("/auth/throttle/{client_id}/reset", web::post().to(reset_throttle));
}

/// Throttled password sign-in
///
/// POST /api/v1/auth/sign-in
///
/// Request body:
/// ```json
/// {
///   "clientId": "browser-session-id",
///   "email": "ana@example.com",
///   "password": "string"
/// }
/// ```
///
/// Responds 429 without contacting the backend while the client is
/// locked, and 423 on the failure that triggers the lock.
async fn sign_in(state: web::Data<AppState>, req: web::Json<SignInRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let SignInRequest {
        client_id,
        email,
        password,
    } = req.into_inner();
    let backend = state.backend.clone();

    let outcome = state
        .throttles
        .attempt(&client_id, Utc::now(), move || async move {
            backend.sign_in_with_password(&email, &password).await
        })
        .await;

    match outcome {
        AttemptOutcome::Succeeded(session) => {
            tracing::info!("Sign-in succeeded for client {}", client_id);
            HttpResponse::Ok().json(SignInResponse {
                success: true,
                access_token: Some(session.access_token),
                user_id: session.user_id,
            })
        }
        AttemptOutcome::Rejected {
            remaining_minutes, ..
        } => {
            tracing::info!("Sign-in rejected for locked client {}", client_id);
            HttpResponse::TooManyRequests()
                .insert_header(("Retry-After", (remaining_minutes * 60).to_string()))
                .json(ErrorResponse::new(
                    "account_locked",
                    format!(
                        "Sign-in is locked for {} minute(s) for your security. Try again later.",
                        remaining_minutes
                    ),
                    429,
                ))
        }
        AttemptOutcome::Failed { error, status } if status.is_locked() => {
            tracing::info!("Client {} locked after failure: {}", client_id, error);
            HttpResponse::build(actix_web::http::StatusCode::LOCKED).json(ErrorResponse::new(
                "account_locked",
                format!(
                    "Too many failed attempts. Sign-in has been locked for {} minutes.",
                    state.throttles.policy().lock_duration.num_minutes()
                ),
                423,
            ))
        }
        AttemptOutcome::Failed {
            error: BackendError::InvalidCredentials(message),
            status,
        } => {
            let message = match status {
                ThrottleStatus::Open {
                    attempts,
                    remaining_attempts,
                } => format!(
                    "{} ({} failed attempt(s), {} left before sign-in is locked)",
                    message, attempts, remaining_attempts
                ),
                ThrottleStatus::Locked { .. } => message,
            };
            HttpResponse::Unauthorized().json(ErrorResponse::new("invalid_credentials", message, 401))
        }
        AttemptOutcome::Failed { error, .. } => {
            tracing::error!("Sign-in failed for client {}: {}", client_id, error);
            HttpResponse::BadGateway().json(ErrorResponse::new("Sign-in failed", error.to_string(), 502))
        }
    }
}

/// Current throttle status, with a live countdown while locked
///
/// GET /api/v1/auth/throttle/{client_id}
async fn throttle_status(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let client_id = path.into_inner();
    let status = state.throttles.status(&client_id, Utc::now()).await;

    HttpResponse::Ok().json(ThrottleStatusResponse { client_id, status })
}

/// Force a client's throttle open
///
/// POST /api/v1/auth/throttle/{client_id}/reset
async fn reset_throttle(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let client_id = path.into_inner();
    state.throttles.reset(&client_id).await;
    let status = state.throttles.status(&client_id, Utc::now()).await;

    HttpResponse::Ok().json(ThrottleStatusResponse { client_id, status })
}
