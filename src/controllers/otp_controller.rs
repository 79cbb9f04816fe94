use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::service::otp_gate::OtpError;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    pub user_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub user_id: String,
    pub otp: String,
}

pub async fn send_otp(
    state: web::Data<AppState>,
    request: web::Json<SendOtpRequest>,
) -> impl Responder {
    let user_id = request.user_id.trim();
    if user_id.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "message": "User ID is required" }));
    }

    match state.gate.issue_code(user_id).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "message": "OTP sent to your email" })),
        Err(err) => error_response(err),
    }
}

pub async fn verify_otp(
    state: web::Data<AppState>,
    request: web::Json<VerifyOtpRequest>,
) -> impl Responder {
    let user_id = request.user_id.trim();
    let otp = request.otp.trim();
    if user_id.is_empty() || otp.is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "message": "User ID and OTP are required" }));
    }

    match state.gate.verify_code(user_id, otp) {
        Ok(()) => HttpResponse::Ok().json(json!({ "message": "OTP verified successfully" })),
        Err(err) => error_response(err),
    }
}

/// Map each gate outcome to its own status and user-facing message.
fn error_response(err: OtpError) -> HttpResponse {
    let status = match &err {
        OtpError::NotFound => StatusCode::NOT_FOUND,
        OtpError::InvalidRecipient
        | OtpError::InvalidFormat
        | OtpError::NotIssued
        | OtpError::Expired
        | OtpError::Mismatch => StatusCode::BAD_REQUEST,
        OtpError::DeliveryFailed(detail) | OtpError::Directory(detail) => {
            error!(%err, %detail, "otp request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    HttpResponse::build(status).json(json!({ "message": err.to_string() }))
}
