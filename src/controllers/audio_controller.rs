use std::path::Path;

use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use tracing::{error, warn};
use uuid::Uuid;

use crate::service::audio_service::{ALLOWED_AUDIO_TYPES, MAX_AUDIO_BYTES, MAX_AUDIO_SECONDS};
use crate::state::AppState;

#[derive(MultipartForm)]
pub struct AudioUploadForm {
    #[multipart(rename = "userId")]
    pub user_id: Text<String>,
    pub description: Text<String>,
    #[multipart(limit = "200MB")]
    pub audio: TempFile,
}

pub async fn upload_audio_tweet(
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<AudioUploadForm>,
) -> impl Responder {
    let user_id = form.user_id.trim().to_string();
    if user_id.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "message": "User ID is required" }));
    }
    let description = form.description.trim().to_string();
    if description.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "message": "Description is required" }));
    }

    // Admission check comes before any validation of the payload itself.
    if !state.gate.is_authorized(&user_id) {
        return HttpResponse::Forbidden().json(json!({
            "message": "OTP verification required. Please verify your OTP first."
        }));
    }

    let Ok(user_id) = Uuid::parse_str(&user_id) else {
        return HttpResponse::BadRequest().json(json!({ "message": "Invalid user ID" }));
    };

    let content_type = form
        .audio
        .content_type
        .as_ref()
        .map(|mime| mime.essence_str().to_owned())
        .unwrap_or_default();
    if !ALLOWED_AUDIO_TYPES.contains(&content_type.as_str()) {
        return HttpResponse::BadRequest().json(json!({
            "message": "Invalid file type. Only audio files are allowed."
        }));
    }

    if form.audio.size > MAX_AUDIO_BYTES {
        return HttpResponse::BadRequest()
            .json(json!({ "message": "Audio file size exceeds 100 MB limit" }));
    }

    let extension = form
        .audio
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    let file_name = format!("audio-{}{}", Uuid::new_v4(), extension);
    let dest = state.upload_dir.join(&file_name);

    if let Err(err) = tokio::fs::create_dir_all(&state.upload_dir).await {
        error!(%err, "failed to create upload directory");
        return HttpResponse::InternalServerError()
            .json(json!({ "message": "Failed to store audio file" }));
    }
    if let Err(err) = tokio::fs::copy(form.audio.file.path(), &dest).await {
        error!(%err, "failed to store audio file");
        return HttpResponse::InternalServerError()
            .json(json!({ "message": "Failed to store audio file" }));
    }

    let duration = match state.probe.duration_seconds(&dest).await {
        Ok(duration) => duration,
        Err(err) => {
            warn!(%err, "audio probe failed");
            remove_uploaded(&dest).await;
            return HttpResponse::BadRequest()
                .json(json!({ "message": "Failed to process audio file" }));
        }
    };
    if duration > MAX_AUDIO_SECONDS {
        remove_uploaded(&dest).await;
        return HttpResponse::BadRequest()
            .json(json!({ "message": "Audio duration exceeds 5 minutes limit" }));
    }

    let audio_url = format!("/uploads/audio/{file_name}");
    match state
        .tweets
        .create_audio_tweet(&user_id, &description, &audio_url, duration.round() as i32)
        .await
    {
        Ok(tweet) => HttpResponse::Ok().json(tweet),
        Err(err) => {
            error!(%err, "failed to save audio tweet");
            remove_uploaded(&dest).await;
            HttpResponse::InternalServerError()
                .json(json!({ "message": "Failed to save audio tweet" }))
        }
    }
}

async fn remove_uploaded(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        warn!(%err, path = %path.display(), "failed to remove uploaded file");
    }
}
