use actix_web::web;

use crate::controllers::{audio_controller, otp_controller};

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/otp/send", web::post().to(otp_controller::send_otp))
        .route("/api/otp/verify", web::post().to(otp_controller::verify_otp))
        .route(
            "/api/audio/upload",
            web::post().to(audio_controller::upload_audio_tweet),
        );
}
