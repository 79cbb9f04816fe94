use std::path::PathBuf;
use std::sync::Arc;

use crate::service::audio_service::AudioProbe;
use crate::service::otp_gate::OtpGate;
use crate::service::tweet_service::TweetService;

/// Shared application state handed to every request handler.
pub struct AppState {
    pub gate: Arc<OtpGate>,
    pub tweets: TweetService,
    pub probe: Arc<dyn AudioProbe>,
    pub upload_dir: PathBuf,
}
