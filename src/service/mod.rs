pub mod audio_service;
pub mod email_service;
pub mod otp_gate;
pub mod tweet_service;
pub mod user_service;
