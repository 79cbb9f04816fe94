pub mod audio_controller;
pub mod otp_controller;
