pub mod otp;
pub mod tweet;
pub mod user;
