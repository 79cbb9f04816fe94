mod config;
mod controllers;
mod models;
mod service;
mod state;
#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actix_multipart::form::MultipartFormConfig;
use actix_web::{middleware::Logger, web, App, HttpServer};
use color_eyre::Result;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::config::Config;
use crate::config::routes;
use crate::service::audio_service::FfprobeAudioProbe;
use crate::service::email_service::EmailService;
use crate::service::otp_gate::OtpGate;
use crate::service::tweet_service::TweetService;
use crate::service::user_service::PgUserDirectory;
use crate::state::AppState;

/// How often the gate sweeps expired OTP records.
const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Multipart budget: the 100 MiB audio file plus form fields and overhead.
const MULTIPART_TOTAL_LIMIT: usize = 110 * 1024 * 1024;

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let pool = config.db_pool().await?;

    let email = EmailService::new(
        &config.smtp_host,
        &config.smtp_user,
        &config.smtp_pass,
        &config.platform_name,
        &config.otp_template_path,
    )?;
    let directory = PgUserDirectory::new(pool.clone());
    let gate = Arc::new(OtpGate::new(Arc::new(directory), Arc::new(email)));

    let cancel = CancellationToken::new();
    let sweeper = Arc::clone(&gate).spawn_sweeper(SWEEP_INTERVAL, cancel.clone());

    let app_state = web::Data::new(AppState {
        gate: Arc::clone(&gate),
        tweets: TweetService::new(pool.clone()),
        probe: Arc::new(FfprobeAudioProbe),
        upload_dir: PathBuf::from(&config.upload_dir),
    });

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .app_data(MultipartFormConfig::default().total_limit(MULTIPART_TOTAL_LIMIT))
            .configure(routes::routes)
    })
    .bind(format!("{}:{}", config.host, config.port))?
    .run()
    .await?;

    cancel.cancel();
    if let Err(err) = sweeper.await {
        warn!(%err, "otp sweeper did not shut down cleanly");
    }

    Ok(())
}
