use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use color_eyre::Result;
use eyre::WrapErr;
use serde::Deserialize;
use tokio::process::Command;

/// MIME types accepted for audio tweets.
pub const ALLOWED_AUDIO_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/ogg",
    "audio/webm",
    "audio/m4a",
    "audio/aac",
];

/// Maximum payload size: 100 MiB.
pub const MAX_AUDIO_BYTES: usize = 100 * 1024 * 1024;

/// Maximum duration: 5 minutes.
pub const MAX_AUDIO_SECONDS: f64 = 300.0;

/// Measures the duration of an audio file on disk.
#[async_trait]
pub trait AudioProbe: Send + Sync {
    async fn duration_seconds(&self, path: &Path) -> Result<f64>;
}

/// Probe backed by the `ffprobe` binary.
pub struct FfprobeAudioProbe;

#[derive(Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

fn parse_duration(stdout: &[u8]) -> Result<f64> {
    let probe: ProbeOutput =
        serde_json::from_slice(stdout).wrap_err("Parsing ffprobe output")?;
    probe
        .format
        .duration
        .as_deref()
        .and_then(|raw| raw.parse::<f64>().ok())
        .ok_or_else(|| eyre::eyre!("Could not determine audio duration"))
}

#[async_trait]
impl AudioProbe for FfprobeAudioProbe {
    async fn duration_seconds(&self, path: &Path) -> Result<f64> {
        let output = Command::new("ffprobe")
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "json"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .wrap_err("Spawning ffprobe")?;

        if !output.status.success() {
            return Err(eyre::eyre!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        parse_duration(&output.stdout)
    }
}
