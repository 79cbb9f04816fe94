//! Shared fakes and helpers.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use color_eyre::Result;
use parking_lot::Mutex;

use crate::service::audio_service::AudioProbe;
use crate::service::email_service::OtpDelivery;
use crate::service::otp_gate::{Clock, OtpGate};
use crate::service::user_service::{UserContact, UserDirectory};

/// Clock the tests step forward by hand.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(start),
        })
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// In-memory user directory.
pub struct FakeDirectory {
    users: HashMap<String, UserContact>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
        }
    }

    pub fn with_user(mut self, identity: &str, name: &str, email: Option<&str>) -> Self {
        self.users.insert(
            identity.to_string(),
            UserContact {
                name: name.to_string(),
                email: email.map(str::to_string),
            },
        );
        self
    }
}

#[async_trait]
impl UserDirectory for FakeDirectory {
    async fn lookup(&self, identity: &str) -> Result<Option<UserContact>> {
        Ok(self.users.get(identity).cloned())
    }
}

/// Recording delivery channel. Codes are captured even in failing mode so
/// tests can exercise the store-then-deliver ordering.
pub struct FakeDelivery {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

impl FakeDelivery {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        })
    }

    pub fn last_code(&self) -> String {
        self.sent
            .lock()
            .last()
            .map(|(_, code)| code.clone())
            .expect("no code delivered")
    }
}

#[async_trait]
impl OtpDelivery for FakeDelivery {
    async fn send_code(&self, to: &str, _name: &str, code: &str) -> Result<()> {
        self.sent.lock().push((to.to_string(), code.to_string()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(eyre::eyre!("smtp unavailable"));
        }
        Ok(())
    }
}

/// Probe reporting a fixed duration.
pub struct FixedProbe(pub f64);

#[async_trait]
impl AudioProbe for FixedProbe {
    async fn duration_seconds(&self, _path: &Path) -> Result<f64> {
        Ok(self.0)
    }
}

/// Probe that always fails.
pub struct FailingProbe;

#[async_trait]
impl AudioProbe for FailingProbe {
    async fn duration_seconds(&self, _path: &Path) -> Result<f64> {
        Err(eyre::eyre!("ffprobe not available"))
    }
}

pub struct GateHarness {
    pub gate: Arc<OtpGate>,
    pub clock: Arc<ManualClock>,
    pub delivery: Arc<FakeDelivery>,
}

/// Gate wired to fakes, with every listed identity known to the directory.
pub fn gate_with_users(users: &[(&str, Option<&str>)]) -> GateHarness {
    let clock = ManualClock::new(Utc::now());
    let delivery = FakeDelivery::new();
    let mut directory = FakeDirectory::new();
    for (identity, email) in users {
        directory = directory.with_user(identity, "Test User", *email);
    }
    let gate = Arc::new(OtpGate::with_clock(
        Arc::new(directory),
        Arc::clone(&delivery) as Arc<dyn OtpDelivery>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    ));
    GateHarness {
        gate,
        clock,
        delivery,
    }
}

pub fn gate_with_user(identity: &str, email: Option<&str>) -> GateHarness {
    gate_with_users(&[(identity, email)])
}

pub const MULTIPART_BOUNDARY: &str = "----chirp-test-boundary";

/// A multipart/form-data body shaped like the client's upload request.
pub fn multipart_body(user_id: &str, description: &str, content_type: &str) -> Vec<u8> {
    let b = MULTIPART_BOUNDARY;
    format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"userId\"\r\n\r\n\
         {user_id}\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"description\"\r\n\r\n\
         {description}\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"audio\"; filename=\"clip.mp3\"\r\n\
         Content-Type: {content_type}\r\n\r\n\
         fake-audio-bytes\r\n\
         --{b}--\r\n"
    )
    .into_bytes()
}
