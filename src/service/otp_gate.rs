use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rand::Rng;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::models::otp::OtpRecord;
use crate::service::email_service::OtpDelivery;
use crate::service::user_service::UserDirectory;

/// Minutes an issued code stays verifiable.
const ISSUE_WINDOW_MINUTES: i64 = 5;
/// Minutes an identity stays authorized after a successful verify.
const AUTHORIZED_WINDOW_MINUTES: i64 = 10;

/// Gate outcomes the HTTP boundary must be able to tell apart.
#[derive(Debug, Error)]
pub enum OtpError {
    #[error("User not found")]
    NotFound,
    #[error("User email not found")]
    InvalidRecipient,
    #[error("Failed to send OTP email")]
    DeliveryFailed(String),
    #[error("OTP must be exactly 6 digits")]
    InvalidFormat,
    #[error("OTP not found. Please request a new OTP")]
    NotIssued,
    #[error("OTP has expired. Please request a new OTP")]
    Expired,
    #[error("Invalid OTP")]
    Mismatch,
    #[error("Failed to look up user")]
    Directory(String),
}

/// Time source for the gate. Production uses [`SystemClock`]; tests inject a
/// manual clock to step through the issuance and authorization windows.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Issues, verifies and expires one-time passcodes, and answers the upload
/// path's "is this identity currently authorized" question.
///
/// All records live behind a single lock; per-record mutations are atomic
/// under it. A record becomes visible to `verify_code` before the delivery
/// call starts, so a verify racing an in-flight send sees the new code.
pub struct OtpGate {
    records: Mutex<HashMap<String, OtpRecord>>,
    directory: Arc<dyn UserDirectory>,
    delivery: Arc<dyn OtpDelivery>,
    clock: Arc<dyn Clock>,
}

impl OtpGate {
    pub fn new(directory: Arc<dyn UserDirectory>, delivery: Arc<dyn OtpDelivery>) -> Self {
        Self::with_clock(directory, delivery, Arc::new(SystemClock))
    }

    pub fn with_clock(
        directory: Arc<dyn UserDirectory>,
        delivery: Arc<dyn OtpDelivery>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            directory,
            delivery,
            clock,
        }
    }

    /// Generate a fresh code for `identity` and dispatch it to the identity's
    /// delivery address.
    ///
    /// The new record replaces any prior one unconditionally. If delivery
    /// fails the record is not rolled back; the code stays verifiable for the
    /// rest of its window.
    pub async fn issue_code(&self, identity: &str) -> Result<(), OtpError> {
        let contact = self
            .directory
            .lookup(identity)
            .await
            .map_err(|err| OtpError::Directory(format!("{err:#}")))?
            .ok_or(OtpError::NotFound)?;
        let Some(email) = contact.email else {
            return Err(OtpError::InvalidRecipient);
        };

        let code = generate_code();
        let now = self.clock.now();
        {
            let mut records = self.records.lock();
            records.insert(
                identity.to_string(),
                OtpRecord {
                    code: code.clone(),
                    issued_expiry: now + Duration::minutes(ISSUE_WINDOW_MINUTES),
                    verified: false,
                    verified_expiry: None,
                },
            );
        }

        self.delivery
            .send_code(&email, &contact.name, &code)
            .await
            .map_err(|err| OtpError::DeliveryFailed(format!("{err:#}")))?;

        info!(identity, "otp code issued");
        Ok(())
    }

    /// Check `candidate` against the code stored for `identity`.
    ///
    /// A mismatch leaves the record intact; retries are unlimited within the
    /// issuance window. An expired record is deleted on the way out.
    pub fn verify_code(&self, identity: &str, candidate: &str) -> Result<(), OtpError> {
        if candidate.len() != 6 || !candidate.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OtpError::InvalidFormat);
        }

        let now = self.clock.now();
        let mut records = self.records.lock();

        let (expired, matches) = match records.get(identity) {
            None => return Err(OtpError::NotIssued),
            Some(record) => (
                now >= record.issued_expiry,
                bool::from(candidate.as_bytes().ct_eq(record.code.as_bytes())),
            ),
        };

        if expired {
            records.remove(identity);
            return Err(OtpError::Expired);
        }
        if !matches {
            return Err(OtpError::Mismatch);
        }

        if let Some(record) = records.get_mut(identity) {
            record.verified = true;
            record.verified_expiry = Some(now + Duration::minutes(AUTHORIZED_WINDOW_MINUTES));
        }
        info!(identity, "otp verified");
        Ok(())
    }

    /// True iff `identity` verified a code and its authorization window is
    /// still open. A record whose window has closed is reclaimed lazily.
    pub fn is_authorized(&self, identity: &str) -> bool {
        let now = self.clock.now();
        let mut records = self.records.lock();

        let (valid, verified) = match records.get(identity) {
            None => return false,
            Some(record) => (record.authorization_valid(now), record.verified),
        };

        if valid {
            return true;
        }
        if verified {
            records.remove(identity);
        }
        false
    }

    /// Delete every record whose relevant window has passed. Returns the
    /// number of reclaimed records.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, record| now < record.relevant_expiry());
        before - records.len()
    }

    /// Spawn the periodic sweep task. It runs until `cancel` fires; the
    /// returned handle lets the caller wait for it to drain at shutdown.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        every: std::time::Duration,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let gate = self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick fires immediately; consume it so we start
            // with a full interval wait.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("otp sweeper shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let reclaimed = gate.sweep_expired();
                        if reclaimed > 0 {
                            debug!(reclaimed, "swept expired otp records");
                        }
                    }
                }
            }
        })
    }
}

/// Uniformly random 6-digit code, fixed-width with leading zeros.
fn generate_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", code)
}
