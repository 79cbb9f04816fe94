use chrono::{DateTime, Utc};

/// One-time-passcode record for a single user identity.
///
/// Records live only in process memory; nothing survives a restart. There is
/// at most one record per identity, and issuing a new code replaces any prior
/// record unconditionally.
#[derive(Debug, Clone)]
pub struct OtpRecord {
    /// Fixed-width 6-digit code, leading zeros preserved.
    pub code: String,
    /// End of the issuance window; the code cannot be verified past this.
    pub issued_expiry: DateTime<Utc>,
    /// Set once a matching code was presented inside the issuance window.
    pub verified: bool,
    /// End of the authorization window; set only when `verified` becomes true.
    pub verified_expiry: Option<DateTime<Utc>>,
}

impl OtpRecord {
    /// True while the identity behind this record may upload audio.
    pub fn authorization_valid(&self, now: DateTime<Utc>) -> bool {
        self.verified && self.verified_expiry.is_some_and(|until| now < until)
    }

    /// The expiry that governs sweeping: the authorization window once
    /// verified, the issuance window otherwise.
    pub fn relevant_expiry(&self) -> DateTime<Utc> {
        self.verified_expiry.unwrap_or(self.issued_expiry)
    }
}
