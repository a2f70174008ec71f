use anyhow::{Context, Result};
use totp_rs::{Algorithm, Secret, TOTP};

/// Standard authenticator parameters: 6 digits, 30-second period, SHA-1.
/// Skew is zero, so a code is only valid within its own period.
const DIGITS: usize = 6;
const SKEW: u8 = 0;
const STEP: u64 = 30;

/// Freshly generated enrolment material for one user.
#[derive(Debug, Clone)]
pub struct Enrolment {
    /// Base32 secret, persisted on the user row
    pub secret: String,
    /// otpauth:// provisioning URL; any compliant authenticator can
    /// consume it (the client renders the QR image)
    pub url: String,
}

pub struct TotpService {
    issuer: String,
}

impl TotpService {
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }

    pub fn enrol(&self, account: &str) -> Result<Enrolment> {
        let secret = Secret::generate_secret();
        let totp = self.build(&secret, account)?;

        Ok(Enrolment {
            secret: secret.to_encoded().to_string(),
            url: totp.get_url(),
        })
    }

    /// Check a 6-digit code against the stored base32 secret.
    pub fn verify(&self, secret: &str, account: &str, code: &str) -> Result<bool> {
        let secret = Secret::Encoded(secret.to_string());
        let totp = self.build(&secret, account)?;
        totp.check_current(code)
            .context("System clock is before the unix epoch")
    }

    fn build(&self, secret: &Secret, account: &str) -> Result<TOTP> {
        let bytes = secret
            .to_bytes()
            .map_err(|e| anyhow::anyhow!("Malformed TOTP secret: {e:?}"))?;

        TOTP::new(
            Algorithm::SHA1,
            DIGITS,
            SKEW,
            STEP,
            bytes,
            Some(self.issuer.clone()),
            account.to_string(),
        )
        .map_err(|e| anyhow::anyhow!("Failed to build TOTP: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrolment_produces_provisioning_url() {
        let svc = TotpService::new("plantdesk");
        let enrolment = svc.enrol("alice").unwrap();

        assert!(enrolment.url.starts_with("otpauth://totp/"));
        assert!(enrolment.url.contains("plantdesk"));
        assert!(!enrolment.secret.is_empty());
    }

    #[test]
    fn current_code_verifies_and_stale_code_fails() {
        let svc = TotpService::new("plantdesk");
        let enrolment = svc.enrol("alice").unwrap();

        let secret = Secret::Encoded(enrolment.secret.clone());
        let totp = TOTP::new(
            Algorithm::SHA1,
            DIGITS,
            SKEW,
            STEP,
            secret.to_bytes().unwrap(),
            Some("plantdesk".to_string()),
            "alice".to_string(),
        )
        .unwrap();

        let code = totp.generate_current().unwrap();
        assert!(svc.verify(&enrolment.secret, "alice", &code).unwrap());
        assert!(!svc.verify(&enrolment.secret, "alice", "000000").unwrap());
    }
}
