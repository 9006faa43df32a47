use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};

/// Proof that the caller presented the admin secret. Announcement writes
/// require one; the only way to obtain it is [`AdminGate::authorize`].
#[derive(Debug, Clone)]
pub struct AdminGrant {
    _private: (),
}

/// Shared-secret check in front of every announcement write.
pub struct AdminGate {
    secret_digest: Option<[u8; 32]>,
}

impl AdminGate {
    pub fn new(secret: Option<String>) -> Self {
        let secret_digest = secret
            .filter(|s| !s.is_empty())
            .map(|s| digest(&s));

        if secret_digest.is_none() {
            tracing::warn!("No admin password configured; announcement writes are disabled");
        }

        Self { secret_digest }
    }

    pub fn is_configured(&self) -> bool {
        self.secret_digest.is_some()
    }

    pub fn authorize(&self, presented: &str) -> Result<AdminGrant> {
        let expected = self.secret_digest.as_ref().ok_or(AppError::Unauthorized)?;

        if bool::from(digest(presented)[..].ct_eq(&expected[..])) {
            Ok(AdminGrant { _private: () })
        } else {
            tracing::warn!("Invalid admin password provided");
            Err(AppError::Unauthorized)
        }
    }
}

fn digest(value: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hasher.finalize().into()
}
