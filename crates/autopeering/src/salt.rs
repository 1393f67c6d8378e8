//! Rotating salt used by neighbor selection to rank candidates.

use std::time::{Duration, SystemTime};

const SALT_LEN: usize = 20;

/// Longest lifetime a salt can have; longer lifetimes are clamped.
pub const MAX_SALT_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Public salt with its expiration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt {
    bytes: [u8; SALT_LEN],
    expiration: SystemTime,
}

impl Salt {
    /// Random salt expiring `lifetime` from now, at most
    /// [`MAX_SALT_LIFETIME`].
    pub fn new(lifetime: Duration) -> Self {
        let now = SystemTime::now();
        Self {
            bytes: rand::random(),
            expiration: now
                .checked_add(lifetime.min(MAX_SALT_LIFETIME))
                .unwrap_or(now),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn expiration(&self) -> SystemTime {
        self.expiration
    }

    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expiration
    }

    /// Zero once expired.
    pub fn expires_in(&self) -> Duration {
        self.expiration
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO)
    }

    /// Expiration as seconds since the unix epoch.
    pub fn expiration_unix(&self) -> u64 {
        self.expiration
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
