//! Issues and retires QR sessions.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use thiserror::Error;
use tracing::{info, warn};

use db::store::{AttendanceStore, NewQrSession, QrSession, StoreError};
use util::config;

pub const DEFAULT_SESSION_MINUTES: i64 = 30;

/// Fresh codes tried before giving up on a create.
pub const MAX_CODE_ATTEMPTS: usize = 5;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("session duration must be positive")]
    InvalidDuration,
    #[error("could not allocate a unique session code after {MAX_CODE_ATTEMPTS} attempts")]
    CodeSpaceExhausted,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default)]
pub struct CreateQrSession {
    pub subject: String,
    pub issuer: String,
    pub location: String,
    /// `None` falls back to the registry default.
    pub duration: Option<Duration>,
}

#[derive(Clone)]
pub struct SessionRegistry {
    store: Arc<dyn AttendanceStore>,
    default_duration: Duration,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn AttendanceStore>) -> Self {
        Self::with_default_duration(store, Duration::minutes(DEFAULT_SESSION_MINUTES))
    }

    /// Default duration taken from `QR_DEFAULT_DURATION_MINUTES`.
    pub fn from_config(store: Arc<dyn AttendanceStore>) -> Self {
        Self::with_default_duration(
            store,
            Duration::minutes(config::qr_default_duration_minutes()),
        )
    }

    pub fn with_default_duration(store: Arc<dyn AttendanceStore>, default_duration: Duration) -> Self {
        Self {
            store,
            default_duration,
        }
    }

    /// Creates an active session expiring `duration` after `now`.
    ///
    /// A code that collides with an existing session is re-rolled; the caller
    /// only sees an error once [`MAX_CODE_ATTEMPTS`] codes were all taken.
    pub async fn create(
        &self,
        params: CreateQrSession,
        now: DateTime<Utc>,
    ) -> Result<QrSession, RegistryError> {
        let duration = params.duration.unwrap_or(self.default_duration);
        if duration <= Duration::zero() {
            return Err(RegistryError::InvalidDuration);
        }
        let expires_at = now
            .checked_add_signed(duration)
            .ok_or(RegistryError::InvalidDuration)?;

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let new = NewQrSession {
                session_code: generate_session_code(),
                subject: params.subject.clone(),
                issuer: params.issuer.clone(),
                location: params.location.clone(),
                expires_at,
                created_at: now,
            };

            match self.store.create_session(new).await {
                Ok(session) => {
                    info!(
                        code = %session.session_code,
                        subject = %session.subject,
                        expires_at = %session.expires_at,
                        "QR session created"
                    );
                    return Ok(session);
                }
                Err(StoreError::Conflict) => {
                    warn!(attempt, "session code collision, generating a new one");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(RegistryError::CodeSpaceExhausted)
    }

    /// Marks the session inactive. Unknown and already inactive codes are a
    /// no-op; the return value says whether anything changed.
    pub async fn deactivate(&self, code: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let changed = self.store.deactivate_session(code, now).await?;
        if changed {
            info!(code, "QR session deactivated");
        }
        Ok(changed)
    }

    pub async fn find(&self, code: &str) -> Result<Option<QrSession>, StoreError> {
        self.store.get_session(code).await
    }

    pub async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<QrSession>, StoreError> {
        self.store.list_active_sessions(now).await
    }
}

/// 128 random bits from the OS, hex encoded.
pub fn generate_session_code() -> String {
    let mut buf = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}
