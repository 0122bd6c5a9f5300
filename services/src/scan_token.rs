//! The payload carried inside a QR image.
//!
//! Decoding is pure: a forged or stale token is rejected here before any
//! store access.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use db::store::QrSession;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Not a JSON object.
    #[error("QR payload is not well-formed")]
    Malformed,
    /// A required field is absent, empty, or of the wrong type.
    #[error("QR payload is missing a valid `{0}`")]
    MissingField(&'static str),
}

/// Decoded QR payload. `expires_at` is in epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanToken {
    pub session_code: String,
    pub subject: String,
    pub issuer: String,
    pub location: String,
    pub expires_at: i64,
}

impl ScanToken {
    /// Whether `now` is past the expiry embedded in the token.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.expires_at
    }
}

impl From<&QrSession> for ScanToken {
    fn from(session: &QrSession) -> Self {
        Self {
            session_code: session.session_code.clone(),
            subject: session.subject.clone(),
            issuer: session.issuer.clone(),
            location: session.location.clone(),
            expires_at: session.expires_at.timestamp(),
        }
    }
}

/// Serializes the token for `session` into the QR payload text.
pub fn encode(session: &QrSession) -> String {
    let token = ScanToken::from(session);
    serde_json::json!({
        "session_code": token.session_code,
        "subject": token.subject,
        "issuer": token.issuer,
        "location": token.location,
        "expires_at": token.expires_at,
    })
    .to_string()
}

pub fn decode(payload: &[u8]) -> Result<ScanToken, DecodeError> {
    let value: Value = serde_json::from_slice(payload).map_err(|_| DecodeError::Malformed)?;
    let Value::Object(map) = value else {
        return Err(DecodeError::Malformed);
    };

    let session_code = map
        .get("session_code")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(DecodeError::MissingField("session_code"))?
        .to_owned();

    // Some scanners re-serialize numbers as doubles; whole seconds are kept.
    let expires_at = match map.get("expires_at") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        _ => None,
    }
    .ok_or(DecodeError::MissingField("expires_at"))?;

    let text = |key: &str| {
        map.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };

    Ok(ScanToken {
        session_code,
        subject: text("subject"),
        issuer: text("issuer"),
        location: text("location"),
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn session() -> QrSession {
        let created = Utc.with_ymd_and_hms(2025, 9, 8, 8, 0, 0).unwrap();
        QrSession {
            id: 1,
            session_code: "9f86d081884c7d659a2feaa0c55ad015".into(),
            subject: "Biology".into(),
            issuer: "Ms. Rivera".into(),
            location: "Lab 2".into(),
            expires_at: created + Duration::minutes(30) + Duration::milliseconds(750),
            active: true,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn decode_reverses_encode() {
        let s = session();
        let token = decode(encode(&s).as_bytes()).unwrap();
        assert_eq!(token.session_code, s.session_code);
        assert_eq!(token.expires_at, s.expires_at.timestamp());
        assert_eq!(token.subject, "Biology");
        assert_eq!(token.issuer, "Ms. Rivera");
        assert_eq!(token.location, "Lab 2");
    }

    #[test]
    fn wire_format_uses_epoch_seconds() {
        let v: Value = serde_json::from_str(&encode(&session())).unwrap();
        assert!(v["expires_at"].is_i64());
        assert_eq!(v["session_code"], "9f86d081884c7d659a2feaa0c55ad015");
    }

    #[test]
    fn non_json_and_non_objects_are_malformed() {
        assert_eq!(decode(b"not json"), Err(DecodeError::Malformed));
        assert_eq!(decode(b"[1,2,3]"), Err(DecodeError::Malformed));
        assert_eq!(decode(b"\"abc\""), Err(DecodeError::Malformed));
        assert_eq!(decode(b""), Err(DecodeError::Malformed));
    }

    #[test]
    fn missing_or_mistyped_required_fields() {
        assert_eq!(
            decode(br#"{"expires_at": 1}"#),
            Err(DecodeError::MissingField("session_code"))
        );
        assert_eq!(
            decode(br#"{"session_code": 42, "expires_at": 1}"#),
            Err(DecodeError::MissingField("session_code"))
        );
        assert_eq!(
            decode(br#"{"session_code": "", "expires_at": 1}"#),
            Err(DecodeError::MissingField("session_code"))
        );
        assert_eq!(
            decode(br#"{"session_code": "abc"}"#),
            Err(DecodeError::MissingField("expires_at"))
        );
        assert_eq!(
            decode(br#"{"session_code": "abc", "expires_at": "1757318400"}"#),
            Err(DecodeError::MissingField("expires_at"))
        );
    }

    #[test]
    fn float_expiry_is_truncated_and_descriptive_fields_default() {
        let token = decode(br#"{"session_code": "abc", "expires_at": 1757318400.9}"#).unwrap();
        assert_eq!(token.expires_at, 1757318400);
        assert_eq!(token.subject, "");
        assert_eq!(token.location, "");
    }

    #[test]
    fn expiry_is_compared_in_whole_seconds() {
        let token = decode(br#"{"session_code": "abc", "expires_at": 1757318400}"#).unwrap();
        let at = Utc.timestamp_opt(1757318400, 0).unwrap();
        assert!(!token.is_expired(at));
        assert!(!token.is_expired(at + Duration::milliseconds(999)));
        assert!(token.is_expired(at + Duration::seconds(1)));
    }
}
