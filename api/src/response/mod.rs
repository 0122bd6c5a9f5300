use serde::Serialize;

/// Envelope for every JSON body the API returns:
/// ```json
/// {
///   "success": true,
///   "data": { "session_code": "9f86d0...", "qr_data": "{...}" },
///   "message": "QR session created"
/// }
/// ```
///
/// Failures set `success` to `false`. `data` is either the payload type's
/// default or, for scan rejections, a machine-readable reason:
/// ```json
/// {
///   "success": false,
///   "data": { "code": "duplicate_scan", "retryable": false },
///   "message": "attendance already recorded for this session"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// Error response with `T::default()` as data.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }

    /// Error response that still carries a payload describing the failure.
    pub fn failure(data: T, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            message: message.into(),
        }
    }
}
