//! QR attendance core: session issuing, token handling, the scan ledger and
//! the validation pipeline that ties them to the notification hub.

pub mod notifications;
pub mod scan_ledger;
pub mod scan_token;
pub mod scan_validator;
pub mod session_registry;
