pub mod m202510010001_create_students;
pub mod m202510010002_create_guardians;
pub mod m202510010003_create_qr_sessions;
pub mod m202510010004_create_qr_scans;
