pub mod guardian;
pub mod qr_scan;
pub mod qr_session;
pub mod student;
pub mod student_guardian;
