use chrono::{DateTime, Utc};
use util::ws::{Audience, EventKind, NotificationEvent, Priority};

pub const ATTENDANCE_TITLE: &str = "Attendance Update";
pub const GUARDIAN_TITLE: &str = "Student Notification";

/// Broadcast to every listener after a scan is recorded.
pub fn attendance_event(student_name: &str, subject: &str, at: DateTime<Utc>) -> NotificationEvent {
    let body = if subject.is_empty() {
        format!("{student_name} checked in via QR code at {}", at.format("%H:%M"))
    } else {
        format!(
            "{student_name} checked in to {subject} via QR code at {}",
            at.format("%H:%M")
        )
    };

    NotificationEvent::new(
        EventKind::Attendance,
        ATTENDANCE_TITLE,
        body,
        Audience::All,
        Priority::Medium,
        at,
    )
}

/// Addressed to the guardians of `student_id`.
pub fn guardian_event(
    student_id: i64,
    student_name: &str,
    subject: &str,
    at: DateTime<Utc>,
) -> NotificationEvent {
    let body = if subject.is_empty() {
        format!("Student {student_name}: present at {}", at.format("%H:%M"))
    } else {
        format!(
            "Student {student_name}: present for {subject} at {}",
            at.format("%H:%M")
        )
    };

    NotificationEvent::new(
        EventKind::ParentAlert,
        GUARDIAN_TITLE,
        body,
        Audience::Guardian,
        Priority::High,
        at,
    )
    .for_holder(student_id)
}
