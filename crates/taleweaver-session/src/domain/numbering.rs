//! Session numbering and the experience schedule.

/// Experience granted for reaching session `session_number`.
///
/// Fixed by the session number alone; the narrator has no say in it.
#[must_use]
pub fn session_experience_reward(session_number: i32) -> i64 {
    100 + 25 * i64::from(session_number)
}

/// The number the session after `previous` receives.
#[must_use]
pub fn next_session_number(previous: i32) -> i32 {
    previous + 1
}
