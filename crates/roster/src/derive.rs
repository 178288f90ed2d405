//! Pure derivation rules.
//!
//! Each function maps authoritative values (and a time reference where
//! needed) to one derived value. `Entry` composes them into its pipeline;
//! keeping them free-standing makes the rules testable in isolation.

use waitboard_core::{ResponseKind, Status, Timestamp};

/// Prefix the upstream system puts on delivery failures.
pub const ERROR_RESPONSE_PREFIX: &str = "Error:";

/// Prefix shown in front of guest replies.
pub const USER_RESPONSE_PREFIX: &str = "Response: ";

/// Whole minutes from `from` to `to`, rounded down.
///
/// Stamps arrive unchecked from upstream, so the span saturates instead of
/// overflowing.
#[inline]
pub fn floor_minutes(from: Timestamp, to: Timestamp) -> i64 {
    to.saturating_sub(from).div_euclid(60)
}

/// Minutes from `from` to `to`, rounded half up.
#[inline]
pub fn rounded_minutes(from: Timestamp, to: Timestamp) -> i64 {
    to.saturating_sub(from).saturating_add(30).div_euclid(60)
}

/// Whole minutes spent in the venue since `checked_in_at`.
///
/// A check-in stamped after `now` (clock skew between devices) counts as
/// zero rather than going negative.
#[inline]
pub fn minutes_in_store(checked_in_at: Timestamp, now: Timestamp) -> i64 {
    now.saturating_sub(checked_in_at).max(0) / 60
}

/// Formats a quoted wait as `(q{hours}:{minutes})`.
///
/// Hours are omitted when zero and minutes are always two digits. A zero or
/// negative quote renders as empty text.
pub fn format_quoted_time(quoted_minutes: i64) -> String {
    if quoted_minutes <= 0 {
        return String::new();
    }

    let hours = quoted_minutes / 60;
    let minutes = quoted_minutes % 60;
    if hours < 1 {
        format!("(q:{:02})", minutes)
    } else {
        format!("(q{}:{:02})", hours, minutes)
    }
}

/// Decides which response, if any, an entry surfaces.
///
/// Nothing is surfaced once the entry is completed or when the stored text is
/// empty. Delivery errors always surface. Guest replies surface only when
/// two-way text is enabled and the guest has not cancelled.
pub fn classify_response(
    text: &str,
    completed: bool,
    status: Status,
    two_way_text: bool,
) -> (String, ResponseKind) {
    if completed || text.is_empty() {
        return (String::new(), ResponseKind::None);
    }

    if text.starts_with(ERROR_RESPONSE_PREFIX) {
        (text.to_owned(), ResponseKind::Error)
    } else if two_way_text && status != Status::UserCancel {
        (format!("{}{}", USER_RESPONSE_PREFIX, text), ResponseKind::User)
    } else {
        (String::new(), ResponseKind::None)
    }
}

/// Display text for a minute count.
///
/// Counts are shown as plain numbers; templates add units.
#[inline]
pub fn minutes_text(minutes: i64) -> String {
    minutes.to_string()
}
