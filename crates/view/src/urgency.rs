//! Wait-time urgency classification.

use waitboard_core::Timestamp;

/// How close an entry's wait is to its quote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Urgency {
    #[default]
    None,
    /// Approaching the quote.
    Warning,
    /// Quote exceeded.
    Alert,
}

/// Base class of the wait-time element.
pub const MINUTES_WAITED_CLASS: &str = "minutes-waited";

impl Urgency {
    /// Classifies a wait of `waited` minutes against a quote of `quoted`
    /// minutes.
    ///
    /// Short quotes (15 minutes or less) warn within 3 minutes of the quote,
    /// longer quotes within 5.
    pub fn classify(quoted: i64, waited: f64) -> Urgency {
        if quoted <= 0 {
            return Urgency::None;
        }

        let quoted_f = quoted as f64;
        let remaining = quoted_f - waited;
        let window = if quoted <= 15 { 3.0 } else { 5.0 };

        if remaining > 0.0 && remaining <= window {
            Urgency::Warning
        } else if waited >= quoted_f {
            Urgency::Alert
        } else {
            Urgency::None
        }
    }

    /// Classifies from raw timestamps, measuring the wait from `created_at`
    /// to `now` in fractional minutes.
    pub fn at(quoted: i64, created_at: Timestamp, now: Timestamp) -> Urgency {
        Self::classify(quoted, now.saturating_sub(created_at) as f64 / 60.0)
    }

    pub fn modifier(self) -> Option<&'static str> {
        match self {
            Urgency::None => None,
            Urgency::Warning => Some("warning"),
            Urgency::Alert => Some("alert"),
        }
    }

    /// Full class name of the wait-time element.
    pub fn class_name(self) -> String {
        match self.modifier() {
            Some(modifier) => format!("{} {}", MINUTES_WAITED_CLASS, modifier),
            None => MINUTES_WAITED_CLASS.to_owned(),
        }
    }
}
