//! Entry status and the enums derived from it.

use crate::error::{Error, Result};
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a waitlist entry, as delivered by the upstream system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Queued,
    Notify,
    Reserved,
    CallAhead,
    Seat,
    NoShow,
    /// Cancelled by staff. Never observable on an entry: normalized to `NoShow`.
    Cancel,
    /// Cancelled by the guest.
    UserCancel,
}

/// Which list a status places an entry on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Still waiting: `queued`, `notify`.
    Current,
    /// Done: `seat`, `noshow`.
    History,
    /// Everything else (reservations, call-aheads, cancellations).
    Pending,
}

impl Status {
    /// Returns the wire name of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Queued => "queued",
            Status::Notify => "notify",
            Status::Reserved => "reserved",
            Status::CallAhead => "callahead",
            Status::Seat => "seat",
            Status::NoShow => "noshow",
            Status::Cancel => "cancel",
            Status::UserCancel => "usercancel",
        }
    }

    /// Folds statuses that display identically. `cancel` becomes `noshow`.
    #[inline]
    pub fn normalized(self) -> Status {
        match self {
            Status::Cancel => Status::NoShow,
            other => other,
        }
    }

    pub fn stage(self) -> Stage {
        match self.normalized() {
            Status::Queued | Status::Notify => Stage::Current,
            Status::Seat | Status::NoShow => Stage::History,
            _ => Stage::Pending,
        }
    }

    /// Returns true for the terminal statuses that carry a completion time.
    #[inline]
    pub fn is_terminal(self) -> bool {
        self.stage() == Stage::History
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "queued" => Ok(Status::Queued),
            "notify" => Ok(Status::Notify),
            "reserved" => Ok(Status::Reserved),
            "callahead" => Ok(Status::CallAhead),
            "seat" => Ok(Status::Seat),
            "noshow" => Ok(Status::NoShow),
            "cancel" => Ok(Status::Cancel),
            "usercancel" => Ok(Status::UserCancel),
            other => Err(Error::invalid_patch(format!("unknown status: {}", other))),
        }
    }
}

/// Classification of the response surfaced on an entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    #[default]
    None,
    User,
    Error,
}

impl ResponseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseKind::None => "none",
            ResponseKind::User => "user",
            ResponseKind::Error => "error",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display bucket an entry is listed under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    #[default]
    Waiting,
    Reserved,
    Seated,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Waiting, Bucket::Reserved, Bucket::Seated];

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Waiting => "waiting",
            Bucket::Reserved => "reserved",
            Bucket::Seated => "seated",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
