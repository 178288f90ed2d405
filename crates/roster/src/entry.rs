//! Waitlist entry state and its derivation pipeline.
//!
//! An `Entry` holds two groups of fields. `EntryFields` are authoritative:
//! only inbound patches write them. `Derived` fields are computed by the
//! entry from the authoritative ones and a time reference.
//!
//! Every mutating method is two-phase: it captures a `Snapshot`, computes
//! the fully normalized target state in place, then diffs once. The returned
//! `ChangeSet` therefore holds exactly the attributes that ended up
//! different, and intermediate states (such as a `cancel` status before it is
//! folded into `noshow`) are never observable.

use crate::derive;
use crate::patch::EntryPatch;
use crate::record::EntryRecord;
use std::rc::Rc;
use waitboard_core::{
    Attr, AttrValue, EntryId, EntryKey, ResponseKind, Stage, Status, Timestamp, WaitlistConfig,
};
use waitboard_reactive::{ChangeSet, Snapshot};

/// Authoritative attributes, written only from inbound patches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryFields {
    pub id: Option<EntryId>,
    pub name: String,
    pub phone: String,
    pub has_phone: bool,
    pub party_size: u32,
    pub status: Status,
    pub created_at: Timestamp,
    pub quoted_time: i64,
    pub checkedin_at: Option<Timestamp>,
    pub call_ahead_checkedin_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub user_response: Option<String>,
    pub has_profile: bool,
    pub ping_count: u32,
    pub status_color: Option<String>,
    pub res_type: Option<String>,
    pub call_ahead_type: Option<String>,
}

impl EntryFields {
    /// Writes every field present in `patch`.
    fn merge(&mut self, patch: &EntryPatch) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }

        if patch.id.is_some() {
            self.id = patch.id;
        }
        set(&mut self.name, &patch.name);
        set(&mut self.phone, &patch.phone);
        set(&mut self.has_phone, &patch.has_phone);
        set(&mut self.party_size, &patch.party_size);
        set(&mut self.status, &patch.status);
        set(&mut self.created_at, &patch.created_at);
        if let Some(quoted) = patch.quoted_time {
            self.quoted_time = quoted.unwrap_or(0);
        }
        set(&mut self.checkedin_at, &patch.checkedin_at);
        set(&mut self.call_ahead_checkedin_at, &patch.call_ahead_checkedin_at);
        set(&mut self.completed_at, &patch.completed_at);
        set(&mut self.user_response, &patch.user_response);
        set(&mut self.has_profile, &patch.has_profile);
        set(&mut self.ping_count, &patch.ping_count);
        set(&mut self.status_color, &patch.status_color);
        set(&mut self.res_type, &patch.res_type);
        set(&mut self.call_ahead_type, &patch.call_ahead_type);
    }
}

/// Attributes the entry computes for itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Derived {
    pub min_waiting: i64,
    pub min_waiting_formatted: String,
    pub min_waited: Option<i64>,
    pub min_waited_formatted: String,
    pub quoted_time_text: String,
    pub minutes_in_store: Option<i64>,
    pub minutes_in_store_long: String,
    pub minutes_in_store_short: String,
    pub response: String,
    pub response_kind: ResponseKind,
}

/// One waitlist entry.
#[derive(Clone, Debug)]
pub struct Entry {
    key: EntryKey,
    config: Rc<WaitlistConfig>,
    /// Whether the first patch has been applied
    applied: bool,
    fields: EntryFields,
    derived: Derived,
}

impl Entry {
    /// Creates an entry with default state. Call `apply` with the first
    /// inbound record to populate it.
    pub fn new(key: EntryKey, config: Rc<WaitlistConfig>) -> Self {
        Self {
            key,
            config,
            applied: false,
            fields: EntryFields::default(),
            derived: Derived::default(),
        }
    }

    /// Creates an entry from its first inbound record.
    pub fn from_patch(
        key: EntryKey,
        config: Rc<WaitlistConfig>,
        patch: &EntryPatch,
        now: Timestamp,
    ) -> (Self, ChangeSet) {
        let mut entry = Self::new(key, config);
        let changes = entry.apply(patch, now);
        (entry, changes)
    }

    #[inline]
    pub fn key(&self) -> EntryKey {
        self.key
    }

    #[inline]
    pub fn id(&self) -> Option<EntryId> {
        self.fields.id
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.fields.status
    }

    #[inline]
    pub fn fields(&self) -> &EntryFields {
        &self.fields
    }

    #[inline]
    pub fn derived(&self) -> &Derived {
        &self.derived
    }

    #[inline]
    pub fn config(&self) -> &WaitlistConfig {
        &self.config
    }

    #[inline]
    pub fn completed_at(&self) -> Option<Timestamp> {
        self.fields.completed_at
    }

    /// Returns true once the entry has been seated or marked no-show.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.fields.completed_at.is_some()
    }

    /// Returns true while the entry still accrues waiting time.
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.is_completed()
    }

    /// Returns the check-in time in effect, preferring the regular check-in
    /// over the call-ahead one. Unset and non-positive stamps are ignored.
    pub fn check_in_time(&self) -> Option<Timestamp> {
        self.fields
            .checkedin_at
            .filter(|&ts| ts > 0)
            .or(self.fields.call_ahead_checkedin_at.filter(|&ts| ts > 0))
    }

    #[inline]
    pub fn is_checked_in(&self) -> bool {
        self.check_in_time().is_some()
    }

    /// Returns the current value of `attr`.
    pub fn get(&self, attr: Attr) -> AttrValue {
        let f = &self.fields;
        let d = &self.derived;
        match attr {
            Attr::Id => f.id.map(|id| id as i64).into(),
            Attr::Name => f.name.as_str().into(),
            Attr::Phone => f.phone.as_str().into(),
            Attr::HasPhone => f.has_phone.into(),
            Attr::PartySize => f.party_size.into(),
            Attr::Status => f.status.as_str().into(),
            Attr::CreatedAt => f.created_at.into(),
            Attr::QuotedTime => f.quoted_time.into(),
            Attr::CheckedInAt => f.checkedin_at.into(),
            Attr::CallAheadCheckedInAt => f.call_ahead_checkedin_at.into(),
            Attr::CompletedAt => f.completed_at.into(),
            Attr::UserResponse => f.user_response.clone().into(),
            Attr::HasProfile => f.has_profile.into(),
            Attr::PingCount => f.ping_count.into(),
            Attr::StatusColor => f.status_color.clone().into(),
            Attr::ResType => f.res_type.clone().into(),
            Attr::CallAheadType => f.call_ahead_type.clone().into(),
            Attr::MinWaiting => d.min_waiting.into(),
            Attr::MinWaitingFormatted => d.min_waiting_formatted.as_str().into(),
            Attr::MinWaited => d.min_waited.into(),
            Attr::MinWaitedFormatted => d.min_waited_formatted.as_str().into(),
            Attr::QuotedTimeText => d.quoted_time_text.as_str().into(),
            Attr::MinutesInStore => d.minutes_in_store.into(),
            Attr::MinutesInStoreLong => d.minutes_in_store_long.as_str().into(),
            Attr::MinutesInStoreShort => d.minutes_in_store_short.as_str().into(),
            Attr::Response => d.response.as_str().into(),
            Attr::ResponseKind => d.response_kind.as_str().into(),
        }
    }

    /// Captures every attribute value.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(|attr| self.get(attr))
    }

    /// Returns the full state as a serializable record.
    pub fn record(&self) -> EntryRecord {
        EntryRecord::from_entry(self)
    }

    /// Applies an inbound patch and runs the derivation pipeline.
    ///
    /// Pipeline order: status normalization, completion stamp, response
    /// classification, quoted-time text, then elapsed times. Returns the
    /// attributes whose value changed.
    pub fn apply(&mut self, patch: &EntryPatch, now: Timestamp) -> ChangeSet {
        let before = self.snapshot();
        let first = !self.applied;

        if first && patch.id.is_none() {
            tracing::warn!(key = %self.key, "entry record is missing an id");
        }

        let prev_status = self.fields.status;
        let prev_completed = self.fields.completed_at;

        self.fields.merge(patch);
        self.fields.status = self.fields.status.normalized();
        self.settle_completion(prev_status, now);
        self.derive_response();
        self.derive_quoted_time();

        if first && self.fields.completed_at.is_some() {
            self.derive_waited();
        } else {
            self.derive_waiting(now);
            if self.fields.completed_at != prev_completed {
                self.derive_waited();
            }
        }

        self.applied = true;
        ChangeSet::diff(&before, &self.snapshot())
    }

    /// Recomputes minutes waiting, and minutes in store when checked in.
    ///
    /// Idempotent for a fixed `now`.
    pub fn recompute_waiting_time(&mut self, now: Timestamp) -> ChangeSet {
        let before = self.snapshot();
        self.derive_waiting(now);
        ChangeSet::diff(&before, &self.snapshot())
    }

    /// Recomputes minutes waited from the completion stamp.
    pub fn recompute_waited_time(&mut self) -> ChangeSet {
        let before = self.snapshot();
        self.derive_waited();
        ChangeSet::diff(&before, &self.snapshot())
    }

    /// Keeps `completed_at` set exactly while the status is terminal.
    ///
    /// Entering a terminal status stamps `now` unless a stamp exists. Going
    /// from no-show back to seated is a fresh completion and re-stamps.
    fn settle_completion(&mut self, prev_status: Status, now: Timestamp) {
        let status = self.fields.status;
        match status.stage() {
            Stage::History => {
                let reseated =
                    self.applied && prev_status == Status::NoShow && status == Status::Seat;
                if self.fields.completed_at.is_none() || reseated {
                    self.fields.completed_at = Some(now);
                }
            }
            Stage::Current | Stage::Pending => {
                self.fields.completed_at = None;
            }
        }
    }

    fn derive_response(&mut self) {
        let text = self.fields.user_response.as_deref().unwrap_or("");
        let (response, kind) = derive::classify_response(
            text,
            self.is_completed(),
            self.fields.status,
            self.config.two_way_text,
        );
        self.derived.response = response;
        self.derived.response_kind = kind;
    }

    fn derive_quoted_time(&mut self) {
        self.derived.quoted_time_text = derive::format_quoted_time(self.fields.quoted_time);
    }

    fn derive_waiting(&mut self, now: Timestamp) {
        let minutes = derive::floor_minutes(self.fields.created_at, now);
        self.derived.min_waiting = minutes;
        self.derived.min_waiting_formatted = derive::minutes_text(minutes);

        match self.check_in_time() {
            Some(checked_in_at) => {
                let minutes = derive::minutes_in_store(checked_in_at, now);
                self.derived.minutes_in_store = Some(minutes);
                self.derived.minutes_in_store_long = derive::minutes_text(minutes);
                self.derived.minutes_in_store_short = derive::minutes_text(minutes);
            }
            None => {
                self.derived.minutes_in_store = None;
                self.derived.minutes_in_store_long.clear();
                self.derived.minutes_in_store_short.clear();
            }
        }
    }

    fn derive_waited(&mut self) {
        match self.fields.completed_at {
            Some(completed_at) => {
                let minutes = derive::rounded_minutes(self.fields.created_at, completed_at);
                self.derived.min_waited = Some(minutes);
                self.derived.min_waited_formatted = derive::minutes_text(minutes);
            }
            None => {
                self.derived.min_waited = None;
                self.derived.min_waited_formatted.clear();
            }
        }
    }
}
