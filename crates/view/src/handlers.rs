//! Targeted fragment updates.
//!
//! Each `TargetedUpdate` ties a group of entry attributes to the one part of
//! the fragment that displays them. Bindings subscribe every row of
//! `TARGETED_UPDATES` to its attributes once, so a change touches only the
//! fragment parts that depend on it.

use crate::fragment::{Fragment, Slot};
use crate::urgency::Urgency;
use waitboard_core::{Attr, AttrSet, ResponseKind, Timestamp};
use waitboard_roster::Entry;

/// Applies one targeted update.
pub type UpdateFn = fn(&Entry, &mut dyn Fragment, Timestamp);

/// One row of the handler table.
#[derive(Clone, Copy)]
pub struct TargetedUpdate {
    pub name: &'static str,
    pub attrs: &'static [Attr],
    pub apply: UpdateFn,
}

impl TargetedUpdate {
    #[inline]
    pub fn attr_set(&self) -> AttrSet {
        AttrSet::of(self.attrs)
    }
}

impl core::fmt::Debug for TargetedUpdate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TargetedUpdate")
            .field("name", &self.name)
            .field("attrs", &self.attrs)
            .finish()
    }
}

pub static TARGETED_UPDATES: &[TargetedUpdate] = &[
    TargetedUpdate {
        name: "name",
        attrs: &[Attr::Name],
        apply: change_name,
    },
    TargetedUpdate {
        name: "status_class",
        attrs: &[Attr::Status],
        apply: change_status_class,
    },
    TargetedUpdate {
        name: "status_color",
        attrs: &[Attr::StatusColor],
        apply: change_status_color,
    },
    TargetedUpdate {
        name: "phone",
        attrs: &[Attr::Phone],
        apply: change_phone,
    },
    TargetedUpdate {
        name: "profile",
        attrs: &[Attr::HasProfile],
        apply: toggle_profile,
    },
    TargetedUpdate {
        name: "response_kind",
        attrs: &[Attr::UserResponse, Attr::ResponseKind],
        apply: toggle_response_kind,
    },
    TargetedUpdate {
        name: "seat_button",
        attrs: &[
            Attr::CheckedInAt,
            Attr::CallAheadCheckedInAt,
            Attr::ResType,
            Attr::CallAheadType,
        ],
        apply: toggle_seat_button,
    },
    TargetedUpdate {
        name: "has_phone",
        attrs: &[Attr::HasPhone],
        apply: toggle_has_phone,
    },
    TargetedUpdate {
        name: "quoted_time",
        attrs: &[Attr::QuotedTimeText],
        apply: change_quoted_time,
    },
    TargetedUpdate {
        name: "waiting_time",
        attrs: &[Attr::MinWaitingFormatted],
        apply: change_waiting_time,
    },
    TargetedUpdate {
        name: "urgency",
        attrs: &[Attr::QuotedTime, Attr::MinWaiting],
        apply: change_urgency,
    },
    TargetedUpdate {
        name: "minutes_in_store",
        attrs: &[
            Attr::MinutesInStore,
            Attr::MinutesInStoreLong,
            Attr::MinutesInStoreShort,
        ],
        apply: change_minutes_in_store,
    },
    TargetedUpdate {
        name: "entry_type",
        attrs: &[Attr::ResType, Attr::CallAheadType],
        apply: toggle_entry_type,
    },
    TargetedUpdate {
        name: "ping_count",
        attrs: &[Attr::PingCount],
        apply: change_ping_count,
    },
];

/// Returns the handler rows listening to `attr`.
pub fn handlers_for(attr: Attr) -> impl Iterator<Item = &'static TargetedUpdate> {
    TARGETED_UPDATES
        .iter()
        .filter(move |update| update.attrs.contains(&attr))
}

fn tagged(tag: &Option<String>) -> bool {
    tag.as_deref().is_some_and(|t| !t.is_empty())
}

fn change_name(entry: &Entry, fragment: &mut dyn Fragment, _: Timestamp) {
    fragment.set_text(Slot::Name, &entry.fields().name);
}

fn change_status_class(entry: &Entry, fragment: &mut dyn Fragment, _: Timestamp) {
    fragment.remove_class_prefix(Slot::Container, "status_");
    let class = format!("status_{}", entry.status());
    fragment.toggle_class(Slot::Container, &class, true);
}

fn change_status_color(entry: &Entry, fragment: &mut dyn Fragment, _: Timestamp) {
    let color = entry
        .fields()
        .status_color
        .as_deref()
        .filter(|c| !c.is_empty());
    fragment.set_style(Slot::PartySize, "background-color", color);
}

fn change_phone(entry: &Entry, fragment: &mut dyn Fragment, _: Timestamp) {
    fragment.set_text(Slot::Phone, &entry.fields().phone);
}

fn toggle_profile(entry: &Entry, fragment: &mut dyn Fragment, _: Timestamp) {
    fragment.toggle_class(Slot::Profile, "notempty", entry.fields().has_profile);
}

fn toggle_response_kind(entry: &Entry, fragment: &mut dyn Fragment, _: Timestamp) {
    let kind = entry.derived().response_kind;
    fragment.toggle_class(Slot::Container, "has_user_response", kind == ResponseKind::User);
    fragment.toggle_class(Slot::Container, "has_error_response", kind == ResponseKind::Error);
}

/// Reservations and call-aheads show a check-in button until checked in.
fn toggle_seat_button(entry: &Entry, fragment: &mut dyn Fragment, _: Timestamp) {
    let fields = entry.fields();
    let booked = tagged(&fields.res_type) || tagged(&fields.call_ahead_type);
    let show_check_in =
        booked && fields.checkedin_at.is_none() && fields.call_ahead_checkedin_at.is_none();
    fragment.toggle_class(Slot::SeatButton, "check-in", show_check_in);
}

fn toggle_has_phone(entry: &Entry, fragment: &mut dyn Fragment, _: Timestamp) {
    fragment.toggle_class(Slot::NotifyButton, "nophone", !entry.fields().has_phone);
}

fn change_quoted_time(entry: &Entry, fragment: &mut dyn Fragment, _: Timestamp) {
    fragment.set_text(Slot::MinutesQuoted, &entry.derived().quoted_time_text);
}

fn change_waiting_time(entry: &Entry, fragment: &mut dyn Fragment, _: Timestamp) {
    fragment.set_text(Slot::MinutesWaitingText, &entry.derived().min_waiting_formatted);
}

fn change_urgency(entry: &Entry, fragment: &mut dyn Fragment, now: Timestamp) {
    let fields = entry.fields();
    let urgency = Urgency::at(fields.quoted_time, fields.created_at, now);
    fragment.set_class_name(Slot::MinutesWaited, &urgency.class_name());
}

fn change_minutes_in_store(entry: &Entry, fragment: &mut dyn Fragment, _: Timestamp) {
    let derived = entry.derived();
    fragment.set_text(Slot::MinutesInStoreLong, &derived.minutes_in_store_long);
    fragment.set_text(Slot::MinutesInStoreShort, &derived.minutes_in_store_short);
}

fn toggle_entry_type(entry: &Entry, fragment: &mut dyn Fragment, _: Timestamp) {
    let fields = entry.fields();
    fragment.toggle_class(Slot::Root, "res-entry", tagged(&fields.res_type));
    fragment.toggle_class(Slot::Root, "cas-entry", tagged(&fields.call_ahead_type));
}

/// The badge only appears once; a count dropping to zero leaves it as is.
fn change_ping_count(entry: &Entry, fragment: &mut dyn Fragment, _: Timestamp) {
    let count = entry.fields().ping_count;
    if count > 0 {
        fragment.set_text(Slot::NotifyCount, &count.to_string());
        fragment.toggle_class(Slot::NotifyButton, "hidden", false);
    }
}
