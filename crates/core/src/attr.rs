//! Attribute names for waitlist entries.
//!
//! Every field of an entry, authoritative or derived, has an `Attr` tag.
//! Change notifications and view subscriptions are expressed in terms of
//! these tags, and `AttrSet` packs any combination of them into one word.

use crate::error::{Error, Result};
use core::fmt;
use core::str::FromStr;

/// A named attribute of a waitlist entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Attr {
    // Authoritative attributes
    Id,
    Name,
    Phone,
    HasPhone,
    PartySize,
    Status,
    CreatedAt,
    QuotedTime,
    CheckedInAt,
    CallAheadCheckedInAt,
    CompletedAt,
    UserResponse,
    HasProfile,
    PingCount,
    StatusColor,
    ResType,
    CallAheadType,
    // Derived attributes
    MinWaiting,
    MinWaitingFormatted,
    MinWaited,
    MinWaitedFormatted,
    QuotedTimeText,
    MinutesInStore,
    MinutesInStoreLong,
    MinutesInStoreShort,
    Response,
    ResponseKind,
}

impl Attr {
    /// All attributes in declaration order.
    pub const ALL: [Attr; 27] = [
        Attr::Id,
        Attr::Name,
        Attr::Phone,
        Attr::HasPhone,
        Attr::PartySize,
        Attr::Status,
        Attr::CreatedAt,
        Attr::QuotedTime,
        Attr::CheckedInAt,
        Attr::CallAheadCheckedInAt,
        Attr::CompletedAt,
        Attr::UserResponse,
        Attr::HasProfile,
        Attr::PingCount,
        Attr::StatusColor,
        Attr::ResType,
        Attr::CallAheadType,
        Attr::MinWaiting,
        Attr::MinWaitingFormatted,
        Attr::MinWaited,
        Attr::MinWaitedFormatted,
        Attr::QuotedTimeText,
        Attr::MinutesInStore,
        Attr::MinutesInStoreLong,
        Attr::MinutesInStoreShort,
        Attr::Response,
        Attr::ResponseKind,
    ];

    /// Returns the wire name of this attribute, as used in entry records.
    pub fn name(self) -> &'static str {
        match self {
            Attr::Id => "id",
            Attr::Name => "name",
            Attr::Phone => "phone",
            Attr::HasPhone => "hasPhone",
            Attr::PartySize => "party_size",
            Attr::Status => "status",
            Attr::CreatedAt => "created_at_ts",
            Attr::QuotedTime => "quoted_time",
            Attr::CheckedInAt => "checkedin_at",
            Attr::CallAheadCheckedInAt => "call_ahead_checkedin_at",
            Attr::CompletedAt => "completed_at_ts",
            Attr::UserResponse => "userResponse",
            Attr::HasProfile => "has_profile",
            Attr::PingCount => "ping_count",
            Attr::StatusColor => "status_color",
            Attr::ResType => "res_type",
            Attr::CallAheadType => "call_ahead_type",
            Attr::MinWaiting => "minWaiting",
            Attr::MinWaitingFormatted => "minWaitingFormatted",
            Attr::MinWaited => "minWaited",
            Attr::MinWaitedFormatted => "minWaitedFormatted",
            Attr::QuotedTimeText => "quotedTimeText",
            Attr::MinutesInStore => "minutesInStore",
            Attr::MinutesInStoreLong => "minutesInStoreLong",
            Attr::MinutesInStoreShort => "minutesInStoreShort",
            Attr::Response => "response",
            Attr::ResponseKind => "responseType",
        }
    }

    /// Returns true if the entry computes this attribute itself.
    #[inline]
    pub fn is_derived(self) -> bool {
        self >= Attr::MinWaiting
    }

    #[inline]
    fn bit(self) -> u32 {
        1 << (self as u8)
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Attr::ALL
            .iter()
            .copied()
            .find(|attr| attr.name() == s)
            .ok_or_else(|| Error::invalid_patch(format!("unknown attribute: {}", s)))
    }
}

/// A compact set of attributes.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AttrSet(u32);

impl AttrSet {
    /// Creates an empty set.
    #[inline]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Creates a set holding the given attributes.
    pub fn of(attrs: &[Attr]) -> Self {
        attrs.iter().copied().collect()
    }

    /// Creates a set holding every attribute.
    pub fn all() -> Self {
        Self::of(&Attr::ALL)
    }

    /// Adds an attribute. Returns true if it was not already present.
    #[inline]
    pub fn insert(&mut self, attr: Attr) -> bool {
        let had = self.contains(attr);
        self.0 |= attr.bit();
        !had
    }

    /// Removes an attribute.
    #[inline]
    pub fn remove(&mut self, attr: Attr) {
        self.0 &= !attr.bit();
    }

    #[inline]
    pub fn contains(&self, attr: Attr) -> bool {
        self.0 & attr.bit() != 0
    }

    /// Returns true if the two sets share at least one attribute.
    #[inline]
    pub fn intersects(&self, other: AttrSet) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn union(&self, other: AttrSet) -> AttrSet {
        AttrSet(self.0 | other.0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates the attributes in declaration order.
    pub fn iter(&self) -> AttrSetIter {
        AttrSetIter { set: *self, pos: 0 }
    }
}

impl FromIterator<Attr> for AttrSet {
    fn from_iter<I: IntoIterator<Item = Attr>>(iter: I) -> Self {
        let mut set = AttrSet::new();
        for attr in iter {
            set.insert(attr);
        }
        set
    }
}

impl IntoIterator for AttrSet {
    type Item = Attr;
    type IntoIter = AttrSetIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for AttrSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Iterator over the members of an `AttrSet`.
pub struct AttrSetIter {
    set: AttrSet,
    pos: usize,
}

impl Iterator for AttrSetIter {
    type Item = Attr;

    fn next(&mut self) -> Option<Attr> {
        while self.pos < Attr::ALL.len() {
            let attr = Attr::ALL[self.pos];
            self.pos += 1;
            if self.set.contains(attr) {
                return Some(attr);
            }
        }
        None
    }
}
