//! Inbound partial entry records.
//!
//! The upstream transport delivers entries as JSON objects carrying any
//! subset of the authoritative fields. Absent fields leave the entry as it
//! is. Nullable fields (timestamps, response text, tags) also distinguish an
//! explicit `null`, which clears the field, from absence.

use serde::{Deserialize, Deserializer};
use waitboard_core::{EntryId, Error, Result, Status, Timestamp};

/// A partial update to one entry's authoritative attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct EntryPatch {
    pub id: Option<EntryId>,
    pub name: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "hasPhone")]
    pub has_phone: Option<bool>,
    pub party_size: Option<u32>,
    pub status: Option<Status>,
    #[serde(rename = "created_at_ts")]
    pub created_at: Option<Timestamp>,
    /// Quoted wait in minutes; `null` resets it to zero.
    #[serde(default, deserialize_with = "nullable")]
    pub quoted_time: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub checkedin_at: Option<Option<Timestamp>>,
    #[serde(default, deserialize_with = "nullable")]
    pub call_ahead_checkedin_at: Option<Option<Timestamp>>,
    #[serde(rename = "completed_at_ts", default, deserialize_with = "nullable")]
    pub completed_at: Option<Option<Timestamp>>,
    #[serde(rename = "userResponse", default, deserialize_with = "nullable")]
    pub user_response: Option<Option<String>>,
    pub has_profile: Option<bool>,
    pub ping_count: Option<u32>,
    #[serde(default, deserialize_with = "nullable")]
    pub status_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub res_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub call_ahead_type: Option<Option<String>>,
}

/// Maps a present field to `Some(value)`, keeping `null` as `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> core::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl EntryPatch {
    /// Creates a patch addressed to the entry with the given identity.
    pub fn new(id: EntryId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Creates a patch without identity.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Decodes a patch from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::invalid_patch(e.to_string()))
    }

    /// Returns true if the patch carries no fields besides identity.
    pub fn is_empty(&self) -> bool {
        *self
            == Self {
                id: self.id,
                ..Self::default()
            }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn has_phone(mut self, has_phone: bool) -> Self {
        self.has_phone = Some(has_phone);
        self
    }

    pub fn party_size(mut self, party_size: u32) -> Self {
        self.party_size = Some(party_size);
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn created_at(mut self, ts: Timestamp) -> Self {
        self.created_at = Some(ts);
        self
    }

    pub fn quoted_time(mut self, minutes: i64) -> Self {
        self.quoted_time = Some(Some(minutes));
        self
    }

    pub fn checked_in_at(mut self, ts: Option<Timestamp>) -> Self {
        self.checkedin_at = Some(ts);
        self
    }

    pub fn call_ahead_checked_in_at(mut self, ts: Option<Timestamp>) -> Self {
        self.call_ahead_checkedin_at = Some(ts);
        self
    }

    pub fn completed_at(mut self, ts: Option<Timestamp>) -> Self {
        self.completed_at = Some(ts);
        self
    }

    pub fn user_response(mut self, text: Option<&str>) -> Self {
        self.user_response = Some(text.map(str::to_owned));
        self
    }

    pub fn has_profile(mut self, has_profile: bool) -> Self {
        self.has_profile = Some(has_profile);
        self
    }

    pub fn ping_count(mut self, count: u32) -> Self {
        self.ping_count = Some(count);
        self
    }

    pub fn status_color(mut self, color: Option<&str>) -> Self {
        self.status_color = Some(color.map(str::to_owned));
        self
    }

    pub fn res_type(mut self, tag: Option<&str>) -> Self {
        self.res_type = Some(tag.map(str::to_owned));
        self
    }

    pub fn call_ahead_type(mut self, tag: Option<&str>) -> Self {
        self.call_ahead_type = Some(tag.map(str::to_owned));
        self
    }
}
