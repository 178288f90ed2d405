//! Outbound entry records.

use crate::entry::Entry;
use serde::Serialize;
use waitboard_core::{EntryId, ResponseKind, Status, Timestamp};

/// A field-keyed snapshot of an entry's full state.
///
/// Field names follow the wire record the upstream system sends, so a
/// template can address authoritative and derived values the same way.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntryRecord {
    pub id: Option<EntryId>,
    pub name: String,
    pub phone: String,
    #[serde(rename = "hasPhone")]
    pub has_phone: bool,
    pub party_size: u32,
    pub status: Status,
    #[serde(rename = "created_at_ts")]
    pub created_at: Timestamp,
    pub quoted_time: i64,
    pub checkedin_at: Option<Timestamp>,
    pub call_ahead_checkedin_at: Option<Timestamp>,
    #[serde(rename = "completed_at_ts")]
    pub completed_at: Option<Timestamp>,
    #[serde(rename = "userResponse")]
    pub user_response: Option<String>,
    pub has_profile: bool,
    pub ping_count: u32,
    pub status_color: Option<String>,
    pub res_type: Option<String>,
    pub call_ahead_type: Option<String>,
    #[serde(rename = "minWaiting")]
    pub min_waiting: i64,
    #[serde(rename = "minWaitingFormatted")]
    pub min_waiting_formatted: String,
    #[serde(rename = "minWaited")]
    pub min_waited: Option<i64>,
    #[serde(rename = "minWaitedFormatted")]
    pub min_waited_formatted: String,
    #[serde(rename = "quotedTimeText")]
    pub quoted_time_text: String,
    #[serde(rename = "minutesInStore")]
    pub minutes_in_store: Option<i64>,
    #[serde(rename = "minutesInStoreLong")]
    pub minutes_in_store_long: String,
    #[serde(rename = "minutesInStoreShort")]
    pub minutes_in_store_short: String,
    pub response: String,
    #[serde(rename = "responseType")]
    pub response_kind: ResponseKind,
}

impl EntryRecord {
    pub fn from_entry(entry: &Entry) -> Self {
        let f = entry.fields();
        let d = entry.derived();
        Self {
            id: f.id,
            name: f.name.clone(),
            phone: f.phone.clone(),
            has_phone: f.has_phone,
            party_size: f.party_size,
            status: f.status,
            created_at: f.created_at,
            quoted_time: f.quoted_time,
            checkedin_at: f.checkedin_at,
            call_ahead_checkedin_at: f.call_ahead_checkedin_at,
            completed_at: f.completed_at,
            user_response: f.user_response.clone(),
            has_profile: f.has_profile,
            ping_count: f.ping_count,
            status_color: f.status_color.clone(),
            res_type: f.res_type.clone(),
            call_ahead_type: f.call_ahead_type.clone(),
            min_waiting: d.min_waiting,
            min_waiting_formatted: d.min_waiting_formatted.clone(),
            min_waited: d.min_waited,
            min_waited_formatted: d.min_waited_formatted.clone(),
            quoted_time_text: d.quoted_time_text.clone(),
            minutes_in_store: d.minutes_in_store,
            minutes_in_store_long: d.minutes_in_store_long.clone(),
            minutes_in_store_short: d.minutes_in_store_short.clone(),
            response: d.response.clone(),
            response_kind: d.response_kind,
        }
    }

    /// Serializes the record as a JSON object.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
