//! Integration tests for the roster: JSON records in, derived state and
//! notifications out, driven by a manual clock.

use std::cell::RefCell;
use std::rc::Rc;
use waitboard_core::{
    Attr, AttrSet, AttrValue, EntryKey, ManualClock, ResponseKind, Status, WaitlistConfig,
};
use waitboard_roster::{EntryCollection, EntryPatch};

const OPEN: i64 = 1_700_000_000;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn roster(config: &str) -> (Rc<ManualClock>, EntryCollection) {
    init_tracing();
    let clock = Rc::new(ManualClock::new(OPEN));
    let config = WaitlistConfig::from_json(config).unwrap();
    let roster = EntryCollection::new(config, clock.clone()).unwrap();
    (clock, roster)
}

#[test]
fn test_guest_lifecycle_from_json() {
    let (clock, mut roster) = roster(r#"{"two_way_text": true, "tick_interval_secs": 60}"#);
    roster.start();

    let key = roster
        .upsert_json(&format!(
            r#"{{"id": 101, "name": "Ann", "party_size": 2, "status": "queued",
                "created_at_ts": {}, "quoted_time": 20, "hasPhone": true}}"#,
            OPEN
        ))
        .unwrap();

    let log = Rc::new(RefCell::new(Vec::new()));
    let log_clone = log.clone();
    roster
        .get(key)
        .unwrap()
        .subscribe_attrs(
            AttrSet::of(&[Attr::Status, Attr::MinWaiting, Attr::ResponseKind]),
            move |_, changes| {
                for change in changes.iter() {
                    log_clone
                        .borrow_mut()
                        .push((change.attr, change.new.clone()));
                }
            },
        )
        .unwrap();

    // Sixteen minutes pass, one sweep per minute.
    for _ in 0..16 {
        clock.advance(60);
        assert!(roster.poll().is_some());
    }
    {
        let entry = roster.get(key).unwrap().borrow();
        assert_eq!(entry.derived().min_waiting, 16);
        assert_eq!(entry.derived().min_waiting_formatted, "16");
    }

    roster
        .upsert_json(r#"{"id": 101, "userResponse": "Parking now"}"#)
        .unwrap();
    assert_eq!(
        roster.get(key).unwrap().borrow().derived().response_kind,
        ResponseKind::User
    );

    clock.advance(120);
    roster.upsert_json(r#"{"id": 101, "status": "seat"}"#).unwrap();
    {
        let entry = roster.get(key).unwrap().borrow();
        assert_eq!(entry.completed_at(), Some(OPEN + 18 * 60));
        assert_eq!(entry.derived().min_waited, Some(18));
        assert_eq!(entry.derived().response_kind, ResponseKind::None);
    }

    let log = log.borrow();
    let minutes = log.iter().filter(|(attr, _)| *attr == Attr::MinWaiting).count();
    assert_eq!(minutes, 17);
    assert!(log.contains(&(Attr::Status, AttrValue::from("seat"))));
    assert!(log.contains(&(Attr::ResponseKind, AttrValue::from("user"))));
    assert!(log.contains(&(Attr::ResponseKind, AttrValue::from("none"))));
}

#[test]
fn test_completed_entries_leave_the_sweep() {
    let (clock, mut roster) = roster("{}");
    for id in 1..=3 {
        roster
            .upsert(EntryPatch::new(id).created_at(OPEN))
            .unwrap();
    }
    roster
        .upsert(EntryPatch::new(2).status(Status::NoShow))
        .unwrap();

    clock.advance(600);
    let report = roster.tick();
    assert_eq!(report.swept, 2);
    {
        let entry = roster.get(EntryKey::Remote(2)).unwrap().borrow();
        assert_eq!(entry.derived().min_waiting, 0);
        assert_eq!(entry.derived().min_waited, Some(0));
    }

    // Back on the list: swept again, completion cleared.
    roster
        .upsert(EntryPatch::new(2).status(Status::Queued))
        .unwrap();
    let entry = roster.get(EntryKey::Remote(2)).unwrap().borrow();
    assert_eq!(entry.completed_at(), None);
    assert_eq!(entry.derived().min_waiting, 10);
}

#[test]
fn test_dropping_roster_ends_ticks() {
    let (clock, mut roster) = roster("{}");
    roster.upsert(EntryPatch::new(1).created_at(OPEN)).unwrap();
    roster.start();
    let entry = roster.get(EntryKey::Remote(1)).unwrap().clone();
    drop(roster);

    clock.advance(3_600);
    assert_eq!(entry.borrow().derived().min_waiting, 0);
}

#[test]
fn test_record_export() {
    let (_, mut roster) = roster("{}");
    let key = roster
        .upsert(
            EntryPatch::new(5)
                .name("Eve")
                .created_at(OPEN - 90)
                .quoted_time(125)
                .call_ahead_checked_in_at(Some(OPEN - 60)),
        )
        .unwrap();

    let json = roster.get(key).unwrap().borrow().record().to_json_value();
    assert_eq!(json["quotedTimeText"], "(q2:05)");
    assert_eq!(json["minWaiting"], 1);
    assert_eq!(json["minutesInStore"], 1);
    assert!(json["completed_at_ts"].is_null());
}
