//! End-to-end tests: roster sweep driving bindings through the classifier.

use std::cell::RefCell;
use std::rc::Rc;
use hashbrown::HashMap;
use waitboard_core::{Bucket, EntryKey, ManualClock, WaitlistConfig};
use waitboard_roster::{EntryCollection, EntryPatch};
use waitboard_view::{
    Fragment, FragmentFactory, MemoryFragment, MemoryList, PlainTemplate, QueueClassifier, Slot,
};

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

struct Board {
    clock: Rc<ManualClock>,
    roster: EntryCollection,
    fragments: Rc<RefCell<HashMap<EntryKey, MemoryFragment>>>,
    list: MemoryList,
    classifier: QueueClassifier,
}

fn board(config: WaitlistConfig) -> Board {
    init_tracing();
    let clock = Rc::new(ManualClock::new(OPEN));
    let mut roster = EntryCollection::new(config, clock.clone()).unwrap();

    let fragments: Rc<RefCell<HashMap<EntryKey, MemoryFragment>>> = Rc::default();
    let registry = fragments.clone();
    let factory: FragmentFactory = Rc::new(move |key: EntryKey| {
        let fragment = MemoryFragment::new();
        registry.borrow_mut().insert(key, fragment.clone());
        Box::new(fragment) as Box<dyn Fragment>
    });

    let list = MemoryList::new();
    let classifier =
        QueueClassifier::new(&mut roster, PlainTemplate, factory, Box::new(list.clone())).unwrap();
    Board {
        clock,
        roster,
        fragments,
        list,
        classifier,
    }
}

impl Board {
    fn fragment(&self, id: u64) -> MemoryFragment {
        self.fragments.borrow()[&EntryKey::Remote(id)].clone()
    }
}

#[test]
fn test_sweep_updates_fragments() {
    let mut board = board(WaitlistConfig::default());
    board
        .roster
        .upsert(EntryPatch::new(1).name("Ann").created_at(OPEN).quoted_time(10))
        .unwrap();
    board
        .roster
        .upsert(EntryPatch::new(2).name("Bo").created_at(OPEN).quoted_time(30))
        .unwrap();
    board.roster.start();

    for _ in 0..8 {
        board.clock.advance(60);
        board.roster.poll();
    }

    let ann = board.fragment(1);
    assert_eq!(ann.text(Slot::MinutesWaitingText).as_deref(), Some("8"));
    assert_eq!(ann.classes(Slot::MinutesWaited), vec!["minutes-waited", "warning"]);
    let bo = board.fragment(2);
    assert_eq!(bo.classes(Slot::MinutesWaited), vec!["minutes-waited"]);

    for _ in 0..3 {
        board.clock.advance(60);
        board.roster.poll();
    }
    assert_eq!(ann.classes(Slot::MinutesWaited), vec!["minutes-waited", "alert"]);

    // Ticks never rebuild structure.
    assert_eq!(ann.render_counts(), (1, 0));
}

#[test]
fn test_response_rerenders_once() {
    let mut board = board(WaitlistConfig::default().with_two_way_text(true));
    board
        .roster
        .upsert(EntryPatch::new(1).name("Ann").created_at(OPEN))
        .unwrap();

    board
        .roster
        .upsert_json(r#"{"id": 1, "userResponse": "Running late"}"#)
        .unwrap();
    board
        .roster
        .upsert_json(r#"{"id": 1, "userResponse": "Running late", "ping_count": 1}"#)
        .unwrap();

    let ann = board.fragment(1);
    assert_eq!(ann.render_counts(), (1, 1));
    assert!(ann.has_class(Slot::Container, "has_user_response"));
    assert_eq!(ann.text(Slot::NotifyCount).as_deref(), Some("1"));
}

#[test]
fn test_render_batches_roster_order() {
    let mut board = board(WaitlistConfig::default());
    for id in [3, 1, 2] {
        board.roster.upsert(EntryPatch::new(id)).unwrap();
    }

    // Initial empty batch, then one per arrival.
    assert_eq!(board.list.attach_count(), 4);
    assert_eq!(
        board.list.last(),
        Some(vec![
            EntryKey::Remote(3),
            EntryKey::Remote(1),
            EntryKey::Remote(2)
        ])
    );
    assert_eq!(board.classifier.bucket(Bucket::Seated), Vec::new());

    board.classifier.render();
    assert_eq!(board.list.attach_count(), 5);
}
