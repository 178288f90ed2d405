//! Queue classification.
//!
//! `QueueClassifier` keeps one binding per roster entry and sorts the
//! bindings into display buckets. Buckets keep roster order. An entry is
//! re-evaluated whenever an attribute its placement depends on changes, and
//! moves between buckets without its binding being rebuilt. Whenever the
//! visible bucket gains or loses an entry it is rendered again.
//!
//! Only one placement rule exists so far: active, unreserved entries wait.
//! Every other entry falls back to the waiting bucket as well, which is logged
//! at debug level so the gap stays visible.

use crate::binding::EntryBinding;
use crate::fragment::Fragment;
use crate::sink::{ListSink, RenderBatch};
use crate::template::Template;
use core::cell::{Ref, RefCell};
use hashbrown::HashMap;
use std::rc::{Rc, Weak};
use waitboard_core::{Attr, AttrSet, Bucket, EntryKey, Result, SharedClock};
use waitboard_reactive::SubscriptionId;
use waitboard_roster::{Entry, EntryCollection, RosterEvent, SharedEntry, WeakEntry};

/// Attributes the bucket placement reads.
pub const PLACEMENT_ATTRS: &[Attr] = &[Attr::Status, Attr::CompletedAt, Attr::ResType];

/// Creates the fragment for a newly bound entry.
pub type FragmentFactory = Rc<dyn Fn(EntryKey) -> Box<dyn Fragment>>;

/// How an entry ended up in its bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Claimed by a placement rule.
    Rule,
    /// No rule claimed it.
    Fallback,
}

/// Decides which bucket an entry is listed under.
pub fn place(entry: &Entry) -> (Bucket, Placement) {
    let reserved = entry
        .fields()
        .res_type
        .as_deref()
        .is_some_and(|t| !t.is_empty());

    if !entry.is_completed() && !reserved {
        return (Bucket::Waiting, Placement::Rule);
    }

    tracing::debug!(
        key = %entry.key(),
        status = %entry.status(),
        "no bucket rule matched, listing as waiting"
    );
    (Bucket::Waiting, Placement::Fallback)
}

struct Member {
    binding: EntryBinding,
    entry: WeakEntry,
    bucket: Bucket,
    placement: Placement,
    /// Roster order
    rank: u64,
    placement_sub: SubscriptionId,
}

struct ClassifierState {
    template: Rc<dyn Template>,
    factory: FragmentFactory,
    clock: SharedClock,
    sink: Box<dyn ListSink>,
    visible: Bucket,
    members: HashMap<EntryKey, Member>,
    buckets: HashMap<Bucket, Vec<EntryKey>>,
    next_rank: u64,
}

impl ClassifierState {
    fn insert_ranked(&mut self, bucket: Bucket, key: EntryKey, rank: u64) {
        let members = &self.members;
        let list = self.buckets.entry(bucket).or_default();
        let pos = list
            .iter()
            .position(|k| members.get(k).is_some_and(|m| m.rank > rank))
            .unwrap_or(list.len());
        list.insert(pos, key);
    }

    fn detach_from_bucket(&mut self, bucket: Bucket, key: EntryKey) {
        if let Some(list) = self.buckets.get_mut(&bucket) {
            list.retain(|k| *k != key);
        }
    }

    fn remove(&mut self, key: EntryKey) -> bool {
        let Some(member) = self.members.remove(&key) else {
            return false;
        };
        self.detach_from_bucket(member.bucket, key);
        if let Some(entry) = member.entry.upgrade() {
            entry.unsubscribe(member.placement_sub);
        }
        true
    }
}

/// Sorts roster entries into display buckets and renders the visible one.
pub struct QueueClassifier {
    state: Rc<RefCell<ClassifierState>>,
    roster_sub: u64,
}

impl QueueClassifier {
    /// Binds every entry of `roster`, follows later membership changes and
    /// renders the visible bucket once.
    pub fn new<T>(
        roster: &mut EntryCollection,
        template: T,
        factory: FragmentFactory,
        sink: Box<dyn ListSink>,
    ) -> Result<Self>
    where
        T: Template + 'static,
    {
        let state = Rc::new(RefCell::new(ClassifierState {
            template: Rc::new(template),
            factory,
            clock: roster.clock(),
            sink,
            visible: roster.config().visible_bucket,
            members: HashMap::new(),
            buckets: HashMap::new(),
            next_rank: 0,
        }));

        for entry in roster.iter() {
            add(&state, entry)?;
        }

        let weak = Rc::downgrade(&state);
        let roster_sub = roster.subscribe_while(move |event| on_roster_event(&weak, event));

        let classifier = Self { state, roster_sub };
        classifier.render();
        Ok(classifier)
    }

    /// Stops following `roster` membership changes.
    pub fn detach(self, roster: &mut EntryCollection) {
        roster.unsubscribe(self.roster_sub);
    }

    /// Attaches the visible bucket's fragments to the sink in one batch.
    pub fn render(&self) {
        render_visible(&self.state);
    }

    /// Selects the bucket `render` attaches.
    pub fn set_visible(&self, bucket: Bucket) {
        self.state.borrow_mut().visible = bucket;
    }

    pub fn visible(&self) -> Bucket {
        self.state.borrow().visible
    }

    /// Returns the keys listed under `bucket`, in roster order.
    pub fn bucket(&self, bucket: Bucket) -> Vec<EntryKey> {
        self.state
            .borrow()
            .buckets
            .get(&bucket)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the bucket and placement of an entry.
    pub fn placement(&self, key: EntryKey) -> Option<(Bucket, Placement)> {
        self.state
            .borrow()
            .members
            .get(&key)
            .map(|m| (m.bucket, m.placement))
    }

    /// Toggles the response region of an entry. Returns true when expanded.
    pub fn show_more(&self, key: EntryKey) -> Option<bool> {
        self.with_binding(key, EntryBinding::toggle_show_more)
    }

    pub fn with_binding<R>(&self, key: EntryKey, f: impl FnOnce(&EntryBinding) -> R) -> Option<R> {
        let state = self.state.borrow();
        state.members.get(&key).map(|m| f(&m.binding))
    }

    /// Returns the number of bound entries.
    pub fn len(&self) -> usize {
        self.state.borrow().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().members.is_empty()
    }
}

impl core::fmt::Debug for QueueClassifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("QueueClassifier")
            .field("members", &state.members.len())
            .field("visible", &state.visible)
            .finish()
    }
}

fn render_visible(state: &RefCell<ClassifierState>) {
    let Ok(mut guard) = state.try_borrow_mut() else {
        tracing::warn!("classifier busy, skipping render");
        return;
    };
    let state = &mut *guard;

    let keys = state.buckets.get(&state.visible).cloned().unwrap_or_default();
    let fragments: Vec<(EntryKey, Ref<'_, dyn Fragment>)> = keys
        .iter()
        .filter_map(|key| {
            let member = state.members.get(key)?;
            match member.binding.fragment() {
                Some(fragment) => Some((*key, fragment)),
                None => {
                    tracing::warn!(%key, "fragment busy, left out of render");
                    None
                }
            }
        })
        .collect();

    let items = fragments.iter().map(|(key, f)| (*key, &**f)).collect();
    state.sink.attach(RenderBatch {
        bucket: state.visible,
        items,
    });
}

/// Binds `entry` and lists it in its bucket. Returns the bucket.
fn add(state: &Rc<RefCell<ClassifierState>>, entry: &SharedEntry) -> Result<Bucket> {
    let key = entry.key();
    let (bucket, placement) = place(&*entry.try_read()?);

    let (template, fragment, clock) = {
        let s = state.borrow();
        (Rc::clone(&s.template), (s.factory)(key), Rc::clone(&s.clock))
    };
    let binding = EntryBinding::new(entry, template, fragment, clock)?;

    let weak = Rc::downgrade(state);
    let placement_sub = entry.subscribe_attrs(AttrSet::of(PLACEMENT_ATTRS), move |e, _| {
        if let Some(state) = weak.upgrade() {
            reclassify(&state, e);
        }
    })?;

    let mut s = state.borrow_mut();
    s.remove(key);
    let rank = s.next_rank;
    s.next_rank += 1;
    s.members.insert(
        key,
        Member {
            binding,
            entry: entry.downgrade(),
            bucket,
            placement,
            rank,
            placement_sub,
        },
    );
    s.insert_ranked(bucket, key, rank);
    Ok(bucket)
}

/// Moves an entry to the bucket its current state calls for.
fn reclassify(state: &Rc<RefCell<ClassifierState>>, entry: &Entry) {
    let key = entry.key();
    let (bucket, placement) = place(entry);

    let visible_changed = {
        let Ok(mut s) = state.try_borrow_mut() else {
            tracing::warn!(%key, "classifier busy, placement not updated");
            return;
        };
        let Some(member) = s.members.get_mut(&key) else {
            return;
        };
        member.placement = placement;
        let (from, rank) = (member.bucket, member.rank);
        if from == bucket {
            return;
        }
        member.bucket = bucket;

        s.detach_from_bucket(from, key);
        s.insert_ranked(bucket, key, rank);
        tracing::debug!(%key, %from, to = %bucket, "entry moved between buckets");
        let visible = s.visible;
        from == visible || bucket == visible
    };

    if visible_changed {
        render_visible(state);
    }
}

/// Follows roster membership. Returns false once the classifier is gone.
fn on_roster_event(state: &Weak<RefCell<ClassifierState>>, event: &RosterEvent) -> bool {
    let Some(state) = state.upgrade() else {
        return false;
    };
    let visible_changed = match event {
        RosterEvent::Added(entry) => match add(&state, entry) {
            Ok(bucket) => state.try_borrow().is_ok_and(|s| s.visible == bucket),
            Err(err) => {
                tracing::warn!(key = %entry.key(), error = %err, "failed to bind entry");
                false
            }
        },
        RosterEvent::Removed(key) => {
            let removed = match state.try_borrow_mut() {
                Ok(mut s) => {
                    let bucket = s.members.get(key).map(|m| m.bucket);
                    s.remove(*key);
                    bucket
                }
                Err(_) => None,
            };
            match removed {
                Some(bucket) => state.try_borrow().is_ok_and(|s| s.visible == bucket),
                None => {
                    tracing::warn!(%key, "removed entry was not bound");
                    false
                }
            }
        }
    };

    if visible_changed {
        render_visible(&state);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{MemoryFragment, Slot};
    use crate::sink::MemoryList;
    use crate::template::PlainTemplate;
    use waitboard_core::{ManualClock, Status, WaitlistConfig};
    use waitboard_roster::EntryPatch;

    const START: i64 = 3_000_000;

    struct Fixture {
        roster: EntryCollection,
        list: MemoryList,
        fragments: Rc<RefCell<HashMap<EntryKey, MemoryFragment>>>,
        classifier: QueueClassifier,
    }

    fn fixture(ids: &[u64]) -> Fixture {
        let clock = Rc::new(ManualClock::new(START));
        let mut roster = EntryCollection::new(WaitlistConfig::default(), clock).unwrap();
        for &id in ids {
            roster
                .upsert(EntryPatch::new(id).name(format!("g{}", id)).created_at(START))
                .unwrap();
        }

        let fragments: Rc<RefCell<HashMap<EntryKey, MemoryFragment>>> = Rc::default();
        let registry = fragments.clone();
        let factory: FragmentFactory = Rc::new(move |key: EntryKey| {
            let fragment = MemoryFragment::new();
            registry.borrow_mut().insert(key, fragment.clone());
            Box::new(fragment) as Box<dyn Fragment>
        });

        let list = MemoryList::new();
        let classifier =
            QueueClassifier::new(&mut roster, PlainTemplate, factory, Box::new(list.clone()))
                .unwrap();
        Fixture {
            roster,
            list,
            fragments,
            classifier,
        }
    }

    fn keys(ids: &[u64]) -> Vec<EntryKey> {
        ids.iter().map(|&id| EntryKey::Remote(id)).collect()
    }

    #[test]
    fn test_initial_render_is_one_batch() {
        let fx = fixture(&[1, 2, 3]);
        assert_eq!(fx.list.attach_count(), 1);
        assert_eq!(fx.list.last(), Some(keys(&[1, 2, 3])));
        assert_eq!(fx.list.batches()[0].0, Bucket::Waiting);
        assert_eq!(fx.classifier.len(), 3);
    }

    #[test]
    fn test_waiting_rule_and_fallback() {
        let mut fx = fixture(&[1]);
        fx.roster
            .upsert(EntryPatch::new(2).res_type(Some("online")))
            .unwrap();
        fx.roster
            .upsert(EntryPatch::new(3).status(Status::Seat))
            .unwrap();

        let rule = fx.classifier.placement(EntryKey::Remote(1));
        assert_eq!(rule, Some((Bucket::Waiting, Placement::Rule)));
        for id in [2, 3] {
            assert_eq!(
                fx.classifier.placement(EntryKey::Remote(id)),
                Some((Bucket::Waiting, Placement::Fallback))
            );
        }
        assert_eq!(fx.classifier.bucket(Bucket::Waiting), keys(&[1, 2, 3]));
        assert!(fx.classifier.bucket(Bucket::Reserved).is_empty());
    }

    #[test]
    fn test_status_change_does_not_duplicate() {
        let fx = fixture(&[1, 2]);
        fx.roster
            .apply(EntryKey::Remote(1), &EntryPatch::new(1).status(Status::Seat))
            .unwrap();
        fx.roster
            .apply(EntryKey::Remote(1), &EntryPatch::new(1).status(Status::Notify))
            .unwrap();

        assert_eq!(fx.classifier.bucket(Bucket::Waiting), keys(&[1, 2]));
        assert_eq!(
            fx.classifier.placement(EntryKey::Remote(1)),
            Some((Bucket::Waiting, Placement::Rule))
        );
        // One binding per entry: still a single structural render each.
        let renders = fx
            .classifier
            .with_binding(EntryKey::Remote(1), EntryBinding::structural_renders);
        assert_eq!(renders, Some(1));
    }

    #[test]
    fn test_tracks_additions_and_removals() {
        let mut fx = fixture(&[1, 2]);
        fx.roster.upsert(EntryPatch::new(3).name("late")).unwrap();
        assert_eq!(fx.classifier.bucket(Bucket::Waiting), keys(&[1, 2, 3]));

        let removed = fx.roster.remove(EntryKey::Remote(2)).unwrap();
        assert_eq!(fx.classifier.bucket(Bucket::Waiting), keys(&[1, 3]));
        assert_eq!(removed.subscriber_count(), 0);
    }

    #[test]
    fn test_membership_change_rerenders_visible_bucket() {
        let mut fx = fixture(&[1, 2]);
        assert_eq!(fx.list.attach_count(), 1);

        fx.roster.upsert(EntryPatch::new(3).name("late")).unwrap();
        assert_eq!(fx.list.attach_count(), 2);
        assert_eq!(fx.list.last(), Some(keys(&[1, 2, 3])));

        fx.roster.remove(EntryKey::Remote(1)).unwrap();
        assert_eq!(fx.list.attach_count(), 3);
        assert_eq!(fx.list.last(), Some(keys(&[2, 3])));

        // Updates that keep the entry in place leave the list alone.
        fx.roster
            .apply(EntryKey::Remote(2), &EntryPatch::new(2).status(Status::Notify))
            .unwrap();
        assert_eq!(fx.list.attach_count(), 3);
    }

    #[test]
    fn test_hidden_bucket_changes_do_not_render() {
        let mut fx = fixture(&[1]);
        fx.classifier.set_visible(Bucket::Seated);
        fx.roster.upsert(EntryPatch::new(2)).unwrap();
        fx.roster.remove(EntryKey::Remote(1)).unwrap();
        assert_eq!(fx.list.attach_count(), 1);
    }

    #[test]
    fn test_dropped_classifier_leaves_roster() {
        let Fixture {
            mut roster,
            classifier,
            ..
        } = fixture(&[1]);
        assert_eq!(roster.observer_count(), 1);
        drop(classifier);

        roster.upsert(EntryPatch::new(2)).unwrap();
        assert_eq!(roster.observer_count(), 0);
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_render_visible_bucket() {
        let fx = fixture(&[1]);
        fx.classifier.set_visible(Bucket::Seated);
        assert_eq!(fx.classifier.visible(), Bucket::Seated);
        fx.classifier.render();

        let batches = fx.list.batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1], (Bucket::Seated, Vec::new()));
    }

    #[test]
    fn test_bindings_follow_changes() {
        let fx = fixture(&[1]);
        fx.roster
            .apply(EntryKey::Remote(1), &EntryPatch::new(1).name("renamed"))
            .unwrap();

        let fragments = fx.fragments.borrow();
        let fragment = &fragments[&EntryKey::Remote(1)];
        assert_eq!(fragment.text(Slot::Name).as_deref(), Some("renamed"));
    }

    #[test]
    fn test_show_more() {
        let fx = fixture(&[1]);
        assert_eq!(fx.classifier.show_more(EntryKey::Remote(1)), Some(true));
        assert_eq!(fx.classifier.show_more(EntryKey::Remote(1)), Some(false));
        assert_eq!(fx.classifier.show_more(EntryKey::Remote(9)), None);
    }

    #[test]
    fn test_detach_stops_tracking() {
        let Fixture {
            mut roster,
            classifier,
            ..
        } = fixture(&[1]);
        let state = Rc::downgrade(&classifier.state);
        classifier.detach(&mut roster);
        assert!(state.upgrade().is_none());
        assert_eq!(roster.observer_count(), 0);

        roster.upsert(EntryPatch::new(2)).unwrap();
        assert_eq!(roster.len(), 2);
    }
}
