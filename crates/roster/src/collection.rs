//! The roster: an ordered, identity-unique set of entries and its sweep.
//!
//! `EntryCollection` owns every entry through a `SharedEntry` handle and an
//! `Interval` that periodically re-derives time-sensitive fields. The sweep
//! visits active entries only and isolates failures per entry: a busy entry
//! or a panicking subscriber is logged and skipped, never aborting the rest.

use crate::entry::Entry;
use crate::interval::Interval;
use crate::patch::EntryPatch;
use crate::shared::SharedEntry;
use hashbrown::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use waitboard_core::{
    next_local_key, EntryKey, Error, Result, SharedClock, Timestamp, WaitlistConfig,
};
use waitboard_reactive::ChangeSet;

/// Membership change broadcast to collection observers.
#[derive(Clone, Debug)]
pub enum RosterEvent {
    /// An entry joined the roster.
    Added(SharedEntry),
    /// An entry left the roster.
    Removed(EntryKey),
}

/// Callback type for membership changes.
/// Membership observer. Returning false drops the subscription.
pub type RosterCallback = Rc<dyn Fn(&RosterEvent) -> bool>;

/// Outcome of one sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Entries whose waiting time was recomputed
    pub swept: usize,
    /// Entries whose derived values actually changed
    pub changed: usize,
    /// Entries skipped because recomputation failed
    pub failed: Vec<EntryKey>,
}

impl TickReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Ordered roster of waitlist entries.
pub struct EntryCollection {
    config: Rc<WaitlistConfig>,
    clock: SharedClock,
    /// Entries in insertion order
    entries: Vec<SharedEntry>,
    /// Key -> position in `entries`
    index: HashMap<EntryKey, usize>,
    interval: Interval,
    observers: Vec<(u64, RosterCallback)>,
    next_observer: u64,
}

impl EntryCollection {
    /// Creates an empty roster after validating `config`.
    pub fn new(config: WaitlistConfig, clock: SharedClock) -> Result<Self> {
        config.validate()?;
        let interval = Interval::new(config.tick_interval_secs);
        Ok(Self {
            config: Rc::new(config),
            clock,
            entries: Vec::new(),
            index: HashMap::new(),
            interval,
            observers: Vec::new(),
            next_observer: 1,
        })
    }

    #[inline]
    pub fn config(&self) -> &WaitlistConfig {
        &self.config
    }

    /// Returns the current time of the roster's clock.
    #[inline]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Returns the roster's clock.
    pub fn clock(&self) -> SharedClock {
        Rc::clone(&self.clock)
    }

    /// Applies `patch` to the entry it identifies, creating the entry if it
    /// is not in the roster yet.
    ///
    /// A patch without identity always creates a new entry under a local key.
    pub fn upsert(&mut self, patch: EntryPatch) -> Result<EntryKey> {
        let key = match patch.id {
            Some(id) => EntryKey::Remote(id),
            None => next_local_key(),
        };

        if self.index.contains_key(&key) {
            self.apply(key, &patch)?;
            return Ok(key);
        }

        let (entry, _) = Entry::from_patch(key, Rc::clone(&self.config), &patch, self.now());
        let shared = SharedEntry::new(entry);
        self.index.insert(key, self.entries.len());
        self.entries.push(shared.clone());

        tracing::debug!(%key, size = self.entries.len(), "entry added");
        self.broadcast(&RosterEvent::Added(shared));
        Ok(key)
    }

    /// Decodes a JSON record and upserts it.
    pub fn upsert_json(&mut self, json: &str) -> Result<EntryKey> {
        let patch = EntryPatch::from_json(json)?;
        self.upsert(patch)
    }

    /// Applies `patch` to an existing entry.
    pub fn apply(&self, key: EntryKey, patch: &EntryPatch) -> Result<ChangeSet> {
        let entry = self.get(key).ok_or_else(|| Error::entry_not_found(key))?;
        entry.apply(patch, self.now())
    }

    /// Removes an entry from the roster.
    pub fn remove(&mut self, key: EntryKey) -> Result<SharedEntry> {
        let pos = self
            .index
            .remove(&key)
            .ok_or_else(|| Error::entry_not_found(key))?;
        let removed = self.entries.remove(pos);
        for shared in &self.entries[pos..] {
            if let Some(slot) = self.index.get_mut(&shared.key()) {
                *slot -= 1;
            }
        }

        tracing::debug!(%key, size = self.entries.len(), "entry removed");
        self.broadcast(&RosterEvent::Removed(key));
        Ok(removed)
    }

    pub fn get(&self, key: EntryKey) -> Option<&SharedEntry> {
        self.index.get(&key).map(|&pos| &self.entries[pos])
    }

    #[inline]
    pub fn contains(&self, key: EntryKey) -> bool {
        self.index.contains_key(&key)
    }

    /// Returns the position of `key` in roster order.
    pub fn position(&self, key: EntryKey) -> Option<usize> {
        self.index.get(&key).copied()
    }

    /// Iterates entries in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &SharedEntry> {
        self.entries.iter()
    }

    pub fn keys(&self) -> Vec<EntryKey> {
        self.entries.iter().map(SharedEntry::key).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Subscribes to membership changes.
    pub fn subscribe<F>(&mut self, callback: F) -> u64
    where
        F: Fn(&RosterEvent) + 'static,
    {
        self.subscribe_while(move |event| {
            callback(event);
            true
        })
    }

    /// Subscribes to membership changes until `callback` returns false.
    pub fn subscribe_while<F>(&mut self, callback: F) -> u64
    where
        F: Fn(&RosterEvent) -> bool + 'static,
    {
        let id = self.next_observer;
        self.next_observer += 1;
        self.observers.push((id, Rc::new(callback)));
        id
    }

    /// Removes a membership subscription. Returns true if it existed.
    pub fn unsubscribe(&mut self, id: u64) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    /// Returns the number of membership subscriptions.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn broadcast(&mut self, event: &RosterEvent) {
        let observers = self.observers.clone();
        let mut dropped = Vec::new();
        for (id, callback) in &observers {
            if !callback(event) {
                dropped.push(*id);
            }
        }
        if !dropped.is_empty() {
            tracing::debug!(count = dropped.len(), "dropping finished roster observers");
            self.observers.retain(|(id, _)| !dropped.contains(id));
        }
    }

    /// Arms the recurring sweep.
    pub fn start(&mut self) {
        let now = self.now();
        self.interval.start(now);
        tracing::debug!(
            period = self.interval.period(),
            next_due = now.saturating_add(self.interval.period()),
            "roster sweep started"
        );
    }

    /// Cancels the recurring sweep. No tick fires afterwards.
    pub fn stop(&mut self) {
        if self.interval.is_armed() {
            self.interval.cancel();
            tracing::debug!("roster sweep stopped");
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.interval.is_armed()
    }

    /// Runs the sweep if a period has elapsed.
    ///
    /// Several missed periods coalesce into one sweep, since recomputation
    /// only depends on the current time.
    pub fn poll(&mut self) -> Option<TickReport> {
        let missed = self.interval.poll(self.now());
        if missed == 0 {
            return None;
        }
        if missed > 1 {
            tracing::debug!(missed, "coalescing missed sweeps");
        }
        Some(self.tick())
    }

    /// Recomputes waiting time for every active entry.
    ///
    /// Completed entries keep the waiting time they had when they left the
    /// list.
    pub fn tick(&self) -> TickReport {
        let now = self.now();
        let mut report = TickReport::default();

        for shared in &self.entries {
            let key = shared.key();
            match shared.try_read() {
                Ok(entry) if !entry.is_active() => continue,
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(%key, error = %err, "skipping entry in sweep");
                    report.failed.push(key);
                    continue;
                }
            }

            match sweep_one(shared, now) {
                Ok(changes) => {
                    report.swept += 1;
                    if !changes.is_empty() {
                        report.changed += 1;
                    }
                }
                Err(err) => {
                    tracing::warn!(%key, error = %err, "entry failed during sweep");
                    report.failed.push(key);
                }
            }
        }

        tracing::debug!(
            now,
            swept = report.swept,
            changed = report.changed,
            failed = report.failed.len(),
            "roster sweep finished"
        );
        report
    }
}

/// Recomputes one entry, turning a subscriber panic into an error.
fn sweep_one(shared: &SharedEntry, now: Timestamp) -> Result<ChangeSet> {
    match panic::catch_unwind(AssertUnwindSafe(|| shared.recompute_waiting_time(now))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_owned());
            Err(Error::subscriber_panicked(shared.key(), message))
        }
    }
}

impl Drop for EntryCollection {
    fn drop(&mut self) {
        self.stop();
    }
}

impl core::fmt::Debug for EntryCollection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EntryCollection")
            .field("len", &self.entries.len())
            .field("interval", &self.interval)
            .finish()
    }
}
