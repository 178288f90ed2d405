//! Shared entry handles.
//!
//! Entries are owned by the collection and observed by view bindings.
//! `SharedEntry` wraps the entry state and its change bus behind reference
//! counting; `WeakEntry` lets observers hold an entry without keeping it
//! alive after the collection drops it.

use crate::entry::Entry;
use crate::patch::EntryPatch;
use core::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};
use waitboard_core::{AttrSet, EntryKey, Error, Result, Timestamp};
use waitboard_reactive::{ChangeBus, ChangeSet, SubscriptionId};

struct EntryCell {
    key: EntryKey,
    state: RefCell<Entry>,
    bus: RefCell<ChangeBus<Entry>>,
}

/// A reference-counted entry with its change bus.
#[derive(Clone)]
pub struct SharedEntry(Rc<EntryCell>);

/// A non-owning entry handle.
#[derive(Clone)]
pub struct WeakEntry {
    key: EntryKey,
    cell: Weak<EntryCell>,
}

impl SharedEntry {
    pub fn new(entry: Entry) -> Self {
        Self(Rc::new(EntryCell {
            key: entry.key(),
            state: RefCell::new(entry),
            bus: RefCell::new(ChangeBus::new()),
        }))
    }

    #[inline]
    pub fn key(&self) -> EntryKey {
        self.0.key
    }

    /// Borrows the entry state.
    ///
    /// # Panics
    ///
    /// Panics if the entry is being mutated. Use `try_read` from code that may
    /// run inside a mutation.
    pub fn borrow(&self) -> Ref<'_, Entry> {
        self.0.state.borrow()
    }

    /// Borrows the entry state, failing if it is being mutated.
    pub fn try_read(&self) -> Result<Ref<'_, Entry>> {
        self.0
            .state
            .try_borrow()
            .map_err(|_| Error::entry_busy(self.key()))
    }

    /// Applies a patch and notifies subscribers of what changed.
    pub fn apply(&self, patch: &EntryPatch, now: Timestamp) -> Result<ChangeSet> {
        self.mutate(|entry| entry.apply(patch, now))
    }

    /// Recomputes waiting time and notifies subscribers of what changed.
    pub fn recompute_waiting_time(&self, now: Timestamp) -> Result<ChangeSet> {
        self.mutate(|entry| entry.recompute_waiting_time(now))
    }

    /// Recomputes waited time and notifies subscribers of what changed.
    pub fn recompute_waited_time(&self) -> Result<ChangeSet> {
        self.mutate(Entry::recompute_waited_time)
    }

    /// Subscribes to changes of any attribute in `attrs`.
    pub fn subscribe_attrs<F>(&self, attrs: AttrSet, callback: F) -> Result<SubscriptionId>
    where
        F: Fn(&Entry, &ChangeSet) + 'static,
    {
        let mut bus = self.bus_mut()?;
        Ok(bus.subscribe_attrs(attrs, callback))
    }

    /// Subscribes to every non-empty change batch.
    pub fn subscribe_any<F>(&self, callback: F) -> Result<SubscriptionId>
    where
        F: Fn(&Entry, &ChangeSet) + 'static,
    {
        let mut bus = self.bus_mut()?;
        Ok(bus.subscribe_any(callback))
    }

    /// Removes a subscription. Returns true if it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        match self.0.bus.try_borrow_mut() {
            Ok(mut bus) => bus.unsubscribe(id),
            Err(_) => false,
        }
    }

    /// Returns the number of subscriptions on this entry.
    pub fn subscriber_count(&self) -> usize {
        self.0.bus.try_borrow().map(|bus| bus.len()).unwrap_or(0)
    }

    pub fn downgrade(&self) -> WeakEntry {
        WeakEntry {
            key: self.key(),
            cell: Rc::downgrade(&self.0),
        }
    }

    /// Returns true if both handles point at the same entry.
    pub fn ptr_eq(&self, other: &SharedEntry) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn bus_mut(&self) -> Result<core::cell::RefMut<'_, ChangeBus<Entry>>> {
        self.0
            .bus
            .try_borrow_mut()
            .map_err(|_| Error::entry_busy(self.key()))
    }

    /// Runs `f` against the entry, then publishes the resulting batch.
    ///
    /// The mutable borrow ends before any subscriber runs, so subscribers
    /// may read the entry and manage subscriptions.
    fn mutate<F>(&self, f: F) -> Result<ChangeSet>
    where
        F: FnOnce(&mut Entry) -> ChangeSet,
    {
        let changes = {
            let mut entry = self
                .0
                .state
                .try_borrow_mut()
                .map_err(|_| Error::entry_busy(self.key()))?;
            f(&mut entry)
        };
        self.publish(&changes)?;
        Ok(changes)
    }

    fn publish(&self, changes: &ChangeSet) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let listeners = {
            let bus = self
                .0
                .bus
                .try_borrow()
                .map_err(|_| Error::entry_busy(self.key()))?;
            bus.listeners(changes)
        };
        tracing::trace!(
            key = %self.key(),
            changed = changes.len(),
            listeners = listeners.len(),
            "publishing entry changes"
        );

        let entry = self.try_read()?;
        for callback in listeners {
            callback(&entry, changes);
        }
        Ok(())
    }
}

impl core::fmt::Debug for SharedEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("SharedEntry").field(&self.key()).finish()
    }
}

impl WeakEntry {
    #[inline]
    pub fn key(&self) -> EntryKey {
        self.key
    }

    /// Returns the entry if it is still alive.
    pub fn upgrade(&self) -> Option<SharedEntry> {
        self.cell.upgrade().map(SharedEntry)
    }
}

impl core::fmt::Debug for WeakEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("WeakEntry").field(&self.key).finish()
    }
}
