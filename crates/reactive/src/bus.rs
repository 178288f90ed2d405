//! Per-owner change bus.
//!
//! `ChangeBus` routes a committed `ChangeSet` to subscribers. Scoped
//! subscribers register for one or more attributes and are indexed by
//! attribute, so a batch only visits the subscribers it concerns. Generic
//! subscribers hear every non-empty batch, after all scoped subscribers.
//!
//! A subscriber is invoked at most once per batch even when several of its
//! attributes changed together.

use crate::change_set::ChangeSet;
use crate::subscription::{ChangeCallback, Interest, SubscriptionId, SubscriptionManager};
use hashbrown::{HashMap, HashSet};
use waitboard_core::{Attr, AttrSet};

/// Attribute-level notification hub for one owner of type `T`.
pub struct ChangeBus<T> {
    /// Callbacks by subscription ID
    subscriptions: SubscriptionManager<T>,
    /// Attribute -> scoped subscriptions that listen to it
    by_attr: HashMap<Attr, Vec<SubscriptionId>>,
    /// Subscriptions to the generic "changed" event, in registration order
    any: Vec<SubscriptionId>,
}

impl<T> Default for ChangeBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ChangeBus<T> {
    /// Creates a bus with no subscribers.
    pub fn new() -> Self {
        Self {
            subscriptions: SubscriptionManager::new(),
            by_attr: HashMap::new(),
            any: Vec::new(),
        }
    }

    /// Subscribes to batches that change any of `attrs`.
    pub fn subscribe_attrs<F>(&mut self, attrs: AttrSet, callback: F) -> SubscriptionId
    where
        F: Fn(&T, &ChangeSet) + 'static,
    {
        let id = self.subscriptions.subscribe(Interest::Attrs(attrs), callback);
        for attr in attrs {
            self.by_attr.entry(attr).or_default().push(id);
        }
        id
    }

    /// Subscribes to every non-empty batch.
    pub fn subscribe_any<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&T, &ChangeSet) + 'static,
    {
        let id = self.subscriptions.subscribe(Interest::Any, callback);
        self.any.push(id);
        id
    }

    /// Unsubscribes by ID.
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(interest) = self.subscriptions.get(id).map(|s| s.interest()) else {
            return false;
        };

        match interest {
            Interest::Attrs(attrs) => {
                for attr in attrs {
                    if let Some(ids) = self.by_attr.get_mut(&attr) {
                        ids.retain(|&sub| sub != id);
                        if ids.is_empty() {
                            self.by_attr.remove(&attr);
                        }
                    }
                }
            }
            Interest::Any => self.any.retain(|&sub| sub != id),
        }

        self.subscriptions.unsubscribe(id)
    }

    /// Returns the callbacks that should see `changes`, in dispatch order.
    ///
    /// Owners that keep their state behind a `RefCell` collect listeners
    /// first, release any mutable borrow, then invoke them. That way a
    /// listener may subscribe or unsubscribe without tripping a borrow.
    pub fn listeners(&self, changes: &ChangeSet) -> Vec<ChangeCallback<T>> {
        if changes.is_empty() {
            return Vec::new();
        }

        let mut scoped: HashSet<SubscriptionId> = HashSet::new();
        for attr in changes.attrs() {
            if let Some(ids) = self.by_attr.get(&attr) {
                scoped.extend(ids.iter().copied());
            }
        }
        let mut scoped: Vec<SubscriptionId> = scoped.into_iter().collect();
        scoped.sort_unstable();

        scoped
            .into_iter()
            .chain(self.any.iter().copied())
            .filter_map(|id| self.subscriptions.get(id))
            .filter_map(|sub| sub.wants(changes))
            .collect()
    }

    /// Returns the number of subscriptions.
    #[inline]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns true if there are no subscriptions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use std::rc::Rc;
    use waitboard_core::AttrValue;

    fn change(attrs: &[Attr]) -> ChangeSet {
        let mut cs = ChangeSet::new();
        for &attr in attrs {
            cs.record(attr, AttrValue::Null, AttrValue::Int(1));
        }
        cs
    }

    fn dispatch<T>(bus: &ChangeBus<T>, owner: &T, changes: &ChangeSet) {
        for callback in bus.listeners(changes) {
            callback(owner, changes);
        }
    }

    #[test]
    fn test_bus_new() {
        let bus: ChangeBus<()> = ChangeBus::new();
        assert!(bus.is_empty());
        assert_eq!(bus.len(), 0);
    }

    #[test]
    fn test_bus_scoped_subscription() {
        let mut bus: ChangeBus<()> = ChangeBus::new();
        let count = Rc::new(RefCell::new(0));
        let count_clone = count.clone();

        bus.subscribe_attrs(AttrSet::of(&[Attr::Name]), move |_, _| {
            *count_clone.borrow_mut() += 1;
        });

        dispatch(&bus, &(), &change(&[Attr::Phone]));
        assert_eq!(*count.borrow(), 0);

        dispatch(&bus, &(), &change(&[Attr::Name]));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_bus_multi_attr_fires_once() {
        let mut bus: ChangeBus<()> = ChangeBus::new();
        let count = Rc::new(RefCell::new(0));
        let count_clone = count.clone();

        bus.subscribe_attrs(AttrSet::of(&[Attr::QuotedTime, Attr::MinWaiting]), move |_, _| {
            *count_clone.borrow_mut() += 1;
        });

        dispatch(&bus, &(), &change(&[Attr::QuotedTime, Attr::MinWaiting]));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_bus_any_after_scoped() {
        let mut bus: ChangeBus<()> = ChangeBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o1 = order.clone();
        bus.subscribe_any(move |_, _| o1.borrow_mut().push("any"));
        let o2 = order.clone();
        bus.subscribe_attrs(AttrSet::of(&[Attr::Status]), move |_, _| o2.borrow_mut().push("status"));
        let o3 = order.clone();
        bus.subscribe_attrs(AttrSet::of(&[Attr::Name]), move |_, _| o3.borrow_mut().push("name"));

        dispatch(&bus, &(), &change(&[Attr::Name, Attr::Status]));
        assert_eq!(*order.borrow(), vec!["status", "name", "any"]);
    }

    #[test]
    fn test_bus_any_skips_empty_batch() {
        let mut bus: ChangeBus<()> = ChangeBus::new();
        let count = Rc::new(RefCell::new(0));
        let count_clone = count.clone();
        bus.subscribe_any(move |_, _| *count_clone.borrow_mut() += 1);

        dispatch(&bus, &(), &ChangeSet::new());
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_bus_passes_owner_and_changes() {
        let mut bus: ChangeBus<String> = ChangeBus::new();
        let seen = Rc::new(RefCell::new(None));
        let seen_clone = seen.clone();

        bus.subscribe_any(move |owner: &String, changes: &ChangeSet| {
            *seen_clone.borrow_mut() = Some((owner.clone(), changes.attrs()));
        });

        dispatch(&bus, &"entry".to_string(), &change(&[Attr::PingCount]));
        let (owner, attrs) = seen.borrow().clone().unwrap();
        assert_eq!(owner, "entry");
        assert!(attrs.contains(Attr::PingCount));
    }

    #[test]
    fn test_bus_unsubscribe() {
        let mut bus: ChangeBus<()> = ChangeBus::new();
        let count = Rc::new(RefCell::new(0));
        let count_clone = count.clone();

        let id = bus.subscribe_attrs(AttrSet::of(&[Attr::Name, Attr::Phone]), move |_, _| {
            *count_clone.borrow_mut() += 1;
        });
        assert_eq!(bus.listeners(&change(&[Attr::Phone])).len(), 1);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert!(bus.listeners(&change(&[Attr::Name, Attr::Phone])).is_empty());
        assert!(bus.by_attr.is_empty());

        dispatch(&bus, &(), &change(&[Attr::Name]));
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_bus_listeners_released_before_call() {
        let bus = Rc::new(RefCell::new(ChangeBus::<()>::new()));
        let bus_clone = bus.clone();

        bus.borrow_mut().subscribe_any(move |_, _| {
            // Re-entrant subscription from inside a callback.
            bus_clone.borrow_mut().subscribe_any(|_, _| {});
        });

        let listeners = bus.borrow().listeners(&change(&[Attr::Name]));
        for callback in listeners {
            callback(&(), &change(&[Attr::Name]));
        }
        assert_eq!(bus.borrow().len(), 2);
    }
}
