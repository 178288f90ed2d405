//! Subscription management for change notifications.
//!
//! This module provides subscription IDs, interest filters and a manager for
//! tracking the callbacks registered on one change bus.

use crate::change_set::ChangeSet;
use hashbrown::HashMap;
use std::rc::Rc;
use waitboard_core::AttrSet;

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback type for change notifications.
///
/// Receives the owner after the change was committed and the batch of
/// changes. Callbacks are reference counted so a bus can hand them out and
/// release its own borrow before invoking them.
pub type ChangeCallback<T> = Rc<dyn Fn(&T, &ChangeSet)>;

/// What a subscriber wants to hear about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interest {
    /// Batches that change at least one of these attributes.
    Attrs(AttrSet),
    /// Every non-empty batch.
    Any,
}

impl Interest {
    /// Returns true if a subscriber with this interest should see `changes`.
    #[inline]
    pub fn matches(&self, changes: &ChangeSet) -> bool {
        match self {
            Interest::Attrs(attrs) => changes.touches(*attrs),
            Interest::Any => !changes.is_empty(),
        }
    }
}

/// A registered callback and what it listens for.
pub struct Subscription<T> {
    interest: Interest,
    callback: ChangeCallback<T>,
}

impl<T> Subscription<T> {
    /// Creates a new subscription.
    pub fn new<F>(interest: Interest, callback: F) -> Self
    where
        F: Fn(&T, &ChangeSet) + 'static,
    {
        Self {
            interest,
            callback: Rc::new(callback),
        }
    }

    #[inline]
    pub fn interest(&self) -> Interest {
        self.interest
    }

    /// Returns the callback if this subscription wants `changes`.
    pub fn wants(&self, changes: &ChangeSet) -> Option<ChangeCallback<T>> {
        self.interest
            .matches(changes)
            .then(|| Rc::clone(&self.callback))
    }
}

/// Manages the subscriptions registered on one bus.
pub struct SubscriptionManager<T> {
    /// Registered subscriptions
    subscriptions: HashMap<SubscriptionId, Subscription<T>>,
    /// Next subscription ID to assign
    next_id: SubscriptionId,
}

impl<T> Default for SubscriptionManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SubscriptionManager<T> {
    /// Creates a new subscription manager.
    pub fn new() -> Self {
        Self {
            subscriptions: HashMap::new(),
            next_id: 1,
        }
    }

    /// Subscribes with the given interest and callback.
    ///
    /// Returns the subscription ID that can be used to unsubscribe. IDs are
    /// handed out in increasing order, so they double as registration order.
    pub fn subscribe<F>(&mut self, interest: Interest, callback: F) -> SubscriptionId
    where
        F: Fn(&T, &ChangeSet) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.subscriptions.insert(id, Subscription::new(interest, callback));
        id
    }

    /// Unsubscribes by ID.
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Returns a subscription by ID.
    pub fn get(&self, id: SubscriptionId) -> Option<&Subscription<T>> {
        self.subscriptions.get(&id)
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
    use waitboard_core::{Attr, AttrValue};

    fn name_change() -> ChangeSet {
        let mut cs = ChangeSet::new();
        cs.record(Attr::Name, "a".into(), "b".into());
        cs
    }

    #[test]
    fn test_subscription_new() {
        let sub: Subscription<()> = Subscription::new(Interest::Any, |_, _| {});
        assert_eq!(sub.interest(), Interest::Any);
        assert!(sub.wants(&name_change()).is_some());
    }

    #[test]
    fn test_subscription_wants_filtered() {
        let sub: Subscription<()> =
            Subscription::new(Interest::Attrs(AttrSet::of(&[Attr::Phone])), |_, _| {});
        assert!(sub.wants(&name_change()).is_none());
    }

    #[test]
    fn test_interest_any_skips_empty() {
        assert!(!Interest::Any.matches(&ChangeSet::new()));
        assert!(Interest::Any.matches(&name_change()));
    }

    #[test]
    fn test_interest_attrs() {
        let mut cs = ChangeSet::new();
        cs.record(Attr::QuotedTime, AttrValue::Int(0), AttrValue::Int(20));
        let interest = Interest::Attrs(AttrSet::of(&[Attr::QuotedTime, Attr::MinWaiting]));
        assert!(interest.matches(&cs));
        assert!(!interest.matches(&name_change()));
    }

    #[test]
    fn test_subscription_manager_subscribe() {
        let mut manager: SubscriptionManager<()> = SubscriptionManager::new();

        let id1 = manager.subscribe(Interest::Any, |_, _| {});
        let id2 = manager.subscribe(Interest::Any, |_, _| {});

        assert_eq!(id1, 1);
        assert_eq!(id2, 2);
        assert_eq!(manager.len(), 2);
        assert!(manager.get(id2).is_some());
    }

    #[test]
    fn test_subscription_manager_unsubscribe() {
        let mut manager: SubscriptionManager<()> = SubscriptionManager::new();

        let id = manager.subscribe(Interest::Any, |_, _| {});
        assert_eq!(manager.len(), 1);

        assert!(manager.unsubscribe(id));
        assert!(manager.is_empty());
        assert!(manager.get(id).is_none());

        assert!(!manager.unsubscribe(id)); // Already removed
    }
}
