//! Waitboard Reactive - Attribute-level change notification.
//!
//! This crate implements the notification half of the waitlist engine. An
//! owner (an entry) diffs its state before and after an update into a
//! `ChangeSet`, then asks its `ChangeBus` for exactly the subscribers interested in
//! the attributes that moved, and invokes them once its own borrows are released.
//!
//! # Core Concepts
//!
//! - `Snapshot`: All attribute values of an owner at one instant
//! - `ChangeSet`: The attributes that changed in one batch, with old and new values
//! - `Interest`: What a subscriber listens for (specific attributes, or any change)
//! - `SubscriptionManager`: Stores subscriber callbacks by id
//! - `ChangeBus`: Routes a change set to the subscribers whose interest it meets
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use waitboard_core::{Attr, AttrSet, AttrValue};
//! use waitboard_reactive::{ChangeBus, ChangeSet};
//!
//! let mut bus: ChangeBus<()> = ChangeBus::new();
//! let hits = Rc::new(Cell::new(0));
//! let hits_clone = hits.clone();
//! bus.subscribe_attrs(AttrSet::of(&[Attr::Name]), move |_, _| hits_clone.set(hits_clone.get() + 1));
//!
//! let mut changes = ChangeSet::new();
//! changes.record(Attr::Phone, AttrValue::Null, "555".into());
//! assert!(bus.listeners(&changes).is_empty());
//!
//! changes.record(Attr::Name, "Ann".into(), "Bob".into());
//! for callback in bus.listeners(&changes) {
//!     callback(&(), &changes);
//! }
//! assert_eq!(hits.get(), 1);
//! ```

pub mod bus;
pub mod change_set;
pub mod subscription;

pub use bus::ChangeBus;
pub use change_set::{AttrChange, ChangeSet, Snapshot};
pub use subscription::{ChangeCallback, Interest, Subscription, SubscriptionId, SubscriptionManager};
