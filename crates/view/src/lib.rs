//! Waitboard View - Keeps rendered fragments in sync with roster entries.
//!
//! This crate maps entry changes onto the rendering collaborator:
//!
//! - `Fragment`, `Template`, `ListSink`: Seams to the rendering collaborator,
//!   with in-memory implementations for headless use
//! - `TARGETED_UPDATES`: Declarative table of per-attribute fragment updates
//! - `EntryBinding`: Paints one fragment and applies only the updates a
//!   change batch calls for
//! - `QueueClassifier`: Sorts bindings into display buckets and renders the
//!   visible bucket in a single batch
//! - `Urgency`: Wait-time urgency against the quoted wait
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use waitboard_core::{Bucket, EntryKey, ManualClock, WaitlistConfig};
//! use waitboard_roster::{EntryCollection, EntryPatch};
//! use waitboard_view::{Fragment, FragmentFactory, MemoryFragment, MemoryList, PlainTemplate, QueueClassifier};
//!
//! let clock = Rc::new(ManualClock::new(0));
//! let mut roster = EntryCollection::new(WaitlistConfig::default(), clock).unwrap();
//! roster.upsert(EntryPatch::new(1).name("Ann")).unwrap();
//!
//! let factory: FragmentFactory = Rc::new(|_: EntryKey| Box::new(MemoryFragment::new()) as Box<dyn Fragment>);
//! let list = MemoryList::new();
//! let classifier =
//!     QueueClassifier::new(&mut roster, PlainTemplate, factory, Box::new(list.clone())).unwrap();
//!
//! roster.upsert(EntryPatch::new(2).name("Bo")).unwrap();
//! classifier.render();
//! assert_eq!(list.last(), Some(vec![EntryKey::Remote(1), EntryKey::Remote(2)]));
//! assert_eq!(classifier.bucket(Bucket::Waiting).len(), 2);
//! ```

pub mod binding;
pub mod classifier;
pub mod fragment;
pub mod handlers;
pub mod sink;
pub mod template;
pub mod urgency;

pub use binding::{EntryBinding, SHOWING_MORE_CLASS, WHOLE_FRAGMENT_ATTRS};
pub use classifier::{place, FragmentFactory, Placement, QueueClassifier, PLACEMENT_ATTRS};
pub use fragment::{Fragment, MemoryDom, MemoryFragment, Slot};
pub use handlers::{handlers_for, TargetedUpdate, UpdateFn, TARGETED_UPDATES};
pub use sink::{ListSink, MemoryList, RenderBatch};
pub use template::{escape_markup, PlainTemplate, Template};
pub use urgency::{Urgency, MINUTES_WAITED_CLASS};
