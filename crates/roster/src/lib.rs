//! Waitboard Roster - Waitlist entries and the collection that ticks them.
//!
//! This crate holds the state half of the engine:
//!
//! - `EntryPatch`: A partial record delivered by the upstream transport
//! - `Entry`: Authoritative and derived state of one waitlist entry, plus the
//!   derivation pipeline that keeps the two consistent
//! - `SharedEntry`: Shared handle pairing an entry with its `ChangeBus`
//! - `EntryCollection`: Ordered, identity-unique roster owning its entries and
//!   a recurring `Interval` that re-derives waiting times
//! - `EntryRecord`: Serializable, field-keyed snapshot for template rendering
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use waitboard_core::{ManualClock, Status, WaitlistConfig};
//! use waitboard_roster::{EntryCollection, EntryPatch};
//!
//! let clock = Rc::new(ManualClock::new(10_000));
//! let mut roster = EntryCollection::new(WaitlistConfig::default(), clock.clone()).unwrap();
//!
//! let key = roster
//!     .upsert(EntryPatch::new(1).name("Ann").created_at(10_000 - 600).quoted_time(20))
//!     .unwrap();
//!
//! let entry = roster.get(key).unwrap().borrow();
//! assert_eq!(entry.derived().min_waiting, 10);
//! assert_eq!(entry.derived().quoted_time_text, "(q:20)");
//! drop(entry);
//!
//! roster.upsert(EntryPatch::new(1).status(Status::Cancel)).unwrap();
//! assert_eq!(roster.get(key).unwrap().borrow().status(), Status::NoShow);
//! ```

pub mod collection;
pub mod derive;
pub mod entry;
pub mod interval;
pub mod patch;
pub mod record;
pub mod shared;

pub use collection::{EntryCollection, RosterCallback, RosterEvent, TickReport};
pub use entry::{Derived, Entry, EntryFields};
pub use interval::Interval;
pub use patch::EntryPatch;
pub use record::EntryRecord;
pub use shared::{SharedEntry, WeakEntry};
