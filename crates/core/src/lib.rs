//! Waitboard Core - Core types for the Waitboard waitlist engine.
//!
//! This crate provides the foundational vocabulary shared by every layer:
//!
//! - `Attr` / `AttrSet`: The closed set of entry attribute names and a compact set of them
//! - `AttrValue`: Runtime values carried by change notifications
//! - `Status`, `Stage`, `ResponseKind`, `Bucket`: Entry state enums
//! - `EntryKey`: Identity of an entry inside a roster
//! - `TimeSource`: Injectable "current time" capability
//! - `WaitlistConfig`: Explicit configuration passed into entries and collections
//! - `Error`: Error types for roster operations
//!
//! # Example
//!
//! ```rust
//! use waitboard_core::{Attr, AttrSet, Status, Stage};
//!
//! let set = AttrSet::of(&[Attr::Status, Attr::CompletedAt]);
//! assert!(set.contains(Attr::Status));
//! assert!(!set.contains(Attr::Name));
//!
//! assert_eq!(Status::NoShow.stage(), Stage::History);
//! assert_eq!("callahead".parse::<Status>().unwrap(), Status::CallAhead);
//! ```

mod attr;
mod clock;
mod config;
mod error;
mod key;
mod status;
mod value;

pub use attr::{Attr, AttrSet, AttrSetIter};
pub use clock::{ManualClock, SharedClock, SystemClock, TimeSource, Timestamp};
pub use config::{WaitlistConfig, DEFAULT_TICK_INTERVAL_SECS};
pub use error::{Error, Result};
pub use key::{next_local_key, EntryId, EntryKey};
pub use status::{Bucket, ResponseKind, Stage, Status};
pub use value::AttrValue;
