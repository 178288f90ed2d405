//! Entry identity.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Identity assigned to an entry by the upstream system.
pub type EntryId = u64;

/// Counter for keys handed to entries that arrive without an identity.
static NEXT_LOCAL_KEY: AtomicU64 = AtomicU64::new(1);

/// Gets the next unique local key.
pub fn next_local_key() -> EntryKey {
    EntryKey::Local(NEXT_LOCAL_KEY.fetch_add(1, Ordering::SeqCst))
}

/// The key an entry is stored under in a roster.
///
/// Entries whose patch carried an `id` are keyed by it. Entries that arrived
/// without one still get a roster slot under a process-local key, so they
/// can be displayed and updated by reference, just not matched against later
/// upstream patches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKey {
    Remote(EntryId),
    Local(u64),
}

impl EntryKey {
    /// Returns the upstream identity, if any.
    #[inline]
    pub fn remote_id(&self) -> Option<EntryId> {
        match self {
            EntryKey::Remote(id) => Some(*id),
            EntryKey::Local(_) => None,
        }
    }
}

impl From<EntryId> for EntryKey {
    fn from(id: EntryId) -> Self {
        EntryKey::Remote(id)
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKey::Remote(id) => write!(f, "#{}", id),
            EntryKey::Local(n) => write!(f, "local-{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_local_key_unique() {
        let a = next_local_key();
        let b = next_local_key();
        assert_ne!(a, b);
        assert_eq!(a.remote_id(), None);
    }

    #[test]
    fn test_remote_key() {
        let key = EntryKey::from(9);
        assert_eq!(key.remote_id(), Some(9));
        assert_eq!(key.to_string(), "#9");
    }
}
