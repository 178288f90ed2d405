//! Change set for tracking attribute changes.
//!
//! A ChangeSet represents the difference between two states of one owner,
//! containing the old and new value of every attribute that changed.

use waitboard_core::{Attr, AttrSet, AttrValue};

/// All attribute values of an owner at one instant, indexed by `Attr`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    values: Vec<AttrValue>,
}

impl Snapshot {
    /// Builds a snapshot by reading every attribute through `read`.
    pub fn capture<F>(mut read: F) -> Self
    where
        F: FnMut(Attr) -> AttrValue,
    {
        Self {
            values: Attr::ALL.iter().map(|&attr| read(attr)).collect(),
        }
    }

    /// Returns the captured value of `attr`.
    #[inline]
    pub fn get(&self, attr: Attr) -> &AttrValue {
        &self.values[attr as usize]
    }
}

/// One attribute that changed value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttrChange {
    pub attr: Attr,
    pub old: AttrValue,
    pub new: AttrValue,
}

/// The attributes that changed in one update batch.
///
/// Changes are kept in attribute declaration order regardless of the order
/// they were recorded in, so subscribers see a stable sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<AttrChange>,
    attrs: AttrSet,
}

impl ChangeSet {
    /// Creates a new empty change set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a change set holding every attribute whose value differs
    /// between the two snapshots.
    pub fn diff(before: &Snapshot, after: &Snapshot) -> Self {
        let mut changes = Self::new();
        for attr in Attr::ALL {
            let old = before.get(attr);
            let new = after.get(attr);
            if old != new {
                changes.attrs.insert(attr);
                changes.changes.push(AttrChange {
                    attr,
                    old: old.clone(),
                    new: new.clone(),
                });
            }
        }
        changes
    }

    /// Records a change of `attr` from `old` to `new`.
    ///
    /// Equal values are ignored. Recording an attribute twice keeps the first
    /// old value and the latest new value; if they end up equal the attribute
    /// is dropped. Returns true if the set now holds a change for `attr`.
    pub fn record(&mut self, attr: Attr, old: AttrValue, new: AttrValue) -> bool {
        if let Some(pos) = self.changes.iter().position(|c| c.attr == attr) {
            if self.changes[pos].old == new {
                self.changes.remove(pos);
                self.attrs.remove(attr);
                return false;
            }
            self.changes[pos].new = new;
            return true;
        }

        if old == new {
            return false;
        }

        let pos = self
            .changes
            .iter()
            .position(|c| c.attr > attr)
            .unwrap_or(self.changes.len());
        self.changes.insert(pos, AttrChange { attr, old, new });
        self.attrs.insert(attr);
        true
    }

    /// Returns true if there are no changes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns the number of changed attributes.
    #[inline]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns the set of changed attribute names.
    #[inline]
    pub fn attrs(&self) -> AttrSet {
        self.attrs
    }

    #[inline]
    pub fn contains(&self, attr: Attr) -> bool {
        self.attrs.contains(attr)
    }

    /// Returns true if any attribute in `attrs` changed.
    #[inline]
    pub fn touches(&self, attrs: AttrSet) -> bool {
        self.attrs.intersects(attrs)
    }

    /// Returns the change recorded for `attr`, if any.
    pub fn get(&self, attr: Attr) -> Option<&AttrChange> {
        if !self.contains(attr) {
            return None;
        }
        self.changes.iter().find(|c| c.attr == attr)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttrChange> {
        self.changes.iter()
    }
}
