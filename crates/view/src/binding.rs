//! Entry bindings.
//!
//! An `EntryBinding` keeps one fragment in sync with one entry. It paints the
//! fragment once on construction, then reacts to change batches: every row of
//! the handler table is subscribed to its own attributes, and a structural
//! re-render happens only when a batch touches `WHOLE_FRAGMENT_ATTRS`.
//!
//! The binding holds the entry weakly. Dropping the binding removes its
//! subscriptions from the entry.

use crate::fragment::{Fragment, Slot};
use crate::handlers::{UpdateFn, TARGETED_UPDATES};
use crate::template::Template;
use core::cell::{Cell, Ref, RefCell};
use std::rc::Rc;
use waitboard_core::{Attr, AttrSet, EntryKey, Result, SharedClock};
use waitboard_reactive::SubscriptionId;
use waitboard_roster::{Entry, SharedEntry, WeakEntry};

/// Attributes whose change re-renders the fragment structure.
pub const WHOLE_FRAGMENT_ATTRS: &[Attr] = &[Attr::UserResponse];

/// Class toggled on the response region by the show-more control.
pub const SHOWING_MORE_CLASS: &str = "showing-more";

struct BindingState {
    key: EntryKey,
    template: Rc<dyn Template>,
    clock: SharedClock,
    fragment: RefCell<Box<dyn Fragment>>,
    structural_renders: Cell<usize>,
    targeted_updates: Cell<usize>,
}

impl BindingState {
    /// Renders the structure through the template.
    ///
    /// A painted fragment only gets its inner container replaced so the
    /// classes on it survive. A fresh fragment is painted whole and then
    /// brought up to date by every targeted handler.
    fn render(&self, entry: &Entry) {
        let Ok(mut fragment) = self.fragment.try_borrow_mut() else {
            tracing::warn!(key = %self.key, "fragment busy, skipping render");
            return;
        };

        let is_rendered = fragment.is_rendered();
        let content = self.template.render(&entry.record(), is_rendered);
        self.structural_renders.set(self.structural_renders.get() + 1);

        if is_rendered {
            fragment.replace_container(content);
            return;
        }

        fragment.replace_all(content);
        let now = self.clock.now();
        for update in TARGETED_UPDATES {
            (update.apply)(entry, &mut **fragment, now);
        }
        self.targeted_updates
            .set(self.targeted_updates.get() + TARGETED_UPDATES.len());
    }

    fn run(&self, entry: &Entry, apply: UpdateFn) {
        let Ok(mut fragment) = self.fragment.try_borrow_mut() else {
            tracing::warn!(key = %self.key, "fragment busy, skipping update");
            return;
        };
        apply(entry, &mut **fragment, self.clock.now());
        self.targeted_updates.set(self.targeted_updates.get() + 1);
    }
}

/// Keeps one fragment in sync with one entry.
pub struct EntryBinding {
    state: Rc<BindingState>,
    entry: WeakEntry,
    subscriptions: Vec<SubscriptionId>,
}

impl EntryBinding {
    /// Paints `fragment` from the entry's current state and subscribes to
    /// its changes.
    pub fn new(
        entry: &SharedEntry,
        template: Rc<dyn Template>,
        fragment: Box<dyn Fragment>,
        clock: SharedClock,
    ) -> Result<Self> {
        let state = Rc::new(BindingState {
            key: entry.key(),
            template,
            clock,
            fragment: RefCell::new(fragment),
            structural_renders: Cell::new(0),
            targeted_updates: Cell::new(0),
        });

        state.render(&*entry.try_read()?);

        let mut binding = Self {
            state,
            entry: entry.downgrade(),
            subscriptions: Vec::with_capacity(TARGETED_UPDATES.len() + 1),
        };

        for update in TARGETED_UPDATES {
            let weak = Rc::downgrade(&binding.state);
            let apply = update.apply;
            let id = entry.subscribe_attrs(update.attr_set(), move |e, _| {
                if let Some(state) = weak.upgrade() {
                    state.run(e, apply);
                }
            })?;
            binding.subscriptions.push(id);
        }

        let weak = Rc::downgrade(&binding.state);
        let whole = AttrSet::of(WHOLE_FRAGMENT_ATTRS);
        let id = entry.subscribe_any(move |e, changes| {
            if !changes.touches(whole) {
                return;
            }
            if let Some(state) = weak.upgrade() {
                state.render(e);
            }
        })?;
        binding.subscriptions.push(id);

        Ok(binding)
    }

    #[inline]
    pub fn key(&self) -> EntryKey {
        self.state.key
    }

    /// Returns the number of structural renders, first paint included.
    pub fn structural_renders(&self) -> usize {
        self.state.structural_renders.get()
    }

    /// Returns the number of targeted handler runs.
    pub fn targeted_updates(&self) -> usize {
        self.state.targeted_updates.get()
    }

    /// Borrows the fragment, unless it is being updated.
    pub fn fragment(&self) -> Option<Ref<'_, dyn Fragment>> {
        self.state
            .fragment
            .try_borrow()
            .ok()
            .map(|guard| Ref::map(guard, |b| &**b))
    }

    /// Expands or collapses the response region. Returns true when expanded.
    pub fn toggle_show_more(&self) -> bool {
        let Ok(mut fragment) = self.state.fragment.try_borrow_mut() else {
            return false;
        };
        let expand = !fragment.has_class(Slot::ResponseRegion, SHOWING_MORE_CLASS);
        fragment.toggle_class(Slot::ResponseRegion, SHOWING_MORE_CLASS, expand);
        expand
    }

    pub fn is_showing_more(&self) -> bool {
        self.fragment()
            .is_some_and(|f| f.has_class(Slot::ResponseRegion, SHOWING_MORE_CLASS))
    }

    /// Returns the number of subscriptions this binding holds on its entry.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

impl Drop for EntryBinding {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.upgrade() {
            for id in self.subscriptions.drain(..) {
                entry.unsubscribe(id);
            }
        }
    }
}

impl core::fmt::Debug for EntryBinding {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EntryBinding")
            .field("key", &self.state.key)
            .field("structural_renders", &self.structural_renders())
            .field("targeted_updates", &self.targeted_updates())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::MemoryFragment;
    use waitboard_core::{ManualClock, Status, TimeSource, WaitlistConfig};
    use waitboard_roster::{EntryPatch, EntryRecord};

    const NOW: i64 = 2_000_000;

    struct Fixture {
        clock: Rc<ManualClock>,
        entry: SharedEntry,
        fragment: MemoryFragment,
        binding: EntryBinding,
    }

    fn fixture(patch: EntryPatch) -> Fixture {
        let clock = Rc::new(ManualClock::new(NOW));
        let config = Rc::new(WaitlistConfig::default().with_two_way_text(true));
        let (entry, _) = Entry::from_patch(EntryKey::Remote(1), config, &patch, clock.now());
        let entry = SharedEntry::new(entry);
        let fragment = MemoryFragment::new();
        let template = Rc::new(|record: &EntryRecord, rendered: bool| {
            format!("{}|{}|{}", record.name, record.response, rendered)
        });
        let binding = EntryBinding::new(
            &entry,
            template,
            Box::new(fragment.clone()),
            clock.clone(),
        )
        .unwrap();
        Fixture {
            clock,
            entry,
            fragment,
            binding,
        }
    }

    fn guest() -> EntryPatch {
        EntryPatch::new(1)
            .name("Ann")
            .created_at(NOW - 600)
            .quoted_time(20)
    }

    #[test]
    fn test_first_paint() {
        let fx = fixture(guest());
        assert_eq!(fx.fragment.render_counts(), (1, 0));
        assert_eq!(fx.binding.structural_renders(), 1);
        assert_eq!(fx.binding.targeted_updates(), TARGETED_UPDATES.len());
        assert_eq!(fx.fragment.dom().content.as_deref(), Some("Ann||false"));
        assert_eq!(fx.fragment.text(Slot::Name).as_deref(), Some("Ann"));
        assert_eq!(fx.fragment.text(Slot::MinutesQuoted).as_deref(), Some("(q:20)"));
        assert!(fx.fragment.has_class(Slot::Container, "status_queued"));
        assert_eq!(fx.binding.subscription_count(), TARGETED_UPDATES.len() + 1);
    }

    #[test]
    fn test_targeted_update_only() {
        let fx = fixture(guest());
        let before = fx.binding.targeted_updates();

        fx.entry.apply(&EntryPatch::new(1).name("Bea"), NOW).unwrap();

        assert_eq!(fx.fragment.text(Slot::Name).as_deref(), Some("Bea"));
        assert_eq!(fx.binding.targeted_updates(), before + 1);
        assert_eq!(fx.fragment.render_counts(), (1, 0));
    }

    #[test]
    fn test_whole_fragment_attr_rerenders_container() {
        let fx = fixture(guest());
        fx.entry
            .apply(&EntryPatch::new(1).user_response(Some("On my way")), NOW)
            .unwrap();

        assert_eq!(fx.fragment.render_counts(), (1, 1));
        assert_eq!(
            fx.fragment.dom().container.as_deref(),
            Some("Ann|Response: On my way|true")
        );
        assert!(fx.fragment.has_class(Slot::Container, "has_user_response"));
        // Container classes survive the container re-render.
        assert!(fx.fragment.has_class(Slot::Container, "status_queued"));
    }

    #[test]
    fn test_multi_attr_handler_runs_once() {
        let fx = fixture(guest());
        let before = fx.binding.targeted_updates();

        // Quoted time and minutes waiting change in the same batch.
        fx.clock.advance(300);
        fx.entry
            .apply(&EntryPatch::new(1).quoted_time(30), fx.clock.now())
            .unwrap();

        // quoted_time text, waiting text and urgency: three handlers once each.
        assert_eq!(fx.binding.targeted_updates(), before + 3);
    }

    #[test]
    fn test_urgency_follows_tick() {
        let fx = fixture(guest());
        assert_eq!(fx.fragment.classes(Slot::MinutesWaited), vec!["minutes-waited"]);

        fx.clock.set(NOW + 6 * 60);
        fx.entry.recompute_waiting_time(fx.clock.now()).unwrap();
        assert_eq!(
            fx.fragment.classes(Slot::MinutesWaited),
            vec!["minutes-waited", "warning"]
        );
        assert_eq!(fx.fragment.text(Slot::MinutesWaitingText).as_deref(), Some("16"));

        fx.clock.set(NOW + 10 * 60);
        fx.entry.recompute_waiting_time(fx.clock.now()).unwrap();
        assert_eq!(
            fx.fragment.classes(Slot::MinutesWaited),
            vec!["minutes-waited", "alert"]
        );
    }

    #[test]
    fn test_status_class_follows_cancel() {
        let fx = fixture(guest());
        fx.entry
            .apply(&EntryPatch::new(1).status(Status::Cancel), NOW)
            .unwrap();
        assert!(fx.fragment.has_class(Slot::Container, "status_noshow"));
        assert!(!fx.fragment.has_class(Slot::Container, "status_queued"));
        assert!(!fx.fragment.has_class(Slot::Container, "status_cancel"));
    }

    #[test]
    fn test_show_more_toggle() {
        let fx = fixture(guest());
        assert!(!fx.binding.is_showing_more());
        assert!(fx.binding.toggle_show_more());
        assert!(fx.binding.is_showing_more());
        assert!(!fx.binding.toggle_show_more());
        assert!(!fx.binding.is_showing_more());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let fx = fixture(guest());
        assert_eq!(fx.entry.subscriber_count(), TARGETED_UPDATES.len() + 1);
        let Fixture {
            entry,
            fragment,
            binding,
            ..
        } = fx;
        drop(binding);
        assert_eq!(entry.subscriber_count(), 0);

        entry.apply(&EntryPatch::new(1).name("Gone"), NOW).unwrap();
        assert_eq!(fragment.text(Slot::Name).as_deref(), Some("Ann"));
    }
}
