//! Rendered fragment seam.
//!
//! A `Fragment` is the rendered representation of one entry, addressed by
//! named `Slot`s. The rendering collaborator implements it over its real
//! document model; `MemoryFragment` keeps everything in memory for headless
//! use and tests.

use core::cell::RefCell;
use hashbrown::HashMap;
use std::rc::Rc;

/// Addressable parts of an entry fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The fragment's own element.
    Root,
    /// Inner container replaced on structural re-render.
    Container,
    Name,
    Phone,
    PartySize,
    Profile,
    /// Seat / check-in button.
    SeatButton,
    NotifyButton,
    NotifyCount,
    MinutesQuoted,
    MinutesWaitingText,
    MinutesWaited,
    MinutesInStoreLong,
    MinutesInStoreShort,
    /// Region the show-more toggle expands.
    ResponseRegion,
}

impl Slot {
    /// Returns the class name templates put on this slot's element.
    pub fn selector(self) -> &'static str {
        match self {
            Slot::Root => "entry",
            Slot::Container => "waitlist_container",
            Slot::Name => "entry-name",
            Slot::Phone => "phone",
            Slot::PartySize => "party-size",
            Slot::Profile => "profile",
            Slot::SeatButton => "sat",
            Slot::NotifyButton => "notify",
            Slot::NotifyCount => "notify_number",
            Slot::MinutesQuoted => "minutes-quoted",
            Slot::MinutesWaitingText => "minutes-waiting-text",
            Slot::MinutesWaited => "minutes-waited",
            Slot::MinutesInStoreLong => "minutes-instore-longform-text",
            Slot::MinutesInStoreShort => "minutes-instore-shortform-text",
            Slot::ResponseRegion => "response",
        }
    }
}

/// Mutable view of one rendered entry.
pub trait Fragment {
    /// Returns true once the structural content has been painted.
    fn is_rendered(&self) -> bool;

    /// Replaces the whole fragment content.
    fn replace_all(&mut self, content: String);

    /// Replaces only the inner container content, keeping its classes.
    fn replace_container(&mut self, content: String);

    fn set_text(&mut self, slot: Slot, text: &str);

    /// Adds `class` when `on`, removes it otherwise.
    fn toggle_class(&mut self, slot: Slot, class: &str, on: bool);

    /// Returns true if `slot` currently carries `class`.
    fn has_class(&self, slot: Slot, class: &str) -> bool;

    /// Replaces every class on `slot`.
    fn set_class_name(&mut self, slot: Slot, class_name: &str);

    /// Removes every class on `slot` starting with `prefix`.
    fn remove_class_prefix(&mut self, slot: Slot, prefix: &str);

    /// Sets a style property; `None` removes it.
    fn set_style(&mut self, slot: Slot, property: &str, value: Option<&str>);
}

/// In-memory fragment state.
#[derive(Clone, Debug, Default)]
pub struct MemoryDom {
    pub content: Option<String>,
    pub container: Option<String>,
    pub texts: HashMap<Slot, String>,
    pub classes: HashMap<Slot, Vec<String>>,
    pub styles: HashMap<(Slot, String), String>,
    /// Number of full structural renders
    pub full_renders: usize,
    /// Number of container-only re-renders
    pub container_renders: usize,
}

/// A fragment kept in memory.
///
/// Clones share state, so a test can keep one handle and hand the other to a
/// binding.
#[derive(Clone, Debug)]
pub struct MemoryFragment {
    dom: Rc<RefCell<MemoryDom>>,
}

impl Default for MemoryFragment {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFragment {
    pub fn new() -> Self {
        let mut dom = MemoryDom::default();
        dom.classes
            .insert(Slot::Root, vec![Slot::Root.selector().to_owned()]);
        Self {
            dom: Rc::new(RefCell::new(dom)),
        }
    }

    /// Returns a copy of the current state.
    pub fn dom(&self) -> MemoryDom {
        self.dom.borrow().clone()
    }

    pub fn text(&self, slot: Slot) -> Option<String> {
        self.dom.borrow().texts.get(&slot).cloned()
    }

    pub fn classes(&self, slot: Slot) -> Vec<String> {
        self.dom.borrow().classes.get(&slot).cloned().unwrap_or_default()
    }

    pub fn style(&self, slot: Slot, property: &str) -> Option<String> {
        self.dom
            .borrow()
            .styles
            .get(&(slot, property.to_owned()))
            .cloned()
    }

    /// Returns `(full, container)` render counts.
    pub fn render_counts(&self) -> (usize, usize) {
        let dom = self.dom.borrow();
        (dom.full_renders, dom.container_renders)
    }
}

impl Fragment for MemoryFragment {
    fn is_rendered(&self) -> bool {
        self.dom.borrow().container.is_some()
    }

    fn replace_all(&mut self, content: String) {
        let mut dom = self.dom.borrow_mut();
        dom.container = Some(content.clone());
        dom.content = Some(content);
        dom.full_renders += 1;
    }

    fn replace_container(&mut self, content: String) {
        let mut dom = self.dom.borrow_mut();
        dom.container = Some(content);
        dom.container_renders += 1;
    }

    fn set_text(&mut self, slot: Slot, text: &str) {
        self.dom.borrow_mut().texts.insert(slot, text.to_owned());
    }

    fn toggle_class(&mut self, slot: Slot, class: &str, on: bool) {
        let mut dom = self.dom.borrow_mut();
        let list = dom.classes.entry(slot).or_default();
        let present = list.iter().any(|c| c == class);
        if on && !present {
            list.push(class.to_owned());
        } else if !on && present {
            list.retain(|c| c != class);
        }
    }

    fn has_class(&self, slot: Slot, class: &str) -> bool {
        self.dom
            .borrow()
            .classes
            .get(&slot)
            .is_some_and(|list| list.iter().any(|c| c == class))
    }

    fn set_class_name(&mut self, slot: Slot, class_name: &str) {
        let list = class_name.split_whitespace().map(str::to_owned).collect();
        self.dom.borrow_mut().classes.insert(slot, list);
    }

    fn remove_class_prefix(&mut self, slot: Slot, prefix: &str) {
        if let Some(list) = self.dom.borrow_mut().classes.get_mut(&slot) {
            list.retain(|c| !c.starts_with(prefix));
        }
    }

    fn set_style(&mut self, slot: Slot, property: &str, value: Option<&str>) {
        let mut dom = self.dom.borrow_mut();
        let key = (slot, property.to_owned());
        match value {
            Some(value) => {
                dom.styles.insert(key, value.to_owned());
            }
            None => {
                dom.styles.remove(&key);
            }
        }
    }
}
