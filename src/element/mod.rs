//! Element Tree - arena of visual elements.
//!
//! Elements are slots in an arena addressed by [`ElementId`]. Freed slots go
//! to a pool and are reused; when the last element is released the arena
//! resets completely.
//!
//! The arena holds the visual hierarchy only. Tag lookup lives in the UI
//! Manager and layout nodes live in the [`LayoutTree`](crate::layout::LayoutTree).

use std::cell::RefCell;
use std::rc::Rc;

use bitflags::bitflags;

use crate::layout::{GeometrySink, TextBlock};
use crate::types::{Frame, Point, PropMap, Tag};

/// Index of an element slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl ElementId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

bitflags! {
    /// Element state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ElementFlags: u8 {
        /// Owns a layout node.
        const LAYOUT   = 1 << 0;
        /// Registered as a root view.
        const ROOT     = 1 << 1;
        /// Ignores pointer input.
        const DISABLED = 1 << 2;
        /// Unregistered and waiting for disposal.
        const DISPOSED = 1 << 3;
    }
}

/// One visual element.
#[derive(Debug, Clone)]
pub struct Element {
    pub tag: Tag,
    /// Component name the element was created as, e.g. `"RCTView"`.
    pub view_type: String,
    /// Module name of the manager that created it, e.g. `"RCTViewManager"`.
    pub module_name: String,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub frame: Frame,
    /// Last value of every prop applied to the element.
    pub props: PropMap,
    pub flags: ElementFlags,
    /// Text content for text-bearing leaves, shared with their measure function.
    pub text: Option<Rc<RefCell<TextBlock>>>,
}

impl Element {
    pub fn new(tag: Tag, view_type: impl Into<String>, module_name: impl Into<String>) -> Self {
        Self {
            tag,
            view_type: view_type.into(),
            module_name: module_name.into(),
            parent: None,
            children: Vec::new(),
            frame: Frame::default(),
            props: PropMap::new(),
            flags: ElementFlags::empty(),
            text: None,
        }
    }

    pub fn participates_in_layout(&self) -> bool {
        self.flags.contains(ElementFlags::LAYOUT)
    }

    pub fn is_disabled(&self) -> bool {
        self.flags.contains(ElementFlags::DISABLED)
    }
}

/// Arena of elements with a free-slot pool.
#[derive(Debug, Default)]
pub struct ElementTree {
    slots: Vec<Option<Element>>,
    free: Vec<usize>,
    live: usize,
}

impl ElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Store an element, reusing a freed slot when one is available.
    pub fn allocate(&mut self, element: Element) -> ElementId {
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(element);
                index
            }
            None => {
                self.slots.push(Some(element));
                self.slots.len() - 1
            }
        };
        self.live += 1;
        ElementId(index)
    }

    /// Free a slot. The element is detached from its parent first; its
    /// children keep a dangling parent link and must be released by the caller.
    pub fn release(&mut self, id: ElementId) -> Option<Element> {
        self.detach(id);
        let element = self.slots.get_mut(id.0)?.take()?;
        self.live -= 1;
        self.free.push(id.0);

        if self.live == 0 {
            self.slots.clear();
            self.free.clear();
        }
        Some(element)
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    // =========================================================================
    // Hierarchy
    // =========================================================================

    /// Make `child` a visual child of `parent` at `index` (clamped to the end).
    pub fn insert_child(&mut self, parent: ElementId, child: ElementId, index: usize) {
        if !self.contains(parent) || !self.contains(child) {
            return;
        }
        self.detach(child);

        if let Some(p) = self.get_mut(parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    /// Remove `child` from its parent's child list.
    pub fn detach(&mut self, child: ElementId) {
        let Some(parent) = self.get(child).and_then(|c| c.parent) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = None;
        }
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.get(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn child_index(&self, parent: ElementId, child: ElementId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    /// `id` and everything below it, children before parents.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.collect_post_order(id, &mut out);
        out
    }

    fn collect_post_order(&self, id: ElementId, out: &mut Vec<ElementId>) {
        for &child in self.children(id) {
            self.collect_post_order(child, out);
        }
        if self.contains(id) {
            out.push(id);
        }
    }

    /// Origin of `id` in the coordinate space of its topmost ancestor.
    pub fn absolute_origin(&self, id: ElementId) -> Point {
        let mut origin = Point::default();
        let mut current = Some(id);
        while let Some(cur) = current {
            let Some(element) = self.get(cur) else { break };
            origin = origin + element.frame.origin();
            current = element.parent;
        }
        origin
    }
}

impl GeometrySink for ElementTree {
    fn apply_geometry(&mut self, element: ElementId, frame: Frame) {
        if let Some(e) = self.get_mut(element) {
            e.frame = frame;
        }
    }
}
