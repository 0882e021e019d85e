//! UI Manager - tag-addressed commands on the element tree.
//!
//! The script side refers to elements by integer [`Tag`]. The UI Manager
//! owns the tag map, the [`ElementTree`] and the [`LayoutTree`], and applies
//! create/update/reparent/remove/measure commands to all three in lockstep.
//!
//! # Failure policy
//!
//! Unknown tags and unknown view types are logged and the command is
//! dropped; the tag map is never left half-updated. Commands still return
//! the error so callers can observe it.
//!
//! # Layout
//!
//! Tree mutations only mark layout as pending (`polish`). The pass runs in
//! `update_polish`, which the event loop calls once per batch and which
//! `measure` calls before reading geometry. Each completed pass bumps the
//! `layout_revision` signal.

mod commands;
mod constants;
mod snapshot;

pub use commands::{CallbackInvocation, COMMANDS};
pub use constants::ui_constants;
pub use snapshot::{
    check_size, file_url, load_snapshot, parse_color, rejection, save_snapshot, Rasterizer, SnapshotFormat,
    SnapshotOptions, SnapshotSource,
};

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{json, Value};
use spark_signals::{signal, Signal};

use crate::bridge::{JsCall, MethodContext, ModuleMethod, ModuleRegistry, NativeModule};
use crate::config::{HostConfig, SnapshotConfig, WindowConfig};
use crate::element::{Element, ElementFlags, ElementId, ElementTree};
use crate::error::{BridgeError, SnapshotError, UiError, UiResult};
use crate::layout::{LayoutTree, StyleProperty, StyleValue};
use crate::managers::{component_name, ComponentData, PropertyOutcome, ViewManager};
use crate::types::{Frame, Point, PropMap, Tag};

/// Root tags are handed out in steps of this size.
const ROOT_TAG_STRIDE: Tag = 10;

/// Maximum parent hops `measure_layout` walks before giving up.
const MAX_ANCESTOR_DEPTH: usize = 30;

const ROOT_VIEW_TYPE: &str = "RCTRootView";

/// Central authority over tagged elements.
pub struct UIManager {
    components: Vec<ComponentData>,
    by_component: HashMap<String, usize>,

    elements: ElementTree,
    layout: LayoutTree,
    views: HashMap<Tag, ElementId>,

    root_tag: Option<Tag>,
    next_root_tag: Tag,
    window: WindowConfig,

    layout_pending: bool,
    style_dirty: Rc<Cell<bool>>,
    layout_revision: Signal<u64>,

    disposals: Vec<ElementId>,
    js_calls: Vec<JsCall>,

    snapshot_config: SnapshotConfig,
    snapshot_source: Box<dyn SnapshotSource>,
}

impl UIManager {
    /// Manager for the given view components, usually
    /// [`ModuleRegistry::view_managers`].
    pub fn new(components: &[ComponentData], config: &HostConfig) -> Self {
        let by_component = components
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();

        let style_dirty = Rc::new(Cell::new(false));
        let mut layout = LayoutTree::new();
        let dirty = style_dirty.clone();
        layout.set_change_listener(move |_, _| dirty.set(true));

        Self {
            components: components.to_vec(),
            by_component,
            elements: ElementTree::new(),
            layout,
            views: HashMap::new(),
            root_tag: None,
            next_root_tag: 1,
            window: config.window.clone(),
            layout_pending: false,
            style_dirty,
            layout_revision: signal(0),
            disposals: Vec::new(),
            js_calls: Vec::new(),
            snapshot_config: config.snapshot.clone(),
            snapshot_source: Box::new(Rasterizer),
        }
    }

    /// Replace the renderer used by `take_snapshot`.
    pub fn set_snapshot_source(&mut self, source: impl SnapshotSource + 'static) {
        self.snapshot_source = Box::new(source);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn elements(&self) -> &ElementTree {
        &self.elements
    }

    pub fn layout(&self) -> &LayoutTree {
        &self.layout
    }

    pub fn root_tag(&self) -> Option<Tag> {
        self.root_tag
    }

    /// Element registered under `tag`.
    pub fn view_for_tag(&self, tag: Tag) -> Option<&Element> {
        self.views.get(&tag).and_then(|&id| self.elements.get(id))
    }

    pub fn contains_tag(&self, tag: Tag) -> bool {
        self.views.contains_key(&tag)
    }

    /// Number of registered tags, root included.
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Tags of `tag`'s children, in z-order.
    pub fn child_tags(&self, tag: Tag) -> Vec<Tag> {
        let Some(&id) = self.views.get(&tag) else {
            return Vec::new();
        };
        self.elements
            .children(id)
            .iter()
            .filter_map(|&child| self.elements.get(child).map(|e| e.tag))
            .collect()
    }

    /// Incremented after every completed layout pass.
    pub fn layout_revision(&self) -> Signal<u64> {
        self.layout_revision.clone()
    }

    /// Take the script calls queued by view-manager commands.
    pub fn drain_js_calls(&mut self) -> Vec<JsCall> {
        std::mem::take(&mut self.js_calls)
    }

    fn lookup(&self, tag: Tag, command: &str) -> UiResult<ElementId> {
        match self.views.get(&tag) {
            Some(&id) => Ok(id),
            None => {
                tracing::warn!(target: "ui_manager", tag, command, "attempting to access unknown view");
                Err(UiError::UnknownView(tag))
            }
        }
    }

    fn component(&self, view_type: &str) -> Option<&ComponentData> {
        self.by_component
            .get(view_type)
            .or_else(|| self.by_component.get(&format!("RCT{view_type}")))
            .map(|&i| &self.components[i])
    }

    fn component_of(&self, id: ElementId) -> Option<&ComponentData> {
        let element = self.elements.get(id)?;
        self.by_component
            .get(component_name(&element.module_name))
            .map(|&i| &self.components[i])
    }

    fn manager_of(&self, id: ElementId) -> Option<Rc<dyn ViewManager>> {
        self.component_of(id).map(|c| c.manager.clone())
    }

    // =========================================================================
    // Roots
    // =========================================================================

    /// Next root tag: 1, 11, 21, ...
    pub fn allocate_root_tag(&mut self) -> Tag {
        let tag = self.next_root_tag;
        self.next_root_tag += ROOT_TAG_STRIDE;
        tag
    }

    /// Create the visual root under `tag`, sized to the window.
    pub fn register_root_view(&mut self, tag: Tag) -> UiResult<()> {
        if self.views.contains_key(&tag) {
            return Err(UiError::DuplicateTag(tag));
        }

        let mut element = Element::new(tag, ROOT_VIEW_TYPE, "");
        element.flags = ElementFlags::ROOT | ElementFlags::LAYOUT;
        let id = self.elements.allocate(element);
        let node = self.layout.create_node(id)?;
        self.layout
            .set_style_property(node, StyleProperty::Width, self.window.width.into())?;
        self.layout
            .set_style_property(node, StyleProperty::Height, self.window.height.into())?;

        self.views.insert(tag, id);
        self.root_tag = Some(tag);
        tracing::debug!(target: "ui_manager", tag, "registered root view");
        self.polish();
        Ok(())
    }

    /// Resize the window the root fills.
    pub fn set_root_size(&mut self, width: f32, height: f32) -> UiResult<()> {
        self.window.width = width;
        self.window.height = height;

        if let Some(node) = self
            .root_tag
            .and_then(|tag| self.views.get(&tag))
            .and_then(|&id| self.layout.find_for_element(id))
        {
            self.layout.set_style_property(node, StyleProperty::Width, width.into())?;
            self.layout.set_style_property(node, StyleProperty::Height, height.into())?;
        }
        self.polish();
        Ok(())
    }

    // =========================================================================
    // Tree commands
    // =========================================================================

    /// Create an element of `view_type` under `tag`.
    pub fn create_view(&mut self, tag: Tag, view_type: &str, root_tag: Tag, props: &PropMap) -> UiResult<()> {
        let Some(component) = self.component(view_type).cloned() else {
            tracing::error!(target: "ui_manager", tag, view_type, "attempt to create unknown view type");
            return Err(UiError::UnknownViewType(view_type.to_string()));
        };
        if self.views.contains_key(&tag) {
            tracing::warn!(target: "ui_manager", tag, view_type, "tag already in use");
            return Err(UiError::DuplicateTag(tag));
        }

        let manager = component.manager;
        let Some(element) = manager.create(tag, &component.name) else {
            tracing::warn!(target: "ui_manager", tag, view_type, "failed to create view");
            return Err(UiError::CreateFailed(view_type.to_string()));
        };

        let id = self.elements.allocate(element);
        if manager.should_layout() {
            if let Err(err) = self.attach_layout(id, manager.as_ref()) {
                self.elements.release(id);
                return Err(err.into());
            }
        }

        self.views.insert(tag, id);
        tracing::trace!(target: "ui_manager", tag, view_type, root_tag, "created view");

        if !props.is_empty() {
            self.apply_props(id, props)?;
        }
        Ok(())
    }

    fn attach_layout(&mut self, id: ElementId, manager: &dyn ViewManager) -> crate::error::LayoutResult<()> {
        let node = self.layout.create_node(id)?;
        if let Some(element) = self.elements.get_mut(id) {
            element.flags.insert(ElementFlags::LAYOUT);
        }
        if let Err(err) = manager.configure(id, &mut self.elements, &mut self.layout) {
            self.layout.destroy_node(node)?;
            return Err(err);
        }
        Ok(())
    }

    /// Apply a prop diff: style keys go to the layout node, the rest to the
    /// element's manager.
    fn apply_props(&mut self, id: ElementId, props: &PropMap) -> UiResult<()> {
        let manager = self.manager_of(id);
        let node = self.layout.find_for_element(id);
        let mut needs_measure = false;

        for (name, value) in props {
            let Some(element) = self.elements.get_mut(id) else {
                break;
            };
            if value.is_null() {
                element.props.remove(name);
            } else {
                element.props.insert(name.clone(), value.clone());
            }

            if let Some(property) = StyleProperty::from_name(name) {
                if let Some(node) = node {
                    self.layout
                        .set_style_property(node, property, StyleValue::from_json(value))?;
                }
                continue;
            }

            let outcome = manager
                .as_ref()
                .map(|m| m.apply_property(element, name, value))
                .unwrap_or(PropertyOutcome::Unhandled);
            match outcome {
                PropertyOutcome::NeedsMeasure => needs_measure = true,
                PropertyOutcome::Applied => {}
                PropertyOutcome::Unhandled => {
                    tracing::trace!(target: "ui_manager", prop = %name, "prop has no native handler");
                }
            }
        }

        if let (true, Some(node)) = (needs_measure, node) {
            self.layout.mark_dirty(node)?;
        }
        Ok(())
    }

    /// The single tree-shape mutation: remove, then insert, then relayout.
    ///
    /// `move_from`/`move_to` are accepted and ignored.
    pub fn manage_children(
        &mut self,
        container_tag: Tag,
        move_from: &[usize],
        move_to: &[usize],
        add_tags: &[Tag],
        add_at: &[usize],
        remove_at: &[usize],
    ) -> UiResult<()> {
        let Some(&container) = self.views.get(&container_tag) else {
            tracing::warn!(target: "ui_manager", container_tag, "attempting to manage children on an unknown container");
            return Err(UiError::UnknownView(container_tag));
        };

        if !move_from.is_empty() || !move_to.is_empty() {
            tracing::debug!(
                target: "ui_manager",
                container_tag,
                ?move_from,
                ?move_to,
                "move indices are not supported, ignoring"
            );
        }

        self.remove_children(container, remove_at)?;
        self.add_children(container, add_tags, add_at)?;

        self.polish();
        Ok(())
    }

    fn remove_children(&mut self, container: ElementId, indices: &[usize]) -> UiResult<()> {
        if indices.is_empty() {
            return Ok(());
        }

        // Resolve every index against the current child list first
        let children = self.elements.children(container).to_vec();
        let count = children.len();
        let mut removed = Vec::with_capacity(indices.len());
        for &index in indices {
            let child = children
                .get(index)
                .copied()
                .ok_or(crate::error::LayoutError::ChildIndexOutOfBounds { index, count })?;
            if !removed.contains(&child) {
                removed.push(child);
            }
        }

        if let Some(container_node) = self.layout.find_for_element(container) {
            let layout_indices: Vec<usize> = removed
                .iter()
                .filter_map(|&child| self.layout.find_for_element(child))
                .filter_map(|node| self.layout.child_index(container_node, node))
                .collect();
            self.layout.remove_children(container_node, &layout_indices)?;
        }

        for child in removed {
            self.elements.detach(child);
            self.unregister_subtree(child);
            self.disposals.push(child);
        }
        Ok(())
    }

    /// Drop every tag in `id`'s subtree from the tag map.
    fn unregister_subtree(&mut self, id: ElementId) {
        for descendant in self.elements.descendants(id) {
            if let Some(element) = self.elements.get_mut(descendant) {
                element.flags.insert(ElementFlags::DISPOSED);
                let tag = element.tag;
                if self.views.get(&tag) == Some(&descendant) {
                    self.views.remove(&tag);
                }
            }
        }
    }

    fn add_children(&mut self, container: ElementId, tags: &[Tag], indices: &[usize]) -> UiResult<()> {
        if tags.len() != indices.len() {
            tracing::warn!(
                target: "ui_manager",
                tags = tags.len(),
                indices = indices.len(),
                "add tags and indices differ in length"
            );
        }

        let container_manager = self.manager_of(container);
        let container_node = self.layout.find_for_element(container);

        for (&tag, &index) in tags.iter().zip(indices) {
            let Some(&child) = self.views.get(&tag) else {
                tracing::warn!(target: "ui_manager", tag, "attempting to add unknown view");
                continue;
            };

            if self.is_ancestor_or_self(child, container) {
                tracing::warn!(target: "ui_manager", tag, "refusing to add a view into its own subtree");
                continue;
            }

            match &container_manager {
                Some(manager) => manager.add_child(&mut self.elements, container, child, index),
                None => self.elements.insert_child(container, child, index),
            }

            let (Some(container_node), Some(child_node)) = (container_node, self.layout.find_for_element(child))
            else {
                continue;
            };

            // Layout index counts only siblings that take part in layout
            let siblings = self.elements.children(container);
            let position = siblings.iter().position(|&c| c == child).unwrap_or(siblings.len());
            let layout_index = siblings[..position]
                .iter()
                .filter(|&&s| self.layout.find_for_element(s).is_some())
                .count();
            self.layout.add_child(container_node, layout_index, child_node)?;
        }
        Ok(())
    }

    /// Whether `ancestor` is `id` or sits on its parent chain.
    fn is_ancestor_or_self(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(element) = current {
            if element == ancestor {
                return true;
            }
            current = self.elements.parent(element);
        }
        false
    }

    /// Append `child_tags` to `container_tag` at indices `0..n`.
    pub fn set_children(&mut self, container_tag: Tag, child_tags: &[Tag]) -> UiResult<()> {
        let indices: Vec<usize> = (0..child_tags.len()).collect();
        self.manage_children(container_tag, &[], &[], child_tags, &indices, &[])
    }

    /// Remove every child of `container_tag`.
    pub fn remove_subviews_from_container_with_id(&mut self, container_tag: Tag) -> UiResult<()> {
        let container = self.lookup(container_tag, "removeSubviewsFromContainerWithID")?;
        let indices: Vec<usize> = (0..self.elements.children(container).len()).collect();
        self.manage_children(container_tag, &[], &[], &[], &[], &indices)
    }

    /// Apply a prop diff to an existing element.
    pub fn update_view(&mut self, tag: Tag, view_type: &str, props: &PropMap) -> UiResult<()> {
        let Some(&id) = self.views.get(&tag) else {
            tracing::warn!(target: "ui_manager", tag, view_type, "attempting to update properties on unknown view");
            return Err(UiError::UnknownView(tag));
        };
        self.apply_props(id, props)?;
        self.polish();
        Ok(())
    }

    /// Put `new_tag` exactly where `tag` is and dispose of `tag`.
    pub fn replace_existing_non_root_view(&mut self, tag: Tag, new_tag: Tag) -> UiResult<()> {
        let Some(&old) = self.views.get(&tag) else {
            tracing::error!(target: "ui_manager", tag, "attempting to replace unknown view");
            return Err(UiError::UnknownView(tag));
        };
        let Some(parent) = self.elements.parent(old) else {
            tracing::error!(target: "ui_manager", tag, "view to replace has no parent");
            return Err(UiError::NoParent(tag));
        };
        let index = self
            .elements
            .child_index(parent, old)
            .ok_or(UiError::NoParent(tag))?;
        let parent_tag = self.elements.get(parent).map(|p| p.tag).ok_or(UiError::NoParent(tag))?;

        self.manage_children(parent_tag, &[], &[], &[new_tag], &[index], &[index])
    }

    /// Dispose of every element except the root, keeping the root's tag.
    pub fn reset(&mut self) {
        let root_tag = self.root_tag;
        let doomed: Vec<ElementId> = self
            .views
            .iter()
            .filter(|&(&tag, _)| Some(tag) != root_tag)
            .map(|(_, &id)| id)
            .collect();
        self.views.retain(|&tag, _| Some(tag) == root_tag);

        for &id in &doomed {
            if let Some(node) = self.layout.find_for_element(id) {
                if let Some(parent) = self.layout.parent(node) {
                    if let Some(index) = self.layout.child_index(parent, node) {
                        if let Err(err) = self.layout.remove_children(parent, &[index]) {
                            tracing::warn!(target: "layout", error = %err, "failed to detach layout node");
                        }
                    }
                }
            }
            self.elements.detach(id);
            if let Some(element) = self.elements.get_mut(id) {
                element.flags.insert(ElementFlags::DISPOSED);
            }
        }
        self.disposals.extend(doomed);
        self.process_pending_disposals();

        tracing::debug!(target: "ui_manager", remaining = self.views.len(), "reset");
        self.polish();
    }

    /// Free elements and layout nodes removed from the tree.
    pub fn process_pending_disposals(&mut self) {
        for id in std::mem::take(&mut self.disposals) {
            for element in self.elements.descendants(id) {
                if let Some(node) = self.layout.find_for_element(element) {
                    if let Err(err) = self.layout.destroy_node(node) {
                        tracing::warn!(target: "layout", error = %err, "failed to destroy layout node");
                    }
                }
                self.elements.release(element);
            }
        }
    }

    /// Elements waiting for disposal.
    pub fn pending_disposals(&self) -> usize {
        self.disposals.len()
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Schedule a layout pass on the root.
    pub fn polish(&mut self) {
        self.layout_pending = true;
    }

    /// Run the scheduled layout pass, if any.
    pub fn update_polish(&mut self) -> UiResult<()> {
        if !self.layout_pending && !self.style_dirty.get() {
            return Ok(());
        }
        let Some(root) = self.root_tag.and_then(|tag| self.views.get(&tag)).copied() else {
            return Ok(());
        };
        let node = self.layout.find_for_element(root);
        debug_assert!(node.is_some(), "root view has no layout node");
        let Some(node) = node else {
            return Ok(());
        };

        self.layout
            .recalculate_layout(node, self.window.width, self.window.height, &mut self.elements)?;
        self.layout_pending = false;
        self.style_dirty.set(false);

        let revision = self.layout_revision.get() + 1;
        self.layout_revision.set(revision);
        tracing::trace!(target: "layout", revision, "layout pass complete");
        Ok(())
    }

    /// End-of-batch hook: lay out, then free removed elements.
    pub fn on_batch_complete(&mut self) -> UiResult<()> {
        self.update_polish()?;
        self.process_pending_disposals();
        Ok(())
    }

    // =========================================================================
    // Measurement
    // =========================================================================

    /// `[x, y, width, height, pageX, pageY]`; empty for an unknown tag.
    ///
    /// `x, y` are relative to the parent, `pageX, pageY` to the visual root.
    pub fn measure(&mut self, tag: Tag) -> Vec<f32> {
        if let Err(err) = self.update_polish() {
            tracing::warn!(target: "layout", error = %err, "layout before measure failed");
        }
        let Ok(id) = self.lookup(tag, "measure") else {
            return Vec::new();
        };
        let Some(element) = self.elements.get(id) else {
            return Vec::new();
        };

        let frame = element.frame;
        let page = self.elements.absolute_origin(id) - self.root_origin();
        vec![frame.x, frame.y, frame.width, frame.height, page.x, page.y]
    }

    fn root_origin(&self) -> Point {
        self.root_tag
            .and_then(|tag| self.views.get(&tag))
            .and_then(|&id| self.elements.get(id))
            .map(|root| root.frame.origin())
            .unwrap_or_default()
    }

    /// Offset of `tag` within `ancestor_tag` plus its size.
    ///
    /// Walks at most 30 parents; if the ancestor is not reached the result
    /// is all zeros.
    pub fn measure_layout(&mut self, tag: Tag, ancestor_tag: Tag) -> UiResult<[f32; 4]> {
        if let Err(err) = self.update_polish() {
            tracing::warn!(target: "layout", error = %err, "layout before measure failed");
        }
        let item = self.lookup(tag, "measureLayout")?;
        let ancestor = self.lookup(ancestor_tag, "measureLayout")?;

        let Some(element) = self.elements.get(item) else {
            return Err(UiError::UnknownView(tag));
        };
        let (width, height) = (element.frame.width, element.frame.height);

        let mut current = Some(item);
        let mut offset = Point::default();
        let mut depth = MAX_ANCESTOR_DEPTH;
        while depth > 0 && current != Some(ancestor) {
            let Some(element) = current.and_then(|id| self.elements.get(id)) else {
                break;
            };
            offset = offset + element.frame.origin();
            current = element.parent;
            depth -= 1;
        }

        if current == Some(ancestor) {
            Ok([offset.x, offset.y, width, height])
        } else {
            Ok([0.0; 4])
        }
    }

    /// `measure_layout` against the element's visual parent.
    pub fn measure_layout_relative_to_parent(&mut self, tag: Tag) -> UiResult<[f32; 4]> {
        let id = self.lookup(tag, "measureLayoutRelativeToParent")?;
        let Some(parent_tag) = self.elements.parent(id).and_then(|p| self.elements.get(p)).map(|p| p.tag) else {
            tracing::warn!(target: "ui_manager", tag, "no parent item");
            return Err(UiError::NoParent(tag));
        };
        self.measure_layout(tag, parent_tag)
    }

    /// Deepest enabled element under `point` (in `tag`'s coordinates).
    ///
    /// Returns the hit element's tag and frame in `tag`'s coordinate space.
    pub fn find_subview_in(&mut self, tag: Tag, point: Point) -> Option<(Tag, Frame)> {
        if let Err(err) = self.update_polish() {
            tracing::warn!(target: "layout", error = %err, "layout before hit test failed");
        }
        let container = self.lookup(tag, "findSubviewIn").ok()?;

        let mut target = container;
        let mut local = point;
        loop {
            let hit = self
                .elements
                .children(target)
                .iter()
                .rev()
                .copied()
                .find(|&child| {
                    self.elements
                        .get(child)
                        .is_some_and(|c| c.frame.contains(local))
                });
            let Some(next) = hit else { break };
            let Some(next_element) = self.elements.get(next) else { break };
            if next_element.is_disabled() {
                break;
            }
            local = local - next_element.frame.origin();
            target = next;
        }

        let element = self.elements.get(target)?;
        let origin = self.elements.absolute_origin(target) - self.elements.absolute_origin(container);
        Some((
            element.tag,
            Frame::new(origin.x, origin.y, element.frame.width, element.frame.height),
        ))
    }

    // =========================================================================
    // Responder
    // =========================================================================

    pub fn set_js_responder(&mut self, tag: Tag, block_native_responder: bool) {
        tracing::trace!(target: "ui_manager", tag, block_native_responder, "setJSResponder");
    }

    pub fn clear_js_responder(&mut self) {
        tracing::trace!(target: "ui_manager", "clearJSResponder");
    }

    pub fn blur(&mut self, tag: Tag) {
        tracing::trace!(target: "ui_manager", tag, "blur");
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Invoke method `command_id` of the element's view manager with
    /// `[tag, ...args]`.
    pub fn dispatch_view_manager_command(
        &mut self,
        registry: &ModuleRegistry,
        tag: Tag,
        command_id: usize,
        args: &[Value],
    ) -> UiResult<()> {
        let id = self.lookup(tag, "dispatchViewManagerCommand")?;
        let Some(module_id) = self.component_of(id).map(|c| c.module_id) else {
            let module_name = self.elements.get(id).map(|e| e.module_name.clone()).unwrap_or_default();
            tracing::warn!(target: "ui_manager", tag, module = %module_name, "could not find valid module information");
            return Err(UiError::UnknownViewType(module_name));
        };

        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(json!(tag));
        call_args.extend_from_slice(args);

        let mut ctx = MethodContext::new();
        registry
            .invoke(module_id, command_id, &mut ctx, &call_args)
            .inspect_err(|err| {
                tracing::warn!(target: "ui_manager", tag, command_id, error = %err, "view manager command failed");
            })?;
        self.js_calls.extend(ctx.js_calls);
        Ok(())
    }

    /// Render `target` (`"window"` or a tag) to an image file.
    ///
    /// Resolves with a `file://` URL; rejects with `{"error": message}`.
    pub fn take_snapshot(&mut self, target: &str, options: &PropMap) -> Result<Value, Value> {
        self.snapshot(target, options)
            .map(|path| json!(file_url(&path)))
            .map_err(|err| {
                tracing::warn!(target: "snapshot", %target, error = %err, "snapshot failed");
                rejection(&err)
            })
    }

    fn snapshot(&mut self, target: &str, options: &PropMap) -> Result<std::path::PathBuf, SnapshotError> {
        let options = SnapshotOptions::from_props(options, &self.snapshot_config.default_format)?;
        if let Err(err) = self.update_polish() {
            tracing::warn!(target: "layout", error = %err, "layout before snapshot failed");
        }

        let (element, width, height) = if target == "window" {
            let root = self
                .root_tag
                .and_then(|tag| self.views.get(&tag))
                .copied()
                .ok_or(SnapshotError::ViewNotFound)?;
            (root, self.window.width, self.window.height)
        } else {
            let id = target
                .parse::<Tag>()
                .ok()
                .and_then(|tag| self.views.get(&tag))
                .copied()
                .ok_or(SnapshotError::ViewNotFound)?;
            let frame = self.elements.get(id).map(|e| e.frame).unwrap_or_default();
            (id, frame.width, frame.height)
        };

        let (width, height) = (width.round().max(1.0) as u32, height.round().max(1.0) as u32);
        check_size(width, height)?;

        let image = self.snapshot_source.render(&self.elements, element, width, height);
        save_snapshot(image, &options, &self.snapshot_config.directory())
    }
}

impl NativeModule for UIManager {
    fn module_name(&self) -> &str {
        "RCTUIManager"
    }

    fn methods_to_export(&self) -> Vec<ModuleMethod> {
        COMMANDS
            .iter()
            .map(|&name| {
                ModuleMethod::new(name, move |_, _| Err(BridgeError::Detached(name.to_string())))
            })
            .collect()
    }

    fn constants_to_export(&self) -> PropMap {
        ui_constants(&self.components, &self.window)
    }
}
