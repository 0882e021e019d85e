//! Layout Tree - Taffy nodes wrapping visual elements.
//!
//! Every layout-participating element owns exactly one engine node. The
//! node's context carries the owning element, a sparse cache of the style
//! attributes set on it, and an optional measure closure for leaves that
//! need intrinsic sizing.
//!
//! The tree also keeps the element → node reverse lookup, so commands that
//! only carry tags can reach a layout node without storing it anywhere else.
//!
//! # Layout pass
//!
//! `recalculate_layout` runs the engine over the subtree synchronously and
//! then walks the result depth-first, writing `x, y, width, height` onto each
//! element through a [`GeometrySink`]. Nothing is observable mid-pass.

use std::collections::HashMap;

use taffy::{AvailableSpace, NodeId, Size, Style, TaffyTree};

use crate::element::ElementId;
use crate::error::{LayoutError, LayoutResult};
use crate::types::Frame;

use super::style::{apply_style_property, base_style, StyleProperty, StyleValue};

/// Handle to one layout node.
pub type LayoutNodeId = NodeId;

/// Intrinsic sizing callback for a leaf.
pub type MeasureFn = Box<dyn FnMut(Size<Option<f32>>, Size<AvailableSpace>) -> Size<f32>>;

/// Called once for every style attribute whose cached value changed.
pub type ChangeListener = Box<dyn FnMut(LayoutNodeId, StyleProperty)>;

/// Receives computed geometry at the end of a layout pass.
pub trait GeometrySink {
    fn apply_geometry(&mut self, element: ElementId, frame: Frame);
}

impl GeometrySink for HashMap<ElementId, Frame> {
    fn apply_geometry(&mut self, element: ElementId, frame: Frame) {
        self.insert(element, frame);
    }
}

/// Per-node state stored as the engine node's context.
pub struct LayoutNode {
    element: ElementId,
    attributes: HashMap<StyleProperty, StyleValue>,
    measure: Option<MeasureFn>,
}

impl LayoutNode {
    fn new(element: ElementId) -> Self {
        Self {
            element,
            attributes: HashMap::new(),
            measure: None,
        }
    }
}

/// Computed edges of a node relative to its parent's box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComputedEdges {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub width: f32,
    pub height: f32,
}

/// Owner of all layout nodes for one runtime instance.
pub struct LayoutTree {
    engine: TaffyTree<LayoutNode>,
    by_element: HashMap<ElementId, LayoutNodeId>,
    listener: Option<ChangeListener>,
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutTree {
    pub fn new() -> Self {
        Self {
            engine: TaffyTree::new(),
            by_element: HashMap::new(),
            listener: None,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create the layout node for `element` and register the reverse lookup.
    pub fn create_node(&mut self, element: ElementId) -> LayoutResult<LayoutNodeId> {
        debug_assert!(
            !self.by_element.contains_key(&element),
            "element already owns a layout node"
        );
        let node = self
            .engine
            .new_leaf_with_context(base_style(), LayoutNode::new(element))?;
        self.by_element.insert(element, node);
        Ok(node)
    }

    /// Destroy a node.
    ///
    /// The node leaves its parent's child list before the engine frees it,
    /// so the parent never holds a dangling child. Its own children are
    /// orphaned, not destroyed.
    pub fn destroy_node(&mut self, node: LayoutNodeId) -> LayoutResult<()> {
        if let Some(parent) = self.engine.parent(node) {
            self.engine.remove_child(parent, node)?;
        }
        let element = self.element_of(node);
        self.engine.remove(node)?;
        if let Some(element) = element {
            self.by_element.remove(&element);
        }
        Ok(())
    }

    /// Layout node owned by `element`, if it participates in layout.
    pub fn find_for_element(&self, element: ElementId) -> Option<LayoutNodeId> {
        self.by_element.get(&element).copied()
    }

    /// Element owning `node`.
    pub fn element_of(&self, node: LayoutNodeId) -> Option<ElementId> {
        self.engine.get_node_context(node).map(|ctx| ctx.element)
    }

    /// Number of live layout nodes.
    pub fn len(&self) -> usize {
        self.by_element.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_element.is_empty()
    }

    // =========================================================================
    // Style
    // =========================================================================

    /// Install the listener notified on effective style changes.
    pub fn set_change_listener(&mut self, listener: impl FnMut(LayoutNodeId, StyleProperty) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Set one style attribute.
    ///
    /// Returns `Ok(false)` without touching the engine when `value` equals
    /// the cached value. Otherwise writes the engine style, updates the
    /// cache, notifies the listener once and returns `Ok(true)`.
    pub fn set_style_property(
        &mut self,
        node: LayoutNodeId,
        property: StyleProperty,
        value: StyleValue,
    ) -> LayoutResult<bool> {
        let ctx = self
            .engine
            .get_node_context_mut(node)
            .ok_or(LayoutError::UnknownNode)?;

        let cached = ctx.attributes.get(&property);
        let unchanged = match cached {
            Some(current) => *current == value,
            None => value == StyleValue::Undefined,
        };
        if unchanged {
            return Ok(false);
        }

        if value == StyleValue::Undefined {
            ctx.attributes.remove(&property);
        } else {
            ctx.attributes.insert(property, value.clone());
        }

        let mut style = self.engine.style(node)?.clone();
        apply_style_property(&mut style, property, &value);
        self.engine.set_style(node, style)?;

        if let Some(listener) = self.listener.as_mut() {
            listener(node, property);
        }
        Ok(true)
    }

    /// Cached attribute value, `None` when unset.
    pub fn style_property(&self, node: LayoutNodeId, property: StyleProperty) -> Option<&StyleValue> {
        self.engine
            .get_node_context(node)
            .and_then(|ctx| ctx.attributes.get(&property))
    }

    /// Engine style of a node.
    pub fn style(&self, node: LayoutNodeId) -> LayoutResult<&Style> {
        Ok(self.engine.style(node)?)
    }

    /// Install the intrinsic sizing callback for a leaf.
    pub fn set_measure_function(
        &mut self,
        node: LayoutNodeId,
        measure: impl FnMut(Size<Option<f32>>, Size<AvailableSpace>) -> Size<f32> + 'static,
    ) -> LayoutResult<()> {
        let ctx = self
            .engine
            .get_node_context_mut(node)
            .ok_or(LayoutError::UnknownNode)?;
        ctx.measure = Some(Box::new(measure));
        self.engine.mark_dirty(node)?;
        Ok(())
    }

    /// Invalidate cached measurements, e.g. after a leaf's text changed.
    pub fn mark_dirty(&mut self, node: LayoutNodeId) -> LayoutResult<()> {
        Ok(self.engine.mark_dirty(node)?)
    }

    // =========================================================================
    // Children
    // =========================================================================

    pub fn children(&self, node: LayoutNodeId) -> LayoutResult<Vec<LayoutNodeId>> {
        Ok(self.engine.children(node)?)
    }

    pub fn child_count(&self, node: LayoutNodeId) -> LayoutResult<usize> {
        Ok(self.engine.children(node)?.len())
    }

    pub fn parent(&self, node: LayoutNodeId) -> Option<LayoutNodeId> {
        self.engine.parent(node)
    }

    /// Position of `child` in `parent`'s child list.
    pub fn child_index(&self, parent: LayoutNodeId, child: LayoutNodeId) -> Option<usize> {
        self.engine
            .children(parent)
            .ok()
            .and_then(|children| children.iter().position(|&c| c == child))
    }

    /// Insert `child` at `index`; `index` must be in `0..=child_count`.
    pub fn add_child(
        &mut self,
        parent: LayoutNodeId,
        index: usize,
        child: LayoutNodeId,
    ) -> LayoutResult<()> {
        let count = self.child_count(parent)?;
        if index > count {
            return Err(LayoutError::ChildIndexOutOfBounds { index, count });
        }

        if let Some(previous) = self.engine.parent(child) {
            self.engine.remove_child(previous, child)?;
        }
        self.engine.insert_child_at_index(parent, index, child)?;
        Ok(())
    }

    /// Remove the children at `indices`.
    ///
    /// Indices refer to the child list as it is before any removal: all of
    /// them are resolved first, then the resolved nodes are removed.
    /// Repeated indices remove their child once.
    pub fn remove_children(
        &mut self,
        parent: LayoutNodeId,
        indices: &[usize],
    ) -> LayoutResult<Vec<LayoutNodeId>> {
        let children = self.engine.children(parent)?;
        let count = children.len();

        let mut to_remove = Vec::with_capacity(indices.len());
        for &index in indices {
            let child = children
                .get(index)
                .copied()
                .ok_or(LayoutError::ChildIndexOutOfBounds { index, count })?;
            if !to_remove.contains(&child) {
                to_remove.push(child);
            }
        }

        for &child in &to_remove {
            self.engine.remove_child(parent, child)?;
        }
        Ok(to_remove)
    }

    // =========================================================================
    // Layout pass
    // =========================================================================

    /// Compute layout for the subtree rooted at `root` and write geometry back.
    pub fn recalculate_layout(
        &mut self,
        root: LayoutNodeId,
        width: f32,
        height: f32,
        sink: &mut impl GeometrySink,
    ) -> LayoutResult<()> {
        let available = Size {
            width: AvailableSpace::Definite(width),
            height: AvailableSpace::Definite(height),
        };

        self.engine.compute_layout_with_measure(
            root,
            available,
            |known_dimensions, available_space, _node_id, context, _style| match context
                .and_then(|ctx| ctx.measure.as_mut())
            {
                Some(measure) => measure(known_dimensions, available_space),
                None => Size::ZERO,
            },
        )?;

        self.write_geometry(root, sink)
    }

    /// Depth-first walk writing each node's layout onto its element.
    fn write_geometry(&self, root: LayoutNodeId, sink: &mut impl GeometrySink) -> LayoutResult<()> {
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            let layout = self.engine.layout(node)?;
            let element = self.element_of(node).ok_or(LayoutError::UnknownNode)?;
            sink.apply_geometry(
                element,
                Frame::new(
                    layout.location.x,
                    layout.location.y,
                    layout.size.width,
                    layout.size.height,
                ),
            );

            let children = self.engine.children(node)?;
            stack.extend(children.into_iter().rev());
        }
        Ok(())
    }

    /// Last computed edges of a node, relative to its parent.
    pub fn computed_edges(&self, node: LayoutNodeId) -> LayoutResult<ComputedEdges> {
        let layout = self.engine.layout(node)?;
        let (parent_width, parent_height) = match self.engine.parent(node) {
            Some(parent) => {
                let parent_layout = self.engine.layout(parent)?;
                (parent_layout.size.width, parent_layout.size.height)
            }
            None => (layout.size.width, layout.size.height),
        };

        Ok(ComputedEdges {
            left: layout.location.x,
            top: layout.location.y,
            right: parent_width - layout.location.x - layout.size.width,
            bottom: parent_height - layout.location.y - layout.size.height,
            width: layout.size.width,
            height: layout.size.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn sized(tree: &mut LayoutTree, element: usize, width: f32, height: f32) -> LayoutNodeId {
        let node = tree.create_node(ElementId::new(element)).unwrap();
        tree.set_style_property(node, StyleProperty::Width, width.into()).unwrap();
        tree.set_style_property(node, StyleProperty::Height, height.into()).unwrap();
        node
    }

    fn order(tree: &LayoutTree, parent: LayoutNodeId) -> Vec<ElementId> {
        tree.children(parent)
            .unwrap()
            .into_iter()
            .map(|child| tree.element_of(child).unwrap())
            .collect()
    }

    #[test]
    fn test_create_and_find() {
        let mut tree = LayoutTree::new();
        let node = tree.create_node(ElementId::new(3)).unwrap();

        assert_eq!(tree.find_for_element(ElementId::new(3)), Some(node));
        assert_eq!(tree.element_of(node), Some(ElementId::new(3)));
        assert_eq!(tree.find_for_element(ElementId::new(4)), None);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_add_child_order() {
        let mut tree = LayoutTree::new();
        let root = sized(&mut tree, 0, 100.0, 100.0);
        let a = tree.create_node(ElementId::new(1)).unwrap();
        let b = tree.create_node(ElementId::new(2)).unwrap();
        let c = tree.create_node(ElementId::new(3)).unwrap();

        tree.add_child(root, 0, a).unwrap();
        tree.add_child(root, 1, c).unwrap();
        tree.add_child(root, 1, b).unwrap();

        assert_eq!(
            order(&tree, root),
            vec![ElementId::new(1), ElementId::new(2), ElementId::new(3)]
        );
        assert_eq!(tree.parent(b), Some(root));
        assert_eq!(tree.child_index(root, c), Some(2));
    }

    #[test]
    fn test_add_child_out_of_bounds() {
        let mut tree = LayoutTree::new();
        let root = tree.create_node(ElementId::new(0)).unwrap();
        let child = tree.create_node(ElementId::new(1)).unwrap();

        let err = tree.add_child(root, 1, child).unwrap_err();
        assert!(matches!(err, LayoutError::ChildIndexOutOfBounds { index: 1, count: 0 }));
        assert_eq!(tree.parent(child), None);
    }

    #[test]
    fn test_add_child_reparents() {
        let mut tree = LayoutTree::new();
        let first = tree.create_node(ElementId::new(0)).unwrap();
        let second = tree.create_node(ElementId::new(1)).unwrap();
        let child = tree.create_node(ElementId::new(2)).unwrap();

        tree.add_child(first, 0, child).unwrap();
        tree.add_child(second, 0, child).unwrap();

        assert_eq!(tree.child_count(first).unwrap(), 0);
        assert_eq!(tree.parent(child), Some(second));
    }

    #[test]
    fn test_remove_children_snapshot() {
        let mut tree = LayoutTree::new();
        let root = tree.create_node(ElementId::new(0)).unwrap();
        let a = tree.create_node(ElementId::new(1)).unwrap();
        let b = tree.create_node(ElementId::new(2)).unwrap();
        let c = tree.create_node(ElementId::new(3)).unwrap();
        tree.add_child(root, 0, a).unwrap();
        tree.add_child(root, 1, b).unwrap();
        tree.add_child(root, 2, c).unwrap();

        let removed = tree.remove_children(root, &[0, 2]).unwrap();

        assert_eq!(removed, vec![a, c]);
        assert_eq!(order(&tree, root), vec![ElementId::new(2)]);
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.parent(c), None);
    }

    #[test]
    fn test_remove_children_reverse_order_indices() {
        let mut tree = LayoutTree::new();
        let root = tree.create_node(ElementId::new(0)).unwrap();
        for i in 1..=3 {
            let child = tree.create_node(ElementId::new(i)).unwrap();
            tree.add_child(root, i - 1, child).unwrap();
        }

        tree.remove_children(root, &[2, 0]).unwrap();
        assert_eq!(order(&tree, root), vec![ElementId::new(2)]);
    }

    #[test]
    fn test_remove_children_repeated_index() {
        let mut tree = LayoutTree::new();
        let root = tree.create_node(ElementId::new(0)).unwrap();
        let a = tree.create_node(ElementId::new(1)).unwrap();
        let b = tree.create_node(ElementId::new(2)).unwrap();
        tree.add_child(root, 0, a).unwrap();
        tree.add_child(root, 1, b).unwrap();

        let removed = tree.remove_children(root, &[0, 0]).unwrap();

        assert_eq!(removed, vec![a]);
        assert_eq!(order(&tree, root), vec![ElementId::new(2)]);
    }

    #[test]
    fn test_remove_children_out_of_bounds_removes_nothing() {
        let mut tree = LayoutTree::new();
        let root = tree.create_node(ElementId::new(0)).unwrap();
        let a = tree.create_node(ElementId::new(1)).unwrap();
        tree.add_child(root, 0, a).unwrap();

        assert!(tree.remove_children(root, &[0, 5]).is_err());
        assert_eq!(tree.child_count(root).unwrap(), 1);
    }

    #[test]
    fn test_destroy_detaches_from_parent() {
        let mut tree = LayoutTree::new();
        let root = tree.create_node(ElementId::new(0)).unwrap();
        let a = tree.create_node(ElementId::new(1)).unwrap();
        let b = tree.create_node(ElementId::new(2)).unwrap();
        tree.add_child(root, 0, a).unwrap();
        tree.add_child(root, 1, b).unwrap();

        tree.destroy_node(a).unwrap();

        assert_eq!(order(&tree, root), vec![ElementId::new(2)]);
        assert_eq!(tree.find_for_element(ElementId::new(1)), None);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_recalculate_column_layout() {
        let mut tree = LayoutTree::new();
        let root = sized(&mut tree, 0, 100.0, 100.0);
        let a = tree.create_node(ElementId::new(1)).unwrap();
        tree.set_style_property(a, StyleProperty::Height, 10.0.into()).unwrap();
        let b = tree.create_node(ElementId::new(2)).unwrap();
        tree.set_style_property(b, StyleProperty::Height, 20.0.into()).unwrap();
        tree.add_child(root, 0, a).unwrap();
        tree.add_child(root, 1, b).unwrap();

        let mut frames = HashMap::new();
        tree.recalculate_layout(root, 100.0, 100.0, &mut frames).unwrap();

        assert_eq!(frames[&ElementId::new(0)], Frame::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(frames[&ElementId::new(1)], Frame::new(0.0, 0.0, 100.0, 10.0));
        assert_eq!(frames[&ElementId::new(2)], Frame::new(0.0, 10.0, 100.0, 20.0));
    }

    #[test]
    fn test_recalculate_row_with_padding() {
        let mut tree = LayoutTree::new();
        let root = sized(&mut tree, 0, 100.0, 50.0);
        tree.set_style_property(root, StyleProperty::FlexDirection, "row".into()).unwrap();
        tree.set_style_property(root, StyleProperty::PaddingLeft, 5.0.into()).unwrap();
        let a = sized(&mut tree, 1, 20.0, 10.0);
        let b = sized(&mut tree, 2, 30.0, 10.0);
        tree.add_child(root, 0, a).unwrap();
        tree.add_child(root, 1, b).unwrap();

        let mut frames = HashMap::new();
        tree.recalculate_layout(root, 100.0, 50.0, &mut frames).unwrap();

        assert_eq!(frames[&ElementId::new(1)].x, 5.0);
        assert_eq!(frames[&ElementId::new(2)].x, 25.0);

        let edges = tree.computed_edges(b).unwrap();
        assert_eq!(edges.left, 25.0);
        assert_eq!(edges.right, 45.0);
    }

    #[test]
    fn test_recalculate_is_idempotent() {
        let mut tree = LayoutTree::new();
        let root = sized(&mut tree, 0, 80.0, 60.0);
        tree.set_style_property(root, StyleProperty::JustifyContent, "center".into()).unwrap();
        let a = sized(&mut tree, 1, 20.0, 20.0);
        tree.set_style_property(a, StyleProperty::Margin, 3.0.into()).unwrap();
        tree.add_child(root, 0, a).unwrap();

        let mut first = HashMap::new();
        tree.recalculate_layout(root, 80.0, 60.0, &mut first).unwrap();
        let mut second = HashMap::new();
        tree.recalculate_layout(root, 80.0, 60.0, &mut second).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_measure_function() {
        let mut tree = LayoutTree::new();
        let root = sized(&mut tree, 0, 100.0, 100.0);
        tree.set_style_property(root, StyleProperty::FlexDirection, "row".into()).unwrap();
        tree.set_style_property(root, StyleProperty::AlignItems, "flex-start".into()).unwrap();

        let leaf = tree.create_node(ElementId::new(1)).unwrap();
        tree.set_measure_function(leaf, |known, _available| Size {
            width: known.width.unwrap_or(30.0),
            height: known.height.unwrap_or(12.0),
        })
        .unwrap();
        tree.add_child(root, 0, leaf).unwrap();

        let mut frames = HashMap::new();
        tree.recalculate_layout(root, 100.0, 100.0, &mut frames).unwrap();

        assert_eq!(frames[&ElementId::new(1)], Frame::new(0.0, 0.0, 30.0, 12.0));
    }

    #[test]
    fn test_style_change_notification() {
        let mut tree = LayoutTree::new();
        let notifications = Rc::new(Cell::new(0));
        let counter = notifications.clone();
        tree.set_change_listener(move |_, _| counter.set(counter.get() + 1));

        let node = tree.create_node(ElementId::new(0)).unwrap();

        assert!(tree.set_style_property(node, StyleProperty::FlexDirection, "row".into()).unwrap());
        assert_eq!(notifications.get(), 1);

        assert!(!tree.set_style_property(node, StyleProperty::FlexDirection, "row".into()).unwrap());
        assert_eq!(notifications.get(), 1);

        assert!(tree.set_style_property(node, StyleProperty::Width, 10.0.into()).unwrap());
        assert!(!tree.set_style_property(node, StyleProperty::Width, 10.0.into()).unwrap());
        assert_eq!(notifications.get(), 2);

        // Resetting an unset attribute is not a change
        assert!(!tree.set_style_property(node, StyleProperty::Height, StyleValue::Undefined).unwrap());
        assert_eq!(notifications.get(), 2);
    }

    #[test]
    fn test_unknown_keyword_is_cached() {
        let mut tree = LayoutTree::new();
        let node = tree.create_node(ElementId::new(0)).unwrap();

        assert!(tree.set_style_property(node, StyleProperty::FlexDirection, "diagonal".into()).unwrap());
        assert_eq!(
            tree.style_property(node, StyleProperty::FlexDirection),
            Some(&StyleValue::keyword("diagonal"))
        );
        assert_eq!(tree.style(node).unwrap().flex_direction, taffy::FlexDirection::Column);
    }

    #[test]
    fn test_direction_is_cached_only() {
        let mut tree = LayoutTree::new();
        let node = tree.create_node(ElementId::new(0)).unwrap();

        assert!(tree.set_style_property(node, StyleProperty::Direction, "rtl".into()).unwrap());
        assert_eq!(
            tree.style_property(node, StyleProperty::Direction),
            Some(&StyleValue::keyword("rtl"))
        );
    }
}
