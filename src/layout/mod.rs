//! Layout Module - flexbox layout for the element tree.
//!
//! Layout is computed with [Taffy](https://github.com/DioxusLabs/taffy).
//!
//! # Architecture
//!
//! 1. [`style`] resolves script-side style keys and values onto Taffy styles
//! 2. [`LayoutTree`] owns one engine node per layout-participating element,
//!    mirrors child order, and caches the attributes set on each node
//! 3. [`text_metrics`] gives text leaves an intrinsic size
//! 4. `recalculate_layout` computes a subtree and writes frames back through
//!    a [`GeometrySink`]
//!
//! # Example
//!
//! ```ignore
//! use std::collections::HashMap;
//! use spark_host::layout::{LayoutTree, StyleProperty};
//!
//! let mut tree = LayoutTree::new();
//! let root = tree.create_node(root_element)?;
//! tree.set_style_property(root, StyleProperty::Width, 800.0.into())?;
//!
//! let mut frames = HashMap::new();
//! tree.recalculate_layout(root, 800.0, 600.0, &mut frames)?;
//! ```

mod layout_tree;
pub mod style;
pub mod text_metrics;

pub use layout_tree::{
    ChangeListener, ComputedEdges, GeometrySink, LayoutNode, LayoutNodeId, LayoutTree, MeasureFn,
};
pub use style::{base_style, StyleProperty, StyleValue};
pub use text_metrics::{line_count, string_width, widest_line, TextBlock};
