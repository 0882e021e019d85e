//! # spark-host
//!
//! Native host runtime for script-driven declarative UI trees.
//!
//! A script engine, reached over a socket, describes a UI as imperative
//! tree commands on integer tags. The host keeps the matching native element
//! tree, lays it out with flexbox, and answers measurements, snapshots and
//! events back across the bridge.
//!
//! ## Architecture
//!
//! ```text
//! script engine → Transport → Host → UIManager → LayoutTree → ElementTree
//! ```
//!
//! Elements live in an arena ([`element::ElementTree`]) and are addressed by
//! [`element::ElementId`]; the UI Manager maps script tags onto them. Each
//! element that takes part in layout owns one node in the
//! [`layout::LayoutTree`], whose computed frames are written back onto the
//! elements after every pass.
//!
//! ## Modules
//!
//! - [`types`] - Tags, frames, style keyword tables
//! - [`layout`] - Flexbox layout tree over taffy, style application, text metrics
//! - [`element`] - Visual element arena
//! - [`managers`] - View managers (View, Text, Button)
//! - [`bridge`] - Native modules, transport, script call encoding
//! - [`ui_manager`] - Tag-addressed commands, measurement, snapshots
//! - [`host`] - The whole call cycle wired together

pub mod bridge;
pub mod config;
pub mod element;
pub mod error;
pub mod host;
pub mod layout;
pub mod logging;
pub mod managers;
pub mod types;
pub mod ui_manager;

// Re-export commonly used items
pub use types::{Frame, Point, PropMap, Tag};

pub use error::{
    BridgeError, ConfigError, HostError, LayoutError, SnapshotError, TransportError, UiError,
};

pub use config::HostConfig;

pub use bridge::{
    Connection, ConnectionState, Executor, JsCall, ModuleDescriptor, ModuleRegistry, NativeModule,
    TcpConnection, Transport,
};

pub use element::{Element, ElementFlags, ElementId, ElementTree};

pub use layout::{LayoutTree, StyleProperty, StyleValue};

pub use managers::{ButtonManager, ContainerViewManager, TextManager, ViewManager};

pub use ui_manager::{CallbackInvocation, SnapshotSource, UIManager};

pub use host::Host;
