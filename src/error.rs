//! Error types.
//!
//! Cross-boundary failures (unknown tags, unknown modules, socket loss,
//! snapshot I/O) are values; the UI Manager logs them and drops the command.

use std::io;

use thiserror::Error;

use crate::types::Tag;

/// Failures inside the layout node wrapper.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("child index {index} out of bounds for node with {count} children")]
    ChildIndexOutOfBounds { index: usize, count: usize },

    #[error("unknown layout node")]
    UnknownNode,

    #[error("layout engine error: {0}")]
    Engine(String),
}

impl From<taffy::TaffyError> for LayoutError {
    fn from(err: taffy::TaffyError) -> Self {
        Self::Engine(format!("{err:?}"))
    }
}

/// Failures resolving or invoking exported module methods.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("unknown module: {0}")]
    UnknownModule(String),

    #[error("module {module} has no method with id {method_id}")]
    UnknownMethod { module: String, method_id: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("method {0} is only callable through its owning module")]
    Detached(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures on the script-engine connection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("socket error: {0}")]
    Io(#[from] io::Error),

    #[error("payload of {0} bytes does not fit a 4-byte length prefix")]
    PayloadTooLarge(usize),

    #[error("connection closed")]
    Closed,
}

/// Failures rendering or persisting a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Could not find view")]
    ViewNotFound,

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Snapshot size {width}x{height} exceeds the {max}px limit")]
    TooLarge { width: u32, height: u32, max: u32 },

    #[error("Unable to save image to file: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unable to save image to file: {0}")]
    Io(#[from] io::Error),
}

/// Failures applying a UI command.
#[derive(Debug, Error)]
pub enum UiError {
    #[error("unknown view tag {0}")]
    UnknownView(Tag),

    #[error("unknown view type {0}")]
    UnknownViewType(String),

    #[error("failed to create view of type {0}")]
    CreateFailed(String),

    #[error("view tag {0} is already registered")]
    DuplicateTag(Tag),

    #[error("view tag {0} has no parent")]
    NoParent(Tag),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Failures driving the host as a whole.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("host has not been started")]
    NotStarted,

    #[error(transparent)]
    Ui(#[from] UiError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failures loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file error: {0}")]
    Io(#[from] io::Error),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("config validation error: {0}")]
    Validation(String),
}

pub type LayoutResult<T> = Result<T, LayoutError>;
pub type BridgeResult<T> = Result<T, BridgeError>;
pub type TransportResult<T> = Result<T, TransportError>;
pub type UiResult<T> = Result<T, UiError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type HostResult<T> = Result<T, HostError>;
