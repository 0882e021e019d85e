//! Bridge - native modules and the connection to the script engine.
//!
//! - [`ModuleRegistry`] holds the export table of every native module
//! - [`Transport`] pairs outgoing requests with incoming replies in order
//! - [`Executor`] encodes script calls onto the transport
//! - [`TcpConnection`] is the socket the transport normally runs over

mod executor;
mod module;
mod registry;
mod tcp;
mod transport;

pub use executor::{encode_js_call, Executor};
pub use module::{
    arg_tag, ExportBuilder, JsCall, MethodContext, MethodHandler, ModuleDescriptor, ModuleMethod,
    NativeModule,
};
pub use registry::ModuleRegistry;
pub use tcp::TcpConnection;
pub use transport::{frame, Connection, ConnectionState, Incoming, ReplyCallback, Transport};

#[cfg(test)]
pub(crate) use transport::tests::MemoryConnection;
