//! Transport - ordered request/response queue to the script engine.
//!
//! # State machine
//!
//! ```text
//! Connecting ──connected──▶ Ready ──error / disconnect──▶ Error
//! ```
//!
//! Error is terminal. Requests queued after it are kept but never sent.
//!
//! # Wire format
//!
//! Outbound: `[u32 little-endian length][payload]` per request.
//! Inbound: whatever one read delivers is one complete JSON reply, handed to
//! the oldest pending callback. This assumes a single request in flight on
//! the remote side at a time.
//!
//! The state lives in a signal so effects can follow connection changes:
//!
//! ```ignore
//! let state = transport.state_signal();
//! let _stop = spark_signals::effect(move || {
//!     tracing::info!("script engine: {:?}", state.get());
//! });
//! ```

use std::collections::VecDeque;
use std::io;

use serde_json::Value;
use spark_signals::{signal, Signal};

use crate::error::{TransportError, TransportResult};

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Ready,
    Error,
}

/// Outcome of one non-blocking read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Data(Vec<u8>),
    /// Nothing available right now.
    Idle,
    /// The peer closed the connection.
    Closed,
}

/// Byte stream to the script engine.
pub trait Connection {
    /// Establish the connection.
    fn open(&mut self) -> io::Result<()>;

    /// Write all bytes.
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read everything currently available without blocking.
    fn receive(&mut self) -> io::Result<Incoming>;
}

/// Receives the parsed reply to one request.
pub type ReplyCallback = Box<dyn FnOnce(Value)>;

/// Prefix `payload` with its length.
pub fn frame(payload: &[u8]) -> TransportResult<Vec<u8>> {
    let length = u32::try_from(payload.len()).map_err(|_| TransportError::PayloadTooLarge(payload.len()))?;
    let mut framed = Vec::with_capacity(4 + payload.len());
    framed.extend_from_slice(&length.to_le_bytes());
    framed.extend_from_slice(payload);
    Ok(framed)
}

/// Request queue over a [`Connection`].
pub struct Transport<C: Connection> {
    connection: C,
    state: Signal<ConnectionState>,
    requests: VecDeque<Vec<u8>>,
    /// One entry per sent-or-queued request, in order.
    callbacks: VecDeque<Option<ReplyCallback>>,
}

impl<C: Connection> Transport<C> {
    pub fn new(connection: C) -> Self {
        Self {
            connection,
            state: signal(ConnectionState::Connecting),
            requests: VecDeque::new(),
            callbacks: VecDeque::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Handle to the state signal.
    pub fn state_signal(&self) -> Signal<ConnectionState> {
        self.state.clone()
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Requests not yet written to the socket.
    pub fn queued_requests(&self) -> usize {
        self.requests.len()
    }

    /// Replies still expected.
    pub fn pending_replies(&self) -> usize {
        self.callbacks.len()
    }

    /// Connect. A failed connect moves straight to Error.
    pub fn start(&mut self) {
        if self.state() != ConnectionState::Connecting {
            return;
        }
        match self.connection.open() {
            Ok(()) => self.on_connected(),
            Err(err) => {
                tracing::error!(target: "transport", error = %err, "failed to connect to script engine");
                self.enter_error();
            }
        }
    }

    /// Queue a request and its callback as a pair, then try to flush.
    pub fn process_request(&mut self, payload: Vec<u8>, callback: Option<ReplyCallback>) -> TransportResult<()> {
        let framed = frame(&payload)?;
        self.requests.push_back(framed);
        self.callbacks.push_back(callback);
        self.flush();
        Ok(())
    }

    /// Write queued requests.
    ///
    /// No-op unless Ready with a non-empty queue; requests simply wait
    /// while connecting.
    pub fn flush(&mut self) {
        if self.state() != ConnectionState::Ready || self.requests.is_empty() {
            tracing::trace!(
                target: "transport",
                state = ?self.state(),
                queued = self.requests.len(),
                "flush deferred"
            );
            return;
        }

        while let Some(request) = self.requests.pop_front() {
            if let Err(err) = self.connection.send(&request) {
                self.requests.push_front(request);
                self.on_socket_error(err);
                return;
            }
        }
    }

    pub fn on_connected(&mut self) {
        if self.state() != ConnectionState::Connecting {
            return;
        }
        tracing::debug!(target: "transport", "connected");
        self.state.set(ConnectionState::Ready);
        self.flush();
    }

    pub fn on_socket_error(&mut self, err: io::Error) {
        tracing::error!(target: "transport", error = %err, "socket error");
        self.enter_error();
    }

    pub fn on_disconnected(&mut self) {
        tracing::error!(target: "transport", pending = self.callbacks.len(), "script engine disconnected");
        self.enter_error();
    }

    fn enter_error(&mut self) {
        if self.state() == ConnectionState::Error {
            return;
        }
        tracing::debug!(target: "transport", from = ?self.state(), "entering error state");
        self.state.set(ConnectionState::Error);
    }

    /// Treat `data` as one reply and hand it to the oldest pending callback.
    pub fn on_ready_read(&mut self, data: &[u8]) {
        let Some(callback) = self.callbacks.pop_front() else {
            tracing::warn!(target: "transport", bytes = data.len(), "reply with no pending request");
            return;
        };
        let Some(callback) = callback else {
            return;
        };

        let reply = serde_json::from_slice(data).unwrap_or_else(|err| {
            tracing::warn!(target: "transport", error = %err, "reply is not valid JSON");
            Value::Null
        });
        callback(reply);
    }

    /// Read once from the connection and dispatch what arrived.
    pub fn poll(&mut self) {
        if self.state() != ConnectionState::Ready {
            return;
        }
        match self.connection.receive() {
            Ok(Incoming::Data(data)) => self.on_ready_read(&data),
            Ok(Incoming::Idle) => {}
            Ok(Incoming::Closed) => self.on_disconnected(),
            Err(err) => self.on_socket_error(err),
        }
    }
}
