//! Client-server RPC protocol.
//!
//! This module defines the communication protocol between peers and the
//! asicd server, including message formats, encoding strategy, transport
//! abstraction, and the server's lifecycle machinery. It provides the
//! types and logic required to serialize, deserialize, and execute method
//! calls against a switch over the network.
//!
//! # Overview
//!
//! The protocol layer is responsible for how object-management calls
//! (create, remove, set, get, handle and capability queries) are
//! exchanged. Attribute
//! values travel in wire form; the server converts them through the
//! attribute codec before and after touching the hardware API, so the
//! codec is exercised on every method that carries a value.
//!
//! Messages are encoded using a compact binary format. This module
//! includes both the message definitions and higher-level abstractions
//! for sending and receiving protocol messages over a stream.
//!
//! # Key Components
//!
//! - [`Request`] / [`Response`]: the message set peers exchange.
//! - [`ProtocolTransport`]: abstraction over a bidirectional transport
//!   (e.g., TCP) used to exchange messages.
//! - [`RpcServer`]: executes requests against a switch.
//! - [`ServerHandle`]: verified startup and cooperative shutdown of the
//!   server worker thread.
//!
//! # Binary Format
//!
//! Frames are bincode-encoded with big-endian byte order and fixed-width
//! integers. Message enums carry stable discriminants for the wire; list
//! payloads carry their element count alongside the sequence, and the
//! server verifies the two agree before converting.
//!
//! # Lifecycle
//!
//! One worker thread owns the listener and processes requests to
//! completion in arrival order. `ServerHandle::start` does not return
//! until the listener is bound; `ServerHandle::stop` raises a shutdown
//! flag, wakes the worker, and joins it.
//!
//! # See Also
//!
//! - [`attr`](crate::attr): the attribute codec every method relies on.
//! - [`switch`](crate::switch): the device the server programs.
mod lifecycle;
mod request;
mod response;
mod server;
mod transport;

pub use lifecycle::{LifecycleError, ServerHandle};
pub use request::Request;
pub use response::{Response, ResponseError};
pub use server::RpcServer;
pub use transport::{ProtocolTransport, TransportError};
