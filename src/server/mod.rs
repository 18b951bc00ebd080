//! HTTP server for the chat relay.
//!
//! - [`chat_api`]: Routes, request validation, handlers
//! - [`error`]: HTTP-facing error taxonomy
//! - [`streaming`]: Byte-transparent SSE relay to the caller

pub mod chat_api;
pub mod error;
pub mod streaming;
