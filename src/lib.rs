//! chat-relay: streaming chat-completion relay.
//!
//! Accepts chat completion requests on a single endpoint, forwards them to a
//! configured upstream AI API with an injected bearer credential, and pipes
//! the upstream SSE response back to the caller byte-for-byte.

pub mod config;
pub mod metrics;
pub mod relay;
pub mod server;
