//! Server push: connection, reconnect backoff, and event-driven cache
//! invalidation.

mod backoff;
mod client;
mod envelope;
mod transport;

pub use backoff::Backoff;
pub use client::{EventStreamClient, EventStreamHandle, StreamState};
pub use envelope::{parse_event, StreamEvent};
pub use transport::{
    event_payload, split_lines, EventLines, HttpPushTransport, PushTransport, MAX_LINE_BYTES,
};
