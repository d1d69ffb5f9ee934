//! HTTP receivers: the subscription notification webhook and the local OAuth redirect target.
//!
//! Both are thin `axum` routers. The webhook answers Fitbit's verification handshake and hands
//! accepted notification batches to a [`NotificationSink`]; the callback receiver finishes the
//! authorization-code flow on the machine running the authorize helper.

pub mod callback;
pub mod sink;
pub mod webhook;

pub use callback::receive_authorization;
pub use sink::{ChannelSink, MemorySink, NotificationSink, SinkError};
pub use webhook::{SIGNATURE_HEADER, Notification, WebhookState, router, serve, serve_with_shutdown};
