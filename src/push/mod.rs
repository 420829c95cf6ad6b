//! Push transport: one authenticated Web Push delivery attempt per call.
//!
//! `PushTransport` is the seam the dispatcher depends on; `WebPushTransport`
//! is the production implementation (RFC 8030 delivery, RFC 8291 payload
//! encryption, RFC 8292 VAPID authentication).

mod transport;
mod vapid;
mod webpush_transport;

pub use transport::{PushDeliveryError, PushTransport};
pub use vapid::{VapidCredentials, VapidError};
pub use webpush_transport::WebPushTransport;
