//! Notification payloads and the fan-out dispatcher.
//!
//! # Dispatch flow
//!
//! 1. Take a snapshot: the caller's subscriptions, or every stored one
//! 2. Attempt each subscription once through the `PushTransport`
//! 3. Classify each result; endpoints reported gone (404/410 by default)
//!    are pruned from the store when the snapshot came from it
//! 4. Return a `DispatchReport` ordered like the snapshot
//!
//! Only a failure to read the snapshot fails the call; per-recipient
//! failures are always folded into the report.

mod classify;
mod dispatcher;
mod payload;
mod report;

pub use classify::{classify, Classification, GONE_STATUS_CODES};
pub use dispatcher::{
    DispatchError, DispatchPolicy, DispatcherStats, DispatcherStatsSnapshot, PushDispatcher,
};
pub use payload::{InboundPayload, NotificationPayload, PayloadError, DEFAULT_TARGET_URL};
pub use report::{DeliveryOutcome, DeliveryResult, DispatchMode, DispatchReport};
