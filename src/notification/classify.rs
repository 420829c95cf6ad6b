//! Non-throwing classification of a transport result.

use crate::push::PushDeliveryError;

/// Status codes meaning the push endpoint no longer exists.
pub const GONE_STATUS_CODES: [u16; 2] = [404, 410];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// 2xx
    Delivered { status_code: u16 },
    /// Endpoint permanently gone; the subscription should be pruned
    Permanent { status_code: u16, reason: String },
    /// Other 4xx, 5xx or no response; the subscription is kept
    Transient {
        status_code: Option<u16>,
        reason: String,
    },
}

/// Classify one transport result against the configured prune set.
pub fn classify(result: Result<u16, PushDeliveryError>, prune_status_codes: &[u16]) -> Classification {
    match result {
        Ok(status_code) => Classification::Delivered { status_code },
        Err(err) => {
            let reason = err.to_string();
            match err.status_code {
                Some(status_code) if prune_status_codes.contains(&status_code) => {
                    Classification::Permanent { status_code, reason }
                }
                status_code => Classification::Transient { status_code, reason },
            }
        }
    }
}
