//! Last-request-wins gating for re-aggregation.
//!
//! When a user switches programs or weeks quickly, several aggregations can
//! be in flight. Each one takes a token from the gate before fetching, and
//! its result is only accepted if no newer token was issued in the meantime.

use crate::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};

/// Token identifying one aggregation request
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Issues request tokens and rejects results from superseded requests
#[derive(Debug, Default)]
pub struct RequestGate {
    latest: AtomicU64,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier token
    pub fn begin(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// True while no newer request has begun
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }

    /// Accept `value` if `token` is still current
    ///
    /// Returns `Error::StaleRequest` otherwise; callers drop the value.
    pub fn commit<T>(&self, token: RequestToken, value: T) -> Result<T> {
        let latest = self.latest.load(Ordering::SeqCst);
        if latest == token.0 {
            Ok(value)
        } else {
            tracing::debug!("Discarding stale request {} (latest {})", token.0, latest);
            Err(Error::StaleRequest {
                token: token.0,
                latest,
            })
        }
    }
}
