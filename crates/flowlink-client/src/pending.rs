//! Outstanding-request tracking for a streaming session.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;
use tracing::warn;

/// Count of requests written but not yet answered by an inbound message.
///
/// The send procedure calls [`add`](Self::add) for each request it issues,
/// the receive procedure calls [`complete`](Self::complete) for each inbound
/// message, and the session waits in [`wait_drained`](Self::wait_drained)
/// once its input is exhausted.
#[derive(Debug, Default)]
pub struct PendingRequests {
    count: AtomicUsize,
    drained: Notify,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one more outstanding request.
    pub fn add(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Records that one outstanding request was answered.
    ///
    /// The count never drops below zero: a message arriving with nothing
    /// outstanding is logged and ignored.
    pub fn complete(&self) {
        if !self.release() {
            warn!("inbound message with no outstanding request");
        }
    }

    /// Takes back a request recorded with [`add`](Self::add) whose write failed.
    pub fn withdraw(&self) {
        self.release();
    }

    fn release(&self) -> bool {
        let previous = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match previous {
            Ok(1) => {
                self.drained.notify_waiters();
                true
            }
            Ok(_) => true,
            Err(_) => false,
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Waits until no request is outstanding. There is no timeout: a request
    /// that is never answered keeps this pending forever.
    pub async fn wait_drained(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}
