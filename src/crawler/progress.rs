//! Progress and limit controller
//!
//! The counters of a run live behind a single mutex owned by
//! [`ProgressController`]. Callers only get increment-and-check operations
//! and copies of the counters; the lock is held for the increment and the
//! comparison, never across I/O.
//!
//! With a success limit, a worker reserves a [`SuccessSlot`] before it writes
//! to the store. Committed plus reserved successes never exceed the limit.
//! While the open reservations could still fill it, [`ProgressController::reserve`]
//! waits for one of them to settle instead of giving up, so a record is
//! only discarded once the limit has actually been met.

use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct CrawlState {
    success: u64,
    fail: u64,
    duplicate: u64,
    surplus: u64,
    reserved: u64,
}

/// Point-in-time copy of the run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSnapshot {
    pub success: u64,
    pub fail: u64,
    pub duplicate: u64,
    pub surplus: u64,
}

impl CrawlSnapshot {
    /// Jobs that reached an outcome
    pub fn processed(&self) -> u64 {
        self.success + self.fail + self.duplicate + self.surplus
    }
}

/// Result of a non-blocking reservation attempt
#[derive(Debug)]
pub enum Reservation<'a> {
    Granted(SuccessSlot<'a>),
    /// Open reservations could still meet the limit
    Pending,
    /// The limit is met
    Full,
}

/// Shared success/failure counters of one run
#[derive(Debug)]
pub struct ProgressController {
    state: Mutex<CrawlState>,
    settled: Notify,
    max_ad_count: Option<u64>,
}

impl ProgressController {
    pub fn new(max_ad_count: Option<u64>) -> Self {
        Self {
            state: Mutex::new(CrawlState::default()),
            settled: Notify::new(),
            max_ad_count,
        }
    }

    // Counters stay meaningful after a panicking holder; every mutation is a
    // single increment.
    fn lock(&self) -> MutexGuard<'_, CrawlState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn max_ad_count(&self) -> Option<u64> {
        self.max_ad_count
    }

    pub fn record_failure(&self) {
        self.lock().fail += 1;
    }

    pub fn record_duplicate(&self) {
        self.lock().duplicate += 1;
    }

    /// Counts a record that was fetched after the limit was met
    pub fn record_surplus(&self) {
        self.lock().surplus += 1;
    }

    /// Reserves one success ahead of a store write without waiting
    pub fn try_reserve(&self) -> Reservation<'_> {
        let mut state = self.lock();
        if let Some(max) = self.max_ad_count {
            if state.success >= max {
                return Reservation::Full;
            }
            if state.success + state.reserved >= max {
                return Reservation::Pending;
            }
        }
        state.reserved += 1;
        Reservation::Granted(SuccessSlot {
            controller: self,
            armed: true,
        })
    }

    /// Reserves one success, waiting while open reservations could fill the
    /// limit
    ///
    /// Returns `None` once the limit is met.
    pub async fn reserve(&self) -> Option<SuccessSlot<'_>> {
        loop {
            let settled = self.settled.notified();
            tokio::pin!(settled);
            // Registered before the check so a settle in between is not missed
            settled.as_mut().enable();

            match self.try_reserve() {
                Reservation::Granted(slot) => return Some(slot),
                Reservation::Full => return None,
                Reservation::Pending => settled.await,
            }
        }
    }

    pub fn snapshot(&self) -> CrawlSnapshot {
        let state = self.lock();
        CrawlSnapshot {
            success: state.success,
            fail: state.fail,
            duplicate: state.duplicate,
            surplus: state.surplus,
        }
    }

    /// True once the success count has met the limit
    pub fn limit_reached(&self) -> bool {
        match self.max_ad_count {
            Some(max) => self.lock().success >= max,
            None => false,
        }
    }

    fn settle(&self, outcome: SlotOutcome) -> bool {
        let reached = {
            let mut state = self.lock();
            state.reserved = state.reserved.saturating_sub(1);
            match outcome {
                SlotOutcome::Success => {
                    state.success += 1;
                    self.max_ad_count == Some(state.success)
                }
                SlotOutcome::Duplicate => {
                    state.duplicate += 1;
                    false
                }
                SlotOutcome::Failure => {
                    state.fail += 1;
                    false
                }
                SlotOutcome::Abandoned => false,
            }
        };
        self.settled.notify_waiters();
        reached
    }
}

#[derive(Debug, Clone, Copy)]
enum SlotOutcome {
    Success,
    Duplicate,
    Failure,
    Abandoned,
}

/// A reserved success, held while the record is written to the store
///
/// Dropping an unsettled slot gives the reservation back without counting
/// anything.
#[derive(Debug)]
pub struct SuccessSlot<'a> {
    controller: &'a ProgressController,
    armed: bool,
}

impl SuccessSlot<'_> {
    /// Turns the reservation into a success
    ///
    /// Returns true for the one success that meets the limit; the caller
    /// cancels the run.
    pub fn commit(mut self) -> bool {
        self.armed = false;
        self.controller.settle(SlotOutcome::Success)
    }

    /// Gives the reservation back and counts a duplicate
    pub fn release_duplicate(mut self) {
        self.armed = false;
        self.controller.settle(SlotOutcome::Duplicate);
    }

    /// Gives the reservation back and counts a failure
    pub fn release_failure(mut self) {
        self.armed = false;
        self.controller.settle(SlotOutcome::Failure);
    }
}

impl Drop for SuccessSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.controller.settle(SlotOutcome::Abandoned);
        }
    }
}
