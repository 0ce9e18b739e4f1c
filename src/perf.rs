//! Driver diagnostics
//!
//! Relaxed atomic counters for the polling engine and the extractor. Reading
//! them never disturbs the driver, so a supervisor task can sample them while
//! the main loop keeps polling.

use core::sync::atomic::{AtomicU32, Ordering};

/// Counters for one driver instance
#[derive(Debug)]
pub struct PollCounters {
    /// Poll calls whose deadline had elapsed
    pub ticks: AtomicU32,
    /// Interrupt IN reads issued
    pub reads: AtomicU32,
    /// Reads answered with NAK (no data)
    pub naks: AtomicU32,
    /// Reads that failed with anything but NAK
    pub read_errors: AtomicU32,
    /// Successful reads carrying no bytes
    pub empty_reads: AtomicU32,
    /// Reports handed to a registered parser
    pub reports_dispatched: AtomicU32,
    /// Reports no parser was registered for
    pub reports_unclaimed: AtomicU32,
    /// Interfaces dropped because the interface table was full
    pub interfaces_dropped: AtomicU32,
    /// Endpoints dropped because the endpoint table was full
    pub endpoints_dropped: AtomicU32,
}

impl PollCounters {
    /// Create new counter set
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
            reads: AtomicU32::new(0),
            naks: AtomicU32::new(0),
            read_errors: AtomicU32::new(0),
            empty_reads: AtomicU32::new(0),
            reports_dispatched: AtomicU32::new(0),
            reports_unclaimed: AtomicU32::new(0),
            interfaces_dropped: AtomicU32::new(0),
            endpoints_dropped: AtomicU32::new(0),
        }
    }

    #[inline(always)]
    pub(crate) fn bump(counter: &AtomicU32) {
        // Saturate instead of wrapping back to zero
        let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_add(1));
    }

    /// Copy out the current values
    pub fn snapshot(&self) -> PollStats {
        PollStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            naks: self.naks.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            empty_reads: self.empty_reads.load(Ordering::Relaxed),
            reports_dispatched: self.reports_dispatched.load(Ordering::Relaxed),
            reports_unclaimed: self.reports_unclaimed.load(Ordering::Relaxed),
            interfaces_dropped: self.interfaces_dropped.load(Ordering::Relaxed),
            endpoints_dropped: self.endpoints_dropped.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        for counter in [
            &self.ticks,
            &self.reads,
            &self.naks,
            &self.read_errors,
            &self.empty_reads,
            &self.reports_dispatched,
            &self.reports_unclaimed,
            &self.interfaces_dropped,
            &self.endpoints_dropped,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for PollCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain copy of [`PollCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollStats {
    /// Serviced poll intervals
    pub ticks: u32,
    /// Interrupt IN reads issued
    pub reads: u32,
    /// Reads answered with NAK
    pub naks: u32,
    /// Reads that failed
    pub read_errors: u32,
    /// Zero-length reads
    pub empty_reads: u32,
    /// Reports handed to a parser
    pub reports_dispatched: u32,
    /// Reports with no parser
    pub reports_unclaimed: u32,
    /// Interfaces rejected for lack of table space
    pub interfaces_dropped: u32,
    /// Endpoints rejected for lack of table space
    pub endpoints_dropped: u32,
}
