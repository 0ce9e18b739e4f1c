//! Interrupt IN polling engine
//!
//! [`HidComposite::poll`] is meant to be called from a cooperative main loop
//! as often as possible. It does nothing until the aggregate poll interval has
//! elapsed, then makes exactly one non-blocking read attempt per interface
//! with a bound interrupt IN endpoint. A failing endpoint never stops its
//! siblings from being serviced.

use crate::error::UsbError;
use crate::perf::PollCounters;
use crate::transport::{Clock, UsbTransport};

use super::parser::ReportContext;
use super::tables::EndpointRole;
use super::{HidComposite, HidHooks, POLL_BUFFER_LEN};

/// Outcome of one [`poll`](HidComposite::poll) call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollStatus {
    /// Deadline had elapsed and endpoints were serviced
    pub serviced: bool,
    /// Interrupt IN reads issued
    pub reads: u8,
    /// Reports handed to a parser
    pub dispatched: u8,
    /// Last transport error other than NAK
    pub last_error: Option<UsbError>,
}

/// `now` has reached `deadline`, tolerating counter wraparound
#[inline]
fn deadline_elapsed(now: u32, deadline: u32) -> bool {
    now.wrapping_sub(deadline) as i32 >= 0
}

impl<'p, H: HidHooks, const IFACES: usize, const EPS: usize, const PARSERS: usize>
    HidComposite<'p, H, IFACES, EPS, PARSERS>
{
    /// Service every interrupt IN endpoint once the poll interval has elapsed
    ///
    /// Returns immediately when the driver is not initialized or the deadline
    /// has not passed. NAK means "no report yet" and is not an error.
    pub fn poll<T: UsbTransport, C: Clock + ?Sized>(&mut self, usb: &mut T, clock: &C) -> PollStatus {
        let mut status = PollStatus::default();

        if !self.poll_enabled {
            return status;
        }

        let now = clock.now_ms();
        if let Some(deadline) = self.next_poll {
            if !deadline_elapsed(now, deadline) {
                return status;
            }
        }

        self.next_poll = Some(now.wrapping_add(self.poll_interval as u32));
        status.serviced = true;
        PollCounters::bump(&self.counters.ticks);

        let mut buf = [0u8; POLL_BUFFER_LEN];
        let has_report_id = self.config.report_id_framing;

        for iface in self.interfaces.iter() {
            let Some(slot) = iface.endpoint_slot(EndpointRole::InterruptIn) else {
                continue;
            };
            let endpoint = self.endpoints[slot];

            buf.fill(0);
            let read_len = (endpoint.max_packet_size as usize).min(POLL_BUFFER_LEN);

            status.reads = status.reads.saturating_add(1);
            PollCounters::bump(&self.counters.reads);

            let read = match usb.in_transfer(self.address, endpoint.ep_addr, &mut buf[..read_len]) {
                Ok(read) => read.min(read_len),
                Err(UsbError::Nak) => {
                    PollCounters::bump(&self.counters.naks);
                    continue;
                }
                Err(error) => {
                    PollCounters::bump(&self.counters.read_errors);
                    warn!(
                        "Poll: interface {} endpoint {} failed: {}",
                        iface.interface,
                        endpoint.ep_addr,
                        error
                    );
                    status.last_error = Some(error);
                    continue;
                }
            };

            if read == 0 {
                PollCounters::bump(&self.counters.empty_reads);
                continue;
            }

            let report = &buf[..read];
            self.hooks.parse_hid_data(endpoint.ep_addr, has_report_id, report);

            let report_id = if has_report_id { report[0] } else { 0 };
            match self.parsers.resolve(report_id, has_report_id) {
                Some(parser) => {
                    let ctx = ReportContext {
                        address: self.address,
                        endpoint: endpoint.ep_addr,
                        vendor_id: self.vendor_id,
                        product_id: self.product_id,
                    };
                    parser.parse(&ctx, has_report_id, report);
                    status.dispatched = status.dispatched.saturating_add(1);
                    PollCounters::bump(&self.counters.reports_dispatched);
                }
                None => PollCounters::bump(&self.counters.reports_unclaimed),
            }
        }

        status
    }
}
