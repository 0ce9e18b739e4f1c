//! Polling engine tests
//!
//! Deadline handling (including clock wraparound), per-endpoint read
//! sizing, error isolation between interfaces and report routing.

mod common;

use common::*;
use usbh_hid_composite::hid::{HidComposite, HidConfig, PollStatus};
use usbh_hid_composite::UsbError;

const KEYBOARD_EP: u8 = 1;
const MOUSE_EP: u8 = 2;

fn ready_driver<'p>(usb: &mut MockTransport, config: HidConfig) -> HidComposite<'p> {
    let mut hid = HidComposite::with_config((), config);
    hid.init(usb, 0, 1, false).expect("init failed");
    usb.clear_log();
    hid
}

#[test]
fn test_poll_before_init_does_nothing() {
    let mut usb = keyboard_mouse_transport();
    let clock = ManualClock::new(0);
    let mut hid: HidComposite<'_> = HidComposite::new(());

    let status = hid.poll(&mut usb, &clock);

    assert_eq!(status, PollStatus::default());
    assert!(usb.in_reads.is_empty());
    assert_eq!(hid.counters().snapshot().ticks, 0);
}

#[test]
fn test_first_poll_after_init_is_immediate() {
    let mut usb = keyboard_mouse_transport();
    let mut hid = ready_driver(&mut usb, HidConfig::new());
    let clock = ManualClock::new(5_000);

    let status = hid.poll(&mut usb, &clock);

    assert!(status.serviced);
    assert_eq!(status.reads, 2);
    assert_eq!(status.dispatched, 0);
    assert_eq!(status.last_error, None);
    // One read per interrupt IN endpoint, in discovery order, sized to the packet
    assert_eq!(usb.in_reads, vec![(1, KEYBOARD_EP, 8), (1, MOUSE_EP, 8)]);
    assert_eq!(hid.counters().snapshot().naks, 2);
}

#[test]
fn test_poll_respects_interval() {
    let mut usb = keyboard_mouse_transport();
    let mut hid = ready_driver(&mut usb, HidConfig::new());
    let clock = ManualClock::new(1_000);

    assert!(hid.poll(&mut usb, &clock).serviced);
    assert_eq!(usb.in_reads.len(), 2);

    // Interval is 10 ms; nothing happens until it has elapsed
    for _ in 0..9 {
        clock.advance(1);
        let status = hid.poll(&mut usb, &clock);
        assert!(!status.serviced);
        assert_eq!(status.reads, 0);
    }
    assert_eq!(usb.in_reads.len(), 2);

    clock.advance(1);
    assert!(hid.poll(&mut usb, &clock).serviced);
    assert_eq!(usb.in_reads.len(), 4);

    // Repeated calls at the same instant read nothing more
    assert!(!hid.poll(&mut usb, &clock).serviced);
    assert_eq!(usb.in_reads.len(), 4);
    assert_eq!(hid.counters().snapshot().ticks, 2);
}

#[test]
fn test_late_poll_does_not_catch_up() {
    let mut usb = keyboard_mouse_transport();
    let mut hid = ready_driver(&mut usb, HidConfig::new());
    let clock = ManualClock::new(1_000);

    assert!(hid.poll(&mut usb, &clock).serviced);
    assert_eq!(usb.in_reads.len(), 2);

    // Five intervals missed: still one read per endpoint
    clock.advance(5 * 10);
    let status = hid.poll(&mut usb, &clock);
    assert!(status.serviced);
    assert_eq!(status.reads, 2);
    assert_eq!(usb.in_reads.len(), 4);

    // Next deadline is one interval after the late call, no backlog
    assert!(!hid.poll(&mut usb, &clock).serviced);
    clock.advance(9);
    assert!(!hid.poll(&mut usb, &clock).serviced);
    assert_eq!(usb.in_reads.len(), 4);
    clock.advance(1);
    assert!(hid.poll(&mut usb, &clock).serviced);
    assert_eq!(usb.in_reads.len(), 6);
}

#[test]
fn test_poll_across_clock_wraparound() {
    let mut usb = keyboard_mouse_transport();
    let mut hid = ready_driver(&mut usb, HidConfig::new());
    let clock = ManualClock::new(u32::MAX - 3);

    assert!(hid.poll(&mut usb, &clock).serviced);

    // Deadline is now 6, past the wrap
    clock.set(u32::MAX);
    assert!(!hid.poll(&mut usb, &clock).serviced);
    clock.set(5);
    assert!(!hid.poll(&mut usb, &clock).serviced);
    clock.set(6);
    assert!(hid.poll(&mut usb, &clock).serviced);
}

#[test]
fn test_closure_clock() {
    let mut usb = keyboard_mouse_transport();
    let mut hid = ready_driver(&mut usb, HidConfig::new());

    let millis = || 42u32;
    assert!(hid.poll(&mut usb, &millis).serviced);
    assert!(!hid.poll(&mut usb, &millis).serviced);
}

#[test]
fn test_report_dispatched_with_device_context() {
    let parser = RecordingParser::default();
    let mut usb = keyboard_mouse_transport();
    let mut hid = ready_driver(&mut usb, HidConfig::new());
    assert!(hid.set_report_parser(0, &parser));
    let clock = ManualClock::new(0);

    let key_a = [0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00];
    usb.queue_report(KEYBOARD_EP, &key_a);

    let status = hid.poll(&mut usb, &clock);
    assert_eq!(status.dispatched, 1);

    let received = parser.last().unwrap();
    assert_eq!(received.data, key_a.to_vec());
    assert!(!received.has_report_id);
    assert_eq!(received.ctx.address, 1);
    assert_eq!(received.ctx.endpoint, KEYBOARD_EP);
    assert_eq!(received.ctx.vendor_id, VENDOR_ID);
    assert_eq!(received.ctx.product_id, PRODUCT_ID);
}

#[test]
fn test_without_report_ids_every_endpoint_reaches_first_parser() {
    let parser = RecordingParser::default();
    let unused = RecordingParser::default();
    let mut usb = keyboard_mouse_transport();
    let mut hid = ready_driver(&mut usb, HidConfig::new());
    hid.set_report_parser(0, &parser);
    hid.set_report_parser(7, &unused);
    let clock = ManualClock::new(0);

    usb.queue_report(KEYBOARD_EP, &[0x07, 0, 0x05, 0, 0, 0, 0, 0]);
    usb.queue_report(MOUSE_EP, &[0x01, 0x10, 0xF0]);

    assert_eq!(hid.poll(&mut usb, &clock).dispatched, 2);
    assert_eq!(parser.count(), 2);
    assert_eq!(unused.count(), 0);

    let endpoints: Vec<u8> = parser.reports.borrow().iter().map(|r| r.ctx.endpoint).collect();
    assert_eq!(endpoints, vec![KEYBOARD_EP, MOUSE_EP]);
}

#[test]
fn test_report_id_routing() {
    let keyboard = RecordingParser::default();
    let consumer = RecordingParser::default();
    let mut usb = keyboard_mouse_transport();
    let mut hid = ready_driver(&mut usb, HidConfig::new().report_id_framing(true));
    hid.set_report_parser(1, &keyboard);
    hid.set_report_parser(2, &consumer);
    let clock = ManualClock::new(0);

    usb.queue_report(KEYBOARD_EP, &[0x02, 0xE9, 0x00]);
    usb.queue_report(MOUSE_EP, &[0x03, 0x01, 0x02]);

    let status = hid.poll(&mut usb, &clock);

    assert_eq!(status.dispatched, 1);
    assert_eq!(keyboard.count(), 0);
    assert_eq!(consumer.count(), 1);
    assert!(consumer.last().unwrap().has_report_id);
    // Report id 3 has no parser
    assert_eq!(hid.counters().snapshot().reports_unclaimed, 1);
}

#[test]
fn test_zero_length_read_not_dispatched() {
    let parser = RecordingParser::default();
    let mut usb = keyboard_mouse_transport();
    let mut hid: HidComposite<'_, RecordingHooks> = HidComposite::new(RecordingHooks::default());
    hid.init(&mut usb, 0, 1, false).unwrap();
    hid.set_report_parser(0, &parser);
    let clock = ManualClock::new(0);

    usb.queue_report(KEYBOARD_EP, &[]);

    let status = hid.poll(&mut usb, &clock);

    assert_eq!(status.reads, 2);
    assert_eq!(status.dispatched, 0);
    assert_eq!(parser.count(), 0);
    assert!(hid.hooks().raw_reports.is_empty());
    assert_eq!(hid.counters().snapshot().empty_reads, 1);
}

#[test]
fn test_failing_endpoint_does_not_block_siblings() {
    let parser = RecordingParser::default();
    let mut usb = keyboard_mouse_transport();
    let mut hid = ready_driver(&mut usb, HidConfig::new());
    hid.set_report_parser(0, &parser);
    let clock = ManualClock::new(0);

    usb.queue_error(KEYBOARD_EP, UsbError::Timeout);
    usb.queue_report(MOUSE_EP, &[0x00, 0x01, 0x01]);

    let status = hid.poll(&mut usb, &clock);

    assert_eq!(status.reads, 2);
    assert_eq!(status.dispatched, 1);
    assert_eq!(status.last_error, Some(UsbError::Timeout));
    assert_eq!(parser.last().unwrap().ctx.endpoint, MOUSE_EP);

    let stats = hid.counters().snapshot();
    assert_eq!(stats.read_errors, 1);
    assert_eq!(stats.naks, 0);
    assert!(hid.is_ready());
}

#[test]
fn test_raw_hook_sees_reports_before_parser() {
    let mut usb = keyboard_mouse_transport();
    let mut hid: HidComposite<'_, RecordingHooks> = HidComposite::new(RecordingHooks::default());
    hid.init(&mut usb, 0, 1, false).unwrap();
    let clock = ManualClock::new(0);

    // No parser registered: the hook still gets the bytes
    usb.queue_report(MOUSE_EP, &[0x01, 0xFF, 0x00]);
    let status = hid.poll(&mut usb, &clock);

    assert_eq!(status.dispatched, 0);
    assert_eq!(hid.hooks().raw_reports, vec![(MOUSE_EP, vec![0x01, 0xFF, 0x00])]);
    assert_eq!(hid.counters().snapshot().reports_unclaimed, 1);
}

#[test]
fn test_read_length_clamped_to_scratch_buffer() {
    let config = vec![
        configuration(1, 1),
        hid_interface(0, 0, 1),
        interrupt_in(1, 512, 1),
    ];
    let mut usb = MockTransport::new(create_hid_device_descriptor(1), vec![config]);
    let mut hid = ready_driver(&mut usb, HidConfig::new());
    let clock = ManualClock::new(0);

    hid.poll(&mut usb, &clock);
    assert_eq!(usb.in_reads, vec![(1, 1, 64)]);
}
