//! Telemetry Manager
//!
//! ## Overview
//!
//! The 20 Hz protocol multiplexer. Inbound, it pulls whatever the radio has
//! buffered and feeds it byte-at-a-time through the frame parser; decoded
//! ground-station requests become [`ManagerRequest`]s for the system
//! manager. Outbound, it drains the shared event queue, packs each
//! surviving event into one wire frame, and clocks frames out under a
//! per-tick byte budget.
//!
//! ## Event policy
//!
//! Two rules thin the downlink before byte packing:
//!
//! - RC echoes coalesce. The sticks are a sampled signal; only the newest
//!   echo in a drain is worth the airtime, and it packs after everything
//!   else in the tick.
//! - While a parameter dump is streaming, only parameter values and
//!   heartbeats pack. Everything else drained in that window is dropped
//!   outright, never deferred, so the dump cannot be starved by sensor
//!   traffic. The window closes the moment the final value packs.
//!
//! ## Byte budget
//!
//! [`MAX_TX_BYTES`] caps one tick's radio write to what the UART can clock
//! out before the next tick. The first frame that does not fit parks in the
//! overflow slot and leads the next tick's write, byte-identical, ahead of
//! anything packed later. Frames never split across writes.

use heapless::Deque;

use crate::constants::link::{MAX_TX_BYTES, RX_BUFFER_BYTES};
use crate::constants::queues::{FRAME_QUEUE_DEPTH, REQUEST_QUEUE_DEPTH, TELEMETRY_QUEUE_DEPTH};
use crate::drivers::Radio;
use crate::errors::{FlightError, FlightResult};
use crate::events::{ManagerRequest, TelemetryEvent};
use crate::link::parser::ParserStats;
use crate::link::{Frame, FrameEncoder, FrameParser, RxMessage};
use crate::queue::MessageQueue;

/// The telemetry manager's queue ends
pub struct TelemetryLinks<'q> {
    /// Events in, from the attitude and system managers
    pub events: &'q MessageQueue<TelemetryEvent, TELEMETRY_QUEUE_DEPTH>,
    /// Ground-station requests out, to the system manager
    pub requests: &'q MessageQueue<ManagerRequest, REQUEST_QUEUE_DEPTH>,
}

/// 20 Hz MAVLink downlink/uplink loop
///
/// Events carry their own timestamps, so this is the one manager without
/// a time source.
pub struct TelemetryManager<'q, R> {
    radio: R,
    links: TelemetryLinks<'q>,

    parser: FrameParser,
    encoder: FrameEncoder,
    frames: Deque<Frame, FRAME_QUEUE_DEPTH>,
    overflow: Option<Frame>,
    streaming: bool,
    rx_buf: [u8; RX_BUFFER_BYTES],
}

impl<'q, R> TelemetryManager<'q, R>
where
    R: Radio,
{
    /// Manager with an idle parser and an empty frame queue
    pub fn new(radio: R, links: TelemetryLinks<'q>) -> Self {
        Self {
            radio,
            links,
            parser: FrameParser::new(),
            encoder: FrameEncoder::new(),
            frames: Deque::new(),
            overflow: None,
            streaming: false,
            rx_buf: [0; RX_BUFFER_BYTES],
        }
    }

    /// `true` while a parameter dump holds the downlink
    pub fn streaming_params(&self) -> bool {
        self.streaming
    }

    /// Receive-side accept/reject counters
    pub fn parser_stats(&self) -> ParserStats {
        self.parser.stats()
    }

    /// Frames packed but not yet written, the overflow slot included
    pub fn frames_pending(&self) -> usize {
        self.frames.len() + usize::from(self.overflow.is_some())
    }

    /// One 50 ms link tick
    pub fn tick(&mut self) -> FlightResult<()> {
        let mut first_error: Option<FlightError> = None;

        // Uplink: every buffered byte through the parser. Framing errors
        // restart the parser internally and never surface here.
        match self.radio.receive(&mut self.rx_buf) {
            Ok(n) => {
                for at in 0..n.min(RX_BUFFER_BYTES) {
                    if let Some(message) = self.parser.push(self.rx_buf[at]) {
                        self.dispatch(message);
                    }
                }
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }

        // Downlink: drain events into packed frames
        let mut newest_echo: Option<TelemetryEvent> = None;
        for event in self.links.events.drain() {
            if self.streaming {
                match event {
                    TelemetryEvent::ParamValue { index, count, .. } => {
                        if index + 1 >= count {
                            self.streaming = false;
                        }
                        self.pack(&event);
                    }
                    TelemetryEvent::Heartbeat { .. } => self.pack(&event),
                    _ => {}
                }
            } else {
                match event {
                    TelemetryEvent::RcEcho { .. } => newest_echo = Some(event),
                    _ => self.pack(&event),
                }
            }
        }
        if let Some(echo) = newest_echo {
            self.pack(&echo);
        }

        // Radio write under the byte budget; the deferred frame leads
        if self.overflow.is_some() || !self.frames.is_empty() {
            let mut out: heapless::Vec<u8, MAX_TX_BYTES> = heapless::Vec::new();
            if let Some(frame) = self.overflow.take() {
                let _ = out.extend_from_slice(frame.as_bytes());
            }
            while let Some(frame) = self.frames.front() {
                if out.len() + frame.len() > MAX_TX_BYTES {
                    self.overflow = self.frames.pop_front();
                    break;
                }
                let _ = out.extend_from_slice(frame.as_bytes());
                self.frames.pop_front();
            }
            if let Err(e) = self.radio.transmit(&out) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn dispatch(&mut self, message: RxMessage) {
        match message {
            RxMessage::ParamSet(request) => {
                self.links.requests.push(ManagerRequest::ParamChange {
                    key: request.key,
                    value: request.value,
                });
            }
            RxMessage::ParamRequestList { .. } => {
                self.streaming = true;
                self.links.requests.push(ManagerRequest::ParamDump);
            }
        }
    }

    /// Encode one event and queue its frame; a full queue drops the frame
    fn pack(&mut self, event: &TelemetryEvent) {
        let frame = self.encoder.encode(event);
        let _ = self.frames.push_back(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ParamKey;
    use crate::link::wire::{MSG_ATTITUDE, MSG_HEARTBEAT, MSG_PARAM_VALUE, MSG_RC_CHANNELS, STX};
    use crate::managers::CoreQueues;
    use core::cell::RefCell;

    struct MockRadio<'a> {
        rx: &'a RefCell<heapless::Vec<u8, 1024>>,
        tx: &'a RefCell<heapless::Vec<heapless::Vec<u8, 512>, 8>>,
    }

    impl<'a> Radio for MockRadio<'a> {
        fn receive(&mut self, buf: &mut [u8]) -> FlightResult<usize> {
            let mut rx = self.rx.borrow_mut();
            let n = rx.len().min(buf.len());
            buf[..n].copy_from_slice(&rx[..n]);
            let rest: heapless::Vec<u8, 1024> = rx[n..].iter().copied().collect();
            *rx = rest;
            Ok(n)
        }

        fn transmit(&mut self, bytes: &[u8]) -> FlightResult<()> {
            let mut write = heapless::Vec::new();
            write
                .extend_from_slice(bytes)
                .map_err(|_| FlightError::ResourceUnavailable)?;
            self.tx
                .borrow_mut()
                .push(write)
                .map_err(|_| FlightError::ResourceUnavailable)
        }
    }

    struct LinkRig {
        rx: RefCell<heapless::Vec<u8, 1024>>,
        tx: RefCell<heapless::Vec<heapless::Vec<u8, 512>, 8>>,
    }

    impl LinkRig {
        fn new() -> Self {
            Self {
                rx: RefCell::new(heapless::Vec::new()),
                tx: RefCell::new(heapless::Vec::new()),
            }
        }

        fn manager<'a>(
            &'a self,
            queues: &'a CoreQueues,
        ) -> TelemetryManager<'a, MockRadio<'a>> {
            TelemetryManager::new(
                MockRadio {
                    rx: &self.rx,
                    tx: &self.tx,
                },
                queues.telemetry_links(),
            )
        }

        fn feed(&self, bytes: &[u8]) {
            self.rx.borrow_mut().extend_from_slice(bytes).unwrap();
        }

        fn writes(&self) -> usize {
            self.tx.borrow().len()
        }

        /// Message ids of the frames inside write `at`, in order
        fn frame_ids(&self, at: usize) -> heapless::Vec<u8, 16> {
            let tx = self.tx.borrow();
            let bytes = &tx[at];
            let mut ids = heapless::Vec::new();
            let mut cursor = 0;
            while cursor < bytes.len() {
                assert_eq!(bytes[cursor], STX);
                let total = bytes[cursor + 1] as usize + 8;
                ids.push(bytes[cursor + 5]).unwrap();
                cursor += total;
            }
            assert_eq!(cursor, bytes.len());
            ids
        }
    }

    #[test]
    fn param_set_uplink_becomes_a_change_request() {
        let rig = LinkRig::new();
        let queues = CoreQueues::new();
        let mut tm = rig.manager(&queues);

        let mut ground = FrameEncoder::new();
        let frame = ground.param_set(&ParamKey::new("p").unwrap(), 120.0, 1, 1);
        rig.feed(frame.as_bytes());

        tm.tick().unwrap();

        match queues.requests.pop() {
            Some(ManagerRequest::ParamChange { key, value }) => {
                assert_eq!(key.as_str(), "p");
                assert_eq!(value, 120.0);
            }
            other => panic!("unexpected request {other:?}"),
        }
        assert_eq!(tm.parser_stats().accepted, 1);
    }

    #[test]
    fn param_request_list_opens_streaming_and_queues_dump() {
        let rig = LinkRig::new();
        let queues = CoreQueues::new();
        let mut tm = rig.manager(&queues);

        let mut ground = FrameEncoder::new();
        rig.feed(ground.param_request_list(1, 1).as_bytes());

        tm.tick().unwrap();

        assert!(tm.streaming_params());
        assert!(matches!(
            queues.requests.pop(),
            Some(ManagerRequest::ParamDump)
        ));
    }

    #[test]
    fn a_frame_split_across_ticks_still_decodes() {
        let rig = LinkRig::new();
        let queues = CoreQueues::new();
        let mut tm = rig.manager(&queues);

        let mut ground = FrameEncoder::new();
        let frame = ground.param_set(&ParamKey::new("yaw_mix").unwrap(), 0.5, 1, 1);
        let bytes = frame.as_bytes();
        let split = bytes.len() / 2;

        rig.feed(&bytes[..split]);
        tm.tick().unwrap();
        assert!(queues.requests.is_empty());

        rig.feed(&bytes[split..]);
        tm.tick().unwrap();
        assert!(matches!(
            queues.requests.pop(),
            Some(ManagerRequest::ParamChange { .. })
        ));
    }

    #[test]
    fn garbage_bytes_produce_no_requests() {
        let rig = LinkRig::new();
        let queues = CoreQueues::new();
        let mut tm = rig.manager(&queues);

        rig.feed(&[0x00, 0xFF, 0xFE, 0x02, 0x00, 0x01, 0x01, 0x17, 0xAA, 0xBB, 0xCC, 0x55]);
        tm.tick().unwrap();

        assert!(queues.requests.is_empty());
        assert!(tm.parser_stats().rejected >= 1);
    }

    #[test]
    fn rc_echoes_coalesce_to_the_newest() {
        let rig = LinkRig::new();
        let queues = CoreQueues::new();
        let mut tm = rig.manager(&queues);

        queues
            .events
            .push(TelemetryEvent::rc_echo(0, [10.0; 6]));
        queues
            .events
            .push(TelemetryEvent::attitude(1, 0.0, 0.0, 0.0));
        queues
            .events
            .push(TelemetryEvent::rc_echo(2, [20.0; 6]));
        queues
            .events
            .push(TelemetryEvent::rc_echo(3, [30.0; 6]));

        tm.tick().unwrap();

        // One attitude frame, then exactly one RC frame, packed last
        let ids = rig.frame_ids(0);
        assert_eq!(ids.as_slice(), &[MSG_ATTITUDE, MSG_RC_CHANNELS]);

        // The surviving echo is the newest: chan1 = 1000 + 30 * 10,
        // found after the 6-byte header and 4-byte time field
        let tx = rig.tx.borrow();
        let rc_at = tx[0].len() - 50;
        let chan1 = u16::from_le_bytes([tx[0][rc_at + 10], tx[0][rc_at + 11]]);
        assert_eq!(chan1, 1300);
    }

    #[test]
    fn streaming_gate_passes_only_params_and_heartbeats() {
        let rig = LinkRig::new();
        let queues = CoreQueues::new();
        let mut tm = rig.manager(&queues);

        let mut ground = FrameEncoder::new();
        rig.feed(ground.param_request_list(1, 1).as_bytes());
        tm.tick().unwrap();
        assert!(tm.streaming_params());
        rig.tx.borrow_mut().clear();

        let key = ParamKey::new("p").unwrap();
        queues
            .events
            .push(TelemetryEvent::attitude(0, 0.1, 0.0, 0.0));
        queues
            .events
            .push(TelemetryEvent::raw_imu(0, [0; 3], [0; 3]));
        queues
            .events
            .push(TelemetryEvent::heartbeat(0, 64, 0, 3));
        queues
            .events
            .push(TelemetryEvent::param_value(0, key, 100.0, 0, 5));

        tm.tick().unwrap();

        let ids = rig.frame_ids(0);
        assert_eq!(ids.as_slice(), &[MSG_HEARTBEAT, MSG_PARAM_VALUE]);
        assert!(tm.streaming_params());

        // Dropped events are gone, not deferred: a quiet tick writes nothing
        rig.tx.borrow_mut().clear();
        tm.tick().unwrap();
        assert_eq!(rig.writes(), 0);
    }

    #[test]
    fn streaming_ends_when_the_last_value_packs() {
        let rig = LinkRig::new();
        let queues = CoreQueues::new();
        let mut tm = rig.manager(&queues);

        let mut ground = FrameEncoder::new();
        rig.feed(ground.param_request_list(1, 1).as_bytes());
        tm.tick().unwrap();

        let key = ParamKey::new("d").unwrap();
        for index in 0..5 {
            queues
                .events
                .push(TelemetryEvent::param_value(0, key, 1.0, index, 5));
        }
        tm.tick().unwrap();
        assert!(!tm.streaming_params());

        // Sensor traffic flows again
        queues
            .events
            .push(TelemetryEvent::attitude(0, 0.0, 0.0, 0.0));
        rig.tx.borrow_mut().clear();
        tm.tick().unwrap();
        assert_eq!(rig.frame_ids(0).as_slice(), &[MSG_ATTITUDE]);
    }

    #[test]
    fn byte_budget_defers_whole_frames() {
        let rig = LinkRig::new();
        let queues = CoreQueues::new();
        let mut tm = rig.manager(&queues);

        // Nine RAW_IMU frames are 9 x 34 = 306 bytes; eight fit in 288
        for n in 0..9 {
            queues
                .events
                .push(TelemetryEvent::raw_imu(n as u64, [n; 3], [n; 3]));
        }
        tm.tick().unwrap();

        assert_eq!(rig.writes(), 1);
        assert_eq!(rig.frame_ids(0).len(), 8);
        assert!(rig.tx.borrow()[0].len() <= MAX_TX_BYTES);
        assert_eq!(tm.frames_pending(), 1);

        // The deferred frame leads the next write, byte-identical to an
        // independent encode of the same event sequence
        tm.tick().unwrap();
        assert_eq!(rig.writes(), 2);

        let mut shadow = FrameEncoder::new();
        let mut ninth = None;
        for n in 0..9 {
            ninth = Some(shadow.encode(&TelemetryEvent::raw_imu(n as u64, [n; 3], [n; 3])));
        }
        assert_eq!(rig.tx.borrow()[1].as_slice(), ninth.unwrap().as_bytes());
        assert_eq!(tm.frames_pending(), 0);
    }

    #[test]
    fn quiet_tick_skips_the_radio_write() {
        let rig = LinkRig::new();
        let queues = CoreQueues::new();
        let mut tm = rig.manager(&queues);

        tm.tick().unwrap();
        tm.tick().unwrap();
        assert_eq!(rig.writes(), 0);
    }
}
