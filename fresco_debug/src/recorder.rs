// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use fresco_core::time::HostTime;
use fresco_core::trace::{
    FrameSummary, FrameTickEvent, InputDispatchEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    TraceSink, UpdateRequestEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_TICK: u8 = 1;
const TAG_UPDATE_REQUEST: u8 = 2;
const TAG_PHASE_BEGIN: u8 = 3;
const TAG_PHASE_END: u8 = 4;
const TAG_INPUT_DISPATCH: u8 = 5;
const TAG_FRAME_SUMMARY: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Process => 0,
            PhaseKind::Display => 1,
            PhaseKind::Input => 2,
            PhaseKind::Present => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_tick(&mut self, e: &FrameTickEvent) {
        self.write_u8(TAG_FRAME_TICK);
        self.write_u64(e.frame_index);
        self.write_u64(e.now.ticks());
    }

    fn on_update_request(&mut self, e: &UpdateRequestEvent) {
        self.write_u8(TAG_UPDATE_REQUEST);
        self.write_u32(e.flags);
        self.write_u8(u8::from(e.newly_scheduled));
        self.write_u64(e.timestamp.ticks());
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_input_dispatch(&mut self, e: &InputDispatchEvent) {
        self.write_u8(TAG_INPUT_DISPATCH);
        self.write_u8(e.kind_code);
        self.write_u8(u8::from(e.hit));
        self.write_u64(e.timestamp.ticks());
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u64(s.now.ticks());
        self.write_u64(s.process_ticks);
        self.write_u64(s.display_ticks);
        self.write_u64(s.input_ticks);
        self.write_u64(s.present_ticks);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`FrameTickEvent`].
    FrameTick(FrameTickEvent),
    /// An [`UpdateRequestEvent`].
    UpdateRequest(UpdateRequestEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// An [`InputDispatchEvent`].
    InputDispatch(InputDispatchEvent),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Process,
            1 => PhaseKind::Display,
            2 => PhaseKind::Input,
            _ => PhaseKind::Present,
        })
    }

    fn decode_frame_tick(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameTick(FrameTickEvent {
            frame_index: self.read_u64()?,
            now: HostTime(self.read_u64()?),
        }))
    }

    fn decode_update_request(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::UpdateRequest(UpdateRequestEvent {
            flags: self.read_u32()?,
            newly_scheduled: self.read_u8()? != 0,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_input_dispatch(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::InputDispatch(InputDispatchEvent {
            kind_code: self.read_u8()?,
            hit: self.read_u8()? != 0,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index: self.read_u64()?,
            now: HostTime(self.read_u64()?),
            process_ticks: self.read_u64()?,
            display_ticks: self.read_u64()?,
            input_ticks: self.read_u64()?,
            present_ticks: self.read_u64()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_FRAME_TICK => self.decode_frame_tick(),
            TAG_UPDATE_REQUEST => self.decode_update_request(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_INPUT_DISPATCH => self.decode_input_dispatch(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tick_event() -> FrameTickEvent {
        FrameTickEvent {
            frame_index: 7,
            now: HostTime(1_000_000),
        }
    }

    fn sample_summary() -> FrameSummary {
        FrameSummary {
            frame_index: 7,
            now: HostTime(1_000_000),
            process_ticks: 150,
            display_ticks: 1400,
            input_ticks: 30,
            present_ticks: 50,
        }
    }

    #[test]
    fn round_trip_frame_tick() {
        let mut rec = RecorderSink::new();
        let orig = sample_tick_event();
        rec.on_frame_tick(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::FrameTick(e) => {
                assert_eq!(e.frame_index, orig.frame_index);
                assert_eq!(e.now, orig.now);
            }
            other => panic!("expected FrameTick, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_update_request() {
        let mut rec = RecorderSink::new();
        let orig = UpdateRequestEvent {
            flags: 0b10_0000,
            newly_scheduled: true,
            timestamp: HostTime(123),
        };
        rec.on_update_request(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::UpdateRequest(e) => {
                assert_eq!(e.flags, orig.flags);
                assert_eq!(e.newly_scheduled, orig.newly_scheduled);
                assert_eq!(e.timestamp, orig.timestamp);
            }
            other => panic!("expected UpdateRequest, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_phase_events() {
        let mut rec = RecorderSink::new();
        let begin = PhaseBeginEvent {
            frame_index: 5,
            phase: PhaseKind::Display,
            timestamp: HostTime(2000),
        };
        let end = PhaseEndEvent {
            frame_index: 5,
            phase: PhaseKind::Display,
            timestamp: HostTime(3000),
        };
        rec.on_phase_begin(&begin);
        rec.on_phase_end(&end);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::PhaseBegin(e) => {
                assert_eq!(e.frame_index, 5);
                assert_eq!(e.phase, PhaseKind::Display);
                assert_eq!(e.timestamp, HostTime(2000));
            }
            other => panic!("expected PhaseBegin, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::PhaseEnd(e) => {
                assert_eq!(e.frame_index, 5);
                assert_eq!(e.phase, PhaseKind::Display);
                assert_eq!(e.timestamp, HostTime(3000));
            }
            other => panic!("expected PhaseEnd, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_input_dispatch() {
        let mut rec = RecorderSink::new();
        let orig = InputDispatchEvent {
            kind_code: 2,
            hit: true,
            timestamp: HostTime(4000),
        };
        rec.on_input_dispatch(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::InputDispatch(e) => {
                assert_eq!(e.kind_code, 2);
                assert!(e.hit);
                assert_eq!(e.timestamp, HostTime(4000));
            }
            other => panic!("expected InputDispatch, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_frame_summary() {
        let mut rec = RecorderSink::new();
        let orig = sample_summary();
        rec.on_frame_summary(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::FrameSummary(s) => {
                assert_eq!(s.frame_index, orig.frame_index);
                assert_eq!(s.process_ticks, orig.process_ticks);
                assert_eq!(s.display_ticks, orig.display_ticks);
                assert_eq!(s.input_ticks, orig.input_ticks);
                assert_eq!(s.present_ticks, orig.present_ticks);
            }
            other => panic!("expected FrameSummary, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_multiple_events() {
        let mut rec = RecorderSink::new();
        rec.on_frame_tick(&sample_tick_event());
        rec.on_update_request(&UpdateRequestEvent {
            flags: 0b100,
            newly_scheduled: false,
            timestamp: HostTime(900),
        });
        rec.on_phase_begin(&PhaseBeginEvent {
            frame_index: 7,
            phase: PhaseKind::Process,
            timestamp: HostTime(1000),
        });
        rec.on_frame_summary(&sample_summary());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], RecordedEvent::FrameTick(_)));
        assert!(matches!(events[1], RecordedEvent::UpdateRequest(_)));
        assert!(matches!(events[2], RecordedEvent::PhaseBegin(_)));
        assert!(matches!(events[3], RecordedEvent::FrameSummary(_)));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_frame_tick(&sample_tick_event());
        let bytes = rec.as_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 3]).collect();
        assert!(events.is_empty());
    }
}
