// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to microseconds using a [`Timebase`].

use std::io::Write;

use fresco_core::event::EventKind;
use fresco_core::time::Timebase;
use fresco_core::trace::{
    FrameSummary, FrameTickEvent, InputDispatchEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    TraceSink, UpdateRequestEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    fn ticks_to_us(&self, ticks: u64) -> f64 {
        self.timebase.ticks_to_nanos(ticks) as f64 / 1000.0
    }

    fn host_us(&self, t: fresco_core::time::HostTime) -> f64 {
        self.ticks_to_us(t.ticks())
    }
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Process => "process",
        PhaseKind::Display => "display",
        PhaseKind::Input => "input",
        PhaseKind::Present => "present",
    }
}

pub(crate) fn kind_name(code: u8) -> &'static str {
    match EventKind::from_code(code) {
        Some(EventKind::MouseDown) => "mousedown",
        Some(EventKind::MouseUp) => "mouseup",
        Some(EventKind::MouseMove) => "mousemove",
        Some(EventKind::MouseOver) => "mouseover",
        Some(EventKind::MouseOut) => "mouseout",
        Some(EventKind::MouseEnter) => "mouseenter",
        Some(EventKind::MouseLeave) => "mouseleave",
        Some(EventKind::PointerDown) => "pointerdown",
        Some(EventKind::PointerUp) => "pointerup",
        Some(EventKind::PointerMove) => "pointermove",
        Some(EventKind::PointerOver) => "pointerover",
        Some(EventKind::PointerOut) => "pointerout",
        Some(EventKind::PointerEnter) => "pointerenter",
        Some(EventKind::PointerLeave) => "pointerleave",
        Some(EventKind::PointerCancel) => "pointercancel",
        Some(EventKind::TouchStart) => "touchstart",
        Some(EventKind::TouchMove) => "touchmove",
        Some(EventKind::TouchEnd) => "touchend",
        Some(EventKind::TouchCancel) => "touchcancel",
        None => "unknown",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_tick(&mut self, e: &FrameTickEvent) {
        let _ = writeln!(
            self.writer,
            "[tick] frame={} now={:.1}µs",
            e.frame_index,
            self.host_us(e.now),
        );
    }

    fn on_update_request(&mut self, e: &UpdateRequestEvent) {
        let scheduled = if e.newly_scheduled { "scheduled" } else { "merged" };
        let _ = writeln!(
            self.writer,
            "[update] flags={:#010x} {scheduled} at {:.1}µs",
            e.flags,
            self.host_us(e.timestamp),
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {} at {:.1}µs",
            e.frame_index,
            phase_name(e.phase),
            self.host_us(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} at {:.1}µs",
            e.frame_index,
            phase_name(e.phase),
            self.host_us(e.timestamp),
        );
    }

    fn on_input_dispatch(&mut self, e: &InputDispatchEvent) {
        let hit = if e.hit { "hit" } else { "miss" };
        let _ = writeln!(
            self.writer,
            "[input] {} {hit} at {:.1}µs",
            kind_name(e.kind_code),
            self.host_us(e.timestamp),
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} process={:.1}µs display={:.1}µs \
             input={:.1}µs present={:.1}µs",
            s.frame_index,
            self.ticks_to_us(s.process_ticks),
            self.ticks_to_us(s.display_ticks),
            self.ticks_to_us(s.input_ticks),
            self.ticks_to_us(s.present_ticks),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fresco_core::time::HostTime;

    #[test]
    fn pretty_print_tick() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        sink.on_frame_tick(&FrameTickEvent {
            frame_index: 1,
            now: HostTime(1_000_000),
        });
        let output = String::from_utf8(sink.writer).unwrap();
        assert!(output.contains("[tick]"), "got: {output}");
        assert!(output.contains("frame=1"), "got: {output}");
    }

    #[test]
    fn pretty_print_input_dispatch_names_the_kind() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        sink.on_input_dispatch(&InputDispatchEvent {
            kind_code: EventKind::MouseMove.code(),
            hit: false,
            timestamp: HostTime(500),
        });
        let output = String::from_utf8(sink.writer).unwrap();
        assert!(output.contains("mousemove"), "got: {output}");
        assert!(output.contains("miss"), "got: {output}");
    }
}
