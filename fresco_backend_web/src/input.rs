// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native DOM event translation.
//!
//! Converts browser mouse/pointer/touch payloads into the
//! surface-coordinate records the [`InputRouter`] consumes. Coordinates
//! are taken relative to the canvas's current bounding rectangle, so
//! window-scoped listeners report positions in the same space as
//! canvas-scoped ones (including negative values outside the surface).
//!
//! [`InputRouter`]: fresco_core::event::InputRouter

use alloc::vec::Vec;

use kurbo::Point;
use web_sys::{HtmlCanvasElement, MouseEvent, PointerEvent, TouchEvent};

use fresco_core::event::{Modifiers, PointerType, TouchPoint};

/// Converts a mouse/pointer event position to surface coordinates.
#[must_use]
pub fn mouse_position(canvas: &HtmlCanvasElement, event: &MouseEvent) -> Point {
    let rect = canvas.get_bounding_client_rect();
    Point::new(
        f64::from(event.client_x()) - rect.left(),
        f64::from(event.client_y()) - rect.top(),
    )
}

/// Captures the modifier-key state of a mouse/pointer event.
#[must_use]
pub fn mouse_modifiers(event: &MouseEvent) -> Modifiers {
    Modifiers {
        shift: event.shift_key(),
        ctrl: event.ctrl_key(),
        alt: event.alt_key(),
        meta: event.meta_key(),
    }
}

/// Captures the modifier-key state of a touch event.
#[must_use]
pub fn touch_modifiers(event: &TouchEvent) -> Modifiers {
    Modifiers {
        shift: event.shift_key(),
        ctrl: event.ctrl_key(),
        alt: event.alt_key(),
        meta: event.meta_key(),
    }
}

/// Maps the platform's pointer-type string to a [`PointerType`].
///
/// Unknown types are treated as touch, the least sticky class (their
/// records are removed on up/cancel).
#[must_use]
pub fn pointer_type(event: &PointerEvent) -> PointerType {
    match event.pointer_type().as_str() {
        "mouse" => PointerType::Mouse,
        "pen" => PointerType::Pen,
        _ => PointerType::Touch,
    }
}

/// Converts a touch event's changed touches to surface-coordinate
/// [`TouchPoint`]s.
#[must_use]
pub fn changed_touches(canvas: &HtmlCanvasElement, event: &TouchEvent) -> Vec<TouchPoint> {
    let rect = canvas.get_bounding_client_rect();
    let list = event.changed_touches();
    let mut points = Vec::with_capacity(list.length() as usize);
    for index in 0..list.length() {
        if let Some(touch) = list.item(index) {
            points.push(TouchPoint {
                id: touch.identifier(),
                position: Point::new(
                    f64::from(touch.client_x()) - rect.left(),
                    f64::from(touch.client_y()) - rect.top(),
                ),
            });
        }
    }
    points
}
