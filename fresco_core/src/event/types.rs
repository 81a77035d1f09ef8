// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synthetic event payloads.

use alloc::vec::Vec;

use kurbo::Point;

use crate::view::ViewId;

/// The kind of a synthetic event.
///
/// Discriminants are stable and exposed via [`code`](Self::code) for
/// compact recording.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Primary mouse button pressed.
    MouseDown = 0,
    /// Primary mouse button released.
    MouseUp = 1,
    /// Mouse moved over the surface.
    MouseMove = 2,
    /// Mouse entered a view (bubbling).
    MouseOver = 3,
    /// Mouse left a view (bubbling).
    MouseOut = 4,
    /// Mouse entered a view (non-bubbling, per-ancestor).
    MouseEnter = 5,
    /// Mouse left a view (non-bubbling, per-ancestor).
    MouseLeave = 6,
    /// Pointer contact began.
    PointerDown = 7,
    /// Pointer contact ended.
    PointerUp = 8,
    /// Pointer moved.
    PointerMove = 9,
    /// Pointer entered a view (bubbling).
    PointerOver = 10,
    /// Pointer left a view (bubbling).
    PointerOut = 11,
    /// Pointer entered a view (non-bubbling, per-ancestor).
    PointerEnter = 12,
    /// Pointer left a view (non-bubbling, per-ancestor).
    PointerLeave = 13,
    /// Pointer sequence was aborted by the platform.
    PointerCancel = 14,
    /// One or more touches began on a target.
    TouchStart = 15,
    /// Touches on a target moved.
    TouchMove = 16,
    /// Touches on a target lifted.
    TouchEnd = 17,
    /// A touch sequence was aborted by the platform.
    TouchCancel = 18,
}

impl EventKind {
    /// Returns whether events of this kind bubble to ancestors.
    ///
    /// Enter/leave kinds are delivered per ancestor instead of bubbling,
    /// matching their DOM counterparts.
    #[must_use]
    pub const fn bubbles(self) -> bool {
        !matches!(
            self,
            Self::MouseEnter | Self::MouseLeave | Self::PointerEnter | Self::PointerLeave
        )
    }

    /// Returns the stable wire code of this kind.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decodes a wire code back into a kind.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::MouseDown,
            1 => Self::MouseUp,
            2 => Self::MouseMove,
            3 => Self::MouseOver,
            4 => Self::MouseOut,
            5 => Self::MouseEnter,
            6 => Self::MouseLeave,
            7 => Self::PointerDown,
            8 => Self::PointerUp,
            9 => Self::PointerMove,
            10 => Self::PointerOver,
            11 => Self::PointerOut,
            12 => Self::PointerEnter,
            13 => Self::PointerLeave,
            14 => Self::PointerCancel,
            15 => Self::TouchStart,
            16 => Self::TouchMove,
            17 => Self::TouchEnd,
            18 => Self::TouchCancel,
            _ => return None,
        })
    }
}

/// Modifier-key state captured alongside an input event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Any shift key is pressed.
    pub shift: bool,
    /// Any control key is pressed.
    pub ctrl: bool,
    /// Any alt/option key is pressed.
    pub alt: bool,
    /// Any meta/command key is pressed.
    pub meta: bool,
}

impl Modifiers {
    /// No modifier keys pressed.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };
}

/// One physical touch point, identified for the duration of its contact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchPoint {
    /// Platform-assigned touch identifier, stable from start to
    /// end/cancel.
    pub id: i32,
    /// Position in surface coordinates.
    pub position: Point,
}

/// A synthetic event dispatched through the view tree.
///
/// The target is fixed at creation; propagation runs the target's
/// listeners first, then bubbles through ancestors until consumed or
/// until the surface host terminates the chain.
#[derive(Clone, Debug)]
pub struct ViewEvent {
    kind: EventKind,
    target: ViewId,
    related_target: Option<ViewId>,
    position: Point,
    modifiers: Modifiers,
    touches: Vec<TouchPoint>,
    bubbles: bool,
    propagation_stopped: bool,
    default_prevented: bool,
    in_passive_listener: bool,
}

impl ViewEvent {
    /// Creates an event of `kind` targeted at `target`.
    #[must_use]
    pub fn new(kind: EventKind, target: ViewId, position: Point, modifiers: Modifiers) -> Self {
        Self {
            kind,
            target,
            related_target: None,
            position,
            modifiers,
            touches: Vec::new(),
            bubbles: kind.bubbles(),
            propagation_stopped: false,
            default_prevented: false,
            in_passive_listener: false,
        }
    }

    /// Creates a touch event carrying the given target's touch list.
    ///
    /// The event position is the first touch's position.
    #[must_use]
    pub fn touch(
        kind: EventKind,
        target: ViewId,
        touches: Vec<TouchPoint>,
        modifiers: Modifiers,
    ) -> Self {
        let position = touches.first().map_or(Point::ORIGIN, |t| t.position);
        Self {
            touches,
            ..Self::new(kind, target, position, modifiers)
        }
    }

    /// Attaches the other side of a target transition (the view the
    /// device came from or moved to).
    #[must_use]
    pub fn with_related(mut self, related: Option<ViewId>) -> Self {
        self.related_target = related;
        self
    }

    /// Returns the event kind.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// Returns the view the event targets.
    #[must_use]
    pub const fn target(&self) -> ViewId {
        self.target
    }

    /// Returns the other side of a target transition, if any.
    #[must_use]
    pub const fn related_target(&self) -> Option<ViewId> {
        self.related_target
    }

    /// Returns the event position in surface coordinates.
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    /// Returns the captured modifier-key state.
    #[must_use]
    pub const fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Returns the touches belonging to this event's target (touch
    /// events only; empty otherwise).
    #[must_use]
    pub fn touches(&self) -> &[TouchPoint] {
        &self.touches
    }

    /// Returns whether the event propagates to ancestors.
    #[must_use]
    pub const fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Stops propagation to further views; listeners already queued at
    /// the current view still run.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Returns whether propagation has been stopped.
    #[must_use]
    pub const fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Cancels the event's default action. Ignored inside a passive
    /// listener.
    pub fn prevent_default(&mut self) {
        if !self.in_passive_listener {
            self.default_prevented = true;
        }
    }

    /// Returns whether the default action was canceled.
    #[must_use]
    pub const fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub(crate) fn set_in_passive_listener(&mut self, passive: bool) {
        self.in_passive_listener = passive;
    }
}
