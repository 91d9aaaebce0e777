//! Pointer gesture tracking.
//!
//! Raw pointer events are translated into container-local coordinates and
//! classified as either a click or a drag. A press only turns into a drag
//! once the pointer has travelled more than [`MIN_DRAG_DISTANCE`] pixels, so
//! a shaky click never produces a zero-size selection.
//!
//! ```text
//! Idle ──down──▶ Pressed ──move > threshold──▶ Dragging ──up──▶ Ended
//!                   └──────────up──────────▶ (click) Ended
//! ```

use docanno_geometry::Point;

/// Minimum pointer travel (screen pixels) before a press counts as a drag.
pub const MIN_DRAG_DISTANCE: f32 = 3.0;

/// Current phase of the pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    /// No button held.
    #[default]
    Idle,
    /// Button held, threshold not yet exceeded.
    Pressed { start: Point },
    /// Button held and moved past the threshold.
    Dragging { start: Point, current: Point },
    /// Button released; kept until the next press for inspection.
    Ended { start: Point, end: Point },
}

/// What a pointer event amounted to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// The press crossed the drag threshold.
    DragStart { start: Point, current: Point },
    /// The pointer moved during a drag.
    DragMove { start: Point, current: Point },
    /// The drag finished.
    DragEnd { start: Point, end: Point },
    /// Released without exceeding the threshold.
    Click(Point),
}

/// Tracks one pointer gesture at a time, in container-local coordinates.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    state: GestureState,
    /// Top-left of the container in client coordinates.
    origin: Point,
    threshold: f32,
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new(MIN_DRAG_DISTANCE)
    }
}

impl GestureTracker {
    pub fn new(threshold: f32) -> Self {
        Self {
            state: GestureState::Idle,
            origin: Point::ZERO,
            threshold,
        }
    }

    /// Set the container's client-space offset.
    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Whether a button is currently held.
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            GestureState::Pressed { .. } | GestureState::Dragging { .. }
        )
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    /// Translate a client-space point into container-local space.
    pub fn to_local(&self, client: Point) -> Point {
        Point::new(client.x - self.origin.x, client.y - self.origin.y)
    }

    /// Button pressed. Returns the local press point.
    pub fn pointer_down(&mut self, client: Point) -> Point {
        let local = self.to_local(client);
        if self.is_active() {
            log::warn!("Pointer down during an active gesture - restarting gesture");
        }
        self.state = GestureState::Pressed { start: local };
        log::trace!("Gesture: pressed at ({:.1}, {:.1})", local.x, local.y);
        local
    }

    /// Pointer moved. Only yields events once the drag threshold is exceeded.
    pub fn pointer_move(&mut self, client: Point) -> Option<GestureEvent> {
        let local = self.to_local(client);
        match self.state {
            GestureState::Pressed { start } => {
                if start.distance_to(&local) > self.threshold {
                    self.state = GestureState::Dragging {
                        start,
                        current: local,
                    };
                    log::debug!(
                        "Gesture: drag started at ({:.1}, {:.1})",
                        start.x,
                        start.y
                    );
                    Some(GestureEvent::DragStart {
                        start,
                        current: local,
                    })
                } else {
                    None
                }
            }
            GestureState::Dragging { start, .. } => {
                self.state = GestureState::Dragging {
                    start,
                    current: local,
                };
                Some(GestureEvent::DragMove {
                    start,
                    current: local,
                })
            }
            GestureState::Idle | GestureState::Ended { .. } => None,
        }
    }

    /// Button released. Always ends the gesture.
    pub fn pointer_up(&mut self, client: Point) -> Option<GestureEvent> {
        let local = self.to_local(client);
        let event = match self.state {
            GestureState::Pressed { start } => {
                // A fast flick may cross the threshold without any move event
                if start.distance_to(&local) > self.threshold {
                    Some(GestureEvent::DragEnd { start, end: local })
                } else {
                    Some(GestureEvent::Click(start))
                }
            }
            GestureState::Dragging { start, .. } => Some(GestureEvent::DragEnd { start, end: local }),
            GestureState::Idle | GestureState::Ended { .. } => None,
        };

        match event {
            Some(GestureEvent::DragEnd { start, end }) => {
                self.state = GestureState::Ended { start, end };
                log::debug!("Gesture: drag ended at ({:.1}, {:.1})", end.x, end.y);
            }
            Some(GestureEvent::Click(point)) => {
                self.state = GestureState::Ended {
                    start: point,
                    end: point,
                };
                log::debug!("Gesture: click at ({:.1}, {:.1})", point.x, point.y);
            }
            _ => {}
        }
        event
    }

    /// Drop any in-progress gesture.
    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
    }

    /// The 0, 1 or 2 points of the current selection.
    pub fn selection_points(&self) -> Vec<Point> {
        match self.state {
            GestureState::Idle => Vec::new(),
            GestureState::Pressed { start } => vec![start],
            GestureState::Dragging { start, current } => vec![start, current],
            GestureState::Ended { start, end } => vec![start, end],
        }
    }
}
