//! Pointer and touch input → rotation requests.
//!
//! Vertical movement turns the cube about X, horizontal movement about Y.
//! No smoothing or momentum: each event maps to one request.

use tumble_engine::input::{InputEvent, InputState, TouchPhase};

/// Arguments for one `rotate(dx, dy)` call.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RotationRequest {
    /// Rotation about X, in pixels.
    pub dx: f32,
    /// Rotation about Y, in pixels.
    pub dy: f32,
}

/// Last-seen pointer or touch coordinates.
#[derive(Debug, Default, Clone)]
pub struct PointerTracker {
    last: (f32, f32),
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> (f32, f32) {
        self.last
    }

    /// Handles one event. `input` must already reflect the event.
    pub fn handle(&mut self, event: &InputEvent, input: &InputState) -> Option<RotationRequest> {
        match event {
            InputEvent::PointerMoved { x, y } => self.pointer_moved(*x, *y, input.primary_only()),
            InputEvent::Touch { phase, point } => match phase {
                TouchPhase::Started => {
                    self.touch_started(input.touches().len(), point.x, point.y);
                    None
                }
                TouchPhase::Moved => self.touch_moved(input.touches().len(), point.x, point.y),
                TouchPhase::Ended | TouchPhase::Cancelled => None,
            },
            _ => None,
        }
    }

    /// Rotates only while exactly the primary button is held. The position
    /// is recorded either way so a later drag starts without a jump.
    pub fn pointer_moved(&mut self, x: f32, y: f32, primary_only: bool) -> Option<RotationRequest> {
        let request = primary_only.then(|| self.delta_to(x, y));
        self.last = (x, y);
        request
    }

    /// `active` counts every finger down, including this one.
    pub fn touch_started(&mut self, active: usize, x: f32, y: f32) {
        if active > 1 {
            return;
        }
        self.last = (x, y);
    }

    pub fn touch_moved(&mut self, active: usize, x: f32, y: f32) -> Option<RotationRequest> {
        if active != 1 {
            return None;
        }
        let request = self.delta_to(x, y);
        self.last = (x, y);
        Some(request)
    }

    fn delta_to(&self, x: f32, y: f32) -> RotationRequest {
        RotationRequest {
            dx: y - self.last.1,
            dy: x - self.last.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use tumble_engine::input::{MouseButton, TouchPoint};

    use super::*;

    struct Harness {
        state: InputState,
        tracker: PointerTracker,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                state: InputState::default(),
                tracker: PointerTracker::new(),
            }
        }

        fn send(&mut self, event: InputEvent) -> Option<RotationRequest> {
            self.state.apply(&event);
            self.tracker.handle(&event, &self.state)
        }

        fn move_to(&mut self, x: f32, y: f32) -> Option<RotationRequest> {
            self.send(InputEvent::PointerMoved { x, y })
        }

        fn button(&mut self, button: MouseButton, pressed: bool) {
            self.send(InputEvent::Button { button, pressed });
        }

        fn touch(&mut self, phase: TouchPhase, id: u64, x: f32, y: f32) -> Option<RotationRequest> {
            self.send(InputEvent::Touch { phase, point: TouchPoint { id, x, y } })
        }
    }

    // ── pointer ───────────────────────────────────────────────────────────

    #[test]
    fn move_without_button_never_rotates_but_tracks() {
        let mut h = Harness::new();
        assert_eq!(h.move_to(10.0, 20.0), None);
        assert_eq!(h.move_to(30.0, 50.0), None);
        assert_eq!(h.tracker.last(), (30.0, 50.0));
    }

    #[test]
    fn drag_with_primary_maps_vertical_to_x() {
        let mut h = Harness::new();
        h.move_to(100.0, 100.0);
        h.button(MouseButton::Primary, true);
        let request = h.move_to(104.0, 110.0).unwrap();
        assert_eq!(request, RotationRequest { dx: 10.0, dy: 4.0 });
    }

    #[test]
    fn drag_with_extra_button_does_not_rotate() {
        let mut h = Harness::new();
        h.button(MouseButton::Primary, true);
        h.button(MouseButton::Secondary, true);
        assert_eq!(h.move_to(5.0, 5.0), None);
        assert_eq!(h.tracker.last(), (5.0, 5.0));
    }

    #[test]
    fn release_stops_rotation() {
        let mut h = Harness::new();
        h.button(MouseButton::Primary, true);
        assert!(h.move_to(1.0, 1.0).is_some());
        h.button(MouseButton::Primary, false);
        assert_eq!(h.move_to(2.0, 2.0), None);
    }

    // ── touch ─────────────────────────────────────────────────────────────

    #[test]
    fn single_touch_drag_rotates_from_its_start() {
        let mut h = Harness::new();
        assert_eq!(h.touch(TouchPhase::Started, 1, 50.0, 50.0), None);
        let request = h.touch(TouchPhase::Moved, 1, 53.0, 45.0).unwrap();
        assert_eq!(request, RotationRequest { dx: -5.0, dy: 3.0 });
        let request = h.touch(TouchPhase::Moved, 1, 54.0, 45.0).unwrap();
        assert_eq!(request, RotationRequest { dx: 0.0, dy: 1.0 });
    }

    #[test]
    fn two_finger_touch_never_rotates() {
        let mut h = Harness::new();
        h.touch(TouchPhase::Started, 1, 10.0, 10.0);
        h.touch(TouchPhase::Started, 2, 90.0, 90.0);
        assert_eq!(h.tracker.last(), (10.0, 10.0));
        assert_eq!(h.touch(TouchPhase::Moved, 1, 20.0, 20.0), None);
        assert_eq!(h.touch(TouchPhase::Moved, 2, 80.0, 80.0), None);
    }

    #[test]
    fn lifting_one_of_two_fingers_resumes_single_touch() {
        let mut h = Harness::new();
        h.touch(TouchPhase::Started, 1, 10.0, 10.0);
        h.touch(TouchPhase::Started, 2, 90.0, 90.0);
        h.touch(TouchPhase::Ended, 2, 90.0, 90.0);
        let request = h.touch(TouchPhase::Moved, 1, 12.0, 10.0).unwrap();
        assert_eq!(request, RotationRequest { dx: 0.0, dy: 2.0 });
    }
}
