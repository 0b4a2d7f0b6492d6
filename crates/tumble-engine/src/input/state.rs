use super::event::{InputEvent, MouseButton, TouchPhase, TouchPoint};

/// What is held down right now in one window.
#[derive(Debug, Default)]
pub struct InputState {
    held: Vec<MouseButton>,
    // Oldest first.
    touches: Vec<TouchPoint>,
}

impl InputState {
    /// Folds `ev` into the state. Losing focus drops every held button and touch.
    pub fn apply(&mut self, ev: &InputEvent) {
        match *ev {
            InputEvent::PointerMoved { .. } | InputEvent::PointerLeft => {}
            InputEvent::Button { button, pressed: true } => {
                if !self.held.contains(&button) {
                    self.held.push(button);
                }
            }
            InputEvent::Button { button, pressed: false } => self.held.retain(|b| *b != button),
            InputEvent::Touch { phase, point } => self.apply_touch(phase, point),
            InputEvent::Focus(true) => {}
            InputEvent::Focus(false) => {
                self.held.clear();
                self.touches.clear();
            }
        }
    }

    fn apply_touch(&mut self, phase: TouchPhase, point: TouchPoint) {
        let existing = self.touches.iter().position(|t| t.id == point.id);
        match (phase, existing) {
            (TouchPhase::Started, Some(i)) => {
                self.touches.remove(i);
                self.touches.push(point);
            }
            (TouchPhase::Started, None) => self.touches.push(point),
            (TouchPhase::Moved, Some(i)) => self.touches[i] = point,
            (TouchPhase::Ended | TouchPhase::Cancelled, Some(i)) => {
                self.touches.remove(i);
            }
            (_, None) => {}
        }
    }

    pub fn is_down(&self, button: MouseButton) -> bool {
        self.held.contains(&button)
    }

    /// The primary button is held and nothing else is.
    pub fn primary_only(&self) -> bool {
        self.held == [MouseButton::Primary]
    }

    /// Fingers currently down, in the order they landed.
    pub fn touches(&self) -> &[TouchPoint] {
        &self.touches
    }
}
