use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, WindowEvent};
use winit::window::Window;

use super::event::{InputEvent, MouseButton, TouchPhase, TouchPoint};

/// Maps the window events the input layer cares about; everything else is `None`.
pub(crate) fn translate(window: &Window, event: &WindowEvent) -> Option<InputEvent> {
    let scale = window.scale_factor();
    let ev = match event {
        WindowEvent::CursorMoved { position, .. } => {
            let (x, y) = logical(*position, scale);
            InputEvent::PointerMoved { x, y }
        }
        WindowEvent::CursorLeft { .. } => InputEvent::PointerLeft,
        WindowEvent::MouseInput { state, button, .. } => InputEvent::Button {
            button: mouse_button(*button),
            pressed: *state == ElementState::Pressed,
        },
        WindowEvent::Touch(touch) => {
            let (x, y) = logical(touch.location, scale);
            InputEvent::Touch {
                phase: touch_phase(touch.phase),
                point: TouchPoint { id: touch.id, x, y },
            }
        }
        WindowEvent::Focused(focused) => InputEvent::Focus(*focused),
        _ => return None,
    };
    Some(ev)
}

fn logical(pos: PhysicalPosition<f64>, scale: f64) -> (f32, f32) {
    let pos = pos.to_logical::<f64>(scale);
    (pos.x as f32, pos.y as f32)
}

fn mouse_button(button: winit::event::MouseButton) -> MouseButton {
    use winit::event::MouseButton as W;
    match button {
        W::Left => MouseButton::Primary,
        W::Right => MouseButton::Secondary,
        W::Middle => MouseButton::Middle,
        W::Back => MouseButton::Other(3),
        W::Forward => MouseButton::Other(4),
        W::Other(code) => MouseButton::Other(code),
    }
}

fn touch_phase(phase: winit::event::TouchPhase) -> TouchPhase {
    use winit::event::TouchPhase as W;
    match phase {
        W::Started => TouchPhase::Started,
        W::Moved => TouchPhase::Moved,
        W::Ended => TouchPhase::Ended,
        W::Cancelled => TouchPhase::Cancelled,
    }
}
