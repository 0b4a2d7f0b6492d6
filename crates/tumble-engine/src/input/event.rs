/// Mouse buttons as seen by the app.
///
/// Anything past the middle button is reported by its platform code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Primary,
    Secondary,
    Middle,
    Other(u16),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
    Cancelled,
}

/// A finger on the surface, in logical pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TouchPoint {
    /// Stable while the finger stays down.
    pub id: u64,
    pub x: f32,
    pub y: f32,
}

/// Window input after translation from the platform.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Cursor position in logical pixels.
    PointerMoved { x: f32, y: f32 },
    PointerLeft,
    Button { button: MouseButton, pressed: bool },
    Touch { phase: TouchPhase, point: TouchPoint },
    Focus(bool),
}
