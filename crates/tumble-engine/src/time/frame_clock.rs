/// Which redraw of a window this is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameTime {
    /// 0 for the first redraw of a window.
    pub index: u64,
}

/// Counts redraws of one window.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) -> FrameTime {
        let time = FrameTime { index: self.frames };
        self.frames += 1;
        time
    }
}
