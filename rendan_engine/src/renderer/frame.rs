/// Frame lifecycle state machine, outcomes and counters

/// Where the orchestrator is within one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameState {
    #[default]
    Idle,
    Acquiring,
    Recording,
    Submitted,
    Presenting,
}

impl FrameState {
    /// Legal transitions: Idle -> Acquiring -> Recording -> Submitted -> Presenting -> Idle,
    /// plus Acquiring -> Idle when the frame is skipped
    pub fn can_advance_to(self, next: FrameState) -> bool {
        matches!(
            (self, next),
            (FrameState::Idle, FrameState::Acquiring)
                | (FrameState::Acquiring, FrameState::Recording)
                | (FrameState::Acquiring, FrameState::Idle)
                | (FrameState::Recording, FrameState::Submitted)
                | (FrameState::Submitted, FrameState::Presenting)
                | (FrameState::Presenting, FrameState::Idle)
        )
    }
}

/// Why a frame produced no new image on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Acquire reported an out-of-date swapchain; it was rebuilt
    OutOfDate,
    /// Present reported an out-of-date swapchain; it is rebuilt next frame
    PresentOutOfDate,
    /// The window has a zero-area framebuffer
    Minimized,
}

/// Result of `Renderer::render_frame`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented { image_index: usize },
    Skipped(SkipReason),
}

impl FrameOutcome {
    pub fn is_presented(&self) -> bool {
        matches!(self, FrameOutcome::Presented { .. })
    }
}

/// Running counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub frames_presented: u64,
    pub frames_skipped: u64,
    pub swapchain_recreations: u64,
    pub draw_calls: u64,
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
