//! Shared test infrastructure for protowave integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use protowave::{
    FrameUpdate, Layout, ProtocolConfig, TimeDuration, TimeInstant, TimeSource, Waveform,
    WaveformView,
};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    const ZERO: Self = TestDuration(0);

    fn as_millis(&self) -> u64 {
        self.0
    }

    fn from_millis(millis: u64) -> Self {
        TestDuration(millis)
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0.saturating_sub(earlier.0))
    }
}

// ============================================================================
// Mock View
// ============================================================================

/// Mock view that records every draw and frame update
pub struct MockView {
    draws: Vec<(ProtocolConfig, Waveform, Layout)>,
    frames: Vec<FrameUpdate>,
    clears: usize,
}

impl MockView {
    pub fn new() -> Self {
        Self {
            draws: Vec::new(),
            frames: Vec::new(),
            clears: 0,
        }
    }

    pub fn clear_count(&self) -> usize {
        self.clears
    }

    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }

    pub fn last_drawn(&self) -> Option<&(ProtocolConfig, Waveform, Layout)> {
        self.draws.last()
    }

    pub fn frames(&self) -> &[FrameUpdate] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&FrameUpdate> {
        self.frames.last()
    }
}

impl WaveformView for MockView {
    fn draw(&mut self, config: &ProtocolConfig, waveform: &Waveform, layout: &Layout) {
        self.draws.push((*config, waveform.clone(), *layout));
    }

    fn update(&mut self, frame: &FrameUpdate) {
        self.frames.push(frame.clone());
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: core::cell::Cell<TestInstant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: core::cell::Cell::new(TestInstant(0)),
        }
    }

    /// Advance time by the given duration
    pub fn advance(&self, duration: TestDuration) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + duration.0));
    }

    pub fn set_time(&self, time: TestInstant) {
        self.current_time.set(time);
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        self.current_time.get()
    }
}

// ============================================================================
// Test Helper Functions
// ============================================================================

/// Level of the named line at abstract time `t`
pub fn level(waveform: &Waveform, line: &str, t: f32) -> protowave::Level {
    waveform
        .timeline(line)
        .unwrap_or_else(|| panic!("no line named {}", line))
        .level_at(t)
}

/// Compare two abstract times with floating-point tolerance
pub fn times_equal(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}
