//! Frame timing and loop control.
//!
//! The app runs one cooperative tick per redraw. [`TickPhase::ORDER`] fixes what a tick does
//! and in which order, [`FrameClock`] measures the time between ticks and a [`StopHandle`]
//! ends the loop from anywhere that holds a clone of it.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use instant::{Duration, Instant};

/// The steps of a single frame tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    /// Flows advance their state, e.g. the model rotation.
    Rotate,
    /// The orbit controller applies accumulated pointer input to the camera.
    Controls,
    /// The frame is drawn and presented.
    Render,
}

impl TickPhase {
    pub const ORDER: [TickPhase; 3] = [TickPhase::Rotate, TickPhase::Controls, TickPhase::Render];
}

#[derive(Debug)]
pub struct FrameClock {
    last: Instant,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
        }
    }

    /// Time since the previous call (or since creation).
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.duration_since(self.last);
        self.last = now;
        self.frames += 1;
        dt
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Requests the frame loop to end. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_runs_before_controls_and_render() {
        assert_eq!(
            TickPhase::ORDER,
            [TickPhase::Rotate, TickPhase::Controls, TickPhase::Render]
        );
    }

    #[test]
    fn stop_is_shared_between_clones() {
        let handle = StopHandle::new();
        let clone = handle.clone();
        assert!(!handle.is_stopped());
        clone.stop();
        assert!(handle.is_stopped());
    }

    #[test]
    fn clock_counts_frames_and_never_goes_back() {
        let mut clock = FrameClock::new();
        let first = clock.tick();
        let second = clock.tick();
        assert!(first >= Duration::ZERO && second >= Duration::ZERO);
        assert_eq!(clock.frames(), 2);
    }
}
