//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Frame timing (fixed-step accumulator, FPS)
//! - Pointer coordinates (canvas pixels to arena units)
//! - The JS-facing session wrapper (wasm32 only)

use glam::Vec2;

use crate::consts::{ARENA_HEIGHT, ARENA_WIDTH, MAX_SUBSTEPS, SIM_DT};

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Frames averaged by the FPS counter
const FPS_WINDOW: usize = 60;
/// Longest frame fed to the accumulator (seconds)
const MAX_FRAME_DT: f32 = 0.1;

/// Host clock in milliseconds
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;
    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
}

/// Rolling frame-rate estimate over the last 60 frames
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frame_times: [f64; FPS_WINDOW],
    frame_index: usize,
    fps: u32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self {
            frame_times: [0.0; FPS_WINDOW],
            frame_index: 0,
            fps: 0,
        }
    }
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame timestamp (ms)
    pub fn record(&mut self, time: f64) {
        self.frame_times[self.frame_index] = time;
        self.frame_index = (self.frame_index + 1) % FPS_WINDOW;

        // Oldest sample sits at the next write position
        let oldest = self.frame_times[self.frame_index];
        if oldest > 0.0 {
            let elapsed = time - oldest;
            if elapsed > 0.0 {
                self.fps = ((FPS_WINDOW - 1) as f64 * 1000.0 / elapsed).round() as u32;
            }
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// Fixed-step accumulator
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    accumulator: f32,
    last_time: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fixed ticks to run for a frame at `time` (ms)
    pub fn advance(&mut self, time: f64) -> u32 {
        let dt = match self.last_time {
            Some(last) => ((time - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_time = Some(time);
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        // Drop backlog we refused to simulate
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }

    /// Forget the last timestamp (after a pause or tab switch)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.last_time = None;
    }
}

/// Canvas-to-arena mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Canvas size in CSS pixels
    pub size: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            size: Vec2::new(ARENA_WIDTH, ARENA_HEIGHT),
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width.max(1.0), height.max(1.0)),
        }
    }

    /// Map a canvas pixel to arena units (clamped inside the arena)
    pub fn to_arena(&self, x: f32, y: f32) -> Vec2 {
        let arena = Vec2::new(ARENA_WIDTH, ARENA_HEIGHT);
        (Vec2::new(x, y) / self.size * arena).clamp(Vec2::ZERO, arena)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_steady_60() {
        let mut fps = FpsCounter::new();
        for i in 1..=120 {
            fps.record(i as f64 * 1000.0 / 60.0);
        }
        assert_eq!(fps.fps(), 60);
    }

    #[test]
    fn test_frame_clock_substeps() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(1000.0), 0);
        assert_eq!(clock.advance(1000.0 + 1000.0 / 60.0 + 0.01), 1);
        // Long stall is capped
        assert_eq!(clock.advance(5000.0), MAX_SUBSTEPS);
        clock.reset();
        assert_eq!(clock.advance(9000.0), 0);
    }

    #[test]
    fn test_viewport_mapping() {
        let vp = Viewport::new(600.0, 350.0);
        assert_eq!(vp.to_arena(300.0, 175.0), Vec2::new(ARENA_WIDTH / 2.0, ARENA_HEIGHT / 2.0));
        assert_eq!(vp.to_arena(-10.0, 900.0), Vec2::new(0.0, ARENA_HEIGHT));
    }
}
