//! Dread Maze - A first-person maze escape game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (maze, placement, movement, raycasting, enemy AI)
//! - `renderer`: Software raycast renderer into a 2D framebuffer
//! - `game`: Host-facing session controller (lifecycle hooks, frame timing)
//! - `audio`: Audio collaborator seam (WebAudio ambience on wasm)
//! - `settings`: Data-driven tuning and quality presets

pub mod audio;
pub mod game;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use game::Game;
pub use settings::{GameConfig, QualityPreset};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Largest simulated step per frame (seconds); longer stalls are clamped
    pub const MAX_FRAME_DT: f32 = 0.05;

    /// Number of keys needed to unlock the exit
    pub const KEYS_REQUIRED: usize = 3;

    /// Rejection sampling budget for a random floor cell
    pub const FLOOR_SAMPLE_ATTEMPTS: u32 = 10_000;
    /// Cell used when rejection sampling finds nothing (always carved)
    pub const FALLBACK_CELL: (i32, i32) = (1, 1);

    /// DDA step bound per ray; exhaustion is treated as a hit
    pub const MAX_RAY_STEPS: u32 = 128;

    /// Smallest legal maze dimension
    pub const MIN_MAZE_SIZE: usize = 5;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector for a facing angle
#[inline]
pub fn angle_to_dir(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Angle of the vector pointing from `from` to `to`
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(3.0 * PI).abs() - PI).abs() < 1e-4);
        assert!((normalize_angle(-PI / 2.0) + PI / 2.0).abs() < 1e-6);
        assert!((normalize_angle(2.0 * PI + 0.25) - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_angle_between_axes() {
        let a = angle_between(Vec2::new(1.0, 1.0), Vec2::new(3.0, 1.0));
        assert!(a.abs() < 1e-6);
        let b = angle_between(Vec2::new(1.0, 1.0), Vec2::new(1.0, 4.0));
        assert!((b - PI / 2.0).abs() < 1e-6);
    }
}
