//! Sphere Says - a Simon Says memory game core
//!
//! Core modules:
//! - `sim`: Sequence engine, orbit navigation, target selection and the
//!   coordinator that ties them together
//! - `settings`: Data-driven game configuration
//! - `error`: Library error type

pub mod error;
pub mod settings;
pub mod sim;

pub use error::SimError;
pub use settings::GameConfig;

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Host tick used by the demo runner (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Delay between `start_new_game` and the first playback
    pub const START_DELAY: f32 = 1.0;
    /// Orbiter grow animation before playback starts
    pub const GROW_DURATION: f32 = 0.5;
    /// Orbiter shrink animation after playback ends
    pub const SETTLE_DURATION: f32 = 0.5;
    /// Pause after an orbit-mode highlight
    pub const HIGHLIGHT_HOLD: f32 = 0.5;
    /// Pause between a completed round and the next level
    pub const NEXT_LEVEL_DELAY: f32 = 1.0;
    /// Input guard release after a correct (non-final) pick
    pub const INPUT_COOLDOWN: f32 = 0.1;
    /// Flat-mode pause between highlights
    pub const SEQUENCE_STEP_DELAY: f32 = 1.0;
    /// Advisory player response window
    pub const INPUT_TIMEOUT: f32 = 3.0;

    /// Angular delta (radians) below which the orbiter snaps to its target
    pub const SNAP_THRESHOLD: f32 = 0.01;
    /// Orbiter linear approach speed (m/s)
    pub const APPROACH_SPEED: f32 = 0.6;
    /// Distance from the observer at which orbs are spawned (m)
    pub const SPAWN_DISTANCE: f32 = 1.5;
    /// Orbs and orbit plane sit this far below eye height (m)
    pub const SPAWN_DROP: f32 = 1.0;

    /// Targeting reach (m)
    pub const SELECTION_MAX_DISTANCE: f32 = 10.0;
    /// Targeting cone half-angle (degrees)
    pub const SELECTION_MAX_ANGLE_DEG: f32 = 30.0;
    /// Minimum score for a candidate to become the current target
    pub const SELECTION_MIN_SCORE: f32 = 0.5;
    /// Committed selection is cleared this long after being forwarded
    pub const SELECTION_CLEAR_DELAY: f32 = 0.5;

    /// Default level cap
    pub const MAX_LEVEL: u32 = 10;
}

/// Normalize an angle to (-π, π]
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if angle > -PI && angle <= PI {
        return angle;
    }
    let wrapped = PI - (PI - angle).rem_euclid(TAU);
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Shortest signed rotation from `from` to `to`, in (-π, π]
#[inline]
pub fn shortest_delta(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Point on a horizontal circle around `center` (angle measured in the XZ plane)
#[inline]
pub fn orbit_point(center: Vec3, radius: f32, theta: f32) -> Vec3 {
    center + Vec3::new(radius * theta.cos(), 0.0, radius * theta.sin())
}

/// Horizontal bearing of `to` as seen from `from` (atan2 of z over x)
#[inline]
pub fn horizontal_angle(from: Vec3, to: Vec3) -> f32 {
    let offset = to - from;
    offset.z.atan2(offset.x)
}
