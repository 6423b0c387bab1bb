//! World targets and observer pose
//!
//! The host anchors one orb per color in world space. The core only ever looks
//! positions up; it never moves or removes a target.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::color::Color;
use crate::consts::SPAWN_DROP;

/// Read-only lookup of a color's world position
pub trait WorldTargetProvider {
    fn lookup(&self, color: Color) -> Option<Vec3>;
}

/// Camera/player pose, sampled once per tick
pub trait ObserverPoseProvider {
    fn position(&self) -> Vec3;
    fn forward(&self) -> Vec3;
}

/// Plain pose value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverPose {
    pub position: Vec3,
    pub forward: Vec3,
}

impl ObserverPose {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }

    /// Pose at `position` looking toward `target`
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            forward: (target - position).normalize_or_zero(),
        }
    }
}

impl ObserverPoseProvider for ObserverPose {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn forward(&self) -> Vec3 {
        self.forward
    }
}

/// Color -> world position map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldTargets {
    positions: [Option<Vec3>; 4],
}

impl WorldTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or move) the orb for `color`
    pub fn insert(&mut self, color: Color, position: Vec3) {
        self.positions[color.index()] = Some(position);
    }

    pub fn remove(&mut self, color: Color) -> Option<Vec3> {
        self.positions[color.index()].take()
    }

    pub fn len(&self) -> usize {
        self.positions.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered targets in color order
    pub fn iter(&self) -> impl Iterator<Item = (Color, Vec3)> + '_ {
        Color::ALL
            .into_iter()
            .filter_map(|color| self.positions[color.index()].map(|pos| (color, pos)))
    }
}

impl WorldTargetProvider for WorldTargets {
    fn lookup(&self, color: Color) -> Option<Vec3> {
        self.positions[color.index()]
    }
}

impl FromIterator<(Color, Vec3)> for WorldTargets {
    fn from_iter<I: IntoIterator<Item = (Color, Vec3)>>(iter: I) -> Self {
        let mut targets = Self::new();
        for (color, pos) in iter {
            targets.insert(color, pos);
        }
        targets
    }
}

/// Where orbs and the orbiter go for a session
///
/// Orbs sit `distance` away from the observer on the horizontal plane, one
/// per side: red in front, green behind, blue to the left, yellow to the
/// right, all 1 m below eye height. The orbit is centred under the observer
/// at the same height and the orbiter starts halfway out in front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnLayout {
    pub targets: WorldTargets,
    pub orbit_center: Vec3,
    pub orbiter_spawn: Vec3,
}

impl SpawnLayout {
    pub fn around(pose: &dyn ObserverPoseProvider, distance: f32) -> Self {
        let eye = pose.position();
        let mut forward = pose.forward();
        forward.y = 0.0;
        // Looking straight up or down: fall back to +Z
        let forward = forward.try_normalize().unwrap_or(Vec3::Z);
        let right = Vec3::Y.cross(forward).normalize();

        let drop = |p: Vec3| Vec3::new(p.x, eye.y - SPAWN_DROP, p.z);

        let targets = [
            (Color::Red, eye + forward * distance),
            (Color::Green, eye - forward * distance),
            (Color::Blue, eye - right * distance),
            (Color::Yellow, eye + right * distance),
        ]
        .into_iter()
        .map(|(color, pos)| (color, drop(pos)))
        .collect();

        Self {
            targets,
            orbit_center: drop(eye),
            orbiter_spawn: drop(eye + forward * distance * 0.5),
        }
    }
}
