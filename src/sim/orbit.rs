//! Orbit navigation for the AR agent
//!
//! The agent lives on a horizontal circle of fixed radius around the orbit
//! center. Travel is expressed as a target angle: the agent always takes the
//! shortest signed way round, at an angular speed of `approach_speed / radius`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::SNAP_THRESHOLD;
use crate::error::SimError;
use crate::settings::GameConfig;
use crate::{horizontal_angle, normalize_angle, orbit_point, shortest_delta};

/// Visual state of the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AgentTint {
    #[default]
    Normal,
    Approaching,
    Reached,
}

/// Result of a travel request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Travel {
    /// Already within the snap threshold; arrival is immediate
    Arrived,
    /// Motion started; `tick` reports arrival
    Started,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrbitNavigator {
    center: Vec3,
    radius: f32,
    /// Linear speed along the circle (m/s)
    approach_speed: f32,
    /// Current angle on the circle (radians, (-π, π])
    angle: f32,
    target_angle: Option<f32>,
    orbiting: bool,
    reached: bool,
    tint: AgentTint,
}

impl OrbitNavigator {
    /// Radius and speed must both be positive and finite, or the agent could
    /// never arrive
    pub fn new(center: Vec3, radius: f32, approach_speed: f32) -> Result<Self, SimError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "orbit radius must be positive, got {radius}"
            )));
        }
        if !(approach_speed.is_finite() && approach_speed > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "approach speed must be positive, got {approach_speed}"
            )));
        }
        Ok(Self {
            center,
            radius,
            approach_speed,
            angle: 0.0,
            target_angle: None,
            orbiting: false,
            reached: false,
            tint: AgentTint::Normal,
        })
    }

    /// Navigator using the configured radius and approach speed
    pub fn from_config(center: Vec3, config: &GameConfig) -> Result<Self, SimError> {
        Self::new(center, config.orbit_radius, config.approach_speed)
    }

    /// Put the agent at the orbit angle closest to a world position
    pub fn place_agent(&mut self, position: Vec3) {
        self.angle = normalize_angle(horizontal_angle(self.center, position));
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn target_angle(&self) -> Option<f32> {
        self.target_angle
    }

    /// Radians per second
    pub fn angular_speed(&self) -> f32 {
        self.approach_speed / self.radius
    }

    /// World position of the agent
    pub fn position(&self) -> Vec3 {
        orbit_point(self.center, self.radius, self.angle)
    }

    pub fn is_orbiting(&self) -> bool {
        self.orbiting
    }

    pub fn has_reached_target(&self) -> bool {
        self.reached
    }

    pub fn tint(&self) -> AgentTint {
        self.tint
    }

    /// Head for the orbit point nearest to `target`. Any travel already in
    /// flight is dropped first.
    pub fn start_orbiting_to_target(&mut self, target: Vec3) -> Travel {
        self.reset_state();

        let target_angle = normalize_angle(horizontal_angle(self.center, target));
        self.target_angle = Some(target_angle);

        if shortest_delta(self.angle, target_angle).abs() <= SNAP_THRESHOLD {
            self.arrive(target_angle);
            return Travel::Arrived;
        }

        self.orbiting = true;
        self.reached = false;
        self.tint = AgentTint::Approaching;
        log::debug!(
            "Orbiter travelling {:.3} -> {:.3} rad",
            self.angle,
            target_angle
        );
        Travel::Started
    }

    /// Advance the agent. Returns true on the tick it reaches the target.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.orbiting {
            return false;
        }
        let Some(target) = self.target_angle else {
            self.orbiting = false;
            return false;
        };

        let delta = shortest_delta(self.angle, target);
        let step = self.angular_speed() * dt;
        if delta.abs() <= step {
            self.arrive(target);
            return true;
        }

        self.angle = normalize_angle(self.angle + delta.signum() * step);
        if shortest_delta(self.angle, target).abs() <= SNAP_THRESHOLD {
            self.arrive(target);
            return true;
        }
        false
    }

    /// Halt motion, keep the current angle
    pub fn stop_orbiting(&mut self) {
        self.orbiting = false;
        self.reached = false;
    }

    /// Cancel travel, forget the target, back to the neutral tint
    pub fn reset_state(&mut self) {
        self.stop_orbiting();
        self.target_angle = None;
        self.tint = AgentTint::Normal;
    }

    fn arrive(&mut self, target: f32) {
        self.angle = target;
        self.orbiting = false;
        self.reached = true;
        self.tint = AgentTint::Reached;
    }
}
