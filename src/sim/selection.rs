//! AR target selection
//!
//! Each tick the resolver scores every world target by how close it is and
//! how near the middle of the observer's view it sits, and keeps the best one
//! as the current candidate. `confirm` commits the candidate as the player's
//! pick.

use glam::Vec3;

use super::color::Color;
use super::engine::{InputSink, SelectionOutcome};
use super::scheduler::Scheduler;
use super::targets::{ObserverPoseProvider, WorldTargetProvider};
use crate::consts::SELECTION_MIN_SCORE;
use crate::settings::GameConfig;

/// A scored target for the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionCandidate {
    pub color: Color,
    pub distance: f32,
    /// Degrees off the observer's forward direction
    pub angle_deg: f32,
    pub score: f32,
}

/// The current candidate moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateChange {
    pub previous: Option<Color>,
    pub current: Option<Color>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolverTask {
    ClearSelection,
}

#[derive(Debug, Clone)]
pub struct SelectionResolver {
    max_distance: f32,
    max_angle_deg: f32,
    clear_delay: f32,
    disabled: bool,
    /// Best-aimed target this frame
    current: Option<Color>,
    /// Committed pick, excluded from targeting until cleared
    selected: Option<Color>,
    /// Last candidate reported through `update`
    announced: Option<Color>,
    scheduler: Scheduler<ResolverTask>,
}

impl SelectionResolver {
    pub fn new(max_distance: f32, max_angle_deg: f32, clear_delay: f32) -> Self {
        Self {
            max_distance,
            max_angle_deg,
            clear_delay,
            disabled: false,
            current: None,
            selected: None,
            announced: None,
            scheduler: Scheduler::new(),
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(
            config.selection_max_distance,
            config.selection_max_angle_deg,
            config.selection_clear_delay,
        )
    }

    pub fn current_target(&self) -> Option<Color> {
        self.current
    }

    pub fn selected(&self) -> Option<Color> {
        self.selected
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Score one target, or None if it is out of reach or outside the cone
    pub fn score(
        &self,
        observer: Vec3,
        forward: Vec3,
        color: Color,
        target: Vec3,
    ) -> Option<SelectionCandidate> {
        let distance = observer.distance(target);
        if distance > self.max_distance {
            return None;
        }

        let forward = forward.normalize_or_zero();
        let to_target = (target - observer).normalize_or_zero();
        let angle_deg = if forward == Vec3::ZERO || to_target == Vec3::ZERO {
            0.0
        } else {
            forward.angle_between(to_target).to_degrees()
        };
        if angle_deg > self.max_angle_deg {
            return None;
        }

        let distance_score = 1.0 - distance / self.max_distance;
        let angle_score = 1.0 - angle_deg / self.max_angle_deg;
        Some(SelectionCandidate {
            color,
            distance,
            angle_deg,
            score: (distance_score + angle_score) / 2.0,
        })
    }

    /// Highest-scoring target above the threshold, skipping the committed pick
    pub fn best_candidate(
        &self,
        pose: &dyn ObserverPoseProvider,
        targets: &dyn WorldTargetProvider,
    ) -> Option<SelectionCandidate> {
        let observer = pose.position();
        let forward = pose.forward();
        let mut best: Option<SelectionCandidate> = None;
        for color in Color::ALL {
            if Some(color) == self.selected {
                continue;
            }
            let Some(position) = targets.lookup(color) else {
                continue;
            };
            let Some(candidate) = self.score(observer, forward, color, position) else {
                continue;
            };
            let best_score = best.map(|b| b.score).unwrap_or(0.0);
            if candidate.score > best_score && candidate.score > SELECTION_MIN_SCORE {
                best = Some(candidate);
            }
        }
        best
    }

    /// Run the pending selection clear
    pub fn tick(&mut self, dt: f32) {
        for task in self.scheduler.tick(dt) {
            match task {
                ResolverTask::ClearSelection => self.clear_selection(),
            }
        }
    }

    /// Per-frame targeting. `accepting_input` is false while the engine is
    /// idle or playing the sequence; targeting is cleared then.
    pub fn update(
        &mut self,
        pose: &dyn ObserverPoseProvider,
        targets: &dyn WorldTargetProvider,
        accepting_input: bool,
    ) -> Option<CandidateChange> {
        if self.disabled || !accepting_input {
            self.current = None;
        } else {
            self.current = self.best_candidate(pose, targets).map(|c| c.color);
        }

        let previous = self.announced;
        if self.current == previous {
            return None;
        }
        self.announced = self.current;
        Some(CandidateChange {
            previous,
            current: self.current,
        })
    }

    /// Commit the current candidate and forward it to `sink`.
    ///
    /// Returns the forwarded color and the engine's verdict. When the sink is
    /// not taking input the pick is discarded.
    pub fn confirm<S: InputSink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> Option<(Color, SelectionOutcome)> {
        if self.disabled {
            return None;
        }
        let color = self.current?;
        self.selected = Some(color);

        if !sink.accepts_input() {
            log::debug!("Discarding pick {}: input closed", color);
            self.clear_selection();
            return None;
        }

        let outcome = sink.submit_color_selection(color);
        self.scheduler.cancel_all();
        self.scheduler
            .delay(self.clear_delay, ResolverTask::ClearSelection);
        Some((color, outcome))
    }

    /// Drop the committed pick and the current candidate
    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.current = None;
    }

    /// Reset every highlight and pending clear
    pub fn clear_all(&mut self) {
        self.scheduler.cancel_all();
        self.clear_selection();
    }

    pub fn disable(&mut self) {
        self.disabled = true;
        self.clear_selection();
    }

    pub fn enable(&mut self) {
        self.disabled = false;
    }
}
