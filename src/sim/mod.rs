//! Game simulation module
//!
//! All gameplay logic lives here. This module must stay host-agnostic:
//! - Host-driven `tick(dt)` only, no wall clock or threads
//! - Seeded RNG only
//! - World positions and camera pose come in through traits
//! - No rendering or platform dependencies

pub mod autoplay;
pub mod color;
pub mod coordinator;
pub mod engine;
pub mod events;
pub mod orbit;
pub mod scheduler;
pub mod selection;
pub mod targets;

pub use autoplay::AutoPlayer;
pub use color::Color;
pub use coordinator::{GameMode, GameplayCoordinator};
pub use engine::{
    DropReason, GamePhase, InputSink, PlaybackMode, SelectionOutcome, SequenceEngine,
};
pub use events::{EventBus, EventLog, GameEvent, PresentationSink};
pub use orbit::{AgentTint, OrbitNavigator, Travel};
pub use scheduler::{Scheduler, TimerId};
pub use selection::{CandidateChange, SelectionCandidate, SelectionResolver};
pub use targets::{
    ObserverPose, ObserverPoseProvider, SpawnLayout, WorldTargetProvider, WorldTargets,
};
