//! Gameplay coordinator
//!
//! Glue between the sequence engine, the orbiting agent and the target
//! selector. The coordinator drains the engine's outbox after every command
//! and tick, acts on travel/reset requests itself and publishes the rest to
//! the presentation layer.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::color::Color;
use super::engine::{InputSink, PlaybackMode, SelectionOutcome, SequenceEngine};
use super::events::{EventBus, GameEvent, PresentationSink};
use super::orbit::{OrbitNavigator, Travel};
use super::selection::SelectionResolver;
use super::targets::{ObserverPoseProvider, WorldTargetProvider};
use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// Screen buttons, no agent
    Flat,
    /// World-anchored orbs with an orbiting agent
    Augmented,
}

/// AR-only collaborators
struct AugmentedRig {
    navigator: OrbitNavigator,
    targets: Box<dyn WorldTargetProvider>,
}

pub struct GameplayCoordinator<R: Rng = Pcg32> {
    engine: SequenceEngine<R>,
    ar: Option<AugmentedRig>,
    resolver: SelectionResolver,
    bus: EventBus,
}

impl<R: Rng> GameplayCoordinator<R> {
    /// Coordinator for the button-driven game
    pub fn flat(mut engine: SequenceEngine<R>) -> Self {
        engine.set_playback_mode(PlaybackMode::Flat);
        let resolver = SelectionResolver::from_config(engine.config());
        Self {
            engine,
            ar: None,
            resolver,
            bus: EventBus::new(),
        }
    }

    /// Coordinator for the AR game. Playback waits on the navigator.
    pub fn augmented(
        mut engine: SequenceEngine<R>,
        navigator: OrbitNavigator,
        targets: Box<dyn WorldTargetProvider>,
    ) -> Self {
        engine.set_playback_mode(PlaybackMode::Orbit);
        let resolver = SelectionResolver::from_config(engine.config());
        Self {
            engine,
            ar: Some(AugmentedRig { navigator, targets }),
            resolver,
            bus: EventBus::new(),
        }
    }

    pub fn mode(&self) -> GameMode {
        if self.ar.is_some() {
            GameMode::Augmented
        } else {
            GameMode::Flat
        }
    }

    pub fn engine(&self) -> &SequenceEngine<R> {
        &self.engine
    }

    pub fn navigator(&self) -> Option<&OrbitNavigator> {
        self.ar.as_ref().map(|ar| &ar.navigator)
    }

    pub fn navigator_mut(&mut self) -> Option<&mut OrbitNavigator> {
        self.ar.as_mut().map(|ar| &mut ar.navigator)
    }

    pub fn targets(&self) -> Option<&dyn WorldTargetProvider> {
        self.ar.as_ref().map(|ar| ar.targets.as_ref())
    }

    pub fn resolver(&self) -> &SelectionResolver {
        &self.resolver
    }

    /// Register a presentation sink. A second subscription under the same
    /// key replaces the first.
    pub fn subscribe(&mut self, key: impl Into<String>, sink: Box<dyn PresentationSink>) {
        self.bus.subscribe(key, sink);
    }

    pub fn unsubscribe(&mut self, key: &str) -> bool {
        self.bus.unsubscribe(key)
    }

    // === Commands ===

    pub fn start_new_game(&mut self) {
        log::info!("Starting new {:?} game", self.mode());
        self.reset_agent();
        self.resolver.clear_all();
        self.resolver.enable();
        self.engine.start_new_game();
        self.pump();
    }

    pub fn stop_game(&mut self) {
        self.engine.stop_game();
        self.reset_agent();
        self.resolver.clear_all();
        self.pump();
    }

    /// Stop whatever is running and start over at level 1
    pub fn restart(&mut self) {
        log::debug!("Restart from level {}", self.engine.level());
        self.stop_game();
        self.start_new_game();
    }

    /// Leave the game for the menu: engine idle, selections cleared
    pub fn back_to_menu(&mut self) {
        self.engine.set_idle(true);
        self.reset_agent();
        self.resolver.clear_all();
        self.pump();
    }

    /// Direct selection from a flat button
    pub fn submit_color_selection(&mut self, color: Color) -> SelectionOutcome {
        let outcome = self.engine.on_color_selected(color);
        self.pump();
        outcome
    }

    /// Commit the resolver's current candidate (AR select button)
    pub fn confirm_selection(&mut self) -> Option<(Color, SelectionOutcome)> {
        let confirmed = self.resolver.confirm(&mut self.engine);
        self.pump();
        confirmed
    }

    /// Advance one frame. `pose` drives AR targeting and may be omitted in
    /// flat mode.
    pub fn tick(&mut self, dt: f32, pose: Option<&dyn ObserverPoseProvider>) {
        self.engine.tick(dt);
        self.pump();

        if let Some(ar) = &mut self.ar {
            if ar.navigator.tick(dt) {
                self.bus.publish(&GameEvent::AgentReachedTarget);
                self.engine.agent_arrived();
            }
        }
        self.pump();

        self.resolver.tick(dt);
        if let (Some(ar), Some(pose)) = (&self.ar, pose) {
            let accepting = self.engine.is_waiting_for_input();
            if let Some(change) = self.resolver.update(pose, ar.targets.as_ref(), accepting) {
                log::debug!("Candidate {:?} -> {:?}", change.previous, change.current);
                self.bus.publish(&GameEvent::CandidateChanged(change.current));
            }
        }
    }

    // === Internals ===

    /// Route everything the engine emitted, including events emitted while
    /// routing
    fn pump(&mut self) {
        loop {
            let events = self.engine.drain_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                self.route(event);
            }
        }
    }

    fn route(&mut self, event: GameEvent) {
        match event {
            GameEvent::AgentTravelRequested(color) => self.travel_to(color),
            GameEvent::AgentResetRequested => self.reset_agent(),
            GameEvent::RoundComplete { success: true } | GameEvent::GameOver => {
                self.resolver.disable();
                self.bus.publish(&event);
            }
            GameEvent::AgentGrowRequested => {
                self.resolver.enable();
                self.bus.publish(&event);
            }
            _ => self.bus.publish(&event),
        }
    }

    fn travel_to(&mut self, color: Color) {
        let Some(ar) = self.ar.as_mut() else {
            // No agent to move: highlight in place
            self.engine.agent_arrived();
            return;
        };

        let Some(target) = ar.targets.lookup(color) else {
            let err = SimError::MissingWorldTarget(color);
            log::warn!("{err}, highlighting without travel");
            self.bus.publish(&GameEvent::Fault(err));
            self.engine.agent_arrived();
            return;
        };

        match ar.navigator.start_orbiting_to_target(target) {
            Travel::Arrived => {
                self.bus.publish(&GameEvent::AgentReachedTarget);
                self.engine.agent_arrived();
            }
            Travel::Started => self.bus.publish(&GameEvent::AgentStartedTravel),
        }
    }

    fn reset_agent(&mut self) {
        if let Some(ar) = &mut self.ar {
            ar.navigator.reset_state();
        }
    }
}

impl<R: Rng> InputSink for GameplayCoordinator<R> {
    fn submit_color_selection(&mut self, color: Color) -> SelectionOutcome {
        GameplayCoordinator::submit_color_selection(self, color)
    }

    fn accepts_input(&self) -> bool {
        self.engine.accepts_input()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::settings::GameConfig;
    use crate::sim::engine::DropReason;
    use crate::sim::events::EventLog;
    use crate::sim::orbit::AgentTint;
    use crate::sim::targets::{ObserverPose, SpawnLayout, WorldTargets};
    use glam::Vec3;

    const EYE: Vec3 = Vec3::new(0.0, 1.6, 0.0);

    fn observer() -> ObserverPose {
        ObserverPose::new(EYE, Vec3::Z)
    }

    fn flat(seed: u64) -> (GameplayCoordinator, EventLog) {
        let engine = SequenceEngine::with_seed(GameConfig::default(), seed).expect("valid config");
        let mut coordinator = GameplayCoordinator::flat(engine);
        let log = EventLog::new();
        coordinator.subscribe("log", Box::new(log.clone()));
        (coordinator, log)
    }

    fn augmented_with(seed: u64, targets: WorldTargets) -> (GameplayCoordinator, EventLog) {
        let config = GameConfig::default();
        let layout = SpawnLayout::around(&observer(), config.spawn_distance);
        let mut navigator =
            OrbitNavigator::from_config(layout.orbit_center, &config).expect("valid orbit");
        navigator.place_agent(layout.orbiter_spawn);
        let engine = SequenceEngine::with_seed(config, seed).expect("valid config");
        let mut coordinator = GameplayCoordinator::augmented(engine, navigator, Box::new(targets));
        let log = EventLog::new();
        coordinator.subscribe("log", Box::new(log.clone()));
        (coordinator, log)
    }

    fn augmented(seed: u64) -> (GameplayCoordinator, EventLog) {
        let layout = SpawnLayout::around(&observer(), GameConfig::default().spawn_distance);
        augmented_with(seed, layout.targets)
    }

    fn tick_until(
        coordinator: &mut GameplayCoordinator,
        pose: Option<&dyn ObserverPoseProvider>,
        max_secs: f32,
        done: impl Fn(&GameplayCoordinator) -> bool,
    ) {
        let mut elapsed = 0.0;
        while !done(coordinator) {
            assert!(elapsed < max_secs, "condition not reached in {max_secs}s");
            coordinator.tick(SIM_DT, pose);
            elapsed += SIM_DT;
        }
    }

    fn highlights(log: &EventLog) -> Vec<Color> {
        log.events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::SequenceHighlight(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_flat_round_trip() {
        let (mut coordinator, log) = flat(11);
        assert_eq!(coordinator.mode(), GameMode::Flat);
        assert!(coordinator.navigator().is_none());

        coordinator.start_new_game();
        tick_until(&mut coordinator, None, 5.0, |c| c.accepts_input());
        let first = coordinator.engine().sequence()[0];
        assert_eq!(highlights(&log), vec![first]);

        assert_eq!(
            coordinator.submit_color_selection(first),
            SelectionOutcome::RoundComplete
        );
        tick_until(&mut coordinator, None, 10.0, |c| c.accepts_input());
        assert_eq!(coordinator.engine().level(), 2);
        assert!(log.contains(&GameEvent::LevelComplete(2)));
        assert_eq!(highlights(&log).len(), 3);

        // Internal requests never reach the presentation layer
        assert!(
            !log.events()
                .iter()
                .any(|e| matches!(e, GameEvent::AgentTravelRequested(_)))
        );
    }

    #[test]
    fn test_ar_round_waits_for_agent() {
        let (mut coordinator, log) = augmented(5);
        assert_eq!(coordinator.mode(), GameMode::Augmented);
        coordinator.start_new_game();
        let pose = observer();
        tick_until(&mut coordinator, Some(&pose), 20.0, |c| c.accepts_input());

        let first = coordinator.engine().sequence()[0];
        let events = log.events();
        let reached = events
            .iter()
            .position(|e| *e == GameEvent::AgentReachedTarget)
            .expect("agent arrived");
        let highlight = events
            .iter()
            .position(|e| *e == GameEvent::SequenceHighlight(first))
            .expect("highlighted");
        assert!(reached < highlight);
        assert!(events.contains(&GameEvent::AgentGrowRequested));
        assert!(events.contains(&GameEvent::AgentShrinkRequested));

        // Agent sits on the orbit point of the highlighted orb
        let navigator = coordinator.navigator().unwrap();
        let target = coordinator.targets().unwrap().lookup(first).unwrap();
        let expected = crate::horizontal_angle(navigator.center(), target);
        assert!(crate::shortest_delta(navigator.angle(), expected).abs() < 1e-4);
        // Reset after the highlight hold
        assert_eq!(navigator.tint(), AgentTint::Normal);
        assert_eq!(navigator.target_angle(), None);
    }

    #[test]
    fn test_ar_snap_arrives_without_travel() {
        let (mut coordinator, log) = augmented(9);
        coordinator.start_new_game();
        let first = coordinator.engine().sequence()[0];
        let target = coordinator.targets().unwrap().lookup(first).unwrap();
        coordinator.navigator_mut().unwrap().place_agent(target);

        tick_until(&mut coordinator, None, 5.0, |c| c.accepts_input());
        assert!(log.contains(&GameEvent::AgentReachedTarget));
        assert!(!log.contains(&GameEvent::AgentStartedTravel));
        assert_eq!(highlights(&log), vec![first]);
    }

    #[test]
    fn test_missing_target_highlights_in_place() {
        let (mut coordinator, log) = augmented_with(2, WorldTargets::new());
        coordinator.start_new_game();
        tick_until(&mut coordinator, None, 5.0, |c| c.accepts_input());

        let first = coordinator.engine().sequence()[0];
        assert!(log.contains(&GameEvent::Fault(SimError::MissingWorldTarget(first))));
        assert_eq!(highlights(&log), vec![first]);
        assert!(!log.contains(&GameEvent::AgentStartedTravel));
    }

    #[test]
    fn test_resolver_confirm_completes_round() {
        let (mut coordinator, log) = augmented(4);
        coordinator.start_new_game();
        let idle_pose = observer();
        tick_until(&mut coordinator, Some(&idle_pose), 20.0, |c| c.accepts_input());

        let first = coordinator.engine().sequence()[0];
        let target = coordinator.targets().unwrap().lookup(first).unwrap();
        let aim = ObserverPose::looking_at(EYE, target);
        coordinator.tick(SIM_DT, Some(&aim));
        assert_eq!(coordinator.resolver().current_target(), Some(first));
        assert!(log.contains(&GameEvent::CandidateChanged(Some(first))));

        assert_eq!(
            coordinator.confirm_selection(),
            Some((first, SelectionOutcome::RoundComplete))
        );
        assert!(log.contains(&GameEvent::ColorPressed(first)));
        assert!(coordinator.resolver().is_disabled());

        // The reticle is cleared on the next frame
        coordinator.tick(SIM_DT, Some(&aim));
        assert_eq!(log.events().last(), Some(&GameEvent::CandidateChanged(None)));

        // Next playback re-enables targeting
        tick_until(&mut coordinator, Some(&aim), 20.0, |c| c.engine().level() == 2);
        assert!(!coordinator.resolver().is_disabled());
    }

    #[test]
    fn test_no_targeting_during_playback() {
        let (mut coordinator, log) = augmented(4);
        coordinator.start_new_game();
        let first = coordinator.engine().sequence()[0];
        let target = coordinator.targets().unwrap().lookup(first).unwrap();
        let aim = ObserverPose::looking_at(EYE, target);
        tick_until(&mut coordinator, Some(&aim), 20.0, |c| {
            c.engine().is_playing_sequence()
        });
        coordinator.tick(SIM_DT, Some(&aim));
        assert_eq!(coordinator.resolver().current_target(), None);
        assert_eq!(coordinator.confirm_selection(), None);
        assert!(!log.contains(&GameEvent::ColorPressed(first)));
    }

    #[test]
    fn test_wrong_pick_disables_selection() {
        let (mut coordinator, log) = flat(8);
        coordinator.start_new_game();
        tick_until(&mut coordinator, None, 5.0, |c| c.accepts_input());
        let first = coordinator.engine().sequence()[0];
        let wrong = Color::ALL[(first.index() + 1) % 4];

        assert_eq!(coordinator.submit_color_selection(wrong), SelectionOutcome::Mismatch);
        assert!(log.contains(&GameEvent::RoundComplete { success: false }));
        assert!(log.contains(&GameEvent::GameOver));
        assert!(coordinator.resolver().is_disabled());
        assert!(coordinator.engine().is_game_over());
        assert_eq!(
            coordinator.submit_color_selection(first),
            SelectionOutcome::Dropped(DropReason::NotAcceptingInput(coordinator.engine().phase()))
        );

        coordinator.restart();
        assert!(!coordinator.resolver().is_disabled());
        assert_eq!(coordinator.engine().level(), 1);
        assert_eq!(coordinator.engine().sequence().len(), 1);
    }

    #[test]
    fn test_stop_mid_travel() {
        let (mut coordinator, log) = augmented(6);
        coordinator.start_new_game();
        let first = coordinator.engine().sequence()[0];
        // Put the agent opposite the first orb so it has to travel
        let target = coordinator.targets().unwrap().lookup(first).unwrap();
        let opposite = 2.0 * coordinator.navigator().unwrap().center() - target;
        coordinator.navigator_mut().unwrap().place_agent(opposite);

        tick_until(&mut coordinator, None, 5.0, |c| {
            c.navigator().is_some_and(|n| n.is_orbiting())
        });
        coordinator.stop_game();
        assert!(coordinator.engine().is_idle());
        assert!(!coordinator.navigator().unwrap().is_orbiting());

        log.clear();
        for _ in 0..600 {
            coordinator.tick(SIM_DT, None);
        }
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_back_to_menu() {
        let (mut coordinator, log) = flat(1);
        coordinator.start_new_game();
        tick_until(&mut coordinator, None, 5.0, |c| c.accepts_input());
        coordinator.back_to_menu();
        assert!(coordinator.engine().is_idle());
        assert!(log.contains(&GameEvent::IdleEntered));
        assert_eq!(coordinator.resolver().selected(), None);
    }

    #[test]
    fn test_resubscribe_single_delivery() {
        let (mut coordinator, first_log) = flat(1);
        let second_log = EventLog::new();
        coordinator.subscribe("log", Box::new(second_log.clone()));
        coordinator.back_to_menu();
        assert!(first_log.events().is_empty());
        assert_eq!(second_log.count(&GameEvent::IdleEntered), 1);

        assert!(coordinator.unsubscribe("log"));
        coordinator.back_to_menu();
        assert_eq!(second_log.count(&GameEvent::IdleEntered), 1);
    }
}
