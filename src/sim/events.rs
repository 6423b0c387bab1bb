//! Game events and the presentation sink
//!
//! The engine and coordinator describe everything that happens as a
//! `GameEvent`. Hosts either implement `PresentationSink` and subscribe it to
//! an `EventBus`, or drain events directly.

use std::cell::RefCell;
use std::rc::Rc;

use super::color::Color;
use crate::error::SimError;

/// Something the host may want to show, or the coordinator must act on
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A sequence color is being shown
    SequenceHighlight(Color),
    /// An accepted player selection, before it is judged
    ColorPressed(Color),
    /// Round judged: all correct, or a wrong pick
    RoundComplete { success: bool },
    /// A new level begins (carries the new level number)
    LevelComplete(u32),
    /// Loss or max-level win
    GameOver,
    /// Engine was put back to idle
    IdleEntered,
    /// Engine asks for the orbiter to travel to a color (orbit mode only)
    AgentTravelRequested(Color),
    /// Engine is done with the current stop; the orbiter should reset
    AgentResetRequested,
    AgentStartedTravel,
    AgentReachedTarget,
    AgentShrinkRequested,
    AgentGrowRequested,
    /// Targeting reticle moved to a new candidate (or to none)
    CandidateChanged(Option<Color>),
    /// A recovered fault worth surfacing
    Fault(SimError),
}

impl GameEvent {
    /// Requests meant for the coordinator rather than the presentation layer
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            GameEvent::AgentTravelRequested(_) | GameEvent::AgentResetRequested
        )
    }

    /// Deliver this event to the matching sink callback
    pub fn dispatch(&self, sink: &mut dyn PresentationSink) {
        match self {
            GameEvent::SequenceHighlight(color) => sink.on_sequence_highlight(*color),
            GameEvent::ColorPressed(color) => sink.on_color_pressed(*color),
            GameEvent::RoundComplete { success } => sink.on_round_complete(*success),
            GameEvent::LevelComplete(level) => sink.on_level_complete(*level),
            GameEvent::GameOver => sink.on_game_over(),
            GameEvent::IdleEntered => sink.on_idle_entered(),
            GameEvent::AgentStartedTravel => sink.on_agent_started_travel(),
            GameEvent::AgentReachedTarget => sink.on_agent_reached_target(),
            GameEvent::AgentShrinkRequested => sink.on_agent_shrink_requested(),
            GameEvent::AgentGrowRequested => sink.on_agent_grow_requested(),
            GameEvent::CandidateChanged(color) => sink.on_candidate_changed(*color),
            GameEvent::Fault(err) => sink.on_fault(err),
            GameEvent::AgentTravelRequested(_) | GameEvent::AgentResetRequested => {}
        }
    }
}

/// One-way notifications to the presentation layer. Every method defaults to a no-op.
pub trait PresentationSink {
    fn on_sequence_highlight(&mut self, _color: Color) {}
    fn on_color_pressed(&mut self, _color: Color) {}
    fn on_round_complete(&mut self, _success: bool) {}
    fn on_level_complete(&mut self, _level: u32) {}
    fn on_game_over(&mut self) {}
    fn on_idle_entered(&mut self) {}
    fn on_agent_started_travel(&mut self) {}
    fn on_agent_reached_target(&mut self) {}
    fn on_agent_shrink_requested(&mut self) {}
    fn on_agent_grow_requested(&mut self) {}
    fn on_candidate_changed(&mut self, _color: Option<Color>) {}
    fn on_fault(&mut self, _error: &SimError) {}
}

/// Observer list keyed by subscriber name
///
/// Subscribing under a key that is already present replaces the old sink, so
/// a host that re-subscribes on every mode switch never gets double delivery.
#[derive(Default)]
pub struct EventBus {
    sinks: Vec<(String, Box<dyn PresentationSink>)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn subscribe(&mut self, key: impl Into<String>, sink: Box<dyn PresentationSink>) {
        let key = key.into();
        self.unsubscribe(&key);
        self.sinks.push((key, sink));
    }

    /// Returns true if a sink was removed
    pub fn unsubscribe(&mut self, key: &str) -> bool {
        let before = self.sinks.len();
        self.sinks.retain(|(k, _)| k != key);
        self.sinks.len() != before
    }

    pub fn is_subscribed(&self, key: &str) -> bool {
        self.sinks.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Deliver to every sink in subscription order. Internal requests are not published.
    pub fn publish(&mut self, event: &GameEvent) {
        if event.is_internal() {
            return;
        }
        for (_, sink) in &mut self.sinks {
            event.dispatch(sink.as_mut());
        }
    }
}

/// Sink that records every event it sees. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<GameEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GameEvent> {
        self.events.borrow().clone()
    }

    pub fn take(&self) -> Vec<GameEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn count(&self, event: &GameEvent) -> usize {
        self.events.borrow().iter().filter(|e| *e == event).count()
    }

    pub fn contains(&self, event: &GameEvent) -> bool {
        self.count(event) > 0
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn record(&mut self, event: GameEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl PresentationSink for EventLog {
    fn on_sequence_highlight(&mut self, color: Color) {
        self.record(GameEvent::SequenceHighlight(color));
    }
    fn on_color_pressed(&mut self, color: Color) {
        self.record(GameEvent::ColorPressed(color));
    }
    fn on_round_complete(&mut self, success: bool) {
        self.record(GameEvent::RoundComplete { success });
    }
    fn on_level_complete(&mut self, level: u32) {
        self.record(GameEvent::LevelComplete(level));
    }
    fn on_game_over(&mut self) {
        self.record(GameEvent::GameOver);
    }
    fn on_idle_entered(&mut self) {
        self.record(GameEvent::IdleEntered);
    }
    fn on_agent_started_travel(&mut self) {
        self.record(GameEvent::AgentStartedTravel);
    }
    fn on_agent_reached_target(&mut self) {
        self.record(GameEvent::AgentReachedTarget);
    }
    fn on_agent_shrink_requested(&mut self) {
        self.record(GameEvent::AgentShrinkRequested);
    }
    fn on_agent_grow_requested(&mut self) {
        self.record(GameEvent::AgentGrowRequested);
    }
    fn on_candidate_changed(&mut self, color: Option<Color>) {
        self.record(GameEvent::CandidateChanged(color));
    }
    fn on_fault(&mut self, error: &SimError) {
        self.record(GameEvent::Fault(error.clone()));
    }
}
