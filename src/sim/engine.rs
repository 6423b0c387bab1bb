//! Sequence engine: the Simon Says state machine
//!
//! Owns the color sequence, the player's input for the current round, the
//! level counter and the phase. All pacing runs through a tick-driven
//! `Scheduler`; in orbit mode each step additionally waits for an explicit
//! `agent_arrived()` signal from the coordinator.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::color::Color;
use super::events::GameEvent;
use super::scheduler::{Scheduler, TimerId};
use crate::error::SimError;
use crate::settings::GameConfig;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Not playing: before the first playback, after a reset, or stopped
    Idle,
    /// Showing the sequence; input is closed
    PlayingSequence,
    /// Player is reproducing the sequence
    WaitingForInput,
    /// Run ended (wrong pick or max level). Reports as idle.
    GameOver,
}

/// How sequence steps are revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackMode {
    /// Highlight immediately, fixed delay between steps
    #[default]
    Flat,
    /// Orbiter travels to each color first; highlight on arrival
    Orbit,
}

/// Why a selection was not judged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Selection arrived outside the input window
    NotAcceptingInput(GamePhase),
    /// A previous selection is still being acknowledged
    Processing,
}

/// Result of `on_color_selected`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Correct, more to go
    Matched,
    /// Correct and the round is complete
    RoundComplete,
    /// Wrong color; game over
    Mismatch,
    /// Ignored without side effects
    Dropped(DropReason),
}

/// Anything that accepts player color selections
pub trait InputSink {
    fn submit_color_selection(&mut self, color: Color) -> SelectionOutcome;
    /// Whether a selection submitted now would be judged
    fn accepts_input(&self) -> bool;
}

/// Delayed continuations of the playback/input loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuation {
    BeginPlayback,
    PlayStep,
    AfterHighlight,
    OpenInput,
    ReleaseInput,
    NextLevel,
    InputTimeout,
    ArrivalTimeout,
}

pub struct SequenceEngine<R: Rng = Pcg32> {
    config: GameConfig,
    rng: R,
    mode: PlaybackMode,
    phase: GamePhase,
    sequence: Vec<Color>,
    player_input: Vec<Color>,
    input_index: usize,
    level: u32,
    /// Re-entrancy guard: one selection at a time
    processing_input: bool,
    /// Next sequence index to reveal during playback
    playback_cursor: usize,
    awaiting_arrival: Option<Color>,
    arrival_timer: Option<TimerId>,
    input_timer: Option<TimerId>,
    last_round_success: Option<bool>,
    /// Set once the game is decided; only a new game clears it
    finished: bool,
    scheduler: Scheduler<Continuation>,
    events: Vec<GameEvent>,
}

impl SequenceEngine<Pcg32> {
    /// Engine with a randomly seeded generator
    pub fn new(config: GameConfig) -> Result<Self, SimError> {
        Self::with_seed(config, rand::random())
    }

    /// Engine with a reproducible color stream
    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self, SimError> {
        Self::with_rng(config, Pcg32::seed_from_u64(seed))
    }
}

impl<R: Rng> SequenceEngine<R> {
    /// Engine with an injected generator. Fails if `config` does not validate.
    pub fn with_rng(config: GameConfig, rng: R) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            config,
            rng,
            mode: PlaybackMode::Flat,
            phase: GamePhase::Idle,
            sequence: Vec::new(),
            player_input: Vec::new(),
            input_index: 0,
            level: 1,
            processing_input: false,
            playback_cursor: 0,
            awaiting_arrival: None,
            arrival_timer: None,
            input_timer: None,
            last_round_success: None,
            finished: false,
            scheduler: Scheduler::new(),
            events: Vec::new(),
        })
    }

    pub fn set_playback_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
    }

    pub fn playback_mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    // === Queries ===

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, GamePhase::Idle | GamePhase::GameOver)
    }

    pub fn is_playing_sequence(&self) -> bool {
        self.phase == GamePhase::PlayingSequence
    }

    pub fn is_waiting_for_input(&self) -> bool {
        self.phase == GamePhase::WaitingForInput
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Game ended by clearing the final level rather than by a wrong pick
    pub fn is_victory(&self) -> bool {
        self.is_game_over() && self.last_round_success == Some(true)
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn max_level(&self) -> u32 {
        self.config.max_level
    }

    pub fn sequence(&self) -> &[Color] {
        &self.sequence
    }

    pub fn player_input(&self) -> &[Color] {
        &self.player_input
    }

    pub fn input_index(&self) -> usize {
        self.input_index
    }

    pub fn is_processing_input(&self) -> bool {
        self.processing_input
    }

    /// Color the engine is blocked on, if it is waiting for the orbiter
    pub fn awaiting_arrival(&self) -> Option<Color> {
        self.awaiting_arrival
    }

    /// Take everything emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Commands ===

    /// Reset everything and schedule playback of a fresh one-color sequence
    pub fn start_new_game(&mut self) {
        self.cancel_pending();
        self.sequence.clear();
        self.player_input.clear();
        self.input_index = 0;
        self.level = 1;
        self.last_round_success = None;
        self.finished = false;
        self.phase = GamePhase::Idle;
        self.add_random_color();
        self.scheduler
            .delay(self.config.start_delay, Continuation::BeginPlayback);
        log::debug!("New game, first color {}", self.sequence[0]);
    }

    /// Halt playback and timers, keep the level
    pub fn stop_game(&mut self) {
        self.cancel_pending();
        self.phase = GamePhase::Idle;
        log::debug!("Game stopped at level {}", self.level);
    }

    /// `true` cancels everything and returns to idle; `false` resumes playback
    /// of the current sequence if there is one. A decided game never resumes.
    pub fn set_idle(&mut self, idle: bool) {
        if idle {
            self.cancel_pending();
            self.phase = GamePhase::Idle;
            self.emit(GameEvent::IdleEntered);
            log::debug!("Engine idle");
        } else if self.finished {
            log::debug!("Not resuming a finished game");
        } else if self.phase == GamePhase::Idle && !self.sequence.is_empty() {
            self.begin_playback();
        }
    }

    /// Judge a player selection against the sequence
    pub fn on_color_selected(&mut self, color: Color) -> SelectionOutcome {
        if self.phase != GamePhase::WaitingForInput {
            log::debug!("Ignoring {} during {:?}", color, self.phase);
            return SelectionOutcome::Dropped(DropReason::NotAcceptingInput(self.phase));
        }
        if self.processing_input || self.input_index >= self.sequence.len() {
            log::debug!("Dropping {} while processing previous selection", color);
            return SelectionOutcome::Dropped(DropReason::Processing);
        }

        self.processing_input = true;
        self.emit(GameEvent::ColorPressed(color));

        if color != self.sequence[self.input_index] {
            log::info!(
                "Wrong color {} at position {} (expected {}), game over at level {}",
                color,
                self.input_index,
                self.sequence[self.input_index],
                self.level
            );
            self.finish_game(false);
            return SelectionOutcome::Mismatch;
        }

        self.player_input.push(color);
        self.input_index += 1;

        if self.input_index >= self.sequence.len() {
            self.disarm_input_timeout();
            self.last_round_success = Some(true);
            self.emit(GameEvent::RoundComplete { success: true });
            self.scheduler
                .delay(self.config.next_level_delay, Continuation::NextLevel);
            log::debug!("Round {} complete", self.level);
            SelectionOutcome::RoundComplete
        } else {
            self.scheduler
                .delay(self.config.input_cooldown, Continuation::ReleaseInput);
            self.arm_input_timeout();
            SelectionOutcome::Matched
        }
    }

    /// Arrival signal from the orbiter. Returns false when nothing was awaited.
    pub fn agent_arrived(&mut self) -> bool {
        if self.phase != GamePhase::PlayingSequence {
            return false;
        }
        let Some(color) = self.awaiting_arrival.take() else {
            return false;
        };
        if let Some(timer) = self.arrival_timer.take() {
            self.scheduler.cancel(timer);
        }
        self.highlight_after_arrival(color);
        true
    }

    /// Advance timers by `dt` seconds and run whatever is due
    pub fn tick(&mut self, dt: f32) {
        for continuation in self.scheduler.tick(dt) {
            self.resume(continuation);
        }
    }

    // === Internals ===

    fn resume(&mut self, continuation: Continuation) {
        match continuation {
            Continuation::BeginPlayback => {
                if self.phase == GamePhase::Idle {
                    self.begin_playback();
                }
            }
            Continuation::PlayStep => {
                if self.phase == GamePhase::PlayingSequence {
                    self.play_step();
                }
            }
            Continuation::AfterHighlight => {
                if self.phase == GamePhase::PlayingSequence {
                    self.emit(GameEvent::AgentResetRequested);
                    self.playback_cursor += 1;
                    self.play_step();
                }
            }
            Continuation::OpenInput => {
                if self.phase == GamePhase::PlayingSequence {
                    self.open_input();
                }
            }
            Continuation::ReleaseInput => {
                if self.phase == GamePhase::WaitingForInput {
                    self.processing_input = false;
                }
            }
            Continuation::NextLevel => {
                if self.phase == GamePhase::WaitingForInput {
                    self.next_level();
                }
            }
            Continuation::InputTimeout => {
                self.input_timer = None;
                if self.phase == GamePhase::WaitingForInput
                    && self.input_index < self.sequence.len()
                {
                    log::info!(
                        "No input within {:.1}s, game over at level {}",
                        self.config.input_timeout,
                        self.level
                    );
                    self.finish_game(false);
                }
            }
            Continuation::ArrivalTimeout => {
                self.arrival_timer = None;
                if self.phase != GamePhase::PlayingSequence {
                    return;
                }
                if let Some(color) = self.awaiting_arrival.take() {
                    let waited = self.config.arrival_timeout.unwrap_or_default();
                    let err = SimError::NavigatorStuck { color, waited };
                    log::warn!("{err}");
                    self.emit(GameEvent::Fault(err));
                    self.highlight_after_arrival(color);
                }
            }
        }
    }

    fn begin_playback(&mut self) {
        self.phase = GamePhase::PlayingSequence;
        self.processing_input = false;
        self.playback_cursor = 0;
        self.awaiting_arrival = None;
        self.emit(GameEvent::AgentGrowRequested);
        self.scheduler
            .delay(self.config.grow_duration, Continuation::PlayStep);
        log::debug!(
            "Playing sequence of {} ({:?} mode)",
            self.sequence.len(),
            self.mode
        );
    }

    fn play_step(&mut self) {
        let Some(&color) = self.sequence.get(self.playback_cursor) else {
            self.emit(GameEvent::AgentShrinkRequested);
            self.scheduler
                .delay(self.config.settle_duration, Continuation::OpenInput);
            return;
        };

        match self.mode {
            PlaybackMode::Orbit => {
                self.awaiting_arrival = Some(color);
                self.emit(GameEvent::AgentTravelRequested(color));
                if let Some(timeout) = self.config.arrival_timeout {
                    self.arrival_timer =
                        Some(self.scheduler.delay(timeout, Continuation::ArrivalTimeout));
                }
            }
            PlaybackMode::Flat => {
                self.emit(GameEvent::SequenceHighlight(color));
                self.playback_cursor += 1;
                self.scheduler
                    .delay(self.config.sequence_step_delay, Continuation::PlayStep);
            }
        }
    }

    fn highlight_after_arrival(&mut self, color: Color) {
        self.emit(GameEvent::SequenceHighlight(color));
        self.scheduler
            .delay(self.config.highlight_hold, Continuation::AfterHighlight);
    }

    fn open_input(&mut self) {
        self.phase = GamePhase::WaitingForInput;
        self.processing_input = false;
        self.input_index = 0;
        self.player_input.clear();
        self.arm_input_timeout();
        log::debug!("Waiting for input ({} colors)", self.sequence.len());
    }

    fn next_level(&mut self) {
        if self.level + 1 > self.config.max_level {
            log::info!("Max level {} cleared", self.config.max_level);
            self.finished = true;
            self.emit(GameEvent::GameOver);
            self.phase = GamePhase::GameOver;
            self.cancel_pending();
            return;
        }
        self.level += 1;
        self.emit(GameEvent::LevelComplete(self.level));
        self.add_random_color();
        log::info!("Level {}", self.level);
        self.begin_playback();
    }

    fn finish_game(&mut self, success: bool) {
        self.last_round_success = Some(success);
        self.finished = true;
        self.emit(GameEvent::RoundComplete { success });
        self.emit(GameEvent::GameOver);
        self.phase = GamePhase::GameOver;
        self.cancel_pending();
        self.processing_input = true;
    }

    fn add_random_color(&mut self) {
        let color = Color::random(&mut self.rng);
        self.sequence.push(color);
    }

    fn arm_input_timeout(&mut self) {
        if !self.config.enforce_input_timeout {
            return;
        }
        self.disarm_input_timeout();
        self.input_timer = Some(
            self.scheduler
                .delay(self.config.input_timeout, Continuation::InputTimeout),
        );
    }

    fn disarm_input_timeout(&mut self) {
        if let Some(timer) = self.input_timer.take() {
            self.scheduler.cancel(timer);
        }
    }

    fn cancel_pending(&mut self) {
        self.scheduler.cancel_all();
        self.awaiting_arrival = None;
        self.arrival_timer = None;
        self.input_timer = None;
        self.processing_input = false;
    }

    fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}

impl<R: Rng> InputSink for SequenceEngine<R> {
    fn submit_color_selection(&mut self, color: Color) -> SelectionOutcome {
        self.on_color_selected(color)
    }

    fn accepts_input(&self) -> bool {
        self.is_waiting_for_input() && !self.processing_input
    }
}
