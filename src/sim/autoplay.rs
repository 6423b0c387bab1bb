//! Demo/attract-mode player
//!
//! Watches the highlights published during playback and taps them back once
//! the input window opens, one pick per `think_time`. It can be told to fumble
//! the last color of a given level so demos also show a loss.

use super::color::Color;
use super::engine::{InputSink, SelectionOutcome};
use super::events::{EventLog, GameEvent};

#[derive(Debug, Clone)]
pub struct AutoPlayer {
    /// Subscribe a clone of this to the coordinator
    feed: EventLog,
    watched: Vec<Color>,
    cursor: usize,
    level: u32,
    think_time: f32,
    thinking: f32,
    mistake_at_level: Option<u32>,
}

impl AutoPlayer {
    pub fn new(think_time: f32) -> Self {
        Self {
            feed: EventLog::new(),
            watched: Vec::new(),
            cursor: 0,
            level: 1,
            think_time,
            thinking: 0.0,
            mistake_at_level: None,
        }
    }

    /// Deliberately pick wrong on the last color of `level`
    pub fn with_mistake_at(mut self, level: u32) -> Self {
        self.mistake_at_level = Some(level);
        self
    }

    /// Sink to hand to `GameplayCoordinator::subscribe`
    pub fn feed(&self) -> EventLog {
        self.feed.clone()
    }

    /// Level the player believes it is on
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Colors seen during the latest playback
    pub fn watched(&self) -> &[Color] {
        &self.watched
    }

    /// Digest new events, then make at most one pick if `sink` is taking input
    pub fn tick<S: InputSink + ?Sized>(
        &mut self,
        dt: f32,
        sink: &mut S,
    ) -> Option<(Color, SelectionOutcome)> {
        for event in self.feed.take() {
            self.observe(&event);
        }

        if !sink.accepts_input() || self.cursor >= self.watched.len() {
            self.thinking = 0.0;
            return None;
        }

        self.thinking += dt;
        if self.thinking < self.think_time {
            return None;
        }
        self.thinking = 0.0;

        let is_last = self.cursor + 1 == self.watched.len();
        let mut color = self.watched[self.cursor];
        if is_last && self.mistake_at_level == Some(self.level) {
            color = Color::ALL[(color.index() + 1) % Color::ALL.len()];
            log::info!("Autoplayer fumbling level {} with {}", self.level, color);
        }
        self.cursor += 1;

        let outcome = sink.submit_color_selection(color);
        log::debug!("Autoplayer picked {} -> {:?}", color, outcome);
        Some((color, outcome))
    }

    fn observe(&mut self, event: &GameEvent) {
        match event {
            GameEvent::AgentGrowRequested => {
                self.watched.clear();
                self.cursor = 0;
            }
            GameEvent::SequenceHighlight(color) => self.watched.push(*color),
            GameEvent::LevelComplete(level) => self.level = *level,
            GameEvent::GameOver | GameEvent::IdleEntered => {
                self.level = 1;
                self.cursor = self.watched.len();
            }
            _ => {}
        }
    }
}

impl Default for AutoPlayer {
    fn default() -> Self {
        Self::new(0.25)
    }
}
