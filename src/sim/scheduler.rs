//! Cooperative timers driven by the host tick
//!
//! A `Scheduler<T>` holds delayed continuations of type `T`. The owner calls
//! `tick(dt)` once per frame and runs whatever comes back. Nothing here runs
//! on its own; cancellation just forgets the pending entry.

/// Handle to a pending continuation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Timer<T> {
    id: TimerId,
    remaining: f32,
    action: T,
}

/// Single-threaded delay queue
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    timers: Vec<Timer<T>>,
    next_id: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 1,
        }
    }

    /// Run `action` after `seconds` of ticked time
    pub fn delay(&mut self, seconds: f32, action: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            remaining: seconds.max(0.0),
            action,
        });
        id
    }

    /// Drop a pending continuation. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Drop every pending continuation
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Advance time and return due continuations, earliest first
    /// (ties keep scheduling order)
    pub fn tick(&mut self, dt: f32) -> Vec<T> {
        for timer in &mut self.timers {
            timer.remaining -= dt;
        }

        let mut due = Vec::new();
        let mut i = 0;
        while i < self.timers.len() {
            if self.timers[i].remaining <= 0.0 {
                due.push(self.timers.remove(i));
            } else {
                i += 1;
            }
        }

        due.sort_by(|a, b| {
            a.remaining
                .partial_cmp(&b.remaining)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.0.cmp(&b.id.0))
        });
        due.into_iter().map(|t| t.action).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_delay() {
        let mut s = Scheduler::new();
        s.delay(0.5, "a");
        assert!(s.tick(0.3).is_empty());
        assert_eq!(s.tick(0.3), vec!["a"]);
        assert!(s.is_empty());
    }

    #[test]
    fn test_zero_delay_fires_on_next_tick() {
        let mut s = Scheduler::new();
        s.delay(0.0, 1);
        assert_eq!(s.tick(0.0), vec![1]);
    }

    #[test]
    fn test_due_order_earliest_first() {
        let mut s = Scheduler::new();
        s.delay(0.4, "late");
        s.delay(0.1, "early");
        s.delay(0.1, "early-second");
        assert_eq!(s.tick(1.0), vec!["early", "early-second", "late"]);
    }

    #[test]
    fn test_cancel() {
        let mut s = Scheduler::new();
        let a = s.delay(0.1, "a");
        let b = s.delay(0.1, "b");
        assert!(s.cancel(a));
        assert!(!s.cancel(a));
        assert!(s.is_pending(b));
        assert_eq!(s.tick(0.2), vec!["b"]);
        assert!(!s.is_pending(b));
    }

    #[test]
    fn test_cancel_all_is_idempotent() {
        let mut s = Scheduler::new();
        s.delay(0.1, ());
        s.cancel_all();
        s.cancel_all();
        assert!(s.tick(1.0).is_empty());
    }
}
