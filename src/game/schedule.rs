//! Timed events on the engine clock.
//!
//! Delayed work is queued here and fired by the engine at the start of the tick
//! whose clock reaches it.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Something the engine has to do at a later clock value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScheduledEvent {
    /// The active power-up effect runs out
    EffectExpired,
    /// An uncollected power-up leaves the board
    PowerUpDespawn { id: u64 },
    /// Background chance to place a power-up
    PowerUpRoll,
    /// The respawn pause after a lost life is over
    Respawn,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    at_ms: u64,
    seq: u64,
    event: ScheduledEvent,
}

/// Min-queue of events ordered by due time, then insertion order
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, at_ms: u64, event: ScheduledEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Entry { at_ms, seq, event }));
    }

    /// Drop every pending event matching the predicate
    pub fn cancel(&mut self, mut matches: impl FnMut(&ScheduledEvent) -> bool) {
        self.queue.retain(|Reverse(entry)| !matches(&entry.event));
    }

    /// Remove and return the earliest event due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: u64) -> Option<ScheduledEvent> {
        match self.queue.peek() {
            Some(Reverse(entry)) if entry.at_ms <= now_ms => {
                self.queue.pop().map(|Reverse(entry)| entry.event)
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_due_in_time_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(300, ScheduledEvent::PowerUpRoll);
        scheduler.schedule(100, ScheduledEvent::EffectExpired);
        scheduler.schedule(200, ScheduledEvent::Respawn);

        assert_eq!(scheduler.pop_due(50), None);
        assert_eq!(scheduler.pop_due(250), Some(ScheduledEvent::EffectExpired));
        assert_eq!(scheduler.pop_due(250), Some(ScheduledEvent::Respawn));
        assert_eq!(scheduler.pop_due(250), None);
        assert_eq!(scheduler.pop_due(300), Some(ScheduledEvent::PowerUpRoll));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_same_time_keeps_insertion_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(100, ScheduledEvent::Respawn);
        scheduler.schedule(100, ScheduledEvent::EffectExpired);

        assert_eq!(scheduler.pop_due(100), Some(ScheduledEvent::Respawn));
        assert_eq!(scheduler.pop_due(100), Some(ScheduledEvent::EffectExpired));
    }

    #[test]
    fn test_cancel_removes_matching() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(100, ScheduledEvent::EffectExpired);
        scheduler.schedule(150, ScheduledEvent::PowerUpDespawn { id: 7 });
        scheduler.schedule(200, ScheduledEvent::EffectExpired);

        scheduler.cancel(|event| *event == ScheduledEvent::EffectExpired);

        assert_eq!(scheduler.len(), 1);
        assert_eq!(
            scheduler.pop_due(1_000),
            Some(ScheduledEvent::PowerUpDespawn { id: 7 })
        );
    }
}
