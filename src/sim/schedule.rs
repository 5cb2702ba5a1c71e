//! Logical-clock task queue
//!
//! Replaces host timers: spawners, countdowns and delayed explosions are
//! entries that fire when the simulation tick counter reaches their due tick.
//! Entries due on the same tick fire in insertion order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::engine::BodyId;

/// Deferred work owned by the round
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Task {
    /// Detonate a particle caught in an earlier blast
    SecondaryExplosion {
        particle: BodyId,
        power: f32,
        radius: f32,
    },
    /// Survival: spawn one burst of enemies, then re-arm
    EnemyBurst,
    /// Survival: one second of the wave countdown
    WaveCountdown,
    /// Collection: emit one color-tagged particle, then re-arm
    CollectorSpawn,
}

#[derive(Debug, Clone)]
struct Entry {
    due: u64,
    seq: u64,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed so the max-heap yields the earliest entry first
    fn cmp(&self, other: &Self) -> Ordering {
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

/// Priority queue of "fire at tick N" tasks
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Entry>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_at(&mut self, due: u64, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Entry { due, seq, task });
    }

    /// Pop the next task due at or before `now`
    pub fn pop_due(&mut self, now: u64) -> Option<Task> {
        if self.queue.peek()?.due > now {
            return None;
        }
        self.queue.pop().map(|e| e.task)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Whether any queued secondary explosion is still waiting
    pub fn has_pending_explosions(&self) -> bool {
        self.queue
            .iter()
            .any(|e| matches!(e.task, Task::SecondaryExplosion { .. }))
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
