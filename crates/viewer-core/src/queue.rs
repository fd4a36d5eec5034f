//! Pending render requests, visible pages first.

use std::collections::{HashMap, VecDeque};

use doc_model::{PageNumber, Scale};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPriority {
    Visible,
    Prefetch,
}

impl RenderPriority {
    fn lane(self) -> usize {
        match self {
            Self::Visible => 0,
            Self::Prefetch => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderJobKey {
    pub page: PageNumber,
    pub scale_key: String,
}

impl RenderJobKey {
    pub fn new(page: PageNumber, scale: Scale) -> Self {
        Self { page, scale_key: scale.key() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    pub key: RenderJobKey,
    pub priority: RenderPriority,
    /// Plan generation that last scheduled this job.
    pub generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    priority: RenderPriority,
    generation: u64,
}

/// One FIFO lane per priority. A key sits in at most one lane.
#[derive(Debug, Default)]
pub struct RenderQueue {
    generation: u64,
    lanes: [VecDeque<RenderJobKey>; 2],
    scheduled: HashMap<RenderJobKey, Scheduled>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bump the generation stamped on jobs scheduled from now on. Queued
    /// jobs stay queued; use [`RenderQueue::retain`] to drop unwanted ones.
    pub fn begin_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Queue `key` at `priority`.
    ///
    /// A key already queued at the same priority keeps its place. One queued
    /// at another priority moves to the back of the new lane.
    pub fn schedule(&mut self, key: RenderJobKey, priority: RenderPriority) {
        let generation = self.generation;

        match self.scheduled.get_mut(&key) {
            Some(entry) if entry.priority == priority => entry.generation = generation,
            Some(entry) => {
                let previous = entry.priority;
                *entry = Scheduled { priority, generation };
                self.lanes[previous.lane()].retain(|queued| queued != &key);
                self.lanes[priority.lane()].push_back(key);
            }
            None => {
                self.scheduled.insert(key.clone(), Scheduled { priority, generation });
                self.lanes[priority.lane()].push_back(key);
            }
        }
    }

    /// Keep only the jobs for which `keep` returns true. Returns how many
    /// were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&RenderJobKey) -> bool) -> usize {
        let before = self.scheduled.len();
        self.scheduled.retain(|key, _| keep(key));

        let scheduled = &self.scheduled;
        for lane in &mut self.lanes {
            lane.retain(|key| scheduled.contains_key(key));
        }

        let dropped = before - self.scheduled.len();
        if dropped > 0 {
            log::debug!("render generation {} dropped {dropped} stale jobs", self.generation);
        }
        dropped
    }

    pub fn pop_next(&mut self) -> Option<RenderJob> {
        let key = self.lanes.iter_mut().find_map(VecDeque::pop_front)?;
        let Scheduled { priority, generation } = self.scheduled.remove(&key)?;

        Some(RenderJob { key, priority, generation })
    }

    pub fn contains(&self, key: &RenderJobKey) -> bool {
        self.scheduled.contains_key(key)
    }

    pub fn priority_of(&self, key: &RenderJobKey) -> Option<RenderPriority> {
        self.scheduled.get(key).map(|entry| entry.priority)
    }

    /// Queued keys in the order they will be handed out.
    pub fn pending(&self) -> impl Iterator<Item = &RenderJobKey> {
        self.lanes.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.scheduled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scheduled.is_empty()
    }
}
