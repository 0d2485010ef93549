//! Bounded undo/redo stacks of whole-document snapshots

use std::collections::VecDeque;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct History<T> {
    past: VecDeque<T>,
    future: VecDeque<T>,
    limit: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

fn push_bounded<T>(stack: &mut VecDeque<T>, item: T, limit: usize) {
    stack.push_back(item);
    while stack.len() > limit {
        stack.pop_front();
    }
}

impl<T> History<T> {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Record the state from before a committed change; invalidates redo
    pub fn record(&mut self, before: T) {
        push_bounded(&mut self.past, before, self.limit);
        self.future.clear();
    }

    /// Step back: returns the state to restore and keeps `current` for redo
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.past.pop_back()?;
        push_bounded(&mut self.future, current, self.limit);
        Some(previous)
    }

    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.future.pop_back()?;
        push_bounded(&mut self.past, current, self.limit);
        Some(next)
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }
}
