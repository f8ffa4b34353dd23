use std::collections::VecDeque;

use rand::Rng;

use crate::ai::Experience;

/// Bounded FIFO store of past transitions.
pub struct ReplayBuffer {
    buffer: VecDeque<Experience>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        ReplayBuffer {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add an experience to the buffer. Evicts the oldest when full.
    pub fn push(&mut self, experience: Experience) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(experience);
    }

    /// Draw `batch_size` experiences uniformly with replacement.
    ///
    /// Returns an empty batch when fewer than `batch_size` are stored.
    pub fn sample<R: Rng>(&self, batch_size: usize, rng: &mut R) -> Vec<Experience> {
        if batch_size == 0 || self.buffer.len() < batch_size {
            return Vec::new();
        }
        (0..batch_size)
            .map(|_| self.buffer[rng.random_range(0..self.buffer.len())].clone())
            .collect()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Experience> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
