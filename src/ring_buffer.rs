// NICU Monitor - Neonatal vital-sign telemetry simulation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Fixed-capacity circular history buffer.
//!
//! Once full, every push overwrites the oldest retained item. Items are
//! always read back oldest-first with no gaps.

use crate::error::{MonitorError, Result};

/// Circular buffer with a capacity fixed at construction.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    /// Index the next push writes to.
    head: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty buffer. Capacity 0 is rejected.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(MonitorError::InvalidCapacity);
        }
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Ok(Self {
            slots,
            head: 0,
            len: 0,
        })
    }

    /// Append an item, returning the evicted oldest item when full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = self.slots[self.head].replace(item);
        self.head = (self.head + 1) % self.slots.len();
        if self.len < self.slots.len() {
            self.len += 1;
        }
        evicted
    }

    /// Most recently pushed item.
    pub fn peek(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        let idx = (self.head + self.slots.len() - 1) % self.slots.len();
        self.slots[idx].as_ref()
    }

    /// Oldest retained item.
    pub fn peek_oldest(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        self.slots[self.oldest_index()].as_ref()
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let start = self.oldest_index();
        let capacity = self.slots.len();
        (0..self.len).filter_map(move |i| self.slots[(start + i) % capacity].as_ref())
    }

    /// Empty the buffer, keeping its capacity.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn oldest_index(&self) -> usize {
        (self.head + self.slots.len() - self.len) % self.slots.len()
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Snapshot of the contents, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            RingBuffer::<u32>::new(0).unwrap_err(),
            MonitorError::InvalidCapacity
        );
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = RingBuffer::<u32>::new(3).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 3);
        assert!(buffer.peek().is_none());
        assert!(buffer.peek_oldest().is_none());
        assert!(buffer.to_vec().is_empty());
    }

    #[test]
    fn test_overwrites_oldest() {
        let mut buffer = RingBuffer::new(5).unwrap();
        for v in 1..=6 {
            buffer.push(v);
        }
        assert_eq!(buffer.to_vec(), vec![2, 3, 4, 5, 6]);
        assert_eq!(buffer.peek(), Some(&6));
        assert_eq!(buffer.peek_oldest(), Some(&2));
        assert!(buffer.is_full());
    }

    #[test]
    fn test_push_returns_evicted() {
        let mut buffer = RingBuffer::new(2).unwrap();
        assert_eq!(buffer.push('a'), None);
        assert_eq!(buffer.push('b'), None);
        assert_eq!(buffer.push('c'), Some('a'));
        assert_eq!(buffer.push('d'), Some('b'));
    }

    #[test]
    fn test_window_law() {
        for capacity in 1..=7 {
            for pushes in 0usize..=20 {
                let mut buffer = RingBuffer::new(capacity).unwrap();
                for v in 0..pushes {
                    buffer.push(v);
                }
                let expected: Vec<usize> = (pushes.saturating_sub(capacity)..pushes).collect();
                assert_eq!(buffer.len(), pushes.min(capacity));
                assert_eq!(buffer.to_vec(), expected);
            }
        }
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut buffer = RingBuffer::new(4).unwrap();
        buffer.push(1);
        buffer.push(2);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 4);

        buffer.push(9);
        assert_eq!(buffer.to_vec(), vec![9]);
        assert_eq!(buffer.peek_oldest(), Some(&9));
    }

    #[test]
    fn test_capacity_one() {
        let mut buffer = RingBuffer::new(1).unwrap();
        buffer.push(1);
        buffer.push(2);
        assert_eq!(buffer.to_vec(), vec![2]);
        assert_eq!(buffer.peek(), buffer.peek_oldest());
    }
}
