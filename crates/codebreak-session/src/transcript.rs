//! Bounded per-session event log.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use codebreak_protocol::TranscriptEntry;

/// Ring buffer of transcript entries. Pushing past capacity evicts the
/// oldest entry.
#[derive(Debug, Clone)]
pub struct Transcript {
    entries: VecDeque<TranscriptEntry>,
    capacity: usize,
}

impl Transcript {
    /// Creates an empty transcript holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an entry stamped with the current wall-clock time.
    pub fn record(&mut self, text: impl Into<String>) {
        self.push(TranscriptEntry {
            at_ms: now_ms(),
            text: text.into(),
        });
    }

    /// Appends a pre-built entry, evicting the oldest when full.
    pub fn push(&mut self, entry: TranscriptEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// The newest `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> Vec<TranscriptEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// All retained entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(t: &Transcript) -> Vec<String> {
        t.iter().map(|e| e.text.clone()).collect()
    }

    #[test]
    fn test_record_stamps_entries() {
        let mut t = Transcript::new(4);
        t.record("hello");
        assert_eq!(t.len(), 1);
        assert!(t.iter().next().unwrap().at_ms > 0);
    }

    #[test]
    fn test_push_past_capacity_evicts_oldest() {
        let mut t = Transcript::new(3);
        for i in 0..5 {
            t.record(format!("e{i}"));
        }
        assert_eq!(t.len(), t.capacity());
        assert_eq!(texts(&t), vec!["e2", "e3", "e4"]);
    }

    #[test]
    fn test_tail_returns_newest_oldest_first() {
        let mut t = Transcript::new(10);
        for i in 0..6 {
            t.record(format!("e{i}"));
        }
        let tail: Vec<String> = t.tail(2).into_iter().map(|e| e.text).collect();
        assert_eq!(tail, vec!["e4", "e5"]);
    }

    #[test]
    fn test_tail_longer_than_len_returns_everything() {
        let mut t = Transcript::new(10);
        t.record("only");
        assert_eq!(t.tail(50).len(), 1);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut t = Transcript::new(0);
        t.record("dropped");
        assert!(t.is_empty());
    }
}
