//! LFU Policy Module
//!
//! Least Frequently Used ordering over a single order list partitioned into
//! per-frequency segments.
//!
//! # Layout
//!
//! ```text
//! front                                                   back
//! [ f=3: e9 ][ f=2: e4 e7 ][ f=1: e8 e6 e5 ]
//!   ^ head     ^ head         ^ head          victim = e5
//! ```
//!
//! - Segments are contiguous and ordered by decreasing frequency.
//! - Inside a segment the most recently promoted entry sits at the head.
//! - The victim is the back of the list: lowest frequency, longest there.
//! - Frequency grows by one on every read and every in-place update.

use std::collections::HashMap;

use super::list::{Handle, OrderList};
use super::policy::EvictionPolicy;

/// One frequency segment: its front-most member and its size.
#[derive(Debug, Clone, Copy)]
struct Segment {
    head: Handle,
    len: usize,
}

// == LFU ==
#[derive(Debug)]
pub struct Lfu<T> {
    order: OrderList<T>,
    /// Access frequency per live entry
    freqs: HashMap<Handle, u64>,
    /// Frequency -> segment; empty segments are dropped
    segments: HashMap<u64, Segment>,
}

impl<T> Lfu<T> {
    /// Current access frequency of an entry.
    pub fn frequency(&self, handle: Handle) -> Option<u64> {
        self.freqs.get(&handle).copied()
    }

    /// Number of distinct frequency segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Takes `handle` out of its segment without touching its list position.
    fn leave_segment(&mut self, handle: Handle, freq: u64) {
        let next = self.order.next(handle);
        let Some(segment) = self.segments.get_mut(&freq) else {
            return;
        };
        if segment.len <= 1 {
            self.segments.remove(&freq);
            return;
        }
        segment.len -= 1;
        if segment.head == handle {
            // Segments are contiguous, so the follower shares the frequency
            if let Some(next) = next {
                segment.head = next;
            }
        }
    }

    /// Moves `handle` from its frequency to the next one up.
    fn promote(&mut self, handle: Handle) {
        let Some(freq) = self.frequency(handle) else {
            return;
        };
        self.leave_segment(handle, freq);

        let target = freq + 1;
        match self.segments.get_mut(&target) {
            Some(segment) => {
                self.order.move_before(handle, segment.head);
                segment.head = handle;
                segment.len += 1;
            }
            None => {
                // New segment goes between the old one and the next higher one
                if let Some(old) = self.segments.get(&freq) {
                    self.order.move_before(handle, old.head);
                }
                self.segments.insert(target, Segment { head: handle, len: 1 });
            }
        }
        self.freqs.insert(handle, target);
    }
}

impl<T: Send + Sync> EvictionPolicy<T> for Lfu<T> {
    fn new() -> Self {
        Self {
            order: OrderList::new(),
            freqs: HashMap::new(),
            segments: HashMap::new(),
        }
    }

    fn name(&self) -> &'static str {
        "lfu"
    }

    fn order(&self) -> &OrderList<T> {
        &self.order
    }

    fn order_mut(&mut self) -> &mut OrderList<T> {
        &mut self.order
    }

    /// New entries join frequency 1 at its head, or the back of the list
    /// when no frequency-1 entry exists.
    ///
    /// Frequency 1 sits at the victim end, so a fresh key is evicted before
    /// any entry that has been read, but after the unread keys already
    /// waiting there.
    fn insert(&mut self, item: T) -> Handle {
        let handle = match self.segments.get_mut(&1) {
            Some(segment) => {
                let handle = self.order.insert_before(item, segment.head);
                segment.head = handle;
                segment.len += 1;
                handle
            }
            None => {
                let handle = self.order.push_back(item);
                self.segments.insert(1, Segment { head: handle, len: 1 });
                handle
            }
        };
        self.freqs.insert(handle, 1);
        handle
    }

    fn on_read(&mut self, handle: Handle) {
        self.promote(handle);
    }

    fn remove(&mut self, handle: Handle) -> Option<T> {
        let freq = self.freqs.remove(&handle)?;
        self.leave_segment(handle, freq);
        self.order.remove(handle)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn victims(lfu: &mut Lfu<&'static str>) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Some(victim) = lfu.victim(None) {
            out.extend(lfu.remove(victim));
        }
        out
    }

    /// Checks that segments are contiguous and ordered by decreasing frequency.
    fn assert_layout(lfu: &Lfu<&'static str>) {
        let mut cursor = lfu.order.front();
        let mut last: Option<u64> = None;
        let mut seen = HashMap::new();
        while let Some(handle) = cursor {
            let freq = lfu.frequency(handle).unwrap();
            if let Some(prev) = last {
                assert!(freq <= prev, "segments out of order");
            }
            if last != Some(freq) {
                assert_eq!(lfu.segments[&freq].head, handle, "segment head mismatch");
            }
            *seen.entry(freq).or_insert(0usize) += 1;
            last = Some(freq);
            cursor = lfu.order.next(handle);
        }
        assert_eq!(seen.len(), lfu.segments.len());
        for (freq, count) in seen {
            assert_eq!(lfu.segments[&freq].len, count);
        }
    }

    #[test]
    fn test_lfu_fresh_entries_evicted_oldest_first() {
        let mut lfu = Lfu::new();
        lfu.insert("a");
        lfu.insert("b");
        lfu.insert("c");

        assert_layout(&lfu);
        assert_eq!(victims(&mut lfu), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_lfu_read_protects_entry() {
        let mut lfu = Lfu::new();
        let a = lfu.insert("a");
        lfu.insert("b");
        lfu.insert("c");

        lfu.on_read(a);
        assert_eq!(lfu.frequency(a), Some(2));
        assert_layout(&lfu);

        assert_eq!(victims(&mut lfu), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_lfu_ties_broken_by_promotion_recency() {
        let mut lfu = Lfu::new();
        let a = lfu.insert("a");
        let b = lfu.insert("b");
        lfu.insert("c");

        // b reaches frequency 2 after a, so a is older within the segment
        lfu.on_read(a);
        lfu.on_read(b);
        assert_layout(&lfu);

        assert_eq!(victims(&mut lfu), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_lfu_new_entry_lands_among_frequency_one() {
        let mut lfu = Lfu::new();
        let a = lfu.insert("a");
        lfu.insert("b");
        lfu.on_read(a);
        lfu.on_read(a);
        lfu.insert("c");
        assert_layout(&lfu);

        assert_eq!(victims(&mut lfu), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_lfu_empty_segments_are_dropped() {
        let mut lfu = Lfu::new();
        let a = lfu.insert("a");

        lfu.on_read(a);
        lfu.on_write(a);
        assert_eq!(lfu.frequency(a), Some(3));
        assert_eq!(lfu.segment_count(), 1);

        lfu.remove(a);
        assert_eq!(lfu.segment_count(), 0);
        assert!(lfu.frequency(a).is_none());
    }

    #[test]
    fn test_lfu_remove_segment_head_keeps_layout() {
        let mut lfu = Lfu::new();
        lfu.insert("a");
        lfu.insert("b");
        let c = lfu.insert("c");
        let d = lfu.insert("d");
        lfu.on_read(c);
        lfu.on_read(d);

        // d heads frequency 2; removing it hands the head to c
        lfu.remove(d);
        assert_layout(&lfu);
        assert_eq!(victims(&mut lfu), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_lfu_spare_is_skipped() {
        let mut lfu = Lfu::new();
        let a = lfu.insert("a");
        let b = lfu.insert("b");

        assert_eq!(lfu.victim(Some(a)), Some(b));
    }
}
