//! LRU Policy Module
//!
//! Implements Least Recently Used ordering for cache eviction.

use super::list::{Handle, OrderList};
use super::policy::EvictionPolicy;

// == LRU ==
/// Tracks access order for LRU eviction.
///
/// Entries are kept in an order list where:
/// - Front = Most recently used
/// - Back = Least recently used
#[derive(Debug)]
pub struct Lru<T> {
    order: OrderList<T>,
}

impl<T: Send + Sync> EvictionPolicy<T> for Lru<T> {
    fn new() -> Self {
        Self {
            order: OrderList::new(),
        }
    }

    fn name(&self) -> &'static str {
        "lru"
    }

    fn order(&self) -> &OrderList<T> {
        &self.order
    }

    fn order_mut(&mut self) -> &mut OrderList<T> {
        &mut self.order
    }

    fn insert(&mut self, item: T) -> Handle {
        self.order.push_front(item)
    }

    // == Touch ==
    /// Marks an entry as recently used (moves to front).
    fn on_read(&mut self, handle: Handle) {
        self.order.move_to_front(handle);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn victims(lru: &mut Lru<&'static str>) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Some(victim) = lru.victim(None) {
            out.extend(lru.remove(victim));
        }
        out
    }

    #[test]
    fn test_lru_victim_is_least_recent() {
        let mut lru = Lru::new();
        let a = lru.insert("a");
        lru.insert("b");
        lru.insert("c");

        assert_eq!(lru.victim(None), Some(a));
    }

    #[test]
    fn test_lru_order_after_multiple_touches() {
        let mut lru = Lru::new();

        // touch(a), touch(b), touch(c): [c, b, a]
        let a = lru.insert("a");
        let b = lru.insert("b");
        let c = lru.insert("c");

        // touch(a): [a, c, b]; touch(c): [c, a, b]; touch(b): [b, c, a]
        lru.on_read(a);
        lru.on_read(c);
        lru.on_write(b);

        assert_eq!(victims(&mut lru), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_lru_spare_skips_back() {
        let mut lru = Lru::new();
        let a = lru.insert("a");
        let b = lru.insert("b");

        assert_eq!(lru.victim(Some(a)), Some(b));
        lru.remove(b);
        assert_eq!(lru.victim(Some(a)), None);
    }
}
