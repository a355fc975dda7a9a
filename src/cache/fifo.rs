//! FIFO Policy Module
//!
//! First in, first out: entries are evicted strictly in insertion order.
//! Reads and in-place updates never change an entry's position.

use super::list::{Handle, OrderList};
use super::policy::EvictionPolicy;

// == FIFO ==
/// Insertion-ordered policy. Front = newest, back = oldest.
#[derive(Debug)]
pub struct Fifo<T> {
    order: OrderList<T>,
}

impl<T: Send + Sync> EvictionPolicy<T> for Fifo<T> {
    fn new() -> Self {
        Self {
            order: OrderList::new(),
        }
    }

    fn name(&self) -> &'static str {
        "fifo"
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

    fn on_read(&mut self, _handle: Handle) {}
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_victim_is_oldest() {
        let mut fifo = Fifo::new();
        let a = fifo.insert("a");
        let b = fifo.insert("b");
        fifo.insert("c");

        fifo.on_read(a);
        fifo.on_write(a);

        assert_eq!(fifo.victim(None), Some(a));
        assert_eq!(fifo.victim(Some(a)), Some(b));
    }

    #[test]
    fn test_fifo_remove() {
        let mut fifo = Fifo::new();
        let a = fifo.insert("a");
        let b = fifo.insert("b");

        assert_eq!(fifo.remove(a), Some("a"));
        assert_eq!(fifo.victim(None), Some(b));
        assert_eq!(fifo.victim(Some(b)), None);
    }
}
