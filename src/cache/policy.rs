//! Eviction Policy Module
//!
//! The ordering half of a store. A policy owns the order list holding the
//! entries and decides where entries go on insert, read and write. The
//! victim is always taken from the back of the list.

use super::list::{Handle, OrderList};

// == Eviction Policy ==
pub trait EvictionPolicy<T>: Send + Sync {
    fn new() -> Self
    where
        Self: Sized;

    /// Short policy name used in logs.
    fn name(&self) -> &'static str;

    /// The list holding every entry, front = protected, back = victim.
    fn order(&self) -> &OrderList<T>;

    fn order_mut(&mut self) -> &mut OrderList<T>;

    /// Places a new entry and returns its handle.
    fn insert(&mut self, item: T) -> Handle;

    /// Reorders after a successful read.
    fn on_read(&mut self, handle: Handle);

    /// Reorders after an in-place update.
    fn on_write(&mut self, handle: Handle) {
        self.on_read(handle);
    }

    /// Detaches an entry from the policy's bookkeeping and the list.
    fn remove(&mut self, handle: Handle) -> Option<T> {
        self.order_mut().remove(handle)
    }

    /// Next entry to evict, never returning `spare`.
    fn victim(&self, spare: Option<Handle>) -> Option<Handle> {
        let order = self.order();
        match order.back() {
            Some(back) if Some(back) == spare => order.prev(back),
            other => other,
        }
    }
}
