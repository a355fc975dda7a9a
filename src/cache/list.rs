//! Order List Module
//!
//! Doubly linked list stored in an arena and addressed by integer handles.
//! Every eviction policy keeps its entries in one of these: the front is
//! the protected end, the back holds the next eviction victim.

// == Handle ==
/// Stable reference to a node in an `OrderList`.
///
/// A handle stays valid until its node is removed; slots are recycled
/// afterwards, so callers must drop handles of removed nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(usize);

#[derive(Debug)]
struct Node<T> {
    item: T,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Order List ==
#[derive(Debug)]
pub struct OrderList<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Default for OrderList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OrderList<T> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn front(&self) -> Option<Handle> {
        self.head.map(Handle)
    }

    pub fn back(&self) -> Option<Handle> {
        self.tail.map(Handle)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.node(handle.0).map(|node| &node.item)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .map(|node| &mut node.item)
    }

    /// Handle of the node after `handle` (towards the back).
    pub fn next(&self, handle: Handle) -> Option<Handle> {
        self.node(handle.0).and_then(|node| node.next).map(Handle)
    }

    /// Handle of the node before `handle` (towards the front).
    pub fn prev(&self, handle: Handle) -> Option<Handle> {
        self.node(handle.0).and_then(|node| node.prev).map(Handle)
    }

    // == Insertion ==
    pub fn push_front(&mut self, item: T) -> Handle {
        let idx = self.alloc(item);
        self.link_before(idx, self.head);
        Handle(idx)
    }

    pub fn push_back(&mut self, item: T) -> Handle {
        let idx = self.alloc(item);
        self.link_before(idx, None);
        Handle(idx)
    }

    /// Inserts `item` directly in front of `at`.
    pub fn insert_before(&mut self, item: T, at: Handle) -> Handle {
        let idx = self.alloc(item);
        self.link_before(idx, Some(at.0));
        Handle(idx)
    }

    // == Reordering ==
    /// Moves `handle` directly in front of `at`. No-op when they are equal.
    pub fn move_before(&mut self, handle: Handle, at: Handle) {
        if handle == at || self.node(handle.0).is_none() || self.node(at.0).is_none() {
            return;
        }
        self.unlink(handle.0);
        self.link_before(handle.0, Some(at.0));
    }

    pub fn move_to_front(&mut self, handle: Handle) {
        if self.head == Some(handle.0) || self.node(handle.0).is_none() {
            return;
        }
        self.unlink(handle.0);
        self.link_before(handle.0, self.head);
    }

    // == Removal ==
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        self.node(handle.0)?;
        self.unlink(handle.0);
        let node = self.slots.get_mut(handle.0).and_then(Option::take)?;
        self.free.push(handle.0);
        Some(node.item)
    }

    /// Iterates from front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    // == Internals ==
    fn node(&self, idx: usize) -> Option<&Node<T>> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    fn alloc(&mut self, item: T) -> usize {
        let node = Node {
            item,
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    /// Links a detached node in front of `at` (`None` = at the back).
    fn link_before(&mut self, idx: usize, at: Option<usize>) {
        let prev = match at {
            Some(at) => self.node(at).and_then(|node| node.prev),
            None => self.tail,
        };
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = prev;
            node.next = at;
        }
        match prev {
            Some(p) => {
                if let Some(node) = self.slots[p].as_mut() {
                    node.next = Some(idx);
                }
            }
            None => self.head = Some(idx),
        }
        match at {
            Some(n) => {
                if let Some(node) = self.slots[n].as_mut() {
                    node.prev = Some(idx);
                }
            }
            None => self.tail = Some(idx),
        }
        self.len += 1;
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.node(idx) {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match prev {
            Some(p) => {
                if let Some(node) = self.slots[p].as_mut() {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.slots[n].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = None;
            node.next = None;
        }
        self.len -= 1;
    }
}

// == Iterator ==
pub struct Iter<'a, T> {
    list: &'a OrderList<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node(self.cursor?)?;
        self.cursor = node.next;
        Some(&node.item)
    }
}
