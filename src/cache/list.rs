//! Ordered List Module
//!
//! Arena-backed doubly-linked list used for both the recency and the
//! expiration orderings.

// == Node Id ==
/// Stable handle to a node inside an [`OrderList`].
///
/// A handle stays valid until its node is removed. After that the slot may be
/// handed out again by a later insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

#[derive(Debug)]
enum Slot<T> {
    Occupied(Node<T>),
    Vacant,
}

// == Order List ==
/// Doubly-linked list with O(1) push, move and remove by handle.
///
/// Nodes live in a contiguous arena. Removed slots go on a free list and are
/// reused by later insertions, so a cache under churn stops allocating once
/// it has reached its working size.
///
/// - Front = head of the ordering
/// - Back = tail of the ordering
#[derive(Debug)]
pub struct OrderList<T> {
    slots: Vec<Slot<T>>,
    /// Indices of vacant slots, reused last-in first-out
    free: Vec<usize>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl<T> Default for OrderList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OrderList<T> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Creates an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.len
    }

    // == Peek ==
    /// Handle of the first node, if any.
    pub fn front(&self) -> Option<NodeId> {
        self.head
    }

    /// Handle of the last node, if any.
    pub fn back(&self) -> Option<NodeId> {
        self.tail
    }

    /// Handle of the node before `id`.
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.prev)
    }

    /// Handle of the node after `id`.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.next)
    }

    /// Returns the payload stored at `id`.
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.node(id).map(|node| &node.value)
    }

    /// Returns the payload stored at `id` mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match self.slots.get_mut(id.0) {
            Some(Slot::Occupied(node)) => Some(&mut node.value),
            _ => None,
        }
    }

    // == Next Id ==
    /// Returns the handle the next insertion will occupy.
    ///
    /// Lets a caller build a payload that refers back to its own node (or to
    /// a node in a sibling list) before inserting it.
    pub fn next_id(&self) -> NodeId {
        match self.free.last() {
            Some(&index) => NodeId(index),
            None => NodeId(self.slots.len()),
        }
    }

    // == Insert ==
    /// Inserts `value` at the front and returns its handle.
    pub fn push_front(&mut self, value: T) -> NodeId {
        let id = self.allocate(value);
        self.link_front(id);
        id
    }

    /// Inserts `value` at the back and returns its handle.
    pub fn push_back(&mut self, value: T) -> NodeId {
        let id = self.allocate(value);
        self.link_back(id);
        id
    }

    /// Inserts `value` directly after `anchor`.
    ///
    /// If `anchor` is not a live node the value goes to the back.
    pub fn insert_after(&mut self, anchor: NodeId, value: T) -> NodeId {
        if self.node(anchor).is_none() {
            return self.push_back(value);
        }
        let id = self.allocate(value);
        self.link_after(anchor, id);
        id
    }

    // == Reorder ==
    /// Moves the node to the front. No-op for a dead handle.
    pub fn move_to_front(&mut self, id: NodeId) {
        if self.head == Some(id) || self.node(id).is_none() {
            return;
        }
        self.unlink(id);
        self.link_front(id);
    }

    // == Remove ==
    /// Unlinks the node and returns its payload. The slot joins the free list.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        self.node(id)?;
        self.unlink(id);
        let slot = std::mem::replace(&mut self.slots[id.0], Slot::Vacant);
        self.free.push(id.0);
        self.len -= 1;
        match slot {
            Slot::Occupied(node) => Some(node.value),
            Slot::Vacant => None,
        }
    }

    /// Removes the back node and returns its payload.
    pub fn pop_back(&mut self) -> Option<T> {
        self.tail.and_then(|id| self.remove(id))
    }

    // == Clear ==
    /// Drops every node. The arena allocation is kept.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    // == Iterate ==
    /// Iterates payloads from front to back.
    #[cfg(test)]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    // == Internals ==
    fn node(&self, id: NodeId) -> Option<&Node<T>> {
        match self.slots.get(id.0) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        match self.slots.get_mut(id.0) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    /// Places a fresh, unlinked node into a free or new slot.
    fn allocate(&mut self, value: T) -> NodeId {
        let node = Node {
            value,
            prev: None,
            next: None,
        };
        self.len += 1;
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Slot::Occupied(node);
                NodeId(index)
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    fn link_front(&mut self, id: NodeId) {
        let old_head = self.head;
        if let Some(node) = self.node_mut(id) {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(head) => {
                if let Some(node) = self.node_mut(head) {
                    node.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    fn link_back(&mut self, id: NodeId) {
        let old_tail = self.tail;
        if let Some(node) = self.node_mut(id) {
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(tail) => {
                if let Some(node) = self.node_mut(tail) {
                    node.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
    }

    fn link_after(&mut self, anchor: NodeId, id: NodeId) {
        let after = self.next(anchor);
        if let Some(node) = self.node_mut(id) {
            node.prev = Some(anchor);
            node.next = after;
        }
        if let Some(node) = self.node_mut(anchor) {
            node.next = Some(id);
        }
        match after {
            Some(next) => {
                if let Some(node) = self.node_mut(next) {
                    node.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
    }

    /// Detaches the node from its neighbours, leaving it in its slot.
    fn unlink(&mut self, id: NodeId) {
        let (prev, next) = match self.node(id) {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match prev {
            Some(prev) => {
                if let Some(node) = self.node_mut(prev) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(next) => {
                if let Some(node) = self.node_mut(next) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(node) = self.node_mut(id) {
            node.prev = None;
            node.next = None;
        }
    }
}

// == Iterator ==
/// Front-to-back iterator over an [`OrderList`].
#[cfg(test)]
pub struct Iter<'a, T> {
    list: &'a OrderList<T>,
    cursor: Option<NodeId>,
}

#[cfg(test)]
impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let node = self.list.node(id)?;
        self.cursor = node.next;
        Some(&node.value)
    }
}
