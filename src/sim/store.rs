//! Id-ordered entity storage
//!
//! Entities are appended with monotonically increasing ids and removed in a
//! single order-preserving compaction pass per tick, so the backing `Vec` is
//! always sorted by id. That gives stable iteration order and O(log n)
//! lookups by id without any index bookkeeping.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStore<T> {
    items: Vec<T>,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity. Ids must be allocated in increasing order.
    pub fn push(&mut self, item: T) {
        debug_assert!(
            self.items.last().is_none_or(|last| last.id() < item.id()),
            "entity ids must be pushed in increasing order"
        );
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.items
            .binary_search_by_key(&id, |e| e.id())
            .ok()
            .map(|i| &self.items[i])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        match self.items.binary_search_by_key(&id, |e| e.id()) {
            Ok(i) => Some(&mut self.items[i]),
            Err(_) => None,
        }
    }

    /// Number of entities still alive
    pub fn alive_count(&self) -> usize {
        self.items.iter().filter(|e| e.is_alive()).count()
    }

    /// Drop every dead/expired/collected entity, keeping id order.
    /// Returns how many were removed.
    pub fn compact(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|e| e.is_alive());
        before - self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a, T> IntoIterator for &'a EntityStore<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut EntityStore<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter_mut()
    }
}

/// Hands out entity ids for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next: EntityId,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Allocate a new entity ID
    pub fn next_id(&mut self) -> EntityId {
        let id = self.next;
        self.next += 1;
        id
    }
}
