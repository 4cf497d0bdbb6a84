//! Insertion-ordered entity storage with stable, typed ids.

use crate::types::EntityId;

/// A slot vector where removal leaves a tombstone, so ids handed out earlier
/// never shift or get reused.
#[derive(Debug, Clone)]
pub(crate) struct Arena<M, T> {
    slots: Vec<Option<T>>,
    live: usize,
    _marker: std::marker::PhantomData<M>,
}

impl<M, T> Default for Arena<M, T> {
    fn default() -> Self {
        Arena {
            slots: Vec::new(),
            live: 0,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<M, T> Arena<M, T> {
    pub fn insert(&mut self, value: T) -> EntityId<M> {
        self.slots.push(Some(value));
        self.live += 1;
        EntityId::new(self.slots.len() - 1)
    }

    pub fn get(&self, id: EntityId<M>) -> Option<&T> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: EntityId<M>) -> Option<&mut T> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: EntityId<M>) -> bool {
        self.get(id).is_some()
    }

    pub fn remove(&mut self, id: EntityId<M>) -> Option<T> {
        let removed = self.slots.get_mut(id.index()).and_then(Option::take);
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    /// Live entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId<M>, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|value| (EntityId::new(index), value)))
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}
