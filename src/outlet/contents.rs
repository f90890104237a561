use crate::{renderable::Renderable, surface::NodeHandle};

/// A held renderable, with the nodes it currently occupies on the surface (empty until the
/// outlet is rendered).
pub(crate) struct Slot {
    pub renderable: Renderable,
    pub nodes: Vec<NodeHandle>,
}

/// The ordered children of an outlet. Removal compacts, so indices never have holes.
#[derive(Default)]
pub(crate) struct Contents {
    slots: Vec<Slot>,
}

impl Contents {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, index: usize) -> Option<&Renderable> {
        self.slots.get(index).map(|slot| &slot.renderable)
    }

    pub fn index_of(&self, renderable: &Renderable) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| Renderable::same(&slot.renderable, renderable))
    }

    /// Clones of every held renderable, in order.
    pub fn renderables(&self) -> Vec<Renderable> {
        self.slots
            .iter()
            .map(|slot| slot.renderable.clone())
            .collect()
    }

    /// The first surface node of the slots from `index` onwards, to insert before.
    pub fn anchor_from(&self, index: usize) -> Option<NodeHandle> {
        self.slots
            .iter()
            .skip(index)
            .find_map(|slot| slot.nodes.first().cloned())
    }

    pub fn insert(&mut self, index: usize, slot: Slot) {
        self.slots.insert(index, slot);
    }

    pub fn push(&mut self, slot: Slot) {
        self.slots.push(slot);
    }

    pub fn remove(&mut self, index: usize) -> Slot {
        self.slots.remove(index)
    }

    pub fn take(&mut self) -> Vec<Slot> {
        std::mem::take(&mut self.slots)
    }

    /// Record the nodes produced for each slot by a full render, in slot order.
    pub fn set_nodes(&mut self, nodes: Vec<Vec<NodeHandle>>) {
        self.slots
            .iter_mut()
            .zip(nodes)
            .for_each(|(slot, nodes)| slot.nodes = nodes);
    }

    /// Every node of every slot.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeHandle> {
        self.slots.iter().flat_map(|slot| slot.nodes.iter())
    }
}
