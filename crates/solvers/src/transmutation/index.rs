use std::collections::HashMap;

use burnup_core::{MaterialComposition, NuclideId};

/// Matrix index of each composition nuclide for one build pass.
///
/// Indices follow composition order. The map is rebuilt for every matrix and
/// dropped with it, so nothing index-related is ever stored on a nuclide.
#[derive(Debug, Clone, Default)]
pub struct MatrixIndex {
    nuclides: Vec<NuclideId>,
    slots: HashMap<NuclideId, usize>,
}

impl MatrixIndex {
    #[must_use]
    pub fn new(composition: &MaterialComposition) -> Self {
        let nuclides = composition.nuclides().to_vec();
        let slots = nuclides
            .iter()
            .enumerate()
            .map(|(slot, &id)| (id, slot))
            .collect();
        Self { nuclides, slots }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nuclides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nuclides.is_empty()
    }

    /// The matrix index of `id`, if it belongs to the composition.
    #[must_use]
    pub fn slot(&self, id: NuclideId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    #[must_use]
    pub fn nuclide(&self, slot: usize) -> Option<NuclideId> {
        self.nuclides.get(slot).copied()
    }

    pub(super) fn into_nuclides(self) -> Vec<NuclideId> {
        self.nuclides
    }
}
