use std::collections::HashMap;

use thiserror::Error;

use crate::{NuclideId, NuclideNetwork};

/// Errors returned when updating a [`MaterialComposition`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum CompositionError {
    #[error("expected {expected} densities, got {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("density {value} at position {position} is negative or not finite")]
    InvalidDensity { position: usize, value: f64 },
}

/// Ordered (nuclide, atomic density) pairs of one material.
///
/// Densities are in atoms per barn-centimetre. Insertion order is the order
/// in which the matrix builder assigns matrix indices, so it never changes
/// once a nuclide is present; new nuclides are appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialComposition {
    nuclides: Vec<NuclideId>,
    densities: Vec<f64>,
    positions: HashMap<NuclideId, usize>,
}

impl MaterialComposition {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nuclides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nuclides.is_empty()
    }

    /// Nuclides in insertion order.
    #[must_use]
    pub fn nuclides(&self) -> &[NuclideId] {
        &self.nuclides
    }

    /// Densities aligned with [`MaterialComposition::nuclides`].
    #[must_use]
    pub fn densities(&self) -> &[f64] {
        &self.densities
    }

    pub fn iter(&self) -> impl Iterator<Item = (NuclideId, f64)> + '_ {
        self.nuclides.iter().copied().zip(self.densities.iter().copied())
    }

    #[must_use]
    pub fn position(&self, id: NuclideId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    #[must_use]
    pub fn density(&self, id: NuclideId) -> Option<f64> {
        self.position(id).map(|pos| self.densities[pos])
    }

    #[must_use]
    pub fn contains(&self, id: NuclideId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Sets the density of a nuclide, appending it if absent.
    pub fn insert(&mut self, id: NuclideId, density: f64) {
        match self.position(id) {
            Some(pos) => self.densities[pos] = density,
            None => {
                self.positions.insert(id, self.nuclides.len());
                self.nuclides.push(id);
                self.densities.push(density);
            }
        }
    }

    /// Appends a nuclide with zero density if absent; returns `true` if added.
    pub fn ensure(&mut self, id: NuclideId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.insert(id, 0.0);
        true
    }

    /// Replaces every density at once, keeping the nuclide order.
    ///
    /// # Errors
    ///
    /// Returns an error if the length differs or any value is negative or
    /// not finite. The composition is unchanged on error.
    pub fn set_densities(&mut self, densities: &[f64]) -> Result<(), CompositionError> {
        if densities.len() != self.densities.len() {
            return Err(CompositionError::LengthMismatch {
                expected: self.densities.len(),
                found: densities.len(),
            });
        }
        if let Some((position, &value)) = densities
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(CompositionError::InvalidDensity { position, value });
        }
        self.densities.copy_from_slice(densities);
        Ok(())
    }

    /// Number of nuclides with a nonzero density.
    #[must_use]
    pub fn nonzero_count(&self) -> usize {
        self.densities.iter().filter(|&&d| d != 0.0).count()
    }

    #[must_use]
    pub fn total_density(&self) -> f64 {
        self.densities.iter().sum()
    }

    /// Adds every nuclide reachable through the network, with zero density.
    ///
    /// After this call every reaction target and fission product of every
    /// member is itself a member, which the matrix builder requires.
    /// Returns the number of nuclides added.
    pub fn close_over(&mut self, network: &NuclideNetwork) -> usize {
        let before = self.len();
        let mut cursor = 0;
        while cursor < self.nuclides.len() {
            let id = self.nuclides[cursor];
            for daughter in network.daughters(id) {
                self.ensure(daughter);
            }
            cursor += 1;
        }
        self.len() - before
    }

    /// Adds the direct daughters of every nuclide with a nonzero density.
    ///
    /// Returns the number of nuclides added.
    pub fn refresh_daughters(&mut self, network: &NuclideNetwork) -> usize {
        let populated: Vec<NuclideId> = self
            .iter()
            .filter(|&(_, density)| density > 0.0)
            .map(|(id, _)| id)
            .collect();

        populated
            .into_iter()
            .flat_map(|id| network.daughters(id))
            .filter(|&daughter| self.ensure(daughter))
            .count()
    }
}

impl FromIterator<(NuclideId, f64)> for MaterialComposition {
    fn from_iter<T: IntoIterator<Item = (NuclideId, f64)>>(iter: T) -> Self {
        let mut composition = Self::new();
        for (id, density) in iter {
            composition.insert(id, density);
        }
        composition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NetworkBuilder, NuclideData, Reaction, Zai};

    fn chain() -> (NuclideNetwork, [NuclideId; 3]) {
        let mut builder = NetworkBuilder::new();
        let a = builder
            .add_nuclide(NuclideData::stable(Zai::new(53, 135, 0)).with_decay_constant(2.9e-5))
            .unwrap();
        let b = builder
            .add_nuclide(NuclideData::stable(Zai::new(54, 135, 0)).with_decay_constant(2.1e-5))
            .unwrap();
        let c = builder
            .add_nuclide(NuclideData::stable(Zai::new(55, 135, 0)))
            .unwrap();
        builder.add_reaction(a, Reaction::decay(Some(b), 1.0)).unwrap();
        builder.add_reaction(b, Reaction::decay(Some(c), 1.0)).unwrap();
        (builder.build(), [a, b, c])
    }

    #[test]
    fn insertion_order_is_stable() {
        let (_, [a, b, c]) = chain();
        let mut comp: MaterialComposition = [(b, 1.0), (a, 2.0)].into_iter().collect();
        comp.insert(b, 3.0);
        comp.insert(c, 0.0);

        assert_eq!(comp.nuclides(), &[b, a, c]);
        assert_eq!(comp.densities(), &[3.0, 2.0, 0.0]);
        assert_eq!(comp.nonzero_count(), 2);
    }

    #[test]
    fn close_over_adds_whole_chain() {
        let (network, [a, b, c]) = chain();
        let mut comp: MaterialComposition = [(a, 1.0)].into_iter().collect();

        assert_eq!(comp.close_over(&network), 2);
        assert_eq!(comp.nuclides(), &[a, b, c]);
        assert_eq!(comp.close_over(&network), 0);
    }

    #[test]
    fn refresh_adds_one_generation_of_populated_nuclides() {
        let (network, [a, b, c]) = chain();
        let mut comp: MaterialComposition = [(a, 1.0)].into_iter().collect();

        assert_eq!(comp.refresh_daughters(&network), 1);
        assert!(comp.contains(b));
        // `b` has zero density, so its daughter is not discovered yet.
        assert!(!comp.contains(c));
    }

    #[test]
    fn set_densities_validates() {
        let (_, [a, b, _]) = chain();
        let mut comp: MaterialComposition = [(a, 1.0), (b, 1.0)].into_iter().collect();

        assert_eq!(
            comp.set_densities(&[1.0]),
            Err(CompositionError::LengthMismatch {
                expected: 2,
                found: 1
            })
        );
        assert!(matches!(
            comp.set_densities(&[1.0, -2.0]),
            Err(CompositionError::InvalidDensity { position: 1, .. })
        ));
        comp.set_densities(&[0.5, 0.25]).unwrap();
        assert_eq!(comp.densities(), &[0.5, 0.25]);
    }
}
