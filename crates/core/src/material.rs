use serde::{Deserialize, Serialize};

use crate::{MaterialComposition, NuclideNetwork, units};

/// Index of a material in the run's material list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub usize);

/// A material tracked by the depletion core.
///
/// Every worker holds a copy of every material, but only the worker whose
/// rank equals `owner` advances it; the merge protocol then copies the
/// owner's densities to everyone else.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    /// Volume (cm³).
    pub volume: f64,
    pub burnable: bool,
    /// Rank of the worker that advances this material.
    pub owner: usize,
    /// Cumulative burnup (MWd/kgHM).
    pub burnup: f64,
    pub composition: MaterialComposition,
}

impl Material {
    #[must_use]
    pub fn new(id: MaterialId, name: impl Into<String>, volume: f64) -> Self {
        Self {
            id,
            name: name.into(),
            volume,
            burnable: true,
            owner: 0,
            burnup: 0.0,
            composition: MaterialComposition::new(),
        }
    }

    #[must_use]
    pub fn with_owner(mut self, owner: usize) -> Self {
        self.owner = owner;
        self
    }

    #[must_use]
    pub fn with_composition(mut self, composition: MaterialComposition) -> Self {
        self.composition = composition;
        self
    }

    /// Returns `true` if this worker must advance the material.
    #[must_use]
    pub fn is_owned_by(&self, rank: usize) -> bool {
        self.burnable && self.owner == rank
    }

    /// Heavy-metal (Z ≥ 90) mass in kilograms.
    #[must_use]
    pub fn heavy_metal_mass(&self, network: &NuclideNetwork) -> f64 {
        self.composition
            .iter()
            .map(|(id, density)| (network.nuclide(id), density))
            .filter(|(nuclide, _)| nuclide.zai().is_heavy_metal())
            .map(|(nuclide, density)| units::mass_kg(density, nuclide.atomic_weight(), self.volume))
            .sum()
    }
}
