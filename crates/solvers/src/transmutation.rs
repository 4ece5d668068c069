//! Assembly of the Bateman transmutation matrix.
//!
//! For one material with composition `N`, the matrix `A` satisfies
//! `dN/dt = A·N`. Column `j` holds what nuclide `j` does: its total removal
//! rate on the diagonal and its production of each daughter in the
//! daughter's row. Matrix indices follow the composition order.
//!
//! # Example
//!
//! ```ignore
//! use burnup_solvers::transmutation::MatrixBuilder;
//!
//! let builder = MatrixBuilder::new(&network, rank);
//! let matrix = builder.build_matrix(&material, &rates, flux, time)?;
//! let after = solver.solve(&matrix.matrix, material.composition.densities(), dt)?;
//! ```

mod index;
mod sizing;


pub use index::MatrixIndex;
pub use sizing::count_nonzero_bound;

use burnup_core::{
    ContractViolation, CscMatrix, Material, MaterialId, NuclideId, NuclideNetwork, ReactionKind,
    ReactionRates, TripletBuilder, truncate_flux,
};
use rayon::prelude::*;
use tracing::trace;

use crate::reprocessing::Reprocessing;

/// The transmutation matrix of one material for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct TransmutationMatrix {
    pub material: MaterialId,
    pub matrix: CscMatrix,
    /// Nuclide of each matrix index.
    pub nuclides: Vec<NuclideId>,
}

/// Builds transmutation matrices for the materials owned by one worker.
#[derive(Debug, Clone, Copy)]
pub struct MatrixBuilder<'a> {
    network: &'a NuclideNetwork,
    rank: usize,
    reprocessing: Option<&'a Reprocessing>,
    lazy_inventory: bool,
}

impl<'a> MatrixBuilder<'a> {
    #[must_use]
    pub fn new(network: &'a NuclideNetwork, rank: usize) -> Self {
        Self {
            network,
            rank,
            reprocessing: None,
            lazy_inventory: false,
        }
    }

    /// Adds continuous removal terms to every matrix built.
    #[must_use]
    pub fn with_reprocessing(mut self, reprocessing: &'a Reprocessing) -> Self {
        self.reprocessing = Some(reprocessing);
        self
    }

    /// Holds inert any member whose daughters are not all in the composition.
    ///
    /// Such a member only accumulates atoms for the step; its reactions join
    /// the matrix once the inventory refresh has added its daughters.
    /// Without this, a missing daughter is a [`ContractViolation`].
    #[must_use]
    pub fn with_lazy_inventory(mut self) -> Self {
        self.lazy_inventory = true;
        self
    }

    /// Builds the matrix of one burnable material owned by this worker.
    ///
    /// `flux` is the material's scalar flux; it is truncated with
    /// [`truncate_flux`] before use. Induced reaction rates are
    /// `flux · rates.rate(..)`; rates that are not positive are skipped.
    ///
    /// # Errors
    ///
    /// Returns a [`ContractViolation`] if the material is not owned by this
    /// worker, the flux is negative or not finite, a daughter is missing
    /// from the composition, a fission branching ratio is not one, an entry
    /// has the wrong sign, or the entry count exceeds the sizing bound.
    pub fn build_matrix<R>(
        &self,
        material: &Material,
        rates: &R,
        flux: f64,
        time: f64,
    ) -> Result<TransmutationMatrix, ContractViolation>
    where
        R: ReactionRates + ?Sized,
    {
        if !material.is_owned_by(self.rank) {
            return Err(ContractViolation::NotOwned {
                material: material.name.clone(),
                rank: self.rank,
            });
        }
        if !flux.is_finite() || flux < 0.0 {
            return Err(ContractViolation::InvalidFlux {
                material: material.name.clone(),
                flux,
            });
        }
        let flux = truncate_flux(flux);

        let composition = &material.composition;
        let index = MatrixIndex::new(composition);
        let dim = index.len();
        let bound = count_nonzero_bound(self.network, material, self.reprocessing);
        let mut triplets = TripletBuilder::with_bound(dim, bound);
        let mut row = vec![0.0; dim];

        let mut inert = 0;
        for (col, &id) in composition.nuclides().iter().enumerate() {
            if self.lazy_inventory && !self.daughters_present(&index, id) {
                inert += 1;
                continue;
            }
            row.fill(0.0);
            self.fill_column(material, &index, id, col, rates, flux, time, &mut row)?;

            for (i, &value) in row.iter().enumerate() {
                if value == 0.0 {
                    continue;
                }
                let wrong_sign = if i == col { value > 0.0 } else { value < 0.0 };
                if wrong_sign {
                    return Err(ContractViolation::Sign {
                        material: material.name.clone(),
                        row: i,
                        col,
                        value,
                    });
                }
                triplets
                    .push(i, col, value)
                    .map_err(|source| ContractViolation::Sparse {
                        material: material.name.clone(),
                        source,
                    })?;
            }
        }

        trace!(
            material = %material.name,
            dim,
            nnz = triplets.len(),
            bound,
            inert,
            "assembled transmutation matrix"
        );

        Ok(TransmutationMatrix {
            material: material.id,
            matrix: triplets.finalize(),
            nuclides: index.into_nuclides(),
        })
    }

    /// Builds matrices for every burnable material this worker owns.
    ///
    /// Materials are assembled in parallel; the result keeps the material
    /// order and pairs each matrix with its position in `materials`.
    /// `fluxes` is aligned with `materials`.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation::FluxLength`] if `fluxes` and `materials`
    /// differ in length, otherwise the first [`ContractViolation`] in
    /// material order.
    pub fn build_all<R>(
        &self,
        materials: &[Material],
        rates: &R,
        fluxes: &[f64],
        time: f64,
    ) -> Result<Vec<(usize, TransmutationMatrix)>, ContractViolation>
    where
        R: ReactionRates + Sync + ?Sized,
    {
        if fluxes.len() != materials.len() {
            return Err(ContractViolation::FluxLength {
                expected: materials.len(),
                found: fluxes.len(),
            });
        }

        materials
            .par_iter()
            .enumerate()
            .filter(|(_, material)| material.is_owned_by(self.rank))
            .map(|(position, material)| {
                self.build_matrix(material, rates, fluxes[position], time)
                    .map(|matrix| (position, matrix))
            })
            .collect()
    }

    fn daughters_present(&self, index: &MatrixIndex, id: NuclideId) -> bool {
        self.network
            .daughters(id)
            .into_iter()
            .all(|daughter| index.slot(daughter).is_some())
    }

    #[allow(clippy::too_many_arguments)]
    fn fill_column<R>(
        &self,
        material: &Material,
        index: &MatrixIndex,
        id: NuclideId,
        col: usize,
        rates: &R,
        flux: f64,
        time: f64,
        row: &mut [f64],
    ) -> Result<(), ContractViolation>
    where
        R: ReactionRates + ?Sized,
    {
        let network = self.network;
        let nuclide = network.nuclide(id);
        let lost = network.lost();

        let slot = |target: NuclideId, mt: u32| {
            index
                .slot(target)
                .ok_or_else(|| ContractViolation::MissingTarget {
                    material: material.name.clone(),
                    parent: nuclide.zai(),
                    target: network.nuclide(target).zai(),
                    mt,
                })
        };
        let unit_branching = |mt: u32, branching: f64| {
            if branching == 1.0 {
                Ok(())
            } else {
                Err(ContractViolation::FissionBranching {
                    nuclide: nuclide.zai(),
                    mt,
                    branching,
                })
            }
        };

        let isomeric_removal = network
            .reactions_of(id)
            .any(|(_, r)| r.kind == ReactionKind::Decay { isomeric_branch: true });

        for (rid, reaction) in network.reactions_of(id) {
            let br = reaction.branching_ratio;
            match reaction.kind {
                ReactionKind::Decay { isomeric_branch } => {
                    let lambda = nuclide.decay_constant();
                    if lambda == 0.0 {
                        continue;
                    }
                    let removal = match (isomeric_removal, isomeric_branch) {
                        (true, true) => lambda,
                        (true, false) => 0.0,
                        (false, _) => br * lambda,
                    };
                    row[col] -= removal;
                    row[slot(reaction.target.unwrap_or(lost), reaction.mt)?] += br * lambda;
                }
                ReactionKind::Transmutation(_) => {
                    if !reaction.is_transmutation_channel() {
                        continue;
                    }
                    let Some(rate) = positive(flux * rates.rate(rid, material.id, time)) else {
                        continue;
                    };
                    row[col] -= br * rate;
                    row[slot(reaction.target.unwrap_or(lost), reaction.mt)?] += br * rate;
                }
                ReactionKind::InducedFission | ReactionKind::SpontaneousFission => {
                    unit_branching(reaction.mt, br)?;
                    let rate = if reaction.kind == ReactionKind::SpontaneousFission {
                        nuclide.spontaneous_fission_rate()
                    } else {
                        flux * rates.rate(rid, material.id, time)
                    };
                    let Some(rate) = positive(rate) else {
                        continue;
                    };
                    row[col] -= rate;
                    match reaction.yields {
                        Some(yid) => {
                            for y in network.yields(yid).iter() {
                                row[slot(y.product, reaction.mt)?] += br * rate * y.fraction.get();
                            }
                        }
                        None => row[slot(lost, reaction.mt)?] += rate,
                    }
                }
                ReactionKind::TotalFission => {
                    if nuclide.fission_yield().is_some() {
                        continue;
                    }
                    unit_branching(reaction.mt, br)?;
                    let Some(rate) = positive(flux * rates.rate(rid, material.id, time)) else {
                        continue;
                    };
                    row[col] -= rate;
                    row[slot(lost, reaction.mt)?] += rate;
                }
            }
        }

        if id != lost {
            if let Some(plan) = self.reprocessing {
                let k = plan.removal_constant(material.id, nuclide.zai().z());
                if k > 0.0 {
                    row[col] -= k;
                    row[slot(lost, 0)?] += k;
                }
            }
        }

        Ok(())
    }
}

/// Rates that are zero, negative, or NaN contribute nothing.
fn positive(rate: f64) -> Option<f64> {
    (rate > 0.0).then_some(rate)
}
