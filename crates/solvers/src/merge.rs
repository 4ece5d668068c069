//! Reconciles material state across workers after a depletion step.
//!
//! Before the merge, each worker has advanced only the burnable materials
//! it owns. [`merge_compositions`] makes every worker's copy of every
//! material identical:
//!
//! 1. barrier, so every owner has finished its solves;
//! 2. sum-reduce the per-material scalars, where only the owner contributes
//!    a nonzero value, so every worker agrees on them;
//! 3. broadcast each burnable material's densities from its owner, in
//!    material order, and overwrite the local copy.
//!
//! The result does not depend on how many workers share the materials.

use burnup_core::{Communicator, ContractViolation, Material, NuclideNetwork};
use tracing::debug;

/// Global quantities agreed on by every worker after a merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// Burnable materials whose state was reconciled.
    pub merged: usize,
    /// Heavy-metal mass (kg) of every burnable material.
    pub heavy_metal_mass: f64,
}

/// Makes every worker's material state identical.
///
/// Every worker must call this with the same material list.
///
/// # Errors
///
/// Returns a [`ContractViolation`] if a material's owner is not a valid rank
/// or a broadcast does not match the local composition length.
pub fn merge_compositions<C>(
    comm: &C,
    network: &NuclideNetwork,
    materials: &mut [Material],
) -> Result<MergeReport, ContractViolation>
where
    C: Communicator + ?Sized,
{
    let rank = comm.rank();

    if let Some(material) = materials
        .iter()
        .find(|m| m.burnable && m.owner >= comm.size())
    {
        return Err(ContractViolation::NotOwned {
            material: material.name.clone(),
            rank: material.owner,
        });
    }

    comm.barrier();

    // Two scalars per material: burnup, then heavy-metal mass.
    let mut scalars = vec![0.0; 2 * materials.len()];
    for (i, material) in materials.iter().enumerate() {
        if material.is_owned_by(rank) {
            scalars[2 * i] = material.burnup;
            scalars[2 * i + 1] = material.heavy_metal_mass(network);
        }
    }
    comm.sum_reduce(&mut scalars);

    let mut report = MergeReport::default();
    for (i, material) in materials.iter_mut().enumerate() {
        if !material.burnable {
            continue;
        }
        material.burnup = scalars[2 * i];
        report.heavy_metal_mass += scalars[2 * i + 1];

        let owner = material.owner;
        let mut densities = if owner == rank {
            material.composition.densities().to_vec()
        } else {
            Vec::new()
        };
        comm.broadcast(owner, &mut densities);

        if densities.len() != material.composition.len() {
            return Err(ContractViolation::MergeLength {
                material: material.name.clone(),
                owner,
                expected: material.composition.len(),
                found: densities.len(),
            });
        }
        material
            .composition
            .set_densities(&densities)
            .map_err(|source| ContractViolation::Composition {
                material: material.name.clone(),
                source,
            })?;
        report.merged += 1;
    }

    debug!(
        rank,
        merged = report.merged,
        heavy_metal_kg = report.heavy_metal_mass,
        "merged compositions"
    );
    Ok(report)
}
