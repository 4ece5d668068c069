use thiserror::Error;

use crate::{CompositionError, SparseError, Zai};

/// A violated invariant of the depletion core.
///
/// These are not user errors: they mean the reaction network, the sizing
/// pass, or the run itself is corrupted. Callers are expected to stop the
/// whole run (every worker) rather than recover.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContractViolation {
    #[error(
        "build_matrix: {parent} feeds {target} (mt={mt}) which is not in material '{material}'"
    )]
    MissingTarget {
        material: String,
        parent: Zai,
        target: Zai,
        mt: u32,
    },

    #[error("build_matrix: fission mt={mt} of {nuclide} has branching ratio {branching}, not 1")]
    FissionBranching {
        nuclide: Zai,
        mt: u32,
        branching: f64,
    },

    #[error("build_matrix: entry ({row}, {col}) of material '{material}' has wrong sign: {value}")]
    Sign {
        material: String,
        row: usize,
        col: usize,
        value: f64,
    },

    #[error("build_matrix: material '{material}' exceeded its sizing bound: {source}")]
    Sparse {
        material: String,
        #[source]
        source: SparseError,
    },

    #[error("build_matrix: flux {flux} of material '{material}' is negative or not finite")]
    InvalidFlux { material: String, flux: f64 },

    #[error("build_matrix: expected {expected} fluxes, one per material, got {found}")]
    FluxLength { expected: usize, found: usize },

    #[error("build_matrix: material '{material}' is not burnable or not owned by rank {rank}")]
    NotOwned { material: String, rank: usize },

    #[error("deplete: material '{material}': {source}")]
    Composition {
        material: String,
        #[source]
        source: CompositionError,
    },

    #[error("merge: material '{material}' expected {expected} densities from rank {owner}, got {found}")]
    MergeLength {
        material: String,
        owner: usize,
        expected: usize,
        found: usize,
    },

    #[error("run: no burn time elapsed over the whole history")]
    NoBurnTime,
}
