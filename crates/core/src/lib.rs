//! Core types and traits for the burnup depletion workspace.
//!
//! This crate defines the shared data model and the seams that the solvers
//! and observers build on:
//!
//! - [`NuclideNetwork`] — read-only nuclides, reactions, and fission yields
//! - [`Material`] and [`MaterialComposition`] — burnable materials and their
//!   ordered nuclide densities
//! - [`CscMatrix`] and [`TripletBuilder`] — compressed-column sparse storage
//! - [`DepletionContext`] — the explicit interval/step/phase position of a run
//! - [`DepletionConfig`] — the validated configuration surface
//! - [`Observer`] — receives scheduler events and optionally returns actions
//! - [`ReactionRates`], [`TransportEngine`], [`DepletionSolver`],
//!   [`Communicator`], [`CoupledProgram`] — traits for external collaborators

pub mod config;
pub mod network;
pub mod sparse;
pub mod units;

mod collaborators;
mod communicator;
mod composition;
mod context;
mod coupling;
mod error;
mod flux;
mod fraction;
mod material;
mod nuclide;
mod observer;
mod reaction;
mod yields;

pub use collaborators::{
    BoxError, DepletionSolver, ReactionRates, RateTable, TransportEngine, TransportRequest,
    TransportResult,
};
pub use communicator::{Communicator, SoloCommunicator};
pub use composition::{CompositionError, MaterialComposition};
pub use config::{DepletionConfig, StepType};
pub use context::{DepletionContext, Phase};
pub use coupling::{CoupledProgram, Uncoupled};
pub use error::ContractViolation;
pub use flux::{FLUX_DECIMALS, truncate_flux};
pub use fraction::{Fraction, FractionError};
pub use material::{Material, MaterialId};
pub use network::{NetworkBuilder, NetworkError, NuclideNetwork};
pub use nuclide::{Nuclide, NuclideData, NuclideId, Zai};
pub use observer::Observer;
pub use reaction::{Reaction, ReactionId, ReactionKind, TransmutationKind};
pub use sparse::{CscMatrix, SparseError, TripletBuilder};
pub use yields::{FissionYield, FissionYieldDistribution, YieldId};
