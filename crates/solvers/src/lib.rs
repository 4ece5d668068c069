//! Numerical machinery of the burnup depletion core.
//!
//! - [`transmutation`] assembles the Bateman matrix of each material
//! - [`exponential`] is a reference solver for `dN/dt = A·N`
//! - [`merge`] reconciles compositions across workers after a step
//! - [`scheduler`] drives the predictor–corrector burnup history
//!
//! Supporting modules cover continuous reprocessing, step sizing,
//! activities and decay heat, the checkpoint file, and an in-process
//! worker group for running several workers on threads.

pub mod activity;
pub mod checkpoint;
pub mod exponential;
pub mod merge;
pub mod reprocessing;
pub mod scheduler;
pub mod step_size;
pub mod thread_group;
pub mod transmutation;
