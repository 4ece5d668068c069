use burnup_core::DepletionContext;

use crate::activity::DecayHeatFit;

/// Indicates how the history terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Ran every interval, including the final transport step.
    Complete,

    /// Stopped at a step boundary by the coupled program or an observer.
    StoppedByBreak,
}

/// Summary of one completed step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub interval: usize,
    /// Step index within the interval.
    pub step: usize,
    pub global_step: usize,
    /// Step length (s); zero for the final transport step.
    pub dt: f64,
    /// Total power (W) used to advance the step.
    pub power: f64,
    /// Cumulative burnup (MWd/kgHM) after the step.
    pub burnup: f64,
    /// Cumulative burn time (s) after the step.
    pub burn_time: f64,
    pub corrector_iterations: usize,
    /// Convergence of the self-iterating corrector, when it ran.
    pub converged: Option<bool>,
    /// Total decay heat (W) of the burnable materials after the step.
    pub decay_heat: f64,
    /// Total activity (Bq) of the burnable materials after the step.
    pub activity: f64,
    /// Decay-heat fit over the current run of decay or activation steps.
    pub decay_heat_fit: Option<DecayHeatFit>,
    /// `true` for the transport-only step that closes the history.
    pub transport_only: bool,
}

/// The result of a depletion run.
#[derive(Debug, Clone)]
pub struct Solution {
    /// How the history terminated.
    pub status: Status,

    /// Final scheduler position.
    pub context: DepletionContext,

    /// One record per completed step.
    pub history: Vec<StepRecord>,

    /// Number of steps completed.
    pub steps: usize,

    /// Total decay heat (W) at the end of the run.
    pub decay_heat: f64,

    /// Total activity (Bq) at the end of the run.
    pub activity: f64,
}
