use burnup_core::{
    DepletionContext, Material, NuclideNetwork, Observer, StepType, TransportResult,
};

use crate::{activity, step_size::PowerHistory};

use super::{Action, Event, StepRecord};

/// Beginning-of-step state of one material.
#[derive(Debug, Clone)]
pub(super) struct Snapshot {
    pub densities: Vec<f64>,
    pub burnup: f64,
    /// Heavy-metal mass (kg).
    pub heavy_metal: f64,
}

impl Snapshot {
    pub fn take(network: &NuclideNetwork, materials: &[Material]) -> Vec<Self> {
        materials
            .iter()
            .map(|m| Self {
                densities: m.composition.densities().to_vec(),
                burnup: m.burnup,
                heavy_metal: m.heavy_metal_mass(network),
            })
            .collect()
    }
}

/// Mutable bookkeeping of one run.
#[derive(Debug)]
pub(super) struct RunState {
    pub context: DepletionContext,
    pub history: Vec<StepRecord>,
    pub power_history: PowerHistory,
    /// Tallies of the latest transport solve, reused by activation steps.
    pub last_transport: Option<TransportResult>,
    /// (burn time, decay heat) over the current run of decay steps.
    pub decay_heat_points: Vec<(f64, f64)>,
    pub break_requested: bool,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            context: DepletionContext::new(),
            history: Vec::new(),
            power_history: PowerHistory::new(),
            last_transport: None,
            decay_heat_points: Vec::new(),
            break_requested: false,
        }
    }

    /// Delivers an event; a break request is honoured at the next boundary.
    pub fn emit<O>(&mut self, observer: &mut O, event: Event)
    where
        O: Observer<Event, Action>,
    {
        if let Some(Action::Break) = observer.observe(&event) {
            self.break_requested = true;
        }
    }

    /// Tallies used by steps that skip transport.
    pub fn frozen_tallies(&self, step_type: StepType, materials: usize) -> TransportResult {
        match step_type {
            StepType::ActivationStep | StepType::ActivationTotal => self
                .last_transport
                .clone()
                .unwrap_or_else(|| TransportResult::zeros(materials)),
            StepType::DecayStep | StepType::DecayTotal | StepType::Burnup => {
                TransportResult::zeros(materials)
            }
        }
    }
}

/// Total (decay heat W, activity Bq) of the burnable materials.
pub(super) fn decay_totals(network: &NuclideNetwork, materials: &[Material]) -> (f64, f64) {
    materials
        .iter()
        .filter(|m| m.burnable)
        .fold((0.0, 0.0), |(heat, act), m| {
            (
                heat + activity::decay_heat(network, m),
                act + activity::total_activity(network, m),
            )
        })
}

/// Largest relative change of a burnable material's nonzero density.
pub(super) fn max_relative_change(previous: &[Vec<f64>], materials: &[Material]) -> f64 {
    previous
        .iter()
        .zip(materials)
        .filter(|(_, m)| m.burnable)
        .flat_map(|(old, m)| old.iter().zip(m.composition.densities()))
        .filter(|&(&old, _)| old > 0.0)
        .map(|(&old, &new)| (new - old).abs() / old)
        .fold(0.0, f64::max)
}
