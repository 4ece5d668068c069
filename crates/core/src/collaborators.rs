use std::collections::HashMap;

use crate::{
    CscMatrix, DepletionContext, Material, MaterialId, ReactionId,
    config::{Normalization, Population},
};

/// Boxed error from an external collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Source of microscopic reaction rates.
///
/// Returned rates are already normalized so that multiplying by the scalar
/// flux gives reactions per atom per second.
pub trait ReactionRates {
    fn rate(&self, reaction: ReactionId, material: MaterialId, time: f64) -> f64;
}

impl<F> ReactionRates for F
where
    F: Fn(ReactionId, MaterialId, f64) -> f64,
{
    fn rate(&self, reaction: ReactionId, material: MaterialId, time: f64) -> f64 {
        self(reaction, material, time)
    }
}

/// Reaction rates tallied by one transport solve.
///
/// Rates are a snapshot, so the lookup ignores time. Missing entries are
/// zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<(MaterialId, ReactionId), f64>,
}

impl RateTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, material: MaterialId, reaction: ReactionId, rate: f64) {
        self.rates.insert((material, reaction), rate);
    }

    #[must_use]
    pub fn get(&self, material: MaterialId, reaction: ReactionId) -> f64 {
        self.rates
            .get(&(material, reaction))
            .copied()
            .unwrap_or(0.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Entry-wise mean of two tables.
    #[must_use]
    pub fn average(&self, other: &Self) -> Self {
        let mut rates = HashMap::with_capacity(self.rates.len().max(other.rates.len()));
        for key in self.rates.keys().chain(other.rates.keys()) {
            rates
                .entry(*key)
                .or_insert_with(|| 0.5 * (self.get(key.0, key.1) + other.get(key.0, key.1)));
        }
        Self { rates }
    }
}

impl ReactionRates for RateTable {
    fn rate(&self, reaction: ReactionId, material: MaterialId, _time: f64) -> f64 {
        self.get(material, reaction)
    }
}

/// What the scheduler asks of one transport solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportRequest {
    pub context: DepletionContext,
    pub normalization: Normalization,
    /// Neutron population; the corrector may use a different one.
    pub population: Population,
    /// Burn time (s) at which the solve is made.
    pub time: f64,
}

/// Tallies returned by one transport solve on one worker.
///
/// The per-material vectors are this worker's partial tallies, aligned with
/// the material list passed to the engine. The scheduler sum-reduces them
/// across workers before use. `rates` are already global.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportResult {
    /// Scalar flux (n/cm²/s).
    pub flux: Vec<f64>,
    /// Deposited power (W).
    pub power: Vec<f64>,
    /// Fissions per second.
    pub fission_rate: Vec<f64>,
    pub rates: RateTable,
}

impl TransportResult {
    /// An all-zero result for `materials` materials.
    #[must_use]
    pub fn zeros(materials: usize) -> Self {
        Self {
            flux: vec![0.0; materials],
            power: vec![0.0; materials],
            fission_rate: vec![0.0; materials],
            rates: RateTable::new(),
        }
    }

    /// Entry-wise mean of two results, used to form corrector rates.
    #[must_use]
    pub fn average(&self, other: &Self) -> Self {
        let mean = |a: &[f64], b: &[f64]| -> Vec<f64> {
            a.iter().zip(b).map(|(x, y)| 0.5 * (x + y)).collect()
        };
        Self {
            flux: mean(&self.flux, &other.flux),
            power: mean(&self.power, &other.power),
            fission_rate: mean(&self.fission_rate, &other.fission_rate),
            rates: self.rates.average(&other.rates),
        }
    }

    /// Total power over all materials (W).
    #[must_use]
    pub fn total_power(&self) -> f64 {
        self.power.iter().sum()
    }
}

/// The Monte Carlo transport engine.
pub trait TransportEngine {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs one transport solve over the given materials.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the solve fails.
    fn solve(
        &mut self,
        request: &TransportRequest,
        materials: &[Material],
    ) -> Result<TransportResult, Self::Error>;
}

/// Solves `dN/dt = A·N` over one step.
pub trait DepletionSolver {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the densities after `dt` seconds, starting from `initial`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the solve fails.
    fn solve(&self, matrix: &CscMatrix, initial: &[f64], dt: f64) -> Result<Vec<f64>, Self::Error>;
}
