//! Shared fixtures for the end-to-end depletion tests.
//!
//! [`Chain`] is a small uranium/plutonium network with a handful of fission
//! products, and [`PinEngine`] is a deterministic stand-in for the transport
//! engine: it spreads the requested power over the burnable materials in
//! proportion to their fission density and derives each material's flux
//! from it.

use burnup_core::{
    Material, MaterialComposition, MaterialId, NetworkBuilder, NuclideData, NuclideId,
    NuclideNetwork, Reaction, ReactionId, TransportEngine, TransportRequest, TransportResult, Zai,
    config::Normalization, units::BARN,
};
use thiserror::Error;

/// Energy released per fission (J).
pub const FISSION_ENERGY: f64 = 3.2e-11;

/// Nuclide and reaction handles of the test network.
#[derive(Debug, Clone)]
pub struct Chain {
    pub network: NuclideNetwork,
    pub u235: NuclideId,
    pub u238: NuclideId,
    pub u239: NuclideId,
    pub np239: NuclideId,
    pub pu239: NuclideId,
    pub cs137: NuclideId,
    pub sr90: NuclideId,
    /// Reactions the engine tallies, with their cross section (b).
    pub tallied: Vec<(ReactionId, f64)>,
    /// Fission reactions, used for power normalization.
    pub fissions: Vec<(NuclideId, ReactionId, f64)>,
}

fn heavy(z: u16, a: u16, weight: f64) -> NuclideData {
    NuclideData {
        atomic_weight: weight,
        ..NuclideData::stable(Zai::new(z, a, 0))
    }
}

impl Chain {
    /// Builds the network.
    ///
    /// # Panics
    ///
    /// Panics if the hard-coded network is rejected by the builder.
    #[must_use]
    pub fn new() -> Self {
        let mut b = NetworkBuilder::new();
        let u235 = b.add_nuclide(heavy(92, 235, 235.04)).unwrap();
        let u238 = b.add_nuclide(heavy(92, 238, 238.05)).unwrap();
        let u239 = b
            .add_nuclide(heavy(92, 239, 239.05).with_decay_constant(4.93e-4))
            .unwrap();
        let np239 = b
            .add_nuclide(heavy(93, 239, 239.05).with_decay_constant(3.41e-6))
            .unwrap();
        let pu239 = b.add_nuclide(heavy(94, 239, 239.05)).unwrap();
        let cs137 = b
            .add_nuclide(
                NuclideData::stable(Zai::new(55, 137, 0))
                    .with_decay_constant(7.30e-10)
                    .with_decay_heat(1.88e-13),
            )
            .unwrap();
        let ba137 = b
            .add_nuclide(NuclideData::stable(Zai::new(56, 137, 0)))
            .unwrap();
        let sr90 = b
            .add_nuclide(
                NuclideData::stable(Zai::new(38, 90, 0))
                    .with_decay_constant(7.63e-10)
                    .with_decay_heat(0.9e-13),
            )
            .unwrap();
        let y90 = b
            .add_nuclide(NuclideData::stable(Zai::new(39, 90, 0)))
            .unwrap();

        let products = [(cs137, 0.062), (sr90, 0.058)];
        b.add_yields(u235, products).unwrap();
        b.add_yields(pu239, [(cs137, 0.066), (sr90, 0.021)]).unwrap();

        let f235 = b.add_reaction(u235, Reaction::induced_fission()).unwrap();
        let f239 = b.add_reaction(pu239, Reaction::induced_fission()).unwrap();
        let capture = b
            .add_reaction(u238, Reaction::transmutation(102, Some(u239)))
            .unwrap();
        b.add_reaction(u239, Reaction::decay(Some(np239), 1.0))
            .unwrap();
        b.add_reaction(np239, Reaction::decay(Some(pu239), 1.0))
            .unwrap();
        b.add_reaction(cs137, Reaction::decay(Some(ba137), 1.0))
            .unwrap();
        b.add_reaction(sr90, Reaction::decay(Some(y90), 1.0)).unwrap();

        Self {
            network: b.build(),
            u235,
            u238,
            u239,
            np239,
            pu239,
            cs137,
            sr90,
            tallied: vec![(f235, 585.0), (f239, 748.0), (capture, 2.7)],
            fissions: vec![(u235, f235, 585.0), (pu239, f239, 748.0)],
        }
    }

    /// Fresh low-enriched fuel pins, owned round-robin by `workers` ranks.
    #[must_use]
    pub fn pins(&self, count: usize, workers: usize) -> Vec<Material> {
        (0..count)
            .map(|i| {
                let enrichment = 0.03 + 0.01 * i as f64;
                let composition: MaterialComposition = [
                    (self.u235, 2.2e-2 * enrichment),
                    (self.u238, 2.2e-2 * (1.0 - enrichment)),
                ]
                .into_iter()
                .collect();
                Material::new(MaterialId(i), format!("pin{i}"), 50.0)
                    .with_owner(i % workers.max(1))
                    .with_composition(composition)
            })
            .collect()
    }

    /// Macroscopic fission cross section times volume (cm²).
    ///
    /// Densities are per barn-cm and cross sections in barns, so the barns
    /// cancel.
    fn fission_weight(&self, material: &Material) -> f64 {
        self.fissions
            .iter()
            .map(|&(nuclide, _, sigma)| {
                material.composition.density(nuclide).unwrap_or(0.0) * sigma * material.volume
            })
            .sum()
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors raised by [`PinEngine`].
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("power {power} W requested but no burnable material can fission")]
    NoFissile { power: f64 },

    #[error("normalization {0:?} is not supported")]
    Unsupported(Normalization),
}

/// Deterministic transport stand-in for one worker.
///
/// By default it reports tallies only for the materials its rank owns, so
/// the scheduler's reduction yields the global tallies. A split engine
/// instead reports an equal share of every material's tallies, as a
/// domain-decomposed transport code would.
#[derive(Debug, Clone)]
pub struct PinEngine {
    chain: Chain,
    rank: usize,
    share: Option<f64>,
    /// Solves run so far.
    pub solves: usize,
}

impl PinEngine {
    #[must_use]
    pub fn new(chain: &Chain, rank: usize) -> Self {
        Self {
            chain: chain.clone(),
            rank,
            share: None,
            solves: 0,
        }
    }

    /// An engine whose rank reports `1 / workers` of every tally.
    #[must_use]
    pub fn split(chain: &Chain, rank: usize, workers: usize) -> Self {
        Self {
            share: Some(1.0 / workers.max(1) as f64),
            ..Self::new(chain, rank)
        }
    }
}

impl TransportEngine for PinEngine {
    type Error = EngineError;

    fn solve(
        &mut self,
        request: &TransportRequest,
        materials: &[Material],
    ) -> Result<TransportResult, Self::Error> {
        self.solves += 1;
        let Normalization::Power(power) = request.normalization else {
            return Err(EngineError::Unsupported(request.normalization));
        };

        let weights: Vec<f64> = materials
            .iter()
            .map(|m| {
                if m.burnable {
                    self.chain.fission_weight(m)
                } else {
                    0.0
                }
            })
            .collect();
        let total: f64 = weights.iter().sum();
        if power > 0.0 && total <= 0.0 {
            return Err(EngineError::NoFissile { power });
        }

        let mut result = TransportResult::zeros(materials.len());
        for (i, (material, &weight)) in materials.iter().zip(&weights).enumerate() {
            if weight <= 0.0 {
                continue;
            }
            for &(reaction, sigma) in &self.chain.tallied {
                result.rates.insert(material.id, reaction, sigma * BARN);
            }
            let fraction = match self.share {
                Some(fraction) => fraction,
                None if material.is_owned_by(self.rank) => 1.0,
                None => continue,
            };
            let share = power * weight / total;
            let fissions = share / FISSION_ENERGY;
            result.power[i] = fraction * share;
            result.fission_rate[i] = fraction * fissions;
            result.flux[i] = fraction * fissions / weight;
        }
        Ok(result)
    }
}
