//! Activities, decay heat, and the decay-heat fit of decay intervals.

use burnup_core::{Material, NuclideId, NuclideNetwork, units::BARN};

/// Activity (Bq) of every radioactive nuclide in a material.
///
/// Stable nuclides and nuclides with zero density are left out.
#[must_use]
pub fn activities(network: &NuclideNetwork, material: &Material) -> Vec<(NuclideId, f64)> {
    material
        .composition
        .iter()
        .filter_map(|(id, density)| {
            let lambda = network.nuclide(id).decay_constant();
            let activity = lambda * atoms(density, material.volume);
            (activity > 0.0).then_some((id, activity))
        })
        .collect()
}

/// Total activity (Bq) of a material.
#[must_use]
pub fn total_activity(network: &NuclideNetwork, material: &Material) -> f64 {
    activities(network, material).iter().map(|(_, a)| a).sum()
}

/// Decay heat (W) of a material.
#[must_use]
pub fn decay_heat(network: &NuclideNetwork, material: &Material) -> f64 {
    material
        .composition
        .iter()
        .map(|(id, density)| network.nuclide(id).decay_heat_rate() * atoms(density, material.volume))
        .sum()
}

/// Atoms of a nuclide at `density` atoms/(b·cm) in `volume` cm³.
fn atoms(density: f64, volume: f64) -> f64 {
    density / BARN * volume
}

/// Single-exponential decay-heat curve `H(t) = amplitude · exp(−rate · t)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayHeatFit {
    /// Decay heat (W) at `t = 0`.
    pub amplitude: f64,
    /// Effective decay constant (s⁻¹).
    pub rate: f64,
}

impl DecayHeatFit {
    /// Decay heat (W) at burn time `t` (s).
    #[must_use]
    pub fn at(&self, t: f64) -> f64 {
        self.amplitude * (-self.rate * t).exp()
    }
}

/// Least-squares fit of `ln H` against `t` over the positive points.
///
/// Returns `None` with fewer than two usable points or when every point has
/// the same time.
#[must_use]
pub fn fit_decay_heat(points: &[(f64, f64)]) -> Option<DecayHeatFit> {
    let usable: Vec<(f64, f64)> = points
        .iter()
        .filter(|(t, h)| t.is_finite() && *h > 0.0 && h.is_finite())
        .map(|&(t, h)| (t, h.ln()))
        .collect();
    if usable.len() < 2 {
        return None;
    }

    let n = usable.len() as f64;
    let mean_t = usable.iter().map(|(t, _)| t).sum::<f64>() / n;
    let mean_y = usable.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (sxy, sxx) = usable.iter().fold((0.0, 0.0), |(sxy, sxx), (t, y)| {
        let dt = t - mean_t;
        (sxy + dt * (y - mean_y), sxx + dt * dt)
    });
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    Some(DecayHeatFit {
        amplitude: (mean_y - slope * mean_t).exp(),
        rate: -slope,
    })
}
