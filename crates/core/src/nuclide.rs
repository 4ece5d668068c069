use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ReactionId, YieldId};

/// Nuclide identity: atomic number, mass number, and isomeric state.
///
/// The packed ZAI code is `10000 * Z + 10 * A + I`, so U-235 is `922350` and
/// Am-242m is `952421`. The zero code is reserved for the lost sink.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Zai {
    z: u16,
    a: u16,
    i: u8,
}

impl Zai {
    /// Identity of the sink that absorbs removed atoms.
    pub const LOST: Zai = Zai { z: 0, a: 0, i: 0 };

    #[must_use]
    pub const fn new(z: u16, a: u16, i: u8) -> Self {
        Self { z, a, i }
    }

    /// Unpacks a ZAI code.
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        Self {
            z: (code / 10_000) as u16,
            a: ((code % 10_000) / 10) as u16,
            i: (code % 10) as u8,
        }
    }

    #[must_use]
    pub const fn code(self) -> u32 {
        self.z as u32 * 10_000 + self.a as u32 * 10 + self.i as u32
    }

    #[must_use]
    pub const fn z(self) -> u16 {
        self.z
    }

    #[must_use]
    pub const fn a(self) -> u16 {
        self.a
    }

    #[must_use]
    pub const fn isomeric_state(self) -> u8 {
        self.i
    }

    /// Returns `true` for actinides (Z ≥ 90), which count toward heavy metal.
    #[must_use]
    pub const fn is_heavy_metal(self) -> bool {
        self.z >= 90
    }
}

impl fmt::Display for Zai {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::LOST {
            return f.write_str("lost");
        }
        write!(f, "{}", self.code())
    }
}

/// Index of a nuclide inside a [`NuclideNetwork`](crate::NuclideNetwork).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NuclideId(pub(crate) usize);

impl NuclideId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Per-nuclide data supplied when building a network.
///
/// Decay data are per atom: `decay_heat` is the energy released per decay
/// (J), `photon_yield` the photons emitted per decay, and `sf_fraction` the
/// share of decays that are spontaneous fissions. Toxicities are dose
/// coefficients in Sv/Bq.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NuclideData {
    pub zai: Zai,
    pub atomic_weight: f64,
    pub decay_constant: f64,
    #[serde(default)]
    pub decay_heat: f64,
    #[serde(default)]
    pub photon_yield: f64,
    #[serde(default)]
    pub sf_fraction: f64,
    #[serde(default)]
    pub ingestion_toxicity: f64,
    #[serde(default)]
    pub inhalation_toxicity: f64,
}

impl NuclideData {
    /// Creates data for a stable nuclide whose atomic weight is its mass number.
    #[must_use]
    pub fn stable(zai: Zai) -> Self {
        Self {
            zai,
            atomic_weight: f64::from(zai.a()),
            ..Self::default()
        }
    }

    /// Returns the data with the given decay constant (s⁻¹).
    #[must_use]
    pub fn with_decay_constant(mut self, decay_constant: f64) -> Self {
        self.decay_constant = decay_constant;
        self
    }

    /// Returns the data with the given decay heat per decay (J).
    #[must_use]
    pub fn with_decay_heat(mut self, decay_heat: f64) -> Self {
        self.decay_heat = decay_heat;
        self
    }

    /// Returns the data with the given spontaneous-fission share of decays.
    #[must_use]
    pub fn with_sf_fraction(mut self, sf_fraction: f64) -> Self {
        self.sf_fraction = sf_fraction;
        self
    }
}

/// A nuclide in the network, with its ordered reaction list.
#[derive(Debug, Clone, PartialEq)]
pub struct Nuclide {
    pub(crate) data: NuclideData,
    pub(crate) reactions: Vec<ReactionId>,
    pub(crate) fission_yield: Option<YieldId>,
}

impl Nuclide {
    #[must_use]
    pub fn zai(&self) -> Zai {
        self.data.zai
    }

    #[must_use]
    pub fn data(&self) -> &NuclideData {
        &self.data
    }

    #[must_use]
    pub fn atomic_weight(&self) -> f64 {
        self.data.atomic_weight
    }

    /// Total decay constant λ (s⁻¹).
    #[must_use]
    pub fn decay_constant(&self) -> f64 {
        self.data.decay_constant
    }

    /// Reactions in the order they were added.
    #[must_use]
    pub fn reactions(&self) -> &[ReactionId] {
        &self.reactions
    }

    /// Explicit fission-yield data, if the nuclide is fissionable.
    #[must_use]
    pub fn fission_yield(&self) -> Option<YieldId> {
        self.fission_yield
    }

    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.data.decay_constant == 0.0
    }

    /// Decay heat per atom (W).
    #[must_use]
    pub fn decay_heat_rate(&self) -> f64 {
        self.data.decay_constant * self.data.decay_heat
    }

    /// Spontaneous fissions per atom per second.
    #[must_use]
    pub fn spontaneous_fission_rate(&self) -> f64 {
        self.data.decay_constant * self.data.sf_fraction
    }

    /// Photons emitted per atom per second.
    #[must_use]
    pub fn photon_emission_rate(&self) -> f64 {
        self.data.decay_constant * self.data.photon_yield
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zai_code_round_trips() {
        let am242m = Zai::new(95, 242, 1);
        assert_eq!(am242m.code(), 952_421);
        assert_eq!(Zai::from_code(952_421), am242m);
        assert_eq!(Zai::from_code(922_350), Zai::new(92, 235, 0));
    }

    #[test]
    fn lost_sink_displays_by_name() {
        assert_eq!(Zai::LOST.to_string(), "lost");
        assert_eq!(Zai::new(54, 135, 0).to_string(), "541350");
    }

    #[test]
    fn heavy_metal_starts_at_thorium() {
        assert!(Zai::new(90, 232, 0).is_heavy_metal());
        assert!(!Zai::new(89, 227, 0).is_heavy_metal());
    }
}
