//! Continuous reprocessing: per-element removal from burnable materials.
//!
//! A mass flow removes every isotope of one element from one material at a
//! constant rate. The removed atoms go to the network's lost sink, so the
//! matrix column of a removed nuclide stays conservative.

use std::collections::HashMap;

use burnup_core::{
    Material, MaterialId, NuclideNetwork,
    config::{ConfigError, Interval},
};
use tracing::debug;

/// Removal constants (s⁻¹) by material and element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reprocessing {
    removal: HashMap<MaterialId, HashMap<u16, f64>>,
}

impl Reprocessing {
    /// No reprocessing at all.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Checks that every mass flow of every interval names a material.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownMaterial`] for the first flow, in
    /// interval order, whose material does not exist.
    pub fn check_materials(
        intervals: &[Interval],
        materials: &[Material],
    ) -> Result<(), ConfigError> {
        intervals
            .iter()
            .flat_map(|interval| &interval.mass_flows)
            .find(|flow| !materials.iter().any(|m| m.name == flow.material))
            .map_or(Ok(()), |flow| {
                Err(ConfigError::UnknownMaterial(flow.material.clone()))
            })
    }

    /// Installs the mass flows of an interval.
    ///
    /// Every material with an active flow gets the lost sink added to its
    /// composition, so the removal term has a row to land in. Flows on the
    /// same element of the same material add up.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownMaterial`] if a flow names a material
    /// that does not exist.
    pub fn install(
        interval: &Interval,
        network: &NuclideNetwork,
        materials: &mut [Material],
    ) -> Result<Self, ConfigError> {
        let mut removal: HashMap<MaterialId, HashMap<u16, f64>> = HashMap::new();

        for flow in &interval.mass_flows {
            let material = materials
                .iter_mut()
                .find(|m| m.name == flow.material)
                .ok_or_else(|| ConfigError::UnknownMaterial(flow.material.clone()))?;

            if flow.removal_constant > 0.0 {
                *removal
                    .entry(material.id)
                    .or_default()
                    .entry(flow.element)
                    .or_insert(0.0) += flow.removal_constant;
                material.composition.ensure(network.lost());
            }
        }

        debug!(materials = removal.len(), "installed mass flows");
        Ok(Self { removal })
    }

    /// Removal constant of element `z` in `material`, zero if none.
    #[must_use]
    pub fn removal_constant(&self, material: MaterialId, z: u16) -> f64 {
        self.removal
            .get(&material)
            .and_then(|elements| elements.get(&z))
            .copied()
            .unwrap_or(0.0)
    }

    /// Returns `true` if `material` has any active flow.
    #[must_use]
    pub fn applies_to(&self, material: MaterialId) -> bool {
        self.removal.contains_key(&material)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removal.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use burnup_core::{
        NetworkBuilder, NuclideData, Zai,
        config::{IntervalSpan, MassFlow, Normalization, StepType},
    };

    use super::*;

    fn interval(flows: Vec<MassFlow>) -> Interval {
        Interval {
            step_type: StepType::Burnup,
            span: IntervalSpan::Days(1.0),
            steps: 1,
            normalization: Normalization::Power(1.0),
            mass_flows: flows,
        }
    }

    fn flow(material: &str, element: u16, k: f64) -> MassFlow {
        MassFlow {
            material: material.to_owned(),
            element,
            removal_constant: k,
        }
    }

    #[test]
    fn flows_accumulate_and_add_the_lost_sink() {
        let mut builder = NetworkBuilder::new();
        let xe = builder
            .add_nuclide(NuclideData::stable(Zai::new(54, 135, 0)))
            .unwrap();
        let network = builder.build();

        let mut materials = vec![
            Material::new(MaterialId(0), "fuel", 1.0)
                .with_composition([(xe, 1.0e-6)].into_iter().collect()),
            Material::new(MaterialId(1), "clad", 1.0),
        ];

        let plan = Reprocessing::install(
            &interval(vec![flow("fuel", 54, 1.0e-5), flow("fuel", 54, 2.0e-5)]),
            &network,
            &mut materials,
        )
        .unwrap();

        assert_eq!(plan.removal_constant(MaterialId(0), 54), 3.0e-5);
        assert_eq!(plan.removal_constant(MaterialId(0), 36), 0.0);
        assert!(!plan.applies_to(MaterialId(1)));
        assert!(materials[0].composition.contains(network.lost()));
        assert!(!materials[1].composition.contains(network.lost()));
    }

    #[test]
    fn check_covers_every_interval() {
        let materials = vec![Material::new(MaterialId(0), "fuel", 1.0)];
        let intervals = [
            interval(vec![flow("fuel", 54, 1.0e-5)]),
            interval(vec![flow("blanket", 92, 1.0e-6)]),
        ];

        assert!(Reprocessing::check_materials(&intervals[..1], &materials).is_ok());
        assert!(matches!(
            Reprocessing::check_materials(&intervals, &materials),
            Err(ConfigError::UnknownMaterial(name)) if name == "blanket"
        ));
    }

    #[test]
    fn unknown_material_is_a_config_error() {
        let network = NetworkBuilder::new().build();
        let mut materials = vec![Material::new(MaterialId(0), "fuel", 1.0)];

        let result = Reprocessing::install(
            &interval(vec![flow("moderator", 1, 1.0)]),
            &network,
            &mut materials,
        );
        assert!(matches!(result, Err(ConfigError::UnknownMaterial(name)) if name == "moderator"));
    }
}
