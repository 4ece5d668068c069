//! Binary checkpoint of the depletion history.
//!
//! All values are little-endian. A file is one header followed by any
//! number of records, one per (step, burnable material):
//!
//! ```text
//! header:  materials u32, nuclides u32,
//!          nuclides × (zai u32, z u32, atomic weight f64, decay constant f64,
//!                      decay heat rate f64, spontaneous fission rate f64,
//!                      photon emission rate f64, ingestion toxicity f64,
//!                      inhalation toxicity f64)
//! record:  burnup f64, burn days f64, burn time f64, nonzero count u32,
//!          volume f64, material burnup f64, name length u32, name bytes,
//!          material index u32, step u32,
//!          count × (nuclide index u32, density f64),
//!          step u32
//! ```
//!
//! Per-atom rates in the header are per second; nuclide indices in records
//! are network indices.

mod error;
mod reader;
mod writer;

pub use error::CheckpointError;
pub use reader::CheckpointReader;
pub use writer::CheckpointWriter;

use std::io::Write;

use burnup_core::{DepletionContext, Material, NuclideNetwork, units::SECONDS_PER_DAY};

/// Decay data of one network nuclide as stored in the header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderNuclide {
    pub zai: u32,
    pub z: u32,
    pub atomic_weight: f64,
    pub decay_constant: f64,
    pub decay_heat_rate: f64,
    pub spontaneous_fission_rate: f64,
    pub photon_emission_rate: f64,
    pub ingestion_toxicity: f64,
    pub inhalation_toxicity: f64,
}

/// The checkpoint header.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Materials with a record per step.
    pub materials: u32,
    /// Every network nuclide, in network order.
    pub nuclides: Vec<HeaderNuclide>,
}

impl Header {
    /// # Errors
    ///
    /// Returns [`CheckpointError::TooLarge`] if a count does not fit in `u32`.
    pub fn from_network(network: &NuclideNetwork, materials: usize) -> Result<Self, CheckpointError> {
        let nuclides = network
            .nuclides()
            .map(|(_, nuclide)| {
                let data = nuclide.data();
                HeaderNuclide {
                    zai: nuclide.zai().code(),
                    z: u32::from(nuclide.zai().z()),
                    atomic_weight: data.atomic_weight,
                    decay_constant: data.decay_constant,
                    decay_heat_rate: nuclide.decay_heat_rate(),
                    spontaneous_fission_rate: nuclide.spontaneous_fission_rate(),
                    photon_emission_rate: nuclide.photon_emission_rate(),
                    ingestion_toxicity: data.ingestion_toxicity,
                    inhalation_toxicity: data.inhalation_toxicity,
                }
            })
            .collect();
        Ok(Self {
            materials: to_u32("material count", materials)?,
            nuclides,
        })
    }

    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<(), CheckpointError> {
        out.write_all(&self.materials.to_le_bytes())?;
        out.write_all(&to_u32("nuclide count", self.nuclides.len())?.to_le_bytes())?;
        for n in &self.nuclides {
            out.write_all(&n.zai.to_le_bytes())?;
            out.write_all(&n.z.to_le_bytes())?;
            for value in [
                n.atomic_weight,
                n.decay_constant,
                n.decay_heat_rate,
                n.spontaneous_fission_rate,
                n.photon_emission_rate,
                n.ingestion_toxicity,
                n.inhalation_toxicity,
            ] {
                out.write_all(&value.to_le_bytes())?;
            }
        }
        Ok(())
    }
}

/// State of one material at one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Cumulative burnup of the history (MWd/kgHM).
    pub burnup: f64,
    /// Cumulative burn time in days.
    pub burnup_days: f64,
    /// Cumulative burn time (s).
    pub burn_time: f64,
    /// Volume (cm³).
    pub volume: f64,
    /// Burnup of this material (MWd/kgHM).
    pub material_burnup: f64,
    pub name: String,
    pub material: u32,
    pub step: u32,
    /// Nonzero densities as (network index, atoms/(b·cm)).
    pub densities: Vec<(u32, f64)>,
}

impl Record {
    /// # Errors
    ///
    /// Returns [`CheckpointError::TooLarge`] if an index does not fit in
    /// `u32`.
    pub fn from_material(
        context: &DepletionContext,
        index: usize,
        material: &Material,
    ) -> Result<Self, CheckpointError> {
        let densities = material
            .composition
            .iter()
            .filter(|&(_, density)| density != 0.0)
            .map(|(id, density)| Ok((to_u32("nuclide index", id.index())?, density)))
            .collect::<Result<Vec<_>, CheckpointError>>()?;

        Ok(Self {
            burnup: context.burnup,
            burnup_days: context.burn_time / SECONDS_PER_DAY,
            burn_time: context.burn_time,
            volume: material.volume,
            material_burnup: material.burnup,
            name: material.name.clone(),
            material: to_u32("material index", index)?,
            step: to_u32("step", context.global_step)?,
            densities,
        })
    }

    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<(), CheckpointError> {
        out.write_all(&self.burnup.to_le_bytes())?;
        out.write_all(&self.burnup_days.to_le_bytes())?;
        out.write_all(&self.burn_time.to_le_bytes())?;
        out.write_all(&to_u32("nonzero count", self.densities.len())?.to_le_bytes())?;
        out.write_all(&self.volume.to_le_bytes())?;
        out.write_all(&self.material_burnup.to_le_bytes())?;
        out.write_all(&to_u32("name length", self.name.len())?.to_le_bytes())?;
        out.write_all(self.name.as_bytes())?;
        out.write_all(&self.material.to_le_bytes())?;
        out.write_all(&self.step.to_le_bytes())?;
        for &(nuclide, density) in &self.densities {
            out.write_all(&nuclide.to_le_bytes())?;
            out.write_all(&density.to_le_bytes())?;
        }
        out.write_all(&self.step.to_le_bytes())?;
        Ok(())
    }
}

fn to_u32(what: &'static str, value: usize) -> Result<u32, CheckpointError> {
    u32::try_from(value).map_err(|_| CheckpointError::TooLarge { what, value })
}

#[cfg(test)]
mod tests {
    use burnup_core::{MaterialComposition, MaterialId, NetworkBuilder, NuclideData, Zai};

    use super::*;

    fn setup() -> (NuclideNetwork, Vec<Material>) {
        let mut builder = NetworkBuilder::new();
        let u = builder
            .add_nuclide(NuclideData::stable(Zai::new(92, 238, 0)).with_decay_constant(4.9e-18))
            .unwrap();
        let pu = builder
            .add_nuclide(NuclideData::stable(Zai::new(94, 239, 0)))
            .unwrap();
        let network = builder.build();

        let fuel: MaterialComposition = [(u, 2.2e-2), (pu, 0.0)].into_iter().collect();
        let mut clad = Material::new(MaterialId(1), "clad", 3.0);
        clad.burnable = false;
        let materials = vec![
            Material::new(MaterialId(0), "fuel", 12.5).with_composition(fuel),
            clad,
        ];
        (network, materials)
    }

    #[test]
    fn header_then_records() {
        let (network, materials) = setup();
        let mut ctx = DepletionContext::new();

        let mut writer = CheckpointWriter::new(Vec::new());
        assert_eq!(writer.write_step(&network, &ctx, &materials).unwrap(), 1);
        ctx.advance(1.0, 10.0, 2.0 * SECONDS_PER_DAY);
        writer.write_step(&network, &ctx, &materials).unwrap();
        assert_eq!(writer.records(), 2);

        let bytes = writer.into_inner();
        let mut reader = CheckpointReader::new(bytes.as_slice());
        let header = reader.read_header().unwrap();
        assert_eq!(header.materials, 1);
        assert_eq!(header.nuclides.len(), network.len());
        assert_eq!(header.nuclides[1].zai, 922_380);
        assert_eq!(header.nuclides[1].z, 92);

        let records = reader.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "fuel");
        assert_eq!(records[0].densities, vec![(1, 2.2e-2)]);
        assert_eq!(records[1].step, 1);
        assert_eq!(records[1].burnup_days, 2.0);
        assert_eq!(records[1].burnup, 1.0);
    }

    #[test]
    fn truncated_record_is_an_error() {
        let (network, materials) = setup();
        let mut writer = CheckpointWriter::new(Vec::new());
        writer
            .write_step(&network, &DepletionContext::new(), &materials)
            .unwrap();
        let mut bytes = writer.into_inner();
        bytes.truncate(bytes.len() - 3);

        let mut reader = CheckpointReader::new(bytes.as_slice());
        reader.read_header().unwrap();
        assert!(matches!(
            reader.next_record(),
            Err(CheckpointError::Truncated)
        ));
    }

    #[test]
    fn trailing_step_must_match() {
        let record = Record {
            burnup: 0.0,
            burnup_days: 0.0,
            burn_time: 0.0,
            volume: 1.0,
            material_burnup: 0.0,
            name: "x".to_owned(),
            material: 0,
            step: 7,
            densities: Vec::new(),
        };
        let mut bytes = Vec::new();
        record.write_to(&mut bytes).unwrap();
        let end = bytes.len();
        bytes[end - 4..].copy_from_slice(&8u32.to_le_bytes());

        let mut reader = CheckpointReader::new(bytes.as_slice());
        assert!(matches!(
            reader.next_record(),
            Err(CheckpointError::StepMismatch {
                leading: 7,
                trailing: 8
            })
        ));
    }
}
