use std::io::Write;

use burnup_core::{DepletionContext, Material, NuclideNetwork};
use tracing::trace;

use super::{CheckpointError, Header, Record};

/// Appends depletion records to a binary checkpoint.
///
/// The header is written once, before the first record.
#[derive(Debug)]
pub struct CheckpointWriter<W: Write> {
    inner: W,
    header_written: bool,
    records: usize,
}

impl<W: Write> CheckpointWriter<W> {
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            header_written: false,
            records: 0,
        }
    }

    /// Records written so far.
    #[must_use]
    pub fn records(&self) -> usize {
        self.records
    }

    /// Writes one record for every burnable material.
    ///
    /// The material index stored in each record is the material's position
    /// in `materials`. Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or a count does not fit in `u32`.
    pub fn write_step(
        &mut self,
        network: &NuclideNetwork,
        context: &DepletionContext,
        materials: &[Material],
    ) -> Result<usize, CheckpointError> {
        if !self.header_written {
            let burnable = materials.iter().filter(|m| m.burnable).count();
            Header::from_network(network, burnable)?.write_to(&mut self.inner)?;
            self.header_written = true;
        }

        let mut written = 0;
        for (index, material) in materials.iter().enumerate() {
            if !material.burnable {
                continue;
            }
            Record::from_material(context, index, material)?.write_to(&mut self.inner)?;
            written += 1;
        }
        self.records += written;

        trace!(step = context.global_step, written, "wrote checkpoint records");
        Ok(written)
    }

    /// # Errors
    ///
    /// Returns an error if the underlying writer fails to flush.
    pub fn flush(&mut self) -> Result<(), CheckpointError> {
        self.inner.flush()?;
        Ok(())
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}
