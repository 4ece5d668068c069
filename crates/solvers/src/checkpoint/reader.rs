use std::io::{ErrorKind, Read};

use super::{CheckpointError, Header, HeaderNuclide, Record};

/// Reads a checkpoint written by [`CheckpointWriter`](super::CheckpointWriter).
#[derive(Debug)]
pub struct CheckpointReader<R: Read> {
    inner: R,
}

impl<R: Read> CheckpointReader<R> {
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Reads the header; call once, before any record.
    ///
    /// # Errors
    ///
    /// Returns an error if the input ends early or cannot be read.
    pub fn read_header(&mut self) -> Result<Header, CheckpointError> {
        let materials = self.u32()?;
        let count = self.u32()?;
        let mut nuclides = Vec::with_capacity(count as usize);
        for _ in 0..count {
            nuclides.push(HeaderNuclide {
                zai: self.u32()?,
                z: self.u32()?,
                atomic_weight: self.f64()?,
                decay_constant: self.f64()?,
                decay_heat_rate: self.f64()?,
                spontaneous_fission_rate: self.f64()?,
                photon_emission_rate: self.f64()?,
                ingestion_toxicity: self.f64()?,
                inhalation_toxicity: self.f64()?,
            });
        }
        Ok(Header {
            materials,
            nuclides,
        })
    }

    /// Reads the next record, or `None` at a clean end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input ends inside a record, the trailing step
    /// does not match, or the name is not UTF-8.
    pub fn next_record(&mut self) -> Result<Option<Record>, CheckpointError> {
        let mut first = [0u8; 8];
        if !self.fill_or_eof(&mut first)? {
            return Ok(None);
        }

        let burnup = f64::from_le_bytes(first);
        let burnup_days = self.f64()?;
        let burn_time = self.f64()?;
        let count = self.u32()?;
        let volume = self.f64()?;
        let material_burnup = self.f64()?;
        let name_len = self.u32()?;
        let mut name = vec![0u8; name_len as usize];
        self.exact(&mut name)?;
        let name = String::from_utf8(name)?;
        let material = self.u32()?;
        let step = self.u32()?;

        let mut densities = Vec::with_capacity(count as usize);
        for _ in 0..count {
            densities.push((self.u32()?, self.f64()?));
        }

        let trailing = self.u32()?;
        if trailing != step {
            return Err(CheckpointError::StepMismatch {
                leading: step,
                trailing,
            });
        }

        Ok(Some(Record {
            burnup,
            burnup_days,
            burn_time,
            volume,
            material_burnup,
            name,
            material,
            step,
            densities,
        }))
    }

    /// Reads every remaining record.
    ///
    /// # Errors
    ///
    /// Returns the first error met.
    pub fn records(&mut self) -> Result<Vec<Record>, CheckpointError> {
        let mut out = Vec::new();
        while let Some(record) = self.next_record()? {
            out.push(record);
        }
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32, CheckpointError> {
        let mut buf = [0u8; 4];
        self.exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn f64(&mut self) -> Result<f64, CheckpointError> {
        let mut buf = [0u8; 8];
        self.exact(&mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    fn exact(&mut self, buf: &mut [u8]) -> Result<(), CheckpointError> {
        self.inner.read_exact(buf).map_err(|err| match err.kind() {
            ErrorKind::UnexpectedEof => CheckpointError::Truncated,
            _ => CheckpointError::Io(err),
        })
    }

    /// Fills `buf`, or returns `false` if the input ends before any byte.
    fn fill_or_eof(&mut self, buf: &mut [u8]) -> Result<bool, CheckpointError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(false),
                Ok(0) => return Err(CheckpointError::Truncated),
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(true)
    }
}
