use crate::{Fraction, NuclideId};

/// Index of a yield distribution inside a
/// [`NuclideNetwork`](crate::NuclideNetwork).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YieldId(pub(crate) usize);

impl YieldId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One fission product and its independent yield.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FissionYield {
    pub product: NuclideId,
    pub fraction: Fraction,
}

/// Ordered independent fission yields of one fissionable nuclide.
///
/// Fractions are per fission, so a distribution usually sums to about two.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FissionYieldDistribution {
    entries: Vec<FissionYield>,
}

impl FissionYieldDistribution {
    #[must_use]
    pub fn new(entries: Vec<FissionYield>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FissionYield> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all fractions (fission products per fission).
    #[must_use]
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|y| y.fraction.get()).sum()
    }
}
