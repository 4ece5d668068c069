use serde::{Deserialize, Serialize};

use crate::{NuclideId, YieldId};

/// Lowest ENDF MT number treated as a transmutation channel.
///
/// Numbers below this are totals or scattering (elastic, inelastic sums)
/// that do not change the nuclide.
pub const FIRST_TRANSMUTATION_MT: u32 = 16;

/// How a transmutation reaction is tallied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransmutationKind {
    /// A physical channel that moves atoms to its target.
    Partial,
    /// A sum of other channels, kept for reporting only.
    Sum,
    /// A special tally (heating, damage) that does not transmute.
    Special,
}

/// The physical process behind a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactionKind {
    /// Radioactive decay.
    ///
    /// When any decay branch of a nuclide carries `isomeric_branch`, that
    /// branch removes the full decay rate from the parent and sibling
    /// branches only produce their targets.
    Decay { isomeric_branch: bool },
    /// Neutron-induced transmutation.
    Transmutation(TransmutationKind),
    /// Neutron-induced fission with explicit yields.
    InducedFission,
    /// Spontaneous fission, driven by the decay constant.
    SpontaneousFission,
    /// Precomputed total fission for nuclides without yield data.
    TotalFission,
}

impl ReactionKind {
    #[must_use]
    pub fn is_fission(self) -> bool {
        matches!(
            self,
            Self::InducedFission | Self::SpontaneousFission | Self::TotalFission
        )
    }

    #[must_use]
    pub fn is_decay(self) -> bool {
        matches!(self, Self::Decay { .. })
    }
}

/// Index of a reaction inside a [`NuclideNetwork`](crate::NuclideNetwork).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReactionId(pub(crate) usize);

impl ReactionId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A reaction channel of one parent nuclide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reaction {
    pub kind: ReactionKind,
    /// ENDF MT number (decay modes use their own numbering, e.g. 10004).
    pub mt: u32,
    pub branching_ratio: f64,
    /// Daughter nuclide; `None` routes the channel to the lost sink.
    pub target: Option<NuclideId>,
    /// Yield distribution for fission channels.
    pub yields: Option<YieldId>,
}

impl Reaction {
    /// A decay branch to `target` with the given branching ratio.
    #[must_use]
    pub fn decay(target: Option<NuclideId>, branching_ratio: f64) -> Self {
        Self {
            kind: ReactionKind::Decay {
                isomeric_branch: false,
            },
            mt: 10_000,
            branching_ratio,
            target,
            yields: None,
        }
    }

    /// A partial transmutation channel (e.g. MT 102 radiative capture).
    #[must_use]
    pub fn transmutation(mt: u32, target: Option<NuclideId>) -> Self {
        Self {
            kind: ReactionKind::Transmutation(TransmutationKind::Partial),
            mt,
            branching_ratio: 1.0,
            target,
            yields: None,
        }
    }

    /// Neutron-induced fission (MT 18). Yields default to the parent's.
    #[must_use]
    pub fn induced_fission() -> Self {
        Self {
            kind: ReactionKind::InducedFission,
            mt: 18,
            branching_ratio: 1.0,
            target: None,
            yields: None,
        }
    }

    /// Spontaneous fission. Yields default to the parent's.
    #[must_use]
    pub fn spontaneous_fission() -> Self {
        Self {
            kind: ReactionKind::SpontaneousFission,
            mt: 10_006,
            branching_ratio: 1.0,
            target: None,
            yields: None,
        }
    }

    /// Total fission routed to the lost sink.
    #[must_use]
    pub fn total_fission() -> Self {
        Self {
            kind: ReactionKind::TotalFission,
            mt: 18,
            branching_ratio: 1.0,
            target: None,
            yields: None,
        }
    }

    /// Returns the reaction with its isomeric-branch flag set (decay only).
    #[must_use]
    pub fn isomeric(mut self) -> Self {
        if let ReactionKind::Decay { .. } = self.kind {
            self.kind = ReactionKind::Decay {
                isomeric_branch: true,
            };
        }
        self
    }

    /// Returns the reaction with a different branching ratio.
    #[must_use]
    pub fn with_branching_ratio(mut self, branching_ratio: f64) -> Self {
        self.branching_ratio = branching_ratio;
        self
    }

    /// Returns the reaction with a different transmutation kind.
    #[must_use]
    pub fn with_transmutation_kind(mut self, kind: TransmutationKind) -> Self {
        if let ReactionKind::Transmutation(_) = self.kind {
            self.kind = ReactionKind::Transmutation(kind);
        }
        self
    }

    /// Returns `true` for partial transmutation channels at or above MT 16.
    #[must_use]
    pub fn is_transmutation_channel(&self) -> bool {
        self.kind == ReactionKind::Transmutation(TransmutationKind::Partial)
            && self.mt >= FIRST_TRANSMUTATION_MT
    }
}
