//! The nuclide/reaction/yield network.
//!
//! Records are stored in owned vectors and addressed by index newtypes
//! ([`NuclideId`], [`ReactionId`], [`YieldId`]), so insertion order is the
//! iteration order and a nuclide's reactions are walked as a slice.
//!
//! A network is assembled with [`NetworkBuilder`], which checks every
//! reference before handing out an immutable [`NuclideNetwork`]. Once built,
//! the network is shared read-only by every thread and worker of a run.

use std::collections::HashMap;

use thiserror::Error;

use crate::{
    FissionYield, FissionYieldDistribution, Fraction, FractionError, Nuclide, NuclideData,
    NuclideId, Reaction, ReactionId, ReactionKind, YieldId, Zai,
};

/// Errors detected while assembling a [`NuclideNetwork`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NetworkError {
    #[error("nuclide {0} was added twice")]
    DuplicateNuclide(Zai),

    #[error("nuclide id {0} does not exist in the network")]
    UnknownNuclide(usize),

    #[error("yield id {0} does not exist in the network")]
    UnknownYield(usize),

    #[error("nuclide {zai} has an invalid decay constant {value}")]
    InvalidDecayConstant { zai: Zai, value: f64 },

    #[error("nuclide {zai}: sf_fraction {value} is outside [0, 1]")]
    InvalidSfFraction { zai: Zai, value: f64 },

    #[error("reaction mt={mt} of {parent} has non-finite branching ratio {value}")]
    InvalidBranchingRatio { parent: Zai, mt: u32, value: f64 },

    #[error("yield of {parent} into {product}: {source}")]
    InvalidYield {
        parent: Zai,
        product: Zai,
        #[source]
        source: FractionError,
    },

    #[error("nuclide {0} already has fission yields")]
    DuplicateYields(Zai),
}

/// Read-only network of nuclides, reactions, and fission yields.
#[derive(Debug, Clone)]
pub struct NuclideNetwork {
    nuclides: Vec<Nuclide>,
    reactions: Vec<Reaction>,
    yields: Vec<FissionYieldDistribution>,
    by_zai: HashMap<Zai, NuclideId>,
    lost: NuclideId,
}

impl NuclideNetwork {
    #[must_use]
    pub fn len(&self) -> usize {
        self.nuclides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nuclides.is_empty()
    }

    /// Returns the nuclide with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this network.
    #[must_use]
    pub fn nuclide(&self, id: NuclideId) -> &Nuclide {
        &self.nuclides[id.0]
    }

    /// Returns the reaction with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this network.
    #[must_use]
    pub fn reaction(&self, id: ReactionId) -> &Reaction {
        &self.reactions[id.0]
    }

    /// Returns the yield distribution with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this network.
    #[must_use]
    pub fn yields(&self, id: YieldId) -> &FissionYieldDistribution {
        &self.yields[id.0]
    }

    /// Looks up a nuclide by identity.
    #[must_use]
    pub fn find(&self, zai: Zai) -> Option<NuclideId> {
        self.by_zai.get(&zai).copied()
    }

    /// Returns the id at a raw index, as stored in checkpoint files.
    #[must_use]
    pub fn id_at(&self, index: usize) -> Option<NuclideId> {
        (index < self.nuclides.len()).then_some(NuclideId(index))
    }

    /// The sink that absorbs atoms leaving the tracked inventory.
    #[must_use]
    pub fn lost(&self) -> NuclideId {
        self.lost
    }

    /// Iterates over all nuclides in insertion order.
    pub fn nuclides(&self) -> impl Iterator<Item = (NuclideId, &Nuclide)> {
        self.nuclides
            .iter()
            .enumerate()
            .map(|(index, nuclide)| (NuclideId(index), nuclide))
    }

    /// Iterates over the reactions of one nuclide in insertion order.
    pub fn reactions_of(&self, id: NuclideId) -> impl Iterator<Item = (ReactionId, &Reaction)> {
        self.nuclide(id)
            .reactions
            .iter()
            .map(|&rid| (rid, &self.reactions[rid.0]))
    }

    /// Every nuclide that `id` can feed directly, in reaction order.
    ///
    /// Channels without a target and fission without yields contribute the
    /// lost sink. Duplicates are kept, so the length is an upper bound on
    /// the off-diagonal entries of the nuclide's matrix column.
    #[must_use]
    pub fn daughters(&self, id: NuclideId) -> Vec<NuclideId> {
        let mut out = Vec::new();
        for (_, reaction) in self.reactions_of(id) {
            match reaction.kind {
                ReactionKind::Decay { .. } | ReactionKind::Transmutation(_) => {
                    out.push(reaction.target.unwrap_or(self.lost));
                }
                ReactionKind::InducedFission | ReactionKind::SpontaneousFission => {
                    match reaction.yields {
                        Some(yid) => out.extend(self.yields(yid).iter().map(|y| y.product)),
                        None => out.push(self.lost),
                    }
                }
                ReactionKind::TotalFission => {
                    if self.nuclide(id).fission_yield.is_none() {
                        out.push(self.lost);
                    }
                }
            }
        }
        out
    }
}

/// Assembles a [`NuclideNetwork`].
///
/// The lost sink is created up front, so every network has one.
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    nuclides: Vec<Nuclide>,
    reactions: Vec<Reaction>,
    yields: Vec<FissionYieldDistribution>,
    by_zai: HashMap<Zai, NuclideId>,
    lost: NuclideId,
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkBuilder {
    #[must_use]
    pub fn new() -> Self {
        let lost = Nuclide {
            data: NuclideData::stable(Zai::LOST),
            reactions: Vec::new(),
            fission_yield: None,
        };
        let lost_id = NuclideId(0);
        Self {
            nuclides: vec![lost],
            reactions: Vec::new(),
            yields: Vec::new(),
            by_zai: HashMap::from([(Zai::LOST, lost_id)]),
            lost: lost_id,
        }
    }

    /// The id of the lost sink created by [`NetworkBuilder::new`].
    #[must_use]
    pub fn lost(&self) -> NuclideId {
        self.lost
    }

    /// Adds a nuclide and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity is already present or the decay data
    /// are not physical.
    pub fn add_nuclide(&mut self, data: NuclideData) -> Result<NuclideId, NetworkError> {
        if self.by_zai.contains_key(&data.zai) {
            return Err(NetworkError::DuplicateNuclide(data.zai));
        }
        if !data.decay_constant.is_finite() || data.decay_constant < 0.0 {
            return Err(NetworkError::InvalidDecayConstant {
                zai: data.zai,
                value: data.decay_constant,
            });
        }
        if !(0.0..=1.0).contains(&data.sf_fraction) {
            return Err(NetworkError::InvalidSfFraction {
                zai: data.zai,
                value: data.sf_fraction,
            });
        }

        let id = NuclideId(self.nuclides.len());
        self.nuclides.push(Nuclide {
            data,
            reactions: Vec::new(),
            fission_yield: None,
        });
        self.by_zai.insert(data.zai, id);
        Ok(id)
    }

    /// Appends a reaction to the parent's reaction list.
    ///
    /// Fission branching ratios are deliberately not checked here; a
    /// non-unit ratio is a contract violation reported by the matrix builder.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent, target, or yield id is unknown, or the
    /// branching ratio is not finite.
    pub fn add_reaction(
        &mut self,
        parent: NuclideId,
        reaction: Reaction,
    ) -> Result<ReactionId, NetworkError> {
        self.check_nuclide(parent)?;
        if let Some(target) = reaction.target {
            self.check_nuclide(target)?;
        }
        if let Some(yid) = reaction.yields {
            if yid.0 >= self.yields.len() {
                return Err(NetworkError::UnknownYield(yid.0));
            }
        }
        if !reaction.branching_ratio.is_finite() {
            return Err(NetworkError::InvalidBranchingRatio {
                parent: self.nuclides[parent.0].zai(),
                mt: reaction.mt,
                value: reaction.branching_ratio,
            });
        }

        let id = ReactionId(self.reactions.len());
        self.reactions.push(reaction);
        self.nuclides[parent.0].reactions.push(id);
        Ok(id)
    }

    /// Attaches independent fission yields to a fissionable nuclide.
    ///
    /// # Errors
    ///
    /// Returns an error if any id is unknown, a fraction is outside `[0, 1]`,
    /// or the parent already has yields.
    pub fn add_yields<I>(&mut self, parent: NuclideId, yields: I) -> Result<YieldId, NetworkError>
    where
        I: IntoIterator<Item = (NuclideId, f64)>,
    {
        self.check_nuclide(parent)?;
        let parent_zai = self.nuclides[parent.0].zai();
        if self.nuclides[parent.0].fission_yield.is_some() {
            return Err(NetworkError::DuplicateYields(parent_zai));
        }

        let mut entries = Vec::new();
        for (product, fraction) in yields {
            self.check_nuclide(product)?;
            let fraction = Fraction::new(fraction).map_err(|source| NetworkError::InvalidYield {
                parent: parent_zai,
                product: self.nuclides[product.0].zai(),
                source,
            })?;
            entries.push(FissionYield { product, fraction });
        }

        let id = YieldId(self.yields.len());
        self.yields.push(FissionYieldDistribution::new(entries));
        self.nuclides[parent.0].fission_yield = Some(id);
        Ok(id)
    }

    /// Finishes the network.
    ///
    /// Fission reactions added without explicit yields inherit the parent's
    /// distribution, so yields may be attached before or after the reaction.
    #[must_use]
    pub fn build(mut self) -> NuclideNetwork {
        for nuclide in &self.nuclides {
            let Some(parent_yields) = nuclide.fission_yield else {
                continue;
            };
            for rid in &nuclide.reactions {
                let reaction = &mut self.reactions[rid.0];
                let inherits = matches!(
                    reaction.kind,
                    ReactionKind::InducedFission | ReactionKind::SpontaneousFission
                );
                if inherits && reaction.yields.is_none() {
                    reaction.yields = Some(parent_yields);
                }
            }
        }

        NuclideNetwork {
            nuclides: self.nuclides,
            reactions: self.reactions,
            yields: self.yields,
            by_zai: self.by_zai,
            lost: self.lost,
        }
    }

    fn check_nuclide(&self, id: NuclideId) -> Result<(), NetworkError> {
        if id.0 < self.nuclides.len() {
            Ok(())
        } else {
            Err(NetworkError::UnknownNuclide(id.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u235() -> NuclideData {
        NuclideData::stable(Zai::new(92, 235, 0)).with_decay_constant(3.12e-17)
    }

    #[test]
    fn lost_sink_is_always_present() {
        let network = NetworkBuilder::new().build();
        assert_eq!(network.len(), 1);
        assert_eq!(network.find(Zai::LOST), Some(network.lost()));
    }

    #[test]
    fn rejects_duplicates_and_bad_decay_data() {
        let mut builder = NetworkBuilder::new();
        builder.add_nuclide(u235()).unwrap();

        assert_eq!(
            builder.add_nuclide(u235()),
            Err(NetworkError::DuplicateNuclide(Zai::new(92, 235, 0)))
        );
        assert!(matches!(
            builder.add_nuclide(NuclideData::stable(Zai::new(1, 3, 0)).with_decay_constant(-1.0)),
            Err(NetworkError::InvalidDecayConstant { .. })
        ));
    }

    #[test]
    fn rejects_yield_fraction_outside_unit_interval() {
        let mut builder = NetworkBuilder::new();
        let parent = builder.add_nuclide(u235()).unwrap();
        let product = builder
            .add_nuclide(NuclideData::stable(Zai::new(55, 137, 0)))
            .unwrap();

        let result = builder.add_yields(parent, [(product, 1.2)]);
        assert!(matches!(result, Err(NetworkError::InvalidYield { .. })));
    }

    #[test]
    fn fission_inherits_parent_yields() {
        let mut builder = NetworkBuilder::new();
        let parent = builder.add_nuclide(u235()).unwrap();
        let p1 = builder
            .add_nuclide(NuclideData::stable(Zai::new(55, 137, 0)))
            .unwrap();
        let rid = builder
            .add_reaction(parent, Reaction::induced_fission())
            .unwrap();
        let yid = builder.add_yields(parent, [(p1, 0.06)]).unwrap();

        let network = builder.build();
        assert_eq!(network.reaction(rid).yields, Some(yid));
        assert_eq!(network.daughters(parent), vec![p1]);
    }

    #[test]
    fn daughters_route_untargeted_channels_to_lost() {
        let mut builder = NetworkBuilder::new();
        let parent = builder.add_nuclide(u235()).unwrap();
        let target = builder
            .add_nuclide(NuclideData::stable(Zai::new(92, 236, 0)))
            .unwrap();
        builder
            .add_reaction(parent, Reaction::transmutation(102, Some(target)))
            .unwrap();
        builder
            .add_reaction(parent, Reaction::transmutation(107, None))
            .unwrap();
        builder
            .add_reaction(parent, Reaction::total_fission())
            .unwrap();

        let network = builder.build();
        let lost = network.lost();
        assert_eq!(network.daughters(parent), vec![target, lost, lost]);
    }

    #[test]
    fn unknown_target_is_rejected() {
        let mut builder = NetworkBuilder::new();
        let parent = builder.add_nuclide(u235()).unwrap();
        let bogus = NuclideId(42);
        assert_eq!(
            builder.add_reaction(parent, Reaction::decay(Some(bogus), 1.0)),
            Err(NetworkError::UnknownNuclide(42))
        );
    }
}
