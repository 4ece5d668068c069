use burnup_core::{Material, NuclideNetwork};

use crate::reprocessing::Reprocessing;

/// Upper bound on the nonzero entries of a material's matrix.
///
/// Each column holds at most its diagonal, one entry per daughter the
/// network lists for it, and one removal entry when reprocessing applies to
/// its element. The builder fails if it ever needs more.
#[must_use]
pub fn count_nonzero_bound(
    network: &NuclideNetwork,
    material: &Material,
    reprocessing: Option<&Reprocessing>,
) -> usize {
    material
        .composition
        .nuclides()
        .iter()
        .map(|&id| {
            let removed = reprocessing.is_some_and(|plan| {
                id != network.lost()
                    && plan.removal_constant(material.id, network.nuclide(id).zai().z()) > 0.0
            });
            1 + network.daughters(id).len() + usize::from(removed)
        })
        .sum()
}
