/// Per-sample accumulators carried across iterations.
///
/// A fresh `AuxState` is built for every sample point and dropped once the
/// distance and color have been read out of it. Nothing in here is shared
/// between evaluations, which is what lets many threads evaluate at once.

use crate::engine::estimator::DeStrategy;
use crate::engine::types::Vec4;

/// Seed for `dist`; formulas that keep a running minimum start from here.
pub const DIST_SEED: f64 = 1000.0;

#[derive(Clone, Debug, PartialEq)]
pub struct AuxState {
    /// Current iteration index, drives every iteration-range gate
    pub i: u32,
    /// Escape norm of `z`, refreshed by the iterator at loop entry and after
    /// each pass. Transforms that move `z` mid-pass may leave it stale.
    pub r: f64,
    /// Derivative magnitude for the logarithmic estimate
    pub r_dz: f64,
    /// Running Lipschitz factor for the linear estimate
    pub de: f64,
    /// Orbit-trap / fold-weight side channel
    pub color: f64,
    /// Per-sample addition constant (sample point or Julia constant)
    pub const_c: Vec4,
    /// Working copy of the addition constant; symmetry swaps permute this one
    pub c: Vec4,
    /// Distance written directly by analytic-custom formulas
    pub dist: f64,
    /// Varying scale owned by the Amazing Surf family
    pub actual_scale: f64,
    /// Varying scale offset owned by the Abox family
    pub actual_scale_a: f64,
    /// Native strategy of the last DE-owning entry that ran
    pub de_owner: Option<DeStrategy>,
}

impl AuxState {
    /// Fresh state for one sample point.
    ///
    /// `const_c` is either the sample point itself or the Julia constant;
    /// `scale_seed` primes `actual_scale` for formulas that vary it.
    pub fn new(const_c: Vec4, scale_seed: f64) -> Self {
        Self {
            i: 0,
            r: 0.0,
            r_dz: 1.0,
            de: 1.0,
            color: 1.0,
            const_c,
            c: const_c,
            dist: DIST_SEED,
            actual_scale: scale_seed,
            actual_scale_a: 0.0,
            de_owner: None,
        }
    }
}
