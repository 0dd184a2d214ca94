/// Distance estimation: turns the final iteration state into a distance.
///
/// Five strategies:
/// - Linear: `r / |DE|`, for folds and IFS that accumulate a Lipschitz bound
/// - Logarithmic: `r ln r / r_dz`, for power bulbs
/// - Delta: finite differences of the final radius over re-iterated
///   neighbours, for formulas without a usable derivative
/// - AnalyticCustom: whatever the formula wrote into `aux.dist`
/// - None: defer to the last DE-owning formula that ran
///
/// A definition may force a strategy; otherwise the hybrid chain decides at
/// runtime, and the last owner to execute wins.

use serde::{Deserialize, Serialize};

use crate::engine::auxiliary::AuxState;
use crate::engine::definition::FractalDefinition;
use crate::engine::iterator::{iterate, IterationOutcome, Termination};
use crate::engine::types::{Sample, Vec4};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeStrategy {
    Linear,
    Logarithmic,
    Delta,
    AnalyticCustom,
    #[default]
    None,
}

impl DeStrategy {
    /// Strategy that actually produces the distance for this sample.
    ///
    /// `None` falls through to the runtime owner recorded by the hybrid
    /// sequence, and to Linear when nothing in the chain owns one.
    #[inline]
    pub fn resolve(self, aux: &AuxState) -> DeStrategy {
        match self {
            DeStrategy::None => match aux.de_owner {
                Some(owner) if owner != DeStrategy::None => owner,
                _ => DeStrategy::Linear,
            },
            explicit => explicit,
        }
    }
}

/// Final step of the Delta strategy, applied to the gradient magnitude.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaFunction {
    /// `0.5 r / dr`
    Linear,
    /// `0.5 r ln r / dr`
    #[default]
    Logarithmic,
}

#[inline(always)]
pub fn linear(r: f64, de: f64) -> f64 {
    r / de.abs()
}

#[inline(always)]
pub fn logarithmic(r: f64, r_dz: f64) -> f64 {
    r * r.ln() / r_dz
}

/// Distance for a finished iteration of `point`.
pub fn estimate(def: &FractalDefinition, point: Vec4, outcome: &IterationOutcome) -> f64 {
    let aux = &outcome.aux;
    match def.strategy.resolve(aux) {
        DeStrategy::Logarithmic => logarithmic(aux.r, aux.r_dz),
        DeStrategy::Delta => delta(def, point, outcome),
        DeStrategy::AnalyticCustom => aux.dist,
        DeStrategy::Linear | DeStrategy::None => linear(aux.r, aux.de),
    }
}

/// Central differences of the final radius along x, y and z.
///
/// Neighbours run exactly as many passes as the main orbit, with no escape
/// test, so all seven radii come from the same pass count.
fn delta(def: &FractalDefinition, point: Vec4, outcome: &IterationOutcome) -> f64 {
    let h = def.delta;
    let passes = outcome.iterations;
    let radius_at = |p: Vec4| iterate(def, p, passes, f64::INFINITY).aux.r;

    let axes = [Vec4::xyz(h, 0.0, 0.0), Vec4::xyz(0.0, h, 0.0), Vec4::xyz(0.0, 0.0, h)];
    let mut grad_sq = 0.0;
    for step in axes {
        let g = (radius_at(point + step) - radius_at(point - step)) / (2.0 * h);
        grad_sq += g * g;
    }
    let dr = grad_sq.sqrt();

    let r = outcome.aux.r;
    match def.delta_function {
        DeltaFunction::Logarithmic => 0.5 * r * r.ln() / dr,
        DeltaFunction::Linear => 0.5 * r / dr,
    }
}

/// Full result of one evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub sample: Sample,
    pub iterations: u32,
    pub termination: Termination,
    /// Strategy that produced the distance
    pub strategy: DeStrategy,
}

/// Distance and color for one sample point.
#[inline]
pub fn evaluate(point: Vec4, def: &FractalDefinition, max_iterations: u32, bailout: f64) -> Sample {
    evaluate_detailed(point, def, max_iterations, bailout).sample
}

/// [`evaluate`] plus the pass count, terminal state and resolved strategy.
pub fn evaluate_detailed(
    point: Vec4,
    def: &FractalDefinition,
    max_iterations: u32,
    bailout: f64,
) -> Evaluation {
    let outcome = iterate(def, point, max_iterations, bailout);
    let distance = estimate(def, point, &outcome);
    Evaluation {
        sample: Sample { distance, color: outcome.aux.color },
        iterations: outcome.iterations,
        termination: outcome.termination,
        strategy: def.strategy.resolve(&outcome.aux),
    }
}
