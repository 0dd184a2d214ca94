/// The iteration loop: Running until the escape test fires or the budget runs
/// out.
///
/// One call owns one position and one `AuxState`; the definition is only
/// read. Nothing here allocates.

use serde::{Deserialize, Serialize};

use crate::engine::auxiliary::AuxState;
use crate::engine::definition::FractalDefinition;
use crate::engine::types::Vec4;

/// Norm compared against the bailout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscapeNorm {
    /// Length over x, y, z, w
    #[default]
    Euclidean,
    /// Length over x, y, z only
    Euclidean3,
    /// Largest absolute component
    Chebyshev,
    /// Sum of absolute components
    Manhattan,
}

impl EscapeNorm {
    #[inline(always)]
    pub fn measure(self, z: &Vec4) -> f64 {
        match self {
            EscapeNorm::Euclidean => z.length(),
            EscapeNorm::Euclidean3 => z.length3(),
            EscapeNorm::Chebyshev => z.max_abs(),
            EscapeNorm::Manhattan => z.sum_abs(),
        }
    }
}

/// Terminal state of the loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Escaped,
    Exhausted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IterationOutcome {
    pub z: Vec4,
    pub aux: AuxState,
    /// Completed passes
    pub iterations: u32,
    pub termination: Termination,
}

/// Iterate `point` through the definition's sequence.
#[inline]
pub fn iterate(
    def: &FractalDefinition,
    point: Vec4,
    max_iterations: u32,
    bailout: f64,
) -> IterationOutcome {
    iterate_with(def, point, max_iterations, bailout, |_, _| {})
}

/// Like [`iterate`], calling `observer` after every completed pass.
pub fn iterate_with<F>(
    def: &FractalDefinition,
    point: Vec4,
    max_iterations: u32,
    bailout: f64,
    mut observer: F,
) -> IterationOutcome
where
    F: FnMut(&Vec4, &AuxState),
{
    let const_c = def.julia.unwrap_or(point);
    let mut z = point;
    let mut aux = AuxState::new(const_c, def.scale_seed);
    aux.r = z.length();

    if max_iterations == 0 {
        return IterationOutcome { z, aux, iterations: 0, termination: Termination::Exhausted };
    }

    let termination = loop {
        def.sequence.apply_pass(&mut z, &mut aux, def.constant_factor);
        aux.i += 1;
        aux.r = z.length();
        observer(&z, &aux);

        if aux.i >= max_iterations {
            break Termination::Exhausted;
        }
        if def.escape_norm.measure(&z) >= bailout {
            break Termination::Escaped;
        }
    };

    IterationOutcome { z, iterations: aux.i, aux, termination }
}
