/// Fractal definition: the immutable bundle one render evaluates against.
///
/// A definition is the hybrid sequence plus fractal-level metadata: forced DE
/// strategy, iteration budget, bailout and escape norm, optional Julia
/// constant. It is built once (usually from JSON) and shared read-only by
/// every sample and every thread.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::error::ConfigError;
use crate::engine::estimator::{self, DeStrategy, DeltaFunction, Evaluation};
use crate::engine::iterator::EscapeNorm;
use crate::engine::types::{Sample, Vec4};
use crate::formulas::hybrid::HybridSequence;
use crate::formulas::FormulaId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalDefinition {
    pub name: String,
    pub sequence: HybridSequence,
    /// Forced strategy; `None` lets the sequence decide at runtime
    pub strategy: DeStrategy,
    pub delta_function: DeltaFunction,
    /// Finite-difference step for the Delta strategy
    pub delta: f64,
    pub max_iterations: u32,
    pub bailout: f64,
    pub escape_norm: EscapeNorm,
    /// Julia mode: constant added instead of the sample point
    #[serde(skip_serializing_if = "Option::is_none")]
    pub julia: Option<Vec4>,
    /// Componentwise weight on the c-pixel addition
    pub constant_factor: Vec4,
    /// Initial `aux.actual_scale`
    pub scale_seed: f64,
}

impl Default for FractalDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            sequence: HybridSequence::default(),
            strategy: DeStrategy::None,
            delta_function: DeltaFunction::Logarithmic,
            delta: 1e-6,
            max_iterations: 60,
            bailout: 100.0,
            escape_norm: EscapeNorm::Euclidean,
            julia: None,
            constant_factor: Vec4::ONE,
            scale_seed: 2.0,
        }
    }
}

impl FractalDefinition {
    pub fn new(name: impl Into<String>, sequence: HybridSequence) -> Self {
        Self { name: name.into(), sequence, ..Default::default() }
    }

    /// Single formula with default parameters and its default bailout.
    pub fn single(id: FormulaId) -> Self {
        let info = id.info();
        Self {
            bailout: info.default_bailout,
            ..Self::new(info.internal_name, HybridSequence::single(id.create()))
        }
    }

    pub fn with_strategy(mut self, strategy: DeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_budget(mut self, max_iterations: u32, bailout: f64) -> Self {
        self.max_iterations = max_iterations;
        self.bailout = bailout;
        self
    }

    pub fn with_julia(mut self, c: Vec4) -> Self {
        self.julia = Some(c);
        self
    }

    /// Parse and validate a definition.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let def: FractalDefinition = serde_json::from_str(json)?;
        def.validate()?;
        debug!(
            name = %def.name,
            entries = def.sequence.entries.len(),
            strategy = ?def.strategy,
            "Loaded fractal definition"
        );
        Ok(def)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject definitions the engine cannot evaluate meaningfully.
    ///
    /// Inert gates (`stop <= start`) are legal and only logged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroMaxIterations);
        }
        if !(self.bailout.is_finite() && self.bailout > 0.0) {
            return Err(ConfigError::InvalidBailout(self.bailout));
        }
        if self.sequence.is_empty() {
            return Err(ConfigError::EmptySequence(self.name.clone()));
        }
        if !(self.delta.is_finite() && self.delta > 0.0) {
            return Err(ConfigError::InvalidDelta(self.delta));
        }

        for (index, entry) in self.sequence.inert_entries() {
            warn!(
                name = %self.name,
                index,
                formula = entry.formula.info().internal_name,
                start = entry.gate.start,
                stop = entry.gate.stop,
                "Sequence entry can never run"
            );
        }
        Ok(())
    }

    /// Evaluate with the definition's own budget and bailout.
    #[inline]
    pub fn evaluate(&self, point: Vec4) -> Sample {
        estimator::evaluate(point, self, self.max_iterations, self.bailout)
    }

    pub fn evaluate_detailed(&self, point: Vec4) -> Evaluation {
        estimator::evaluate_detailed(point, self, self.max_iterations, self.bailout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_uses_formula_bailout() {
        let def = FractalDefinition::single(FormulaId::Mandelbox);
        assert_eq!(def.name, "mandelbox");
        assert_eq!(def.bailout, 100.0);
        assert_eq!(def.sequence.entries.len(), 1);
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_budget() {
        let def = FractalDefinition::single(FormulaId::Mandelbulb).with_budget(0, 10.0);
        assert!(matches!(def.validate(), Err(ConfigError::ZeroMaxIterations)));

        let def = FractalDefinition::single(FormulaId::Mandelbulb).with_budget(10, f64::NAN);
        assert!(matches!(def.validate(), Err(ConfigError::InvalidBailout(_))));

        let def = FractalDefinition::single(FormulaId::Mandelbulb).with_budget(10, -1.0);
        assert!(matches!(def.validate(), Err(ConfigError::InvalidBailout(_))));
    }

    #[test]
    fn test_validate_rejects_empty_sequence_and_delta() {
        let def = FractalDefinition::new("empty", HybridSequence::default());
        assert!(matches!(def.validate(), Err(ConfigError::EmptySequence(name)) if name == "empty"));

        let mut def = FractalDefinition::single(FormulaId::NewtonPow3);
        def.delta = 0.0;
        assert!(matches!(def.validate(), Err(ConfigError::InvalidDelta(_))));
    }

    #[test]
    fn test_inert_gate_is_not_an_error() {
        let mut def = FractalDefinition::single(FormulaId::Mandelbulb);
        def.sequence.entries[0].gate = crate::formulas::hybrid::IterationGate::new(4, 2);
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_from_json_minimal() {
        let def = FractalDefinition::from_json(
            r#"{
                "name": "bulb",
                "sequence": { "entries": [ { "formula": { "type": "mandelbulb", "power": 2.0 } } ] },
                "max_iterations": 30,
                "strategy": "logarithmic"
            }"#,
        )
        .unwrap();
        assert_eq!(def.max_iterations, 30);
        assert_eq!(def.bailout, 100.0);
        assert_eq!(def.strategy, DeStrategy::Logarithmic);
        assert_eq!(def.constant_factor, Vec4::ONE);
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(FractalDefinition::from_json("{"), Err(ConfigError::Json(_))));
        assert!(matches!(
            FractalDefinition::from_json(r#"{"sequence": {"entries": [{"formula": {"type": "no_such"}}]}}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            FractalDefinition::from_json(r#"{"name": "x"}"#),
            Err(ConfigError::EmptySequence(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let def = FractalDefinition::single(FormulaId::AboxSmooth).with_julia(Vec4::xyz(0.1, 0.2, 0.3));
        let back = FractalDefinition::from_json(&def.to_json().unwrap()).unwrap();
        assert_eq!(back, def);
    }
}
