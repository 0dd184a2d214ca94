/// Evaluation engine: value types, per-sample state, the iteration loop and
/// distance estimation.

pub mod auxiliary;
pub mod definition;
pub mod error;
pub mod estimator;
pub mod iterator;
pub mod types;

pub use definition::FractalDefinition;
pub use error::ConfigError;
pub use estimator::{evaluate, evaluate_detailed, DeStrategy, DeltaFunction, Evaluation};
pub use iterator::{iterate, iterate_with, EscapeNorm, IterationOutcome, Termination};
pub use types::{Sample, Vec4};
