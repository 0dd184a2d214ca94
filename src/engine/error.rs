/// Errors raised while loading or validating a fractal definition.
///
/// The evaluation path itself never fails: numeric trouble surfaces as
/// NaN / Inf distances for the ray marcher to treat as "no hit".

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid fractal definition JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("max_iterations must be at least 1")]
    ZeroMaxIterations,
    #[error("bailout must be finite and positive, got {0}")]
    InvalidBailout(f64),
    #[error("fractal '{0}' has no sequence entries")]
    EmptySequence(String),
    #[error("delta step must be finite and positive, got {0}")]
    InvalidDelta(f64),
    #[error("unknown fractal '{0}'")]
    UnknownFractal(String),
}
