use fractal_core::engine::{ConfigError, DeStrategy, EscapeNorm, FractalDefinition, Termination, Vec4};
use fractal_core::formulas::hybrid::SequenceMode;
use fractal_core::formulas::presets::FractalRegistry;
use fractal_core::formulas::{Formula, FormulaId};

const HYBRID: &str = r#"{
    "name": "folded_bulb",
    "sequence": {
        "mode": "chained",
        "entries": [
            {
                "formula": { "type": "transf_box_fold", "limit": { "x": 1.0, "y": 1.0, "z": 1.0, "w": 0.0 } },
                "gate": { "start": 0, "stop": 4 }
            },
            { "formula": { "type": "mandelbulb", "power": 4.0 } },
            { "formula": { "type": "transf_scale", "scale": 0.5 }, "enabled": false }
        ]
    },
    "max_iterations": 20,
    "bailout": 8.0,
    "escape_norm": "chebyshev"
}"#;

#[test]
fn test_hybrid_definition_from_json() {
    let def = FractalDefinition::from_json(HYBRID).unwrap();
    assert_eq!(def.sequence.mode, SequenceMode::Chained);
    assert_eq!(def.sequence.entries.len(), 3);
    assert_eq!(def.sequence.entries[0].gate.stop, 4);
    assert!(!def.sequence.entries[2].enabled);
    assert_eq!(def.escape_norm, EscapeNorm::Chebyshev);
    assert_eq!(def.strategy, DeStrategy::None);
    match &def.sequence.entries[1].formula {
        Formula::Mandelbulb(bulb) => assert_eq!(bulb.power, 4.0),
        other => panic!("unexpected formula {other:?}"),
    }

    // the bulb runs last, so its logarithmic estimate is used
    let eval = def.evaluate_detailed(Vec4::xyz(0.4, 0.4, 0.4));
    assert_eq!(eval.strategy, DeStrategy::Logarithmic);
    assert!(eval.iterations <= 20);
}

#[test]
fn test_registry_loads_user_definition() {
    let mut registry = FractalRegistry::builtin();
    let before = registry.len();
    registry.load_json(HYBRID).unwrap();
    assert_eq!(registry.len(), before + 1);
    assert!(registry.names().any(|n| n == "folded_bulb"));
}

#[test]
fn test_invalid_definitions_rejected() {
    let cases = [
        (r#"{"name": "a", "max_iterations": 0, "sequence": {"entries": [{"formula": {"type": "mandelbox"}}]}}"#, "zero"),
        (r#"{"name": "b", "bailout": 0.0, "sequence": {"entries": [{"formula": {"type": "mandelbox"}}]}}"#, "bailout"),
        (r#"{"name": "c", "sequence": {"entries": []}}"#, "empty"),
        (r#"{"name": "d", "sequence": {"entries": [{"formula": {"type": "mandelbox", "scale": "big"}}]}}"#, "json"),
    ];
    for (json, kind) in cases {
        let err = FractalDefinition::from_json(json).unwrap_err();
        let ok = match kind {
            "zero" => matches!(err, ConfigError::ZeroMaxIterations),
            "bailout" => matches!(err, ConfigError::InvalidBailout(b) if b == 0.0),
            "empty" => matches!(err, ConfigError::EmptySequence(ref n) if n == "c"),
            _ => matches!(err, ConfigError::Json(_)),
        };
        assert!(ok, "{kind}: {err}");
    }
}

#[test]
fn test_builtin_definitions_survive_json() {
    let registry = FractalRegistry::builtin();
    for id in FormulaId::ALL {
        let name = id.info().internal_name;
        if let Ok(def) = registry.get(name) {
            let json = def.to_json().unwrap();
            assert!(json.contains(name), "{name}");
            let back = FractalDefinition::from_json(&json).unwrap();
            let p = Vec4::xyz(0.2, -0.1, 0.3);
            assert_eq!(back.evaluate(p).distance.to_bits(), def.evaluate(p).distance.to_bits(), "{name}");
        }
    }
}

#[test]
fn test_julia_definition_ignores_sample_in_constant() {
    let registry = FractalRegistry::builtin();
    let def = registry.get("quaternion_julia").unwrap();
    let out = fractal_core::engine::iterate(def, Vec4::xyz(5.0, 0.0, 0.0), 60, 10.0);
    assert_eq!(out.aux.const_c, Vec4::new(-0.2, 0.6, 0.2, 0.2));
    assert_eq!(out.termination, Termination::Escaped);
}
