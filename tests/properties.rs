use fractal_core::engine::estimator::{linear, logarithmic};
use fractal_core::engine::{
    evaluate, iterate, iterate_with, DeStrategy, DeltaFunction, FractalDefinition, Termination,
    Vec4,
};
use fractal_core::formulas::hybrid::{HybridSequence, SequenceEntry};
use fractal_core::formulas::presets::FractalRegistry;
use fractal_core::formulas::transforms::{AdditionConstant, Scale};
use fractal_core::formulas::{bulbs, Formula, FormulaId};

fn power_bulb(power: f64) -> FractalDefinition {
    FractalDefinition::new(
        "bulb",
        HybridSequence::single(Formula::Mandelbulb(bulbs::Mandelbulb { power, ..Default::default() })),
    )
}

#[test]
fn test_evaluation_is_deterministic() {
    let registry = FractalRegistry::builtin();
    let points = [
        Vec4::xyz(0.3, -0.2, 0.1),
        Vec4::xyz(1.1, 0.4, -0.7),
        Vec4::xyz(-0.05, 0.9, 0.25),
    ];
    for name in registry.names() {
        let def = registry.get(name).unwrap();
        for p in points {
            let a = def.evaluate(p);
            let b = def.evaluate(p);
            // compare bit patterns so NaN outputs still count as equal
            assert_eq!(a.distance.to_bits(), b.distance.to_bits(), "{name}");
            assert_eq!(a.color.to_bits(), b.color.to_bits(), "{name}");
        }
    }
}

#[test]
fn test_escape_is_monotonic_along_ray() {
    // both start past the last bounded point on the positive x axis
    let rays: [(f64, &[f64]); 2] = [
        (2.0, &[0.3, 0.35, 0.5, 1.0, 2.0, 5.0, 20.0]),
        (8.0, &[0.75, 0.8, 1.0, 1.5, 3.0, 20.0]),
    ];
    for (power, scales) in rays {
        let def = power_bulb(power);
        let mut previous = u32::MAX;
        for &s in scales {
            let out = iterate(&def, Vec4::xyz(s, 0.0, 0.0), 60, 100.0);
            assert_eq!(out.termination, Termination::Escaped, "power {power} at {s}");
            assert!(out.iterations <= previous, "power {power} at {s}");
            previous = out.iterations;
        }
    }
}

#[test]
fn test_gate_limits_transform_to_its_range() {
    let def = FractalDefinition::new(
        "gated",
        HybridSequence::chained(vec![
            SequenceEntry::new(Formula::TransfScale(Scale { scale: 2.0 })).gated(3, 7),
        ]),
    );

    let mut trace = Vec::new();
    iterate_with(&def, Vec4::xyz(1.0, 0.0, 0.0), 10, 1e9, |z, aux| {
        trace.push((aux.i, z.x, aux.de));
    });

    assert_eq!(trace.len(), 10);
    for (completed, x, de) in trace {
        // passes 0..completed have run; those inside [3, 7) doubled z
        let doublings = completed.saturating_sub(3).min(4);
        let expected = f64::from(1u32 << doublings);
        assert_eq!(x, expected, "after {completed} passes");
        assert_eq!(de, expected, "after {completed} passes");
    }
}

fn box_then_bulb() -> FractalDefinition {
    FractalDefinition::new(
        "box_then_bulb",
        HybridSequence::chained(vec![
            SequenceEntry::new(FormulaId::Mandelbox.create()).with_add_c(false),
            SequenceEntry::new(FormulaId::Mandelbulb.create()),
        ]),
    )
    .with_budget(10, 100.0)
}

#[test]
fn test_last_owner_decides_strategy() {
    let bulb_last = box_then_bulb();
    let box_last = FractalDefinition::new(
        "bulb_then_box",
        HybridSequence::chained(vec![
            SequenceEntry::new(FormulaId::Mandelbulb.create()).with_add_c(false),
            SequenceEntry::new(FormulaId::Mandelbox.create()),
        ]),
    )
    .with_budget(10, 100.0);

    // the orbit stays in the z = 0 plane, where the bulb's polar angle is 0
    // whatever radius it reads
    let p = Vec4::xyz(0.5, 0.3, 0.0);

    let eval = bulb_last.evaluate_detailed(p);
    assert_eq!(eval.strategy, DeStrategy::Logarithmic);
    assert!(eval.sample.distance.is_finite());
    let out = iterate(&bulb_last, p, 10, 100.0);
    assert_eq!(eval.sample.distance, logarithmic(out.aux.r, out.aux.r_dz));

    let eval = box_last.evaluate_detailed(p);
    assert_eq!(eval.strategy, DeStrategy::Linear);
    assert!(eval.sample.distance.is_finite());
    let out = iterate(&box_last, p, 10, 100.0);
    assert_eq!(eval.sample.distance, linear(out.aux.r, out.aux.de));
}

#[test]
fn test_stale_radius_nan_propagates() {
    // the box grows z past the radius taken at the start of the pass, so the
    // bulb's asin argument leaves [-1, 1]
    let def = box_then_bulb();
    let p = Vec4::xyz(0.5, 0.3, 0.2);

    let out = iterate(&def, p, 1, 100.0);
    assert!(out.z.x.is_nan());
    assert!(out.z.z.is_nan());
    assert!(out.aux.r.is_nan());

    // NaN never compares >= bailout, so the orbit runs the full budget
    let eval = def.evaluate_detailed(p);
    assert_eq!(eval.termination, Termination::Exhausted);
    assert_eq!(eval.iterations, 10);
    assert!(eval.sample.distance.is_nan());
}

#[test]
fn test_analytic_custom_returns_formula_distance() {
    let registry = FractalRegistry::builtin();
    let def = registry.get("jos_kleinian_v3").unwrap();
    let p = Vec4::xyz(0.3, 0.1, 0.2);

    let eval = def.evaluate_detailed(p);
    assert_eq!(eval.strategy, DeStrategy::AnalyticCustom);

    let out = iterate(def, p, def.max_iterations, def.bailout);
    assert!(out.aux.dist.is_finite());
    assert_eq!(eval.sample.distance.to_bits(), out.aux.dist.to_bits());
    assert_eq!(
        evaluate(p, def, def.max_iterations, def.bailout).distance.to_bits(),
        out.aux.dist.to_bits()
    );
}

/// Final radius of the six axis neighbours, run for `passes` with no escape
/// test, folded into the gradient magnitude.
fn gradient_by_hand(def: &FractalDefinition, p: Vec4, passes: u32) -> f64 {
    let h = def.delta;
    let r = |q: Vec4| iterate(def, q, passes, f64::INFINITY).aux.r;
    let gx = (r(p + Vec4::xyz(h, 0.0, 0.0)) - r(p - Vec4::xyz(h, 0.0, 0.0))) / (2.0 * h);
    let gy = (r(p + Vec4::xyz(0.0, h, 0.0)) - r(p - Vec4::xyz(0.0, h, 0.0))) / (2.0 * h);
    let gz = (r(p + Vec4::xyz(0.0, 0.0, h)) - r(p - Vec4::xyz(0.0, 0.0, h))) / (2.0 * h);
    (gx * gx + gy * gy + gz * gz).sqrt()
}

#[test]
fn test_delta_matches_central_differences() {
    let mut def = FractalDefinition::single(FormulaId::NewtonPow3).with_strategy(DeStrategy::Delta);
    let p = Vec4::xyz(0.9, 0.6, 0.4);

    let out = iterate(&def, p, def.max_iterations, def.bailout);
    assert_eq!(out.termination, Termination::Escaped);
    let r = out.aux.r;
    let dr = gradient_by_hand(&def, p, out.iterations);
    assert!(dr.is_finite() && dr > 0.0);

    assert_eq!(def.delta_function, DeltaFunction::Logarithmic);
    let distance = def.evaluate(p).distance;
    let expected = 0.5 * r * r.ln() / dr;
    assert!((distance - expected).abs() <= 1e-12 * expected.abs(), "{distance} vs {expected}");

    def.delta_function = DeltaFunction::Linear;
    let distance = def.evaluate(p).distance;
    let expected = 0.5 * r / dr;
    assert!((distance - expected).abs() <= 1e-12 * expected.abs(), "{distance} vs {expected}");
}

#[test]
fn test_forced_strategy_ignores_owner() {
    let def = FractalDefinition::single(FormulaId::Mandelbulb).with_strategy(DeStrategy::Linear);
    let p = Vec4::xyz(0.7, 0.2, -0.4);
    let eval = def.evaluate_detailed(p);
    assert_eq!(eval.strategy, DeStrategy::Linear);
    let out = iterate(&def, p, def.max_iterations, def.bailout);
    assert_eq!(eval.sample.distance, linear(out.aux.r, out.aux.de));
}

#[test]
fn test_zero_offset_pass_is_identity() {
    let def = FractalDefinition::new(
        "identity",
        HybridSequence::single(Formula::TransfAdditionConstant(AdditionConstant::default())),
    );
    let p = Vec4::xyz(0.25, -1.5, 2.0);
    let out = iterate(&def, p, 1, 100.0);

    assert_eq!(out.iterations, 1);
    assert_eq!(out.termination, Termination::Exhausted);
    assert_eq!(out.z, p);
    assert_eq!(out.aux.de, 1.0);
    assert_eq!(out.aux.r_dz, 1.0);
    assert_eq!(out.aux.color, 1.0);
}

#[test]
fn test_power2_bulb_escapes_on_axis() {
    let registry = FractalRegistry::builtin();
    let def = registry.get("mandelbulb_power2").unwrap();

    // x: 1 -> 2 -> 5 -> 26 -> 677
    let out = iterate(def, Vec4::xyz(1.0, 0.0, 0.0), def.max_iterations, def.bailout);
    assert_eq!(out.termination, Termination::Escaped);
    assert_eq!(out.iterations, 4);
    assert_eq!(out.z, Vec4::xyz(677.0, 0.0, 0.0));
    assert_eq!(out.aux.r_dz, 6813.0);

    let eval = def.evaluate_detailed(Vec4::xyz(1.0, 0.0, 0.0));
    let expected = 677.0 * 677f64.ln() / 6813.0;
    assert!(eval.sample.distance > 0.0);
    assert!((eval.sample.distance - expected).abs() < 1e-12);
}

#[test]
fn test_power2_bulb_origin_exhausts() {
    let registry = FractalRegistry::builtin();
    let def = registry.get("mandelbulb_power2").unwrap();

    let eval = def.evaluate_detailed(Vec4::ZERO);
    assert_eq!(eval.termination, Termination::Exhausted);
    assert_eq!(eval.iterations, 30);
    assert!(eval.sample.distance.is_finite());
    assert!(eval.sample.distance.abs() < 1e-6);
}

#[test]
fn test_color_attributed_to_active_fold() {
    let registry = FractalRegistry::builtin();
    let def = registry.get("folded_box").unwrap();

    let mut colors = vec![1.0];
    let mut xs = Vec::new();
    let out = iterate_with(def, Vec4::xyz(3.0, 0.0, 0.0), def.max_iterations, def.bailout, |z, aux| {
        colors.push(aux.color);
        xs.push(z.x);
    });
    assert_eq!(out.termination, Termination::Exhausted);
    assert_eq!(out.iterations, 30);

    for (pass, step) in colors.windows(2).enumerate() {
        let gained = step[1] - step[0];
        let expected = match pass {
            0 => 0.03,
            1..=4 => 0.0,
            _ => 0.02,
        };
        assert!((gained - expected).abs() < 1e-9, "pass {pass} gained {gained}");
    }

    // box fold lands on -1 and leaves it alone; sphere fold then doubles
    assert_eq!(&xs[..5], &[-1.0; 5]);
    assert_eq!(xs[5], -2.0);
    assert_eq!(xs[29], -f64::from(1u32 << 25));
}

#[test]
fn test_alternating_hands_ownership_back_and_forth() {
    let registry = FractalRegistry::builtin();
    let def = registry.get("bulbox").unwrap();

    let mut owners = Vec::new();
    iterate_with(def, Vec4::xyz(0.1, 0.05, 0.0), 6, 1e30, |_, aux| owners.push(aux.de_owner));

    let box_owner = Some(DeStrategy::Linear);
    let bulb_owner = Some(DeStrategy::Logarithmic);
    assert_eq!(
        owners,
        vec![box_owner, box_owner, bulb_owner, box_owner, box_owner, bulb_owner]
    );
}

#[test]
fn test_newton_delta_is_finite_outside() {
    let def = FractalDefinition::single(FormulaId::NewtonPow3).with_strategy(DeStrategy::Delta);
    let eval = def.evaluate_detailed(Vec4::xyz(0.9, 0.6, 0.4));
    assert_eq!(eval.strategy, DeStrategy::Delta);
    assert_eq!(eval.termination, Termination::Escaped);
    assert!(eval.sample.distance.is_finite());
    assert!(eval.sample.distance > 0.0);
}

#[test]
fn test_free_function_matches_definition_budget() {
    let def = FractalDefinition::single(FormulaId::MengerSponge);
    let p = Vec4::xyz(0.4, 0.1, -0.3);
    assert_eq!(evaluate(p, &def, def.max_iterations, def.bailout), def.evaluate(p));
}
