/// Named fractal definitions.
///
/// The registry maps a fractal name to its definition (sequence, parameters,
/// DE tag). `builtin()` carries the stock presets; user definitions are
/// loaded from JSON on top.

use std::collections::BTreeMap;

use tracing::info;

use super::hybrid::{HybridSequence, SequenceEntry};
use super::transforms::{BoxFold, SphereColor, SphericalFold};
use super::{bulbs, Formula, FormulaId};
use crate::engine::definition::FractalDefinition;
use crate::engine::error::ConfigError;
use crate::engine::estimator::DeStrategy;
use crate::engine::types::Vec4;

#[derive(Clone, Debug, Default)]
pub struct FractalRegistry {
    definitions: BTreeMap<String, FractalDefinition>,
}

impl FractalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the stock presets.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for def in builtin_presets() {
            registry.definitions.insert(def.name.clone(), def);
        }
        registry
    }

    pub fn get(&self, name: &str) -> Result<&FractalDefinition, ConfigError> {
        self.definitions
            .get(name)
            .ok_or_else(|| ConfigError::UnknownFractal(name.to_string()))
    }

    /// Add or replace a definition, returning the one it replaced.
    pub fn insert(&mut self, def: FractalDefinition) -> Option<FractalDefinition> {
        info!(name = %def.name, entries = def.sequence.entries.len(), "Registered fractal");
        self.definitions.insert(def.name.clone(), def)
    }

    /// Parse, validate and register a JSON definition.
    pub fn load_json(&mut self, json: &str) -> Result<&FractalDefinition, ConfigError> {
        let def = FractalDefinition::from_json(json)?;
        let name = def.name.clone();
        self.insert(def);
        self.get(&name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn builtin_presets() -> Vec<FractalDefinition> {
    let mut presets: Vec<FractalDefinition> = [
        FormulaId::Mandelbulb,
        FormulaId::Quaternion,
        FormulaId::NewtonPow3,
        FormulaId::Mandelbox,
        FormulaId::AboxKlein,
        FormulaId::AboxSmooth,
        FormulaId::AmazingSurfM3d,
        FormulaId::MengerSponge,
        FormulaId::JosKleinianV3,
    ]
    .into_iter()
    .map(|id| {
        let def = FractalDefinition::single(id);
        // standalone presets name their strategy instead of deferring
        let strategy = id.info().strategy;
        def.with_strategy(strategy)
    })
    .collect();

    presets.push(FractalDefinition {
        max_iterations: 30,
        ..FractalDefinition::new(
            "mandelbulb_power2",
            HybridSequence::single(Formula::Mandelbulb(bulbs::Mandelbulb { power: 2.0, ..Default::default() })),
        )
        .with_strategy(DeStrategy::Logarithmic)
    });

    presets.push(
        FractalDefinition::new(
            "quaternion_julia",
            HybridSequence::single(FormulaId::Quaternion.create()),
        )
        .with_strategy(DeStrategy::Logarithmic)
        .with_budget(60, 10.0)
        .with_julia(Vec4::new(-0.2, 0.6, 0.2, 0.2)),
    );

    // Classic Mandelbulb3D alternating hybrid: two box passes, one bulb pass
    presets.push(
        FractalDefinition::new(
            "bulbox",
            HybridSequence::alternating(vec![
                SequenceEntry::new(FormulaId::Mandelbox.create()).with_repeat(2),
                SequenceEntry::new(FormulaId::Mandelbulb.create()),
            ]),
        )
        .with_budget(40, 100.0),
    );

    // Box fold early, sphere fold late; neither owns a DE so Linear is used
    presets.push(
        FractalDefinition::new(
            "folded_box",
            HybridSequence::chained(vec![
                SequenceEntry::new(Formula::TransfBoxFold(BoxFold::default())).gated(0, 5),
                SequenceEntry::new(Formula::TransfSphericalFold(SphericalFold {
                    scale: 2.0,
                    color: SphereColor { scale_weight: 0.01, ..Default::default() },
                    ..Default::default()
                }))
                .gated(5, 30),
            ]),
        )
        .with_budget(30, 1e12),
    );

    presets
}
