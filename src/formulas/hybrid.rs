/// Hybrid sequences: ordered chains of formulas with per-entry gates.
///
/// Two modes:
/// - Chained: every active entry runs every iteration, in list order
/// - Alternating: one entry per iteration, each repeated `repeat` times
///   before the cycle moves on (the classic Mandelbulb3D hybrid)
///
/// Entry order is part of the fractal's identity. Couplings between entries
/// (a fold and the scale that must follow it) live in the sequence data,
/// never in the engine.

use serde::{Deserialize, Serialize};

use super::{Formula, Transform};
use crate::engine::auxiliary::AuxState;
use crate::engine::estimator::DeStrategy;
use crate::engine::types::Vec4;

/// Half-open iteration range `[start, stop)`.
///
/// `stop <= start` is a legal, inert gate: the guarded step never fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterationGate {
    pub start: u32,
    pub stop: u32,
}

impl IterationGate {
    pub const ALWAYS: IterationGate = IterationGate { start: 0, stop: u32::MAX };

    pub const fn new(start: u32, stop: u32) -> Self {
        Self { start, stop }
    }

    #[inline(always)]
    pub fn contains(&self, i: u32) -> bool {
        i >= self.start && i < self.stop
    }

    pub fn is_inert(&self) -> bool {
        self.stop <= self.start
    }
}

impl Default for IterationGate {
    fn default() -> Self {
        Self::ALWAYS
    }
}

/// An optional sub-step inside a formula: its own enable flag and gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct Gated<T> {
    pub enabled: bool,
    pub gate: IterationGate,
    #[serde(flatten)]
    pub params: T,
}

impl<T> Gated<T> {
    pub fn off(gate: IterationGate, params: T) -> Self {
        Self { enabled: false, gate, params }
    }

    pub fn on(gate: IterationGate, params: T) -> Self {
        Self { enabled: true, gate, params }
    }

    /// Parameters if the step is enabled and `i` is inside its gate.
    #[inline(always)]
    pub fn active(&self, i: u32) -> Option<&T> {
        if self.enabled && self.gate.contains(i) {
            Some(&self.params)
        } else {
            None
        }
    }
}

impl<T: Default> Default for Gated<T> {
    fn default() -> Self {
        Self::off(IterationGate::ALWAYS, T::default())
    }
}

fn default_true() -> bool {
    true
}

fn default_repeat() -> u32 {
    1
}

/// A single slot in the hybrid sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequenceEntry {
    pub formula: Formula,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub gate: IterationGate,
    /// Overrides the formula's c-pixel addition policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_c: Option<bool>,
    /// Consecutive iterations per cycle in alternating mode
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl SequenceEntry {
    pub fn new(formula: Formula) -> Self {
        Self {
            formula,
            enabled: true,
            gate: IterationGate::ALWAYS,
            add_c: None,
            repeat: 1,
        }
    }

    pub fn gated(mut self, start: u32, stop: u32) -> Self {
        self.gate = IterationGate::new(start, stop);
        self
    }

    pub fn with_add_c(mut self, add_c: bool) -> Self {
        self.add_c = Some(add_c);
        self
    }

    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn adds_c(&self) -> bool {
        self.add_c
            .unwrap_or_else(|| self.formula.info().cpixel.default_enabled())
    }

    #[inline(always)]
    pub fn is_active(&self, i: u32) -> bool {
        self.enabled && self.gate.contains(i)
    }

    /// Run the formula, the c-pixel addition, and record DE ownership.
    #[inline]
    fn run(&self, z: &mut Vec4, aux: &mut AuxState, constant_factor: Vec4) {
        self.formula.apply(z, aux);

        if self.adds_c() {
            *z += aux.c * constant_factor;
        }

        // Last DE-owning entry to run decides the estimate
        let owned = self.formula.info().strategy;
        if owned != DeStrategy::None {
            aux.de_owner = Some(owned);
        }
    }
}

/// Hybrid mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceMode {
    #[default]
    Chained,
    Alternating,
}

/// Ordered formula chain that defines one fractal.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HybridSequence {
    #[serde(default)]
    pub mode: SequenceMode,
    pub entries: Vec<SequenceEntry>,
}

impl HybridSequence {
    pub fn chained(entries: Vec<SequenceEntry>) -> Self {
        Self { mode: SequenceMode::Chained, entries }
    }

    pub fn alternating(entries: Vec<SequenceEntry>) -> Self {
        Self { mode: SequenceMode::Alternating, entries }
    }

    pub fn single(formula: Formula) -> Self {
        Self::chained(vec![SequenceEntry::new(formula)])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply one iteration pass at `aux.i`.
    #[inline]
    pub fn apply_pass(&self, z: &mut Vec4, aux: &mut AuxState, constant_factor: Vec4) {
        match self.mode {
            SequenceMode::Chained => {
                for entry in &self.entries {
                    if entry.is_active(aux.i) {
                        entry.run(z, aux, constant_factor);
                    }
                }
            }
            SequenceMode::Alternating => {
                if let Some(entry) = self.alternating_slot(aux.i) {
                    if entry.gate.contains(aux.i) {
                        entry.run(z, aux, constant_factor);
                    }
                }
            }
        }
    }

    /// Entry that owns iteration `i` in alternating mode.
    ///
    /// Enabled entries take turns, each for `repeat` (min 1) consecutive
    /// iterations; the cycle wraps.
    pub fn alternating_slot(&self, i: u32) -> Option<&SequenceEntry> {
        let cycle: u64 = self
            .entries
            .iter()
            .filter(|e| e.enabled)
            .map(|e| e.repeat.max(1) as u64)
            .sum();
        if cycle == 0 {
            return None;
        }

        let mut pos = i as u64 % cycle;
        for entry in self.entries.iter().filter(|e| e.enabled) {
            let span = entry.repeat.max(1) as u64;
            if pos < span {
                return Some(entry);
            }
            pos -= span;
        }
        None
    }

    /// Entries whose gate can never fire.
    pub fn inert_entries(&self) -> impl Iterator<Item = (usize, &SequenceEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.enabled && e.gate.is_inert())
    }
}
