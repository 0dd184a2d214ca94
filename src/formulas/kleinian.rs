/// JosLeys-Kleinian V3: Kleinian group limit set with polyfold and trig
/// pre-steps.
///
/// The formula writes its own distance into `aux.dist` every pass and is
/// read out with the analytic-custom strategy.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::hybrid::{Gated, IterationGate};
use super::transforms::{AxisFlags, SphereInvert};
use super::Transform;
use crate::engine::auxiliary::AuxState;
use crate::engine::types::Vec4;
use crate::math::utils::{poly_fold, sign};

/// Angular folds around the three coordinate planes, each with its own order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolyFold {
    pub abs_axes: AxisFlags,
    pub xy_order: Option<u32>,
    pub yz_order: Option<u32>,
    pub zx_order: Option<u32>,
    pub offset: Vec4,
}

impl Default for PolyFold {
    fn default() -> Self {
        Self {
            abs_axes: AxisFlags::default(),
            xy_order: Some(8),
            yz_order: None,
            zx_order: None,
            offset: Vec4::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrigFn {
    /// Axis collapses to zero
    Off,
    #[default]
    Sin,
    Cos,
}

impl TrigFn {
    #[inline(always)]
    fn eval(self, v: f64) -> f64 {
        match self {
            TrigFn::Off => 0.0,
            TrigFn::Sin => v.sin(),
            TrigFn::Cos => v.cos(),
        }
    }
}

/// Replaces each axis with a trig function of its scaled value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrigStep {
    pub multiplier: Vec4,
    pub functions: [TrigFn; 3],
    pub scale: f64,
    /// Divide each axis by `|old| + 1` (scale applied a second time)
    pub damp: bool,
}

impl Default for TrigStep {
    fn default() -> Self {
        Self {
            multiplier: Vec4::xyz(1.0, 1.0, 1.0),
            functions: [TrigFn::Sin; 3],
            scale: 1.0,
            damp: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZFold {
    pub offset: f64,
    pub scale: f64,
}

impl Default for ZFold {
    fn default() -> Self {
        Self { offset: 1.0, scale: 0.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JosKleinianV3 {
    pub poly_fold: Gated<PolyFold>,
    pub sphere_inversion: Gated<SphereInvert>,
    /// Has its own enable flag and gate; it is not switched together with
    /// the yz polyfold
    pub trig: Gated<TrigStep>,
    /// Sort so that x >= z
    pub swap_xz: bool,
    pub swap_gate: IterationGate,
    /// Height of the fundamental domain (`a` in the Kleinian map)
    pub fold_value: f64,
    /// Twist of the fundamental domain (`b` in the Kleinian map)
    pub offset: f64,
    pub box_size: Vec4,
    pub kleinian_gate: IterationGate,
    pub z_fold: Gated<ZFold>,
    /// Also bound the distance from the top of the domain (on by default)
    pub spheres: bool,
    pub dist_clamp: f64,
    pub de_floor: f64,
}

impl Default for JosKleinianV3 {
    fn default() -> Self {
        let first = IterationGate::new(0, 1);
        Self {
            poly_fold: Gated::off(first, PolyFold::default()),
            sphere_inversion: Gated::off(first, SphereInvert::default()),
            trig: Gated::off(first, TrigStep::default()),
            swap_xz: false,
            swap_gate: IterationGate::ALWAYS,
            fold_value: 2.0,
            offset: 0.0,
            box_size: Vec4::xyz(1.0, 1.0, 1.0),
            kleinian_gate: IterationGate::ALWAYS,
            z_fold: Gated::off(IterationGate::ALWAYS, ZFold::default()),
            spheres: true,
            dist_clamp: 0.05,
            de_floor: 1.0,
        }
    }
}

impl JosKleinianV3 {
    #[inline]
    fn wrap(&self, z: &mut Vec4) {
        let a = self.fold_value;
        let bs = self.box_size;
        z.x += bs.x;
        z.y += bs.y;
        z.x = z.x - 2.0 * bs.x * (z.x / 2.0 * bs.x).floor() - bs.x;
        z.y = z.y - 2.0 * bs.y * (z.y / 2.0 * bs.y).floor() - bs.y;
        z.z += bs.z - 1.0;
        z.z = z.z - a * bs.z * (z.z / a * bs.z).floor();
        z.z -= bs.z - 1.0;
    }
}

impl Transform for JosKleinianV3 {
    fn apply(&self, z: &mut Vec4, aux: &mut AuxState) {
        let i = aux.i;

        if let Some(poly) = self.poly_fold.active(i) {
            if poly.abs_axes.x { z.x = z.x.abs(); }
            if poly.abs_axes.y { z.y = z.y.abs(); }
            if poly.abs_axes.z { z.z = z.z.abs(); }
            if let Some(order) = poly.xy_order {
                (z.x, z.y) = poly_fold(z.x, z.y, order as f64);
            }
            if let Some(order) = poly.yz_order {
                (z.y, z.z) = poly_fold(z.y, z.z, order as f64);
            }
            if let Some(order) = poly.zx_order {
                (z.z, z.x) = poly_fold(z.z, z.x, order as f64);
            }
            *z += poly.offset;
        }

        if let Some(inversion) = self.sphere_inversion.active(i) {
            inversion.invert(z, aux);
        }

        if let Some(trig) = self.trig.active(i) {
            let old = *z;
            let scaled = *z * trig.multiplier;
            let [fx, fy, fz] = trig.functions;
            *z = Vec4::new(fx.eval(scaled.x), fy.eval(scaled.y), fz.eval(scaled.z), 0.0) * trig.scale;
            if trig.damp {
                z.x = z.x * trig.scale / (old.x.abs() + 1.0);
                z.y = z.y * trig.scale / (old.y.abs() + 1.0);
                z.z = z.z * trig.scale / (old.z.abs() + 1.0);
            }
        }

        if self.swap_xz && self.swap_gate.contains(i) && z.z > z.x {
            std::mem::swap(&mut z.x, &mut z.z);
        }

        let a = self.fold_value;
        let b = self.offset;

        if self.kleinian_gate.contains(i) {
            let f = sign(b);
            self.wrap(z);

            if z.z >= a * (0.5 + 0.2 * (f * PI * (z.x + b * 0.5) / self.box_size.x).sin()) {
                z.x = -z.x - b;
                z.z = -z.z + a;
            }

            let rr = z.dot(z);
            let trap = Vec4::new(z.x, z.y, z.z, rr).length();
            aux.color = aux.color.min(trap);

            // invert and mirror
            let ir = 1.0 / rr;
            *z *= -ir;
            z.x = -z.x - b;
            z.z += a;

            aux.de *= ir.abs();
        }

        if let Some(fold) = self.z_fold.active(i) {
            z.z = sign(z.z) * (fold.offset - z.z.abs() + z.z.abs() * fold.scale);
        }

        let z_top = if self.spheres { z.z.min(a - z.z) } else { z.z };
        aux.dist = z_top.min(self.dist_clamp) / aux.de.max(self.de_floor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aux() -> AuxState {
        AuxState::new(Vec4::ZERO, 2.0)
    }

    #[test]
    fn test_kleinian_step() {
        let mut z = Vec4::xyz(0.5, 0.5, 0.5);
        let mut a = aux();
        JosKleinianV3::default().apply(&mut z, &mut a);

        assert!((z.x - 2.0 / 3.0).abs() < 1e-12);
        assert!((z.y + 2.0 / 3.0).abs() < 1e-12);
        assert!((z.z - 4.0 / 3.0).abs() < 1e-12);
        assert!((a.de - 4.0 / 3.0).abs() < 1e-12);
        assert!((a.dist - 0.0375).abs() < 1e-12);
        // trap |(x, y, z, rr)| exceeds the seed
        assert_eq!(a.color, 1.0);
    }

    #[test]
    fn test_kleinian_orbit_trap_takes_minimum() {
        let mut z = Vec4::xyz(0.1, 0.0, 0.1);
        let mut a = aux();
        JosKleinianV3::default().apply(&mut z, &mut a);
        assert!(a.color < 0.15);
    }

    #[test]
    fn test_kleinian_gate_off_still_writes_dist() {
        let k = JosKleinianV3 { kleinian_gate: IterationGate::new(3, 3), ..Default::default() };
        let mut z = Vec4::xyz(0.2, 0.0, 0.02);
        let mut a = aux();
        k.apply(&mut z, &mut a);
        assert_eq!(z, Vec4::xyz(0.2, 0.0, 0.02));
        assert!((a.dist - 0.02).abs() < 1e-15);
    }

    #[test]
    fn test_swap_xz_sorts() {
        let k = JosKleinianV3 {
            swap_xz: true,
            kleinian_gate: IterationGate::new(0, 0),
            ..Default::default()
        };
        let mut z = Vec4::xyz(0.1, 0.0, 0.3);
        let mut a = aux();
        k.apply(&mut z, &mut a);
        assert_eq!(z, Vec4::xyz(0.3, 0.0, 0.1));
    }

    #[test]
    fn test_trig_step_collapses_off_axes() {
        let mut k = JosKleinianV3 { kleinian_gate: IterationGate::new(0, 0), ..Default::default() };
        k.trig.enabled = true;
        k.trig.params.functions = [TrigFn::Sin, TrigFn::Off, TrigFn::Cos];
        let mut z = Vec4::xyz(0.0, 5.0, 0.0);
        let mut a = aux();
        k.apply(&mut z, &mut a);
        assert_eq!(z, Vec4::xyz(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_spheres_bound_distance_from_top_by_default() {
        assert!(JosKleinianV3::default().spheres);

        let near_top = |spheres: bool| {
            let k = JosKleinianV3 { spheres, kleinian_gate: IterationGate::new(0, 0), ..Default::default() };
            let mut z = Vec4::xyz(0.0, 0.0, 1.99);
            let mut a = aux();
            k.apply(&mut z, &mut a);
            a.dist
        };
        // fold_value 2: the top of the domain is 0.01 away
        assert!((near_top(true) - 0.01).abs() < 1e-12);
        assert_eq!(near_top(false), 0.05);
    }
}
