/// Coordinate-space transforms.
///
/// These own no distance semantics: inside a hybrid chain the estimate comes
/// from whichever DE-owning formula ran last. Several of them still scale
/// `aux.de` / `aux.r_dz` so the owning formula's estimate stays consistent.

use serde::{Deserialize, Serialize};

use super::hybrid::{Gated, IterationGate};
use super::Transform;
use crate::engine::auxiliary::AuxState;
use crate::engine::types::Vec4;
use crate::math::math3d::Rotation;
use crate::math::utils::sign;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Addition constant
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditionConstant {
    pub offset: Vec4,
}

impl Transform for AdditionConstant {
    #[inline]
    fn apply(&self, z: &mut Vec4, _aux: &mut AuxState) {
        *z += self.offset;
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scale
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scale {
    pub scale: f64,
}

impl Default for Scale {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl Transform for Scale {
    #[inline]
    fn apply(&self, z: &mut Vec4, aux: &mut AuxState) {
        *z *= self.scale;
        aux.de *= self.scale.abs();
        aux.r_dz *= self.scale.abs();
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Box fold
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Color weights for per-axis folds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldColor {
    /// Added to `aux.color` for each axis that folded
    pub weights: Vec4,
    /// Multiplies `aux.color` every time the transform runs
    pub decay: f64,
}

impl Default for FoldColor {
    fn default() -> Self {
        Self { weights: Vec4::xyz(0.03, 0.05, 0.07), decay: 1.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxFold {
    pub limit: Vec4,
    pub value: Vec4,
    pub color: FoldColor,
}

impl Default for BoxFold {
    fn default() -> Self {
        Self {
            limit: Vec4::xyz(1.0, 1.0, 1.0),
            value: Vec4::xyz(2.0, 2.0, 2.0),
            color: FoldColor::default(),
        }
    }
}

/// Reflects `v` back inside `[-limit, limit]`; true if it folded.
#[inline(always)]
pub(crate) fn fold_axis(v: &mut f64, limit: f64, value: f64) -> bool {
    if *v > limit {
        *v = value - *v;
        true
    } else if *v < -limit {
        *v = -value - *v;
        true
    } else {
        false
    }
}

impl Transform for BoxFold {
    #[inline]
    fn apply(&self, z: &mut Vec4, aux: &mut AuxState) {
        aux.color *= self.color.decay;
        if fold_axis(&mut z.x, self.limit.x, self.value.x) {
            aux.color += self.color.weights.x;
        }
        if fold_axis(&mut z.y, self.limit.y, self.value.y) {
            aux.color += self.color.weights.y;
        }
        if fold_axis(&mut z.z, self.limit.z, self.value.z) {
            aux.color += self.color.weights.z;
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Spherical fold
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereColor {
    /// Added when the point is inside the minimum radius
    pub inner: f64,
    /// Added when the point is between the minimum and fixed radius
    pub middle: f64,
    /// Added every pass, weighted by the post-fold scale
    pub scale_weight: f64,
    pub decay: f64,
}

impl Default for SphereColor {
    fn default() -> Self {
        Self { inner: 0.2, middle: 0.1, scale_weight: 0.0, decay: 1.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphericalFold {
    pub min_r2: f64,
    pub fixed_r2: f64,
    /// Applied after the fold
    pub scale: f64,
    pub color: SphereColor,
}

impl Default for SphericalFold {
    fn default() -> Self {
        Self { min_r2: 0.25, fixed_r2: 1.0, scale: 1.0, color: SphereColor::default() }
    }
}

impl Transform for SphericalFold {
    #[inline]
    fn apply(&self, z: &mut Vec4, aux: &mut AuxState) {
        aux.color *= self.color.decay;

        let rr = z.dot(z);
        let m = if rr < self.min_r2 {
            aux.color += self.color.inner;
            self.fixed_r2 / self.min_r2
        } else if rr < self.fixed_r2 {
            aux.color += self.color.middle;
            self.fixed_r2 / rr
        } else {
            1.0
        };

        let m = m * self.scale;
        *z *= m;
        aux.de *= m.abs();
        aux.r_dz *= m.abs();
        aux.color += self.color.scale_weight * self.scale;
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sphere inversion (Möbius)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Inversion in a sphere of squared radius `radius2` centred at `-offset`,
/// followed by a translation and a uniform scale.
///
/// Shared by the transform below and by the Abox / Kleinian formulas that
/// embed it as a gated pre-step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereInvert {
    pub offset: Vec4,
    pub radius2: f64,
    pub addition: Vec4,
    pub scale: f64,
    /// Extra factor on the DE update only
    pub de_scale: f64,
}

impl Default for SphereInvert {
    fn default() -> Self {
        Self {
            offset: Vec4::ZERO,
            radius2: 1.0,
            addition: Vec4::ZERO,
            scale: 1.0,
            de_scale: 1.0,
        }
    }
}

impl SphereInvert {
    #[inline]
    pub fn invert(&self, z: &mut Vec4, aux: &mut AuxState) {
        *z += self.offset;
        let rr = z.dot(z);
        let t = self.radius2 / rr;
        *z *= t;
        aux.de *= t;
        *z += self.addition - self.offset;
        *z *= self.scale;
        aux.de *= self.scale * self.de_scale;
    }
}

/// Gated sphere inversion pre-step, off by default, active only on the first
/// iteration unless configured otherwise.
pub fn first_pass_inversion() -> Gated<SphereInvert> {
    Gated::off(IterationGate::new(0, 1), SphereInvert::default())
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereInversion {
    #[serde(flatten)]
    pub invert: SphereInvert,
}

impl Transform for SphereInversion {
    #[inline]
    fn apply(&self, z: &mut Vec4, aux: &mut AuxState) {
        self.invert.invert(z, aux);
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Rotation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationTransform {
    /// Euler angles in degrees
    pub rotation: Rotation,
}

impl Transform for RotationTransform {
    #[inline]
    fn apply(&self, z: &mut Vec4, _aux: &mut AuxState) {
        *z = self.rotation.rotate(z);
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Add c-pixel with axis swap
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSwap {
    #[default]
    Xy,
    Xz,
    Yz,
}

/// Permutes the per-sample constant into `aux.c` and adds it.
///
/// Later c-pixel additions in the same chain pick up the permuted copy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddCpixelAxisSwap {
    pub swap: AxisSwap,
    pub multiplier: Vec4,
}

impl Default for AddCpixelAxisSwap {
    fn default() -> Self {
        Self { swap: AxisSwap::Xy, multiplier: Vec4::ONE }
    }
}

impl Transform for AddCpixelAxisSwap {
    #[inline]
    fn apply(&self, z: &mut Vec4, aux: &mut AuxState) {
        let c = aux.const_c;
        let swapped = match self.swap {
            AxisSwap::Xy => Vec4::new(c.y, c.x, c.z, c.w),
            AxisSwap::Xz => Vec4::new(c.z, c.y, c.x, c.w),
            AxisSwap::Yz => Vec4::new(c.x, c.z, c.y, c.w),
        };
        aux.c = swapped;
        *z += swapped * self.multiplier;
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DarkBeam fold V2: pseudo Mandalay fold by DarkBeam, adapted by Knighty
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-axis switches that start set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisFlags {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl Default for AxisFlags {
    fn default() -> Self {
        Self { x: true, y: true, z: true }
    }
}

/// Per-axis switches that start cleared; the step does nothing until an
/// axis is picked.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisSelection {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DarkbeamFoldV2 {
    /// Per-axis abs; when inactive every axis is folded
    pub partial_abs: Gated<AxisFlags>,
    pub fold: Vec4,
    pub g: Vec4,
    pub h: Vec4,
    /// Feed each axis pass from the previous pass instead of the input
    pub sequential: bool,
}

impl Default for DarkbeamFoldV2 {
    fn default() -> Self {
        Self {
            partial_abs: Gated::off(IterationGate::ALWAYS, AxisFlags::default()),
            fold: Vec4::xyz(0.5, 0.5, 0.5),
            g: Vec4::ZERO,
            h: Vec4::ZERO,
            sequential: false,
        }
    }
}

/// One axis of the DarkBeam fold; `a` is the folded axis, `b`/`c` the others.
#[inline(always)]
fn darkbeam_axis(a: f64, b: f64, fo: f64, g: f64, h: f64) -> f64 {
    let t1 = a - 2.0 * fo;
    let t2 = b - 4.0 * fo;
    let v = ((t1 + fo).abs() - fo).max(t2);
    let v1 = (t1 - g).max(b - h);
    let v1 = v1.max(-a.abs());
    v.min(v1).min(a)
}

impl Transform for DarkbeamFoldV2 {
    fn apply(&self, z: &mut Vec4, aux: &mut AuxState) {
        let sign_x = sign(z.x);
        let sign_y = sign(z.y);
        let sign_z = sign(z.z);

        if let Some(axes) = self.partial_abs.active(aux.i) {
            if axes.x { z.x = z.x.abs(); }
            if axes.y { z.y = z.y.abs(); }
            if axes.z { z.z = z.z.abs(); }
        } else {
            *z = z.abs();
        }

        let fo = self.fold;
        let g = self.g;
        let h = self.h;
        let mut p = *z;
        let mut q = *z;

        if p.z > p.y { std::mem::swap(&mut p.y, &mut p.z); }
        q.x = darkbeam_axis(p.x, p.y, fo.x, g.x, h.y);

        p = if self.sequential { q } else { *z };
        if p.x > p.z { std::mem::swap(&mut p.z, &mut p.x); }
        q.y = darkbeam_axis(p.y, p.z, fo.y, g.y, h.z);

        p = if self.sequential { q } else { *z };
        if p.y > p.x { std::mem::swap(&mut p.x, &mut p.y); }
        q.z = darkbeam_axis(p.z, p.x, fo.z, g.z, h.x);

        *z = q;
        z.x *= sign_x;
        z.y *= sign_y;
        z.z *= sign_z;
    }
}
