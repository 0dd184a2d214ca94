/// Fold family: Mandelbox and its Abox / Amazing Surf descendants, plus the
/// Menger sponge IFS.
///
/// All of these scale `aux.de` and are read out with the linear estimate.

use serde::{Deserialize, Serialize};

use super::hybrid::{Gated, IterationGate};
use super::transforms::{
    first_pass_inversion, fold_axis, AdditionConstant, AxisSelection, FoldColor, RotationTransform,
    SphereColor, SphereInvert,
};
use super::Transform;
use crate::engine::auxiliary::AuxState;
use crate::engine::types::Vec4;
use crate::math::math3d::Rotation;
use crate::math::utils::{box_fold, sign, smooth_condition_a_greater_b, smooth_condition_a_less_b};

#[inline(always)]
fn box_fold_xyz(z: &mut Vec4, limit: &Vec4) {
    z.x = box_fold(z.x, limit.x);
    z.y = box_fold(z.y, limit.y);
    z.z = box_fold(z.z, limit.z);
}

/// Drift of the Abox varying scale between iterations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleVary {
    pub vary: f64,
    pub base: f64,
}

impl Default for ScaleVary {
    fn default() -> Self {
        Self { vary: 0.0, base: 1.0 }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Mandelbox: box fold, sphere fold, scale
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mandelbox {
    pub scale: f64,
    pub fold_limit: f64,
    pub min_r2: f64,
    pub fixed_r2: f64,
    pub box_color: FoldColor,
    pub sphere_color: SphereColor,
}

impl Default for Mandelbox {
    fn default() -> Self {
        Self {
            scale: 2.0,
            fold_limit: 1.0,
            min_r2: 0.25,
            fixed_r2: 1.0,
            box_color: FoldColor::default(),
            sphere_color: SphereColor::default(),
        }
    }
}

impl Transform for Mandelbox {
    #[inline]
    fn apply(&self, z: &mut Vec4, aux: &mut AuxState) {
        aux.color *= self.box_color.decay;

        // Box fold
        let fl = self.fold_limit;
        let w = self.box_color.weights;
        if fold_axis(&mut z.x, fl, 2.0 * fl) { aux.color += w.x; }
        if fold_axis(&mut z.y, fl, 2.0 * fl) { aux.color += w.y; }
        if fold_axis(&mut z.z, fl, 2.0 * fl) { aux.color += w.z; }

        // Sphere fold
        let r_sqr = z.dot(z);
        let factor = if r_sqr < self.min_r2 {
            aux.color += self.sphere_color.inner;
            self.fixed_r2 / self.min_r2
        } else if r_sqr < self.fixed_r2 {
            aux.color += self.sphere_color.middle;
            self.fixed_r2 / r_sqr
        } else {
            1.0
        };

        let m = factor * self.scale;
        *z *= m;
        aux.de = aux.de * m.abs() + 1.0;
        aux.color += self.sphere_color.scale_weight * self.scale;
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Abox - Klein: box fold with a division-based sphere scale, box tail
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Plain box fold + scale that takes over once the main fold stops.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailFold {
    pub limit: Vec4,
    pub scale: f64,
    pub offset: Vec4,
}

impl Default for TailFold {
    fn default() -> Self {
        Self { limit: Vec4::xyz(1.0, 1.0, 0.0), scale: 2.0, offset: Vec4::ZERO }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AboxKlein {
    pub sphere_inversion: Gated<SphereInvert>,
    /// The main fold runs for `i < fold_stop`, the tail fold after
    pub fold_stop: u32,
    pub fold_limit: Vec4,
    pub swap_xy: bool,
    pub min_r2: f64,
    pub scale: f64,
    pub de_offset: f64,
    pub scale_vary: Option<ScaleVary>,
    pub rotation: Option<Rotation>,
    pub offset: Vec4,
    /// Per-axis weights on the fold overshoot; `w` weighs the scale
    pub fold_color: Option<Vec4>,
    pub tail_fold: Option<TailFold>,
}

impl Default for AboxKlein {
    fn default() -> Self {
        Self {
            sphere_inversion: first_pass_inversion(),
            fold_stop: 15,
            fold_limit: Vec4::xyz(1.0, 1.0, 1.0),
            swap_xy: false,
            min_r2: 0.0,
            scale: 1.0,
            de_offset: 1.0,
            scale_vary: None,
            rotation: None,
            offset: Vec4::ZERO,
            fold_color: None,
            tail_fold: Some(TailFold::default()),
        }
    }
}

impl Transform for AboxKlein {
    fn apply(&self, z: &mut Vec4, aux: &mut AuxState) {
        if let Some(inversion) = self.sphere_inversion.active(aux.i) {
            inversion.invert(z, aux);
        }

        if aux.i < self.fold_stop {
            let old = *z;
            box_fold_xyz(z, &self.fold_limit);
            if self.swap_xy {
                std::mem::swap(&mut z.x, &mut z.y);
            }
            let folded = *z;

            let rr = z.dot(z);
            let dividend = if rr < self.min_r2 { self.min_r2 } else { rr.min(1.0) };
            let use_scale = (aux.actual_scale_a + self.scale) / dividend;
            *z *= use_scale;
            aux.de = aux.de * use_scale.abs() + self.de_offset;

            if let Some(v) = &self.scale_vary {
                aux.actual_scale_a -= v.vary * (aux.actual_scale_a.abs() - v.base);
            }

            if let Some(rotation) = &self.rotation {
                *z = rotation.rotate(z);
            }
            *z += self.offset;

            if let Some(w) = &self.fold_color {
                let l = self.fold_limit;
                let mut color_add = 0.0;
                if folded.x != old.x { color_add += w.x * (folded.x.abs() - l.x); }
                if folded.y != old.y { color_add += w.y * (folded.y.abs() - l.y); }
                if folded.z != old.z { color_add += w.z * (folded.z.abs() - l.z); }
                color_add += w.w * use_scale;
                aux.color += color_add;
            }
        } else if let Some(tail) = &self.tail_fold {
            box_fold_xyz(z, &tail.limit);
            *z *= tail.scale;
            aux.de *= tail.scale;
            *z += tail.offset;
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Abox - Smooth: Mandelbox with logistic-blended folds
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Pulls axes beyond twice the limit back with a logistic blend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClampFold {
    /// Blend sharpness, also applied as a post-scale
    pub scale: f64,
}

impl Default for ClampFold {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothBoxFold {
    pub sharpness: f64,
    /// x and y blend their lower reflection from the upper one
    pub sequential: bool,
}

impl Default for SmoothBoxFold {
    fn default() -> Self {
        Self { sharpness: 3.0, sequential: false }
    }
}

/// Quadratic soft fold near the box walls.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftFold {
    pub strength: Vec4,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereRadii {
    pub min_r2: f64,
    pub max_r2: f64,
}

impl Default for SphereRadii {
    fn default() -> Self {
        Self { min_r2: 0.25, max_r2: 1.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothSphereFold {
    pub inner_sharpness: f64,
    pub outer_sharpness: f64,
    /// Iterations that also blend the outer (fixed radius) shell
    pub outer_gate: IterationGate,
}

impl Default for SmoothSphereFold {
    fn default() -> Self {
        Self {
            inner_sharpness: 3.0,
            outer_sharpness: 3.0,
            outer_gate: IterationGate::ALWAYS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpixelAdd {
    pub multiplier: Vec4,
}

impl Default for CpixelAdd {
    fn default() -> Self {
        Self { multiplier: Vec4::ONE }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AboxSmoothColor {
    /// x, y, z weigh the fold displacement; w weighs the hard sphere overshoot
    pub weights: Vec4,
    pub gate: IterationGate,
    /// Weighs the hard sphere fold factor
    pub sphere_weight: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AboxSmooth {
    pub sphere_inversion: Gated<SphereInvert>,
    pub limit: Vec4,
    /// Fold the z axis too; off gives a 2D fold
    pub fold_z: bool,
    pub clamp_fold: Gated<ClampFold>,
    pub smooth_fold: Gated<SmoothBoxFold>,
    pub box_fold: IterationGate,
    pub soft_fold: Gated<SoftFold>,
    pub offset: Gated<AdditionConstant>,
    /// Shared by the hard and smooth sphere folds and the overshoot color
    pub radii: SphereRadii,
    /// Hard sphere fold
    pub sphere_fold: bool,
    pub sphere_fold_gate: IterationGate,
    pub smooth_sphere_fold: Gated<SmoothSphereFold>,
    pub scale: f64,
    pub scale_gate: IterationGate,
    pub de_offset: f64,
    pub scale_vary: Option<ScaleVary>,
    pub rotation: Gated<RotationTransform>,
    pub add_cpixel: Gated<CpixelAdd>,
    pub addition: Gated<AdditionConstant>,
    pub post_rotation: Gated<RotationTransform>,
    pub fold_color: Option<AboxSmoothColor>,
}

impl Default for AboxSmooth {
    fn default() -> Self {
        let always = IterationGate::ALWAYS;
        Self {
            sphere_inversion: first_pass_inversion(),
            limit: Vec4::xyz(1.0, 1.0, 1.0),
            fold_z: true,
            clamp_fold: Gated::off(always, ClampFold::default()),
            smooth_fold: Gated::off(always, SmoothBoxFold::default()),
            box_fold: always,
            soft_fold: Gated::off(IterationGate::new(0, 1), SoftFold::default()),
            offset: Gated::on(always, AdditionConstant::default()),
            radii: SphereRadii::default(),
            sphere_fold: false,
            sphere_fold_gate: always,
            smooth_sphere_fold: Gated::on(always, SmoothSphereFold::default()),
            scale: 2.0,
            scale_gate: always,
            de_offset: 1.0,
            scale_vary: None,
            rotation: Gated::off(always, RotationTransform::default()),
            add_cpixel: Gated::off(always, CpixelAdd::default()),
            addition: Gated::on(always, AdditionConstant::default()),
            post_rotation: Gated::on(always, RotationTransform::default()),
            fold_color: None,
        }
    }
}

#[inline(always)]
fn clamp_axis(v: &mut f64, limit: f64, sharpness: f64) {
    if v.abs() > 2.0 * limit {
        let s = sign(*v);
        let a = v.abs();
        let k = smooth_condition_a_greater_b(a, limit, sharpness);
        *v = (a * (1.0 - k) + (2.0 * limit - a) * k) * s;
    }
}

#[inline(always)]
fn smooth_fold_axis(v: f64, limit: f64, sharpness: f64, sequential: bool) -> f64 {
    let k_hi = smooth_condition_a_greater_b(v, limit, sharpness);
    let k_lo = smooth_condition_a_less_b(v, -limit, sharpness);
    let hi = v * (1.0 - k_hi) + (2.0 * limit - v) * k_hi;
    let base = if sequential { hi } else { v };
    base * (1.0 - k_lo) + (-2.0 * limit - base) * k_lo
}

#[inline(always)]
fn soft_fold_amount(v: f64, limit: f64) -> f64 {
    let length = 2.0 * limit;
    let a = v.abs();
    if a < limit {
        v * v / length
    } else if a > limit && a < length {
        (length - a) * (length - a) / length
    } else {
        0.0
    }
}

impl Transform for AboxSmooth {
    fn apply(&self, z: &mut Vec4, aux: &mut AuxState) {
        let c = aux.const_c;
        let i = aux.i;
        let l = self.limit;

        if let Some(inversion) = self.sphere_inversion.active(i) {
            inversion.invert(z, aux);
        }

        let old = *z;

        if let Some(clamp) = self.clamp_fold.active(i) {
            clamp_axis(&mut z.x, l.x, clamp.scale);
            clamp_axis(&mut z.y, l.y, clamp.scale);
            if self.fold_z {
                clamp_axis(&mut z.z, l.z, clamp.scale);
            }
            *z *= clamp.scale;
            aux.de *= clamp.scale;
        }

        if let Some(smooth) = self.smooth_fold.active(i) {
            let sm = smooth.sharpness;
            z.x = smooth_fold_axis(z.x, l.x, sm, smooth.sequential);
            z.y = smooth_fold_axis(z.y, l.y, sm, smooth.sequential);
            if self.fold_z {
                // z always blends its lower reflection from the upper one
                let k_hi = smooth_condition_a_greater_b(z.z, l.z, sm);
                let k_lo = smooth_condition_a_less_b(z.z, -l.z, sm);
                let hi = z.z * (1.0 - k_hi) + (2.0 * l.z - z.z) * k_hi;
                z.z = hi * (1.0 - k_lo) + (-2.0 * l.z - hi) * k_lo;
            }
        }

        if self.box_fold.contains(i) {
            z.x = box_fold(z.x, l.x);
            z.y = box_fold(z.y, l.y);
            if self.fold_z {
                z.z = box_fold(z.z, l.z);
            }
        }

        if let Some(soft) = self.soft_fold.active(i) {
            let s = soft.strength;
            z.x -= sign(z.x) * soft_fold_amount(z.x, l.x) * s.x;
            z.y -= sign(z.y) * soft_fold_amount(z.y, l.y) * s.y;
            z.z -= sign(z.z) * soft_fold_amount(z.z, l.z) * s.z;
        }

        let folded = *z;

        if let Some(add) = self.offset.active(i) {
            *z += add.offset;
        }

        let mut rr_col = 0.0;
        let mut m = 1.0;
        let SphereRadii { min_r2, max_r2 } = self.radii;
        if self.sphere_fold && self.sphere_fold_gate.contains(i) {
            let rr = z.dot(z);
            rr_col = rr;
            if rr < min_r2 {
                m = max_r2 / min_r2;
            } else if rr < max_r2 {
                m = max_r2 / rr;
            }
            *z *= m;
            aux.de *= m;
        }

        if let Some(smooth) = self.smooth_sphere_fold.active(i) {
            let rr = z.dot(z);
            let rk1 = smooth_condition_a_less_b(rr, min_r2, smooth.inner_sharpness);
            let sm1 = (max_r2 / min_r2) * rk1 + (1.0 - rk1);
            *z *= sm1;
            aux.de *= sm1;

            if smooth.outer_gate.contains(i) {
                let rk2 = smooth_condition_a_less_b(rr, max_r2, smooth.outer_sharpness);
                let rk21 = (1.0 - rk1) * rk2;
                let sm2 = (1.0 - rk21) + max_r2 / rr * rk21;
                *z *= sm2;
                aux.de *= sm2;
            }
        }

        if self.scale_gate.contains(i) {
            let use_scale = aux.actual_scale_a + self.scale;
            *z *= use_scale;
            aux.de = aux.de * use_scale.abs() + self.de_offset;
            if let Some(v) = &self.scale_vary {
                aux.actual_scale_a = -(v.vary * (aux.actual_scale_a.abs() - v.base));
            }
        }

        if let Some(rot) = self.rotation.active(i) {
            *z = rot.rotation.rotate(z);
        }
        if let Some(cp) = self.add_cpixel.active(i) {
            *z += c * cp.multiplier;
        }
        if let Some(add) = self.addition.active(i) {
            *z += add.offset;
        }
        if let Some(rot) = self.post_rotation.active(i) {
            *z = rot.rotation.rotate(z);
        }

        if let Some(col) = &self.fold_color {
            let w = col.weights;
            let mut color_add = 0.0;
            if col.gate.contains(i) {
                let d = (folded - old).abs();
                if d.x > 0.0 { color_add += w.x * d.x; }
                if d.y > 0.0 { color_add += w.y * d.y; }
                if d.z > 0.0 { color_add += w.z * d.z; }
            }
            if rr_col > max_r2 {
                color_add += w.w * (rr_col - max_r2) / 100.0;
            }
            color_add += col.sphere_weight * m;
            aux.color += color_add;
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Amazing Surf M3D: xy box fold, varying-scale sphere fold, degree rotations
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmazingSurfColor {
    /// x, y weigh the fold displacement, z weighs |z.z|, w the sphere factor
    pub weights: Vec4,
    pub gate: IterationGate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmazingSurfM3d {
    /// Axis negation pre-step. Enabling it also switches the sphere fold to
    /// the plain radius instead of the squared one, on every iteration.
    pub invert: Gated<AxisSelection>,
    pub scale: f64,
    pub scale_vary: f64,
    pub fold_limit: Vec4,
    pub min_r2: f64,
    pub de_offset: f64,
    pub add_cpixel: bool,
    pub cpixel_multiplier: Vec4,
    pub offset: Vec4,
    /// Applied about z, then y, then x (degrees)
    pub rotation_deg: [f64; 3],
    pub fold_color: Option<AmazingSurfColor>,
}

impl Default for AmazingSurfM3d {
    fn default() -> Self {
        Self {
            invert: Gated::off(IterationGate::ALWAYS, AxisSelection::default()),
            scale: 1.5,
            scale_vary: 0.0,
            fold_limit: Vec4::xyz(1.0, 1.0, 1.0),
            min_r2: 0.25,
            de_offset: 1.0,
            add_cpixel: true,
            cpixel_multiplier: Vec4::ONE,
            offset: Vec4::ZERO,
            rotation_deg: [0.0; 3],
            fold_color: None,
        }
    }
}

#[inline(always)]
fn rotate_plane(a: &mut f64, b: &mut f64, degrees: f64) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let t = *a;
    *a = *a * cos - *b * sin;
    *b = t * sin + *b * cos;
}

impl Transform for AmazingSurfM3d {
    fn apply(&self, z: &mut Vec4, aux: &mut AuxState) {
        if let Some(axes) = self.invert.active(aux.i) {
            if axes.x { z.x = -z.x; }
            if axes.y { z.y = -z.y; }
            if axes.z { z.z = -z.z; }
        }

        aux.actual_scale = self.scale + self.scale_vary * (aux.actual_scale.abs() - 1.0);

        let old = *z;
        z.x = box_fold(z.x, self.fold_limit.x);
        z.y = box_fold(z.y, self.fold_limit.y);
        let folded = *z;

        let rr = if self.invert.enabled {
            (z.x * z.x + z.y * z.y + z.z * z.z).sqrt()
        } else {
            z.dot(z)
        };

        let mut m = aux.actual_scale;
        if rr < self.min_r2 {
            m /= self.min_r2;
        } else if rr < 1.0 {
            m /= rr;
        }
        *z *= m;
        aux.de = aux.de * m.abs() + self.de_offset;

        if self.add_cpixel {
            *z += aux.const_c * self.cpixel_multiplier;
        }
        *z += self.offset;

        let [rx, ry, rz] = self.rotation_deg;
        rotate_plane(&mut z.x, &mut z.y, rz);
        rotate_plane(&mut z.z, &mut z.x, ry);
        rotate_plane(&mut z.y, &mut z.z, rx);

        if let Some(col) = &self.fold_color {
            if col.gate.contains(aux.i) {
                let w = col.weights;
                let d = (folded - old).abs();
                let mut color_add = 0.0;
                if d.x > 0.0 { color_add += w.x * d.x; }
                if d.y > 0.0 { color_add += w.y * d.y; }
                color_add += w.z * z.z.abs();
                color_add += w.w * m;
                aux.color += color_add;
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Menger Sponge: sorted abs fold, scale, corner offset
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MengerSponge {
    pub scale: f64,
    pub offset: Vec4,
}

impl Default for MengerSponge {
    fn default() -> Self {
        Self { scale: 3.0, offset: Vec4::xyz(1.0, 1.0, 1.0) }
    }
}

impl Transform for MengerSponge {
    #[inline]
    fn apply(&self, z: &mut Vec4, aux: &mut AuxState) {
        z.x = z.x.abs();
        z.y = z.y.abs();
        z.z = z.z.abs();

        if z.x < z.y { std::mem::swap(&mut z.x, &mut z.y); }
        if z.x < z.z { std::mem::swap(&mut z.x, &mut z.z); }
        if z.y < z.z { std::mem::swap(&mut z.y, &mut z.z); }

        *z *= self.scale;
        let shift = self.offset * (self.scale - 1.0);
        z.x -= shift.x;
        z.y -= shift.y;
        if z.z > 0.5 * shift.z {
            z.z -= shift.z;
        }

        aux.de *= self.scale.abs();
    }
}
