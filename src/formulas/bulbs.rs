/// Power-bulb family: trigonometric Mandelbulb, 4D quaternion square and
/// the Newton z^3 + 1 bulb.
///
/// These track the logarithmic derivative in `aux.r_dz` (Newton tracks
/// `aux.de`, its native estimate is the Delta strategy).

use serde::{Deserialize, Serialize};

use super::transforms::AxisSelection;
use super::Transform;
use crate::engine::auxiliary::AuxState;
use crate::engine::types::Vec4;
use crate::math::math3d::Quaternion as Quat;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Mandelbulb: arbitrary power, asin latitude form
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mandelbulb {
    pub power: f64,
    /// Added to the azimuth before raising to the power (radians)
    pub alpha_offset: f64,
    /// Added to the latitude before raising to the power (radians)
    pub beta_offset: f64,
}

impl Default for Mandelbulb {
    fn default() -> Self {
        Self { power: 8.0, alpha_offset: 0.0, beta_offset: 0.0 }
    }
}

impl Transform for Mandelbulb {
    #[inline]
    fn apply(&self, z: &mut Vec4, aux: &mut AuxState) {
        if aux.r < 1e-21 {
            aux.r = 1e-21;
        }
        let th0 = (z.z / aux.r).asin() + self.beta_offset;
        let ph0 = z.y.atan2(z.x) + self.alpha_offset;

        let mut rp = aux.r.powf(self.power - 1.0);
        let th = th0 * self.power;
        let ph = ph0 * self.power;
        let costh = th.cos();

        aux.r_dz = rp * aux.r_dz * self.power + 1.0;
        rp *= aux.r;

        *z = Vec4::new(costh * ph.cos() * rp, costh * ph.sin() * rp, th.sin() * rp, z.w);
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Quaternion: q² in 4D, (x, y, z, w) read as (a, b, c, d)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quaternion {}

impl Transform for Quaternion {
    #[inline]
    fn apply(&self, z: &mut Vec4, aux: &mut AuxState) {
        aux.r_dz = aux.r_dz * 2.0 * aux.r;
        let q = Quat::from_vec4(z);
        *z = q.mul(&q).to_vec4();
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Newton Pow3: Newton's method for z³ + 1 = 0, remapped to a diverging orbit
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Affine tweak applied to `aux.de` after the main step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticDe {
    pub scale: f64,
    pub offset: f64,
}

impl Default for AnalyticDe {
    fn default() -> Self {
        Self { scale: 1.0, offset: 1.0 }
    }
}

/// Writes a logarithmic estimate into `aux.dist` every pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistOutput {
    /// Shifts the radius origin along x
    pub shift: f64,
    /// Replace `aux.dist` instead of keeping the running minimum
    pub overwrite: bool,
}

impl Default for DistOutput {
    fn default() -> Self {
        Self { shift: 1.0, overwrite: false }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonPow3 {
    pub abs_axes: Option<AxisSelection>,
    /// Scale of the diverging-to-converging remap
    pub pre_scale: f64,
    /// Scale of the converging-to-diverging remap
    pub post_scale: f64,
    /// Per-formula translation, the hybrid-local equivalent of a Julia constant
    pub offset: Vec4,
    pub analytic_de: Option<AnalyticDe>,
    pub dist_output: Option<DistOutput>,
}

impl Default for NewtonPow3 {
    fn default() -> Self {
        Self {
            abs_axes: None,
            pre_scale: 1.0,
            post_scale: 1.0,
            offset: Vec4::ZERO,
            analytic_de: None,
            dist_output: None,
        }
    }
}

const NEWTON_STEP: f64 = 0.6666666666;

impl Transform for NewtonPow3 {
    fn apply(&self, z: &mut Vec4, aux: &mut AuxState) {
        if let Some(axes) = &self.abs_axes {
            if axes.x { z.x = z.x.abs(); }
            if axes.y { z.y = z.y.abs(); }
            if axes.z { z.z = z.z.abs(); }
        }

        // diverging orbit -> converging Newton orbit
        let sq_r = self.pre_scale / (aux.r * aux.r);
        z.x = z.x * sq_r + 1.0;
        z.y = -z.y * sq_r;
        z.z = -z.z * sq_r;

        // z(n+1) = 2/3 z(n) - 1/3 z(n)^-2
        let tp = *z * *z;
        let sq_r = tp.x + tp.y + tp.z;
        let sq_r = 1.0 / (3.0 * sq_r * sq_r);
        let r_xy = tp.x + tp.y;
        let h1 = 1.0 - tp.z / r_xy;

        let inv = Vec4::new(
            -(h1 * (tp.x - tp.y) * sq_r),
            2.0 * h1 * z.x * z.y * sq_r,
            2.0 * z.z * r_xy.sqrt() * sq_r,
            tp.w,
        );
        *z = *z * NEWTON_STEP - inv;

        // back to the diverging orbit
        let tp = Vec4::new(z.x - 1.0, z.y, z.z, z.w);
        let sq_r = self.post_scale / tp.dot(&tp);
        z.x = tp.x * sq_r;
        z.y = -tp.y * sq_r;
        z.z = -tp.z * sq_r;

        *z += self.offset;

        aux.de *= aux.r * 2.0;
        if let Some(tweak) = &self.analytic_de {
            aux.de = aux.de * tweak.scale + tweak.offset;
        }

        if let Some(out) = &self.dist_output {
            let mut q = *z;
            q.x -= out.shift;
            let r = q.length() + out.shift;
            let estimate = 0.5 * r.ln() * r / aux.de;
            aux.dist = if out.overwrite { estimate } else { aux.dist.min(estimate) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aux_at(z: &Vec4) -> AuxState {
        let mut aux = AuxState::new(*z, 2.0);
        aux.r = z.length();
        aux
    }

    #[test]
    fn test_power2_bulb_on_axis() {
        let bulb = Mandelbulb { power: 2.0, ..Default::default() };
        let mut z = Vec4::xyz(1.0, 0.0, 0.0);
        let mut aux = aux_at(&z);
        bulb.apply(&mut z, &mut aux);
        assert!((z.x - 1.0).abs() < 1e-12);
        assert!(z.y.abs() < 1e-12);
        assert!(z.z.abs() < 1e-12);
        assert_eq!(aux.r_dz, 3.0);
    }

    #[test]
    fn test_power8_bulb_scales_radius() {
        let bulb = Mandelbulb::default();
        let mut z = Vec4::xyz(0.3, 0.4, 0.5);
        let r = z.length();
        let mut aux = aux_at(&z);
        bulb.apply(&mut z, &mut aux);
        assert!((z.length() - r.powi(8)).abs() < 1e-12);
    }

    #[test]
    fn test_bulb_origin_guard() {
        let bulb = Mandelbulb::default();
        let mut z = Vec4::ZERO;
        let mut aux = aux_at(&z);
        bulb.apply(&mut z, &mut aux);
        assert!(!z.is_nan());
        assert_eq!(aux.r, 1e-21);
    }

    #[test]
    fn test_quaternion_square() {
        let mut z = Vec4::new(1.0, 1.0, 0.0, 0.0);
        let mut aux = aux_at(&z);
        Quaternion::default().apply(&mut z, &mut aux);
        // (1 + i)^2 = 2i
        assert!(z.x.abs() < 1e-12);
        assert!((z.y - 2.0).abs() < 1e-12);
        assert!((aux.r_dz - 2.0 * 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_newton_step_is_finite_off_axis() {
        let newton = NewtonPow3::default();
        let mut z = Vec4::xyz(0.7, 0.4, 0.3);
        let mut aux = aux_at(&z);
        newton.apply(&mut z, &mut aux);
        assert!(!z.is_nan());
        assert!((aux.de - 2.0 * Vec4::xyz(0.7, 0.4, 0.3).length()).abs() < 1e-12);
        assert_eq!(aux.dist, crate::engine::auxiliary::DIST_SEED);
    }

    #[test]
    fn test_newton_dist_output_keeps_minimum() {
        let newton = NewtonPow3 {
            dist_output: Some(DistOutput::default()),
            ..Default::default()
        };
        let mut z = Vec4::xyz(0.7, 0.4, 0.3);
        let mut aux = aux_at(&z);
        aux.dist = -1.0;
        newton.apply(&mut z, &mut aux);
        assert_eq!(aux.dist, -1.0);

        let overwrite = NewtonPow3 {
            dist_output: Some(DistOutput { overwrite: true, ..Default::default() }),
            ..Default::default()
        };
        let mut z = Vec4::xyz(0.7, 0.4, 0.3);
        let mut aux = aux_at(&z);
        aux.dist = -1.0;
        overwrite.apply(&mut z, &mut aux);
        assert_ne!(aux.dist, -1.0);
    }

    #[test]
    fn test_newton_abs_axes_start_cleared() {
        let newton: NewtonPow3 = serde_json::from_str(r#"{"abs_axes": {"y": true}}"#).unwrap();
        assert_eq!(newton.abs_axes, Some(AxisSelection { x: false, y: true, z: false }));
        assert!(NewtonPow3::default().abs_axes.is_none());
    }
}
