/// Formula system: the transform contract and the formula corpus.
///
/// Every formula is a parameter record implementing [`Transform`]: one pure
/// step that mutates the position and the auxiliary state in place. The
/// closed [`Formula`] enum dispatches to the records without virtual calls,
/// which keeps the hot loop inlinable and keeps every formula translatable
/// 1:1 into generated GPU kernel source.
///
/// The hybrid system chains formulas into a [`hybrid::HybridSequence`], each
/// entry optionally gated to an iteration range.

pub mod bulbs;
pub mod folds;
pub mod hybrid;
pub mod kleinian;
pub mod presets;
pub mod transforms;

use serde::{Deserialize, Serialize};

use crate::engine::auxiliary::AuxState;
use crate::engine::estimator::DeStrategy;
use crate::engine::types::Vec4;

/// One fractal iteration step.
///
/// Implementations must be deterministic and must only touch `z` and `aux`;
/// there is no return channel. Numeric guards are each formula's own business.
pub trait Transform {
    fn apply(&self, z: &mut Vec4, aux: &mut AuxState);
}

/// Whether the iterator adds the per-sample constant after a formula runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CpixelPolicy {
    EnabledByDefault,
    DisabledByDefault,
}

impl CpixelPolicy {
    pub fn default_enabled(self) -> bool {
        matches!(self, CpixelPolicy::EnabledByDefault)
    }
}

/// Static metadata for one formula.
#[derive(Clone, Copy, Debug)]
pub struct FormulaInfo {
    /// Human-readable name (UI dropdown value)
    pub name: &'static str,
    /// Stable identifier shared with the kernel generator and config files
    pub internal_name: &'static str,
    /// DE strategy the formula owns; `None` for pure coordinate transforms
    pub strategy: DeStrategy,
    pub cpixel: CpixelPolicy,
    pub default_bailout: f64,
}

/// Formula identifier matching the config / UI formula names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormulaId {
    Mandelbulb,
    Quaternion,
    NewtonPow3,
    Mandelbox,
    AboxKlein,
    AboxSmooth,
    AmazingSurfM3d,
    MengerSponge,
    JosKleinianV3,
    TransfAdditionConstant,
    TransfScale,
    TransfBoxFold,
    TransfSphericalFold,
    TransfSphereInversion,
    TransfRotation,
    TransfAddCpixelAxisSwap,
    TransfDarkbeamFoldV2,
}

impl FormulaId {
    pub const ALL: [FormulaId; 17] = [
        FormulaId::Mandelbulb,
        FormulaId::Quaternion,
        FormulaId::NewtonPow3,
        FormulaId::Mandelbox,
        FormulaId::AboxKlein,
        FormulaId::AboxSmooth,
        FormulaId::AmazingSurfM3d,
        FormulaId::MengerSponge,
        FormulaId::JosKleinianV3,
        FormulaId::TransfAdditionConstant,
        FormulaId::TransfScale,
        FormulaId::TransfBoxFold,
        FormulaId::TransfSphericalFold,
        FormulaId::TransfSphereInversion,
        FormulaId::TransfRotation,
        FormulaId::TransfAddCpixelAxisSwap,
        FormulaId::TransfDarkbeamFoldV2,
    ];

    pub fn info(&self) -> FormulaInfo {
        use CpixelPolicy::*;
        use DeStrategy::*;

        let (name, internal_name, strategy, cpixel, default_bailout) = match self {
            FormulaId::Mandelbulb => ("Mandelbulb", "mandelbulb", Logarithmic, EnabledByDefault, 10.0),
            FormulaId::Quaternion => ("Quaternion", "quaternion", Logarithmic, EnabledByDefault, 10.0),
            FormulaId::NewtonPow3 => ("Newton Pow3", "newton_pow3", Delta, DisabledByDefault, 10.0),
            FormulaId::Mandelbox => ("Mandelbox", "mandelbox", Linear, EnabledByDefault, 100.0),
            FormulaId::AboxKlein => ("Abox - Klein", "abox_klein", Linear, DisabledByDefault, 100.0),
            FormulaId::AboxSmooth => ("Abox - Smooth", "abox_smooth", Linear, EnabledByDefault, 100.0),
            FormulaId::AmazingSurfM3d => ("Amazing Surf M3D", "amazing_surf_m3d", Linear, DisabledByDefault, 100.0),
            FormulaId::MengerSponge => ("Menger Sponge", "menger_sponge", Linear, DisabledByDefault, 10.0),
            FormulaId::JosKleinianV3 => ("JosLeys-Kleinian V3", "jos_kleinian_v3", AnalyticCustom, DisabledByDefault, 10.0),
            FormulaId::TransfAdditionConstant => ("T>Addition Constant", "transf_addition_constant", None, DisabledByDefault, 100.0),
            FormulaId::TransfScale => ("T>Scale", "transf_scale", None, DisabledByDefault, 100.0),
            FormulaId::TransfBoxFold => ("T>Box Fold", "transf_box_fold", None, DisabledByDefault, 100.0),
            FormulaId::TransfSphericalFold => ("T>Spherical Fold", "transf_spherical_fold", None, DisabledByDefault, 100.0),
            FormulaId::TransfSphereInversion => ("T>Sphere Inversion", "transf_sphere_inversion", None, DisabledByDefault, 100.0),
            FormulaId::TransfRotation => ("T>Rotation", "transf_rotation", None, DisabledByDefault, 100.0),
            FormulaId::TransfAddCpixelAxisSwap => ("T>Add Cpixel - Axis Swap", "transf_add_cpixel_axis_swap", None, DisabledByDefault, 100.0),
            FormulaId::TransfDarkbeamFoldV2 => ("T>DarkbeamFoldV2", "transf_darkbeam_fold_v2", None, DisabledByDefault, 100.0),
        };

        FormulaInfo { name, internal_name, strategy, cpixel, default_bailout }
    }

    /// Parse from an internal name or a UI name.
    pub fn from_name(name: &str) -> Option<Self> {
        FormulaId::ALL
            .iter()
            .copied()
            .find(|id| {
                let info = id.info();
                info.internal_name == name || info.name == name
            })
    }

    /// Create a formula with default parameters.
    pub fn create(&self) -> Formula {
        match self {
            FormulaId::Mandelbulb => Formula::Mandelbulb(Default::default()),
            FormulaId::Quaternion => Formula::Quaternion(Default::default()),
            FormulaId::NewtonPow3 => Formula::NewtonPow3(Default::default()),
            FormulaId::Mandelbox => Formula::Mandelbox(Default::default()),
            FormulaId::AboxKlein => Formula::AboxKlein(Default::default()),
            FormulaId::AboxSmooth => Formula::AboxSmooth(Default::default()),
            FormulaId::AmazingSurfM3d => Formula::AmazingSurfM3d(Default::default()),
            FormulaId::MengerSponge => Formula::MengerSponge(Default::default()),
            FormulaId::JosKleinianV3 => Formula::JosKleinianV3(Default::default()),
            FormulaId::TransfAdditionConstant => Formula::TransfAdditionConstant(Default::default()),
            FormulaId::TransfScale => Formula::TransfScale(Default::default()),
            FormulaId::TransfBoxFold => Formula::TransfBoxFold(Default::default()),
            FormulaId::TransfSphericalFold => Formula::TransfSphericalFold(Default::default()),
            FormulaId::TransfSphereInversion => Formula::TransfSphereInversion(Default::default()),
            FormulaId::TransfRotation => Formula::TransfRotation(Default::default()),
            FormulaId::TransfAddCpixelAxisSwap => Formula::TransfAddCpixelAxisSwap(Default::default()),
            FormulaId::TransfDarkbeamFoldV2 => Formula::TransfDarkbeamFoldV2(Default::default()),
        }
    }
}

/// A formula together with its parameter record.
///
/// Serialized with an internal `type` tag holding the formula's internal name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Formula {
    Mandelbulb(bulbs::Mandelbulb),
    Quaternion(bulbs::Quaternion),
    NewtonPow3(bulbs::NewtonPow3),
    Mandelbox(folds::Mandelbox),
    AboxKlein(folds::AboxKlein),
    AboxSmooth(folds::AboxSmooth),
    AmazingSurfM3d(folds::AmazingSurfM3d),
    MengerSponge(folds::MengerSponge),
    JosKleinianV3(kleinian::JosKleinianV3),
    TransfAdditionConstant(transforms::AdditionConstant),
    TransfScale(transforms::Scale),
    TransfBoxFold(transforms::BoxFold),
    TransfSphericalFold(transforms::SphericalFold),
    TransfSphereInversion(transforms::SphereInversion),
    TransfRotation(transforms::RotationTransform),
    TransfAddCpixelAxisSwap(transforms::AddCpixelAxisSwap),
    TransfDarkbeamFoldV2(transforms::DarkbeamFoldV2),
}

impl Formula {
    pub fn id(&self) -> FormulaId {
        match self {
            Formula::Mandelbulb(_) => FormulaId::Mandelbulb,
            Formula::Quaternion(_) => FormulaId::Quaternion,
            Formula::NewtonPow3(_) => FormulaId::NewtonPow3,
            Formula::Mandelbox(_) => FormulaId::Mandelbox,
            Formula::AboxKlein(_) => FormulaId::AboxKlein,
            Formula::AboxSmooth(_) => FormulaId::AboxSmooth,
            Formula::AmazingSurfM3d(_) => FormulaId::AmazingSurfM3d,
            Formula::MengerSponge(_) => FormulaId::MengerSponge,
            Formula::JosKleinianV3(_) => FormulaId::JosKleinianV3,
            Formula::TransfAdditionConstant(_) => FormulaId::TransfAdditionConstant,
            Formula::TransfScale(_) => FormulaId::TransfScale,
            Formula::TransfBoxFold(_) => FormulaId::TransfBoxFold,
            Formula::TransfSphericalFold(_) => FormulaId::TransfSphericalFold,
            Formula::TransfSphereInversion(_) => FormulaId::TransfSphereInversion,
            Formula::TransfRotation(_) => FormulaId::TransfRotation,
            Formula::TransfAddCpixelAxisSwap(_) => FormulaId::TransfAddCpixelAxisSwap,
            Formula::TransfDarkbeamFoldV2(_) => FormulaId::TransfDarkbeamFoldV2,
        }
    }

    pub fn info(&self) -> FormulaInfo {
        self.id().info()
    }
}

impl Transform for Formula {
    #[inline]
    fn apply(&self, z: &mut Vec4, aux: &mut AuxState) {
        match self {
            Formula::Mandelbulb(f) => f.apply(z, aux),
            Formula::Quaternion(f) => f.apply(z, aux),
            Formula::NewtonPow3(f) => f.apply(z, aux),
            Formula::Mandelbox(f) => f.apply(z, aux),
            Formula::AboxKlein(f) => f.apply(z, aux),
            Formula::AboxSmooth(f) => f.apply(z, aux),
            Formula::AmazingSurfM3d(f) => f.apply(z, aux),
            Formula::MengerSponge(f) => f.apply(z, aux),
            Formula::JosKleinianV3(f) => f.apply(z, aux),
            Formula::TransfAdditionConstant(f) => f.apply(z, aux),
            Formula::TransfScale(f) => f.apply(z, aux),
            Formula::TransfBoxFold(f) => f.apply(z, aux),
            Formula::TransfSphericalFold(f) => f.apply(z, aux),
            Formula::TransfSphereInversion(f) => f.apply(z, aux),
            Formula::TransfRotation(f) => f.apply(z, aux),
            Formula::TransfAddCpixelAxisSwap(f) => f.apply(z, aux),
            Formula::TransfDarkbeamFoldV2(f) => f.apply(z, aux),
        }
    }
}
