//! Integrator configuration.
//!
//! All physics and scheme choices are orthogonal runtime axes collected in
//! [`IntegratorConfig`]: equation of state, field model, passive scalar
//! count, reconstruction order, shock-robustness correction, Riemann solver
//! and gravitational potential. Cross-axis constraints (e.g. an MHD-only
//! solver with a hydro field model) are rejected by [`IntegratorConfig::validate`]
//! before any stepping.

use thiserror::Error;

/// Maximum number of passive scalar fields carried by the state records.
///
/// The runtime scalar count (`n_scalars`) may be anything up to this bound;
/// unused slots are stored as zeros.
pub const MAX_SCALARS: usize = 4;

/// Maximum number of characteristic waves (adiabatic MHD).
pub const NWAVE_MAX: usize = 7;

/// Maximum number of reconstructed components (waves + scalars).
pub const NCOMP_MAX: usize = NWAVE_MAX + MAX_SCALARS;

// =============================================================================
// Configuration Axes
// =============================================================================

/// Equation of state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Eos {
    /// Ideal gas with adiabatic index `gamma`; total energy is evolved.
    Adiabatic { gamma: f64 },
    /// Fixed sound speed `csound`; no energy equation.
    Isothermal { csound: f64 },
}

impl Eos {
    /// Whether an energy variable is carried.
    #[inline]
    pub fn is_adiabatic(&self) -> bool {
        matches!(self, Eos::Adiabatic { .. })
    }
}

/// Field model: pure hydrodynamics or magnetohydrodynamics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldModel {
    Hydro,
    Mhd,
}

/// Spatial reconstruction order.
///
/// `FirstOrder` is piecewise-constant reconstruction (the limited slope
/// forced to zero everywhere); `Plm` is slope-limited piecewise-linear
/// reconstruction in the characteristic variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconstruction {
    FirstOrder,
    Plm,
}

/// Shock-robustness correction applied by the corrector stage.
///
/// The two mechanisms are mutually exclusive: the first-order fallback
/// rewrites fluxes after the fact, which is inconsistent with the
/// H-correction's pre-computed dissipation field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrectionMode {
    None,
    /// Multidimensional dissipation of Sanders et al. (1998), suppressing
    /// grid-aligned shock instability ("carbuncle").
    HCorrection,
    /// First-order flux/EMF fallback in cells where the second-order
    /// update drives density non-positive.
    FirstOrderFlux,
}

/// Approximate Riemann solver selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverKind {
    /// Roe linearization with Harten-Hyman entropy fix (adiabatic hydro).
    Roe,
    /// HLLE with Davis wave-speed bounds; valid for every physics
    /// combination and positivity-robust.
    Hlle,
    /// HLLC contact-restoring solver (adiabatic hydro).
    Hllc,
    /// HLLD multi-state solver of Miyoshi & Kusano (adiabatic MHD).
    Hlld,
}

impl SolverKind {
    /// Whether the solver transports waves toward the interface from both
    /// sides (HLL family). The reconstructor's characteristic tracing
    /// applies a symmetric correction for such solvers.
    #[inline]
    pub fn is_hll_type(&self) -> bool {
        matches!(self, SolverKind::Hlle | SolverKind::Hllc | SolverKind::Hlld)
    }
}

/// Static gravitational potential capability.
///
/// Sampled at cell centers and at half-cell offsets along each axis by the
/// predictor and corrector source-term passes.
#[derive(Clone, Copy)]
pub enum GravPotential {
    None,
    Static(fn(f64, f64, f64) -> f64),
}

impl GravPotential {
    /// The potential function, if one is configured.
    #[inline]
    pub fn get(&self) -> Option<fn(f64, f64, f64) -> f64> {
        match self {
            GravPotential::None => None,
            GravPotential::Static(f) => Some(*f),
        }
    }
}

impl std::fmt::Debug for GravPotential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GravPotential::None => write!(f, "None"),
            GravPotential::Static(_) => write!(f, "Static(..)"),
        }
    }
}

// =============================================================================
// Physics Record
// =============================================================================

/// The physics subset of the configuration threaded through conversions,
/// eigensystems, reconstruction and flux solvers.
#[derive(Clone, Copy, Debug)]
pub struct Physics {
    pub eos: Eos,
    pub field: FieldModel,
    pub n_scalars: usize,
    /// Pressure is clamped to this floor on underflow during conversion.
    pub pressure_floor: f64,
}

impl Physics {
    /// Number of characteristic wave families.
    #[inline]
    pub fn nwave(&self) -> usize {
        match (self.field, self.eos.is_adiabatic()) {
            (FieldModel::Hydro, false) => 4,
            (FieldModel::Hydro, true) => 5,
            (FieldModel::Mhd, false) => 6,
            (FieldModel::Mhd, true) => 7,
        }
    }

    /// Number of reconstructed components (waves + advected scalars).
    #[inline]
    pub fn ncomp(&self) -> usize {
        self.nwave() + self.n_scalars
    }
}

// =============================================================================
// Integrator Configuration
// =============================================================================

/// Full configuration of the van Leer integrator.
#[derive(Clone, Copy, Debug)]
pub struct IntegratorConfig {
    pub eos: Eos,
    pub field: FieldModel,
    pub n_scalars: usize,
    pub order: Reconstruction,
    pub correction: CorrectionMode,
    pub solver: SolverKind,
    pub gravity: GravPotential,
    pub pressure_floor: f64,
}

/// Error raised by configuration validation, before any stepping.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("scalar count {0} exceeds MAX_SCALARS ({MAX_SCALARS})")]
    TooManyScalars(usize),
    #[error("solver {solver:?} does not support {field:?} with {eos:?}")]
    SolverMismatch {
        solver: SolverKind,
        field: FieldModel,
        eos: Eos,
    },
    #[error("adiabatic index must exceed 1, got {0}")]
    InvalidGamma(f64),
    #[error("isothermal sound speed must be positive, got {0}")]
    InvalidSoundSpeed(f64),
    #[error("pressure floor must be positive, got {0}")]
    InvalidPressureFloor(f64),
}

impl IntegratorConfig {
    /// Adiabatic hydrodynamics with sensible defaults (PLM, HLLE, no
    /// correction, no gravity).
    pub fn adiabatic_hydro(gamma: f64) -> Self {
        Self {
            eos: Eos::Adiabatic { gamma },
            field: FieldModel::Hydro,
            n_scalars: 0,
            order: Reconstruction::Plm,
            correction: CorrectionMode::None,
            solver: SolverKind::Hlle,
            gravity: GravPotential::None,
            pressure_floor: 1.0e-20,
        }
    }

    /// Adiabatic MHD with sensible defaults.
    pub fn adiabatic_mhd(gamma: f64) -> Self {
        Self {
            field: FieldModel::Mhd,
            ..Self::adiabatic_hydro(gamma)
        }
    }

    /// Isothermal hydrodynamics.
    pub fn isothermal_hydro(csound: f64) -> Self {
        Self {
            eos: Eos::Isothermal { csound },
            ..Self::adiabatic_hydro(5.0 / 3.0)
        }
    }

    /// Isothermal MHD.
    pub fn isothermal_mhd(csound: f64) -> Self {
        Self {
            field: FieldModel::Mhd,
            ..Self::isothermal_hydro(csound)
        }
    }

    pub fn with_scalars(mut self, n: usize) -> Self {
        self.n_scalars = n;
        self
    }

    pub fn with_order(mut self, order: Reconstruction) -> Self {
        self.order = order;
        self
    }

    pub fn with_correction(mut self, correction: CorrectionMode) -> Self {
        self.correction = correction;
        self
    }

    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_gravity(mut self, phi: fn(f64, f64, f64) -> f64) -> Self {
        self.gravity = GravPotential::Static(phi);
        self
    }

    /// The physics subset of this configuration.
    #[inline]
    pub fn physics(&self) -> Physics {
        Physics {
            eos: self.eos,
            field: self.field,
            n_scalars: self.n_scalars,
            pressure_floor: self.pressure_floor,
        }
    }

    /// Ghost depth required by the widest stencil of this configuration:
    /// 2 for piecewise-constant reconstruction, 3 for PLM, plus one when
    /// the first-order flux fallback is enabled.
    pub fn required_nghost(&self) -> usize {
        let base = match self.order {
            Reconstruction::FirstOrder => 2,
            Reconstruction::Plm => 3,
        };
        match self.correction {
            CorrectionMode::FirstOrderFlux => base + 1,
            _ => base,
        }
    }

    /// Check all cross-axis constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_scalars > MAX_SCALARS {
            return Err(ConfigError::TooManyScalars(self.n_scalars));
        }
        match self.eos {
            Eos::Adiabatic { gamma } if gamma <= 1.0 => {
                return Err(ConfigError::InvalidGamma(gamma));
            }
            Eos::Isothermal { csound } if csound <= 0.0 => {
                return Err(ConfigError::InvalidSoundSpeed(csound));
            }
            _ => {}
        }
        if self.pressure_floor <= 0.0 {
            return Err(ConfigError::InvalidPressureFloor(self.pressure_floor));
        }
        let supported = match self.solver {
            SolverKind::Hlle => true,
            SolverKind::Roe | SolverKind::Hllc => {
                self.field == FieldModel::Hydro && self.eos.is_adiabatic()
            }
            SolverKind::Hlld => self.field == FieldModel::Mhd && self.eos.is_adiabatic(),
        };
        if !supported {
            return Err(ConfigError::SolverMismatch {
                solver: self.solver,
                field: self.field,
                eos: self.eos,
            });
        }
        Ok(())
    }
}
