//! Approximate Riemann solvers.
//!
//! The integrator consumes the flux solver through the [`RiemannSolver`]
//! trait: given left/right conserved interface states and the
//! interface-normal field, return one conserved-flux record. Solvers must
//! be conservative between opposing sweep orientations and consistent
//! (`F(U, U)` equals the physical flux). The `etah` argument is the
//! H-correction dissipation hint; solvers honor it by widening their
//! signal-speed estimates (zero disables it).
//!
//! Shipped solvers, selected by [`SolverKind`] at configuration time:
//! - [`Hlle`]: two-wave solver with Davis bounds; every physics
//!   combination, positivity-robust, most diffusive.
//! - [`Hllc`]: three-wave contact-restoring solver, adiabatic hydro.
//! - [`Roe`]: full linearization with Harten-Hyman entropy fix,
//!   adiabatic hydro.
//! - [`Hlld`]: Miyoshi & Kusano multi-state solver, adiabatic MHD.

mod hllc;
mod hlld;
mod hlle;
mod roe;

pub use hllc::Hllc;
pub use hlld::Hlld;
pub use hlle::Hlle;
pub use roe::Roe;

use crate::config::{Eos, FieldModel, Physics, SolverKind};
use crate::state::Cons1D;

/// Contract for approximate Riemann solvers at one interface.
pub trait RiemannSolver: Send + Sync {
    /// Flux through the interface with normal field `bx`, given left and
    /// right conserved states. `etah` is the H-correction dissipation
    /// hint (0 when disabled).
    fn flux(&self, bx: f64, ul: &Cons1D, ur: &Cons1D, phys: &Physics, etah: f64) -> Cons1D;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

/// Create a boxed solver from the configuration enum.
pub fn create_solver(kind: SolverKind) -> Box<dyn RiemannSolver> {
    match kind {
        SolverKind::Roe => Box::new(Roe),
        SolverKind::Hlle => Box::new(Hlle),
        SolverKind::Hllc => Box::new(Hllc),
        SolverKind::Hlld => Box::new(Hlld),
    }
}

/// Gas pressure of a conserved record, clamped to the configured floor.
pub(crate) fn gas_pressure(u: &Cons1D, bx: f64, phys: &Physics) -> f64 {
    match phys.eos {
        Eos::Isothermal { csound } => csound * csound * u.d,
        Eos::Adiabatic { gamma } => {
            let di = 1.0 / u.d;
            let mut p = u.e - 0.5 * (u.mx * u.mx + u.my * u.my + u.mz * u.mz) * di;
            if phys.field == FieldModel::Mhd {
                p -= 0.5 * (bx * bx + u.by * u.by + u.bz * u.bz);
            }
            ((gamma - 1.0) * p).max(phys.pressure_floor)
        }
    }
}

/// Physical flux of a conserved record along the sweep normal.
pub(crate) fn phys_flux(u: &Cons1D, bx: f64, phys: &Physics) -> Cons1D {
    let di = 1.0 / u.d;
    let vx = u.mx * di;
    let vy = u.my * di;
    let vz = u.mz * di;
    let p = gas_pressure(u, bx, phys);

    let mut f = Cons1D {
        d: u.mx,
        mx: u.mx * vx + p,
        my: u.my * vx,
        mz: u.mz * vx,
        ..Cons1D::default()
    };

    if phys.field == FieldModel::Mhd {
        let pb = 0.5 * (bx * bx + u.by * u.by + u.bz * u.bz);
        f.mx += pb - bx * bx;
        f.my -= bx * u.by;
        f.mz -= bx * u.bz;
        f.by = u.by * vx - bx * vy;
        f.bz = u.bz * vx - bx * vz;
        if phys.eos.is_adiabatic() {
            f.e = (u.e + p + pb) * vx - bx * (vx * bx + vy * u.by + vz * u.bz);
        }
    } else if phys.eos.is_adiabatic() {
        f.e = (u.e + p) * vx;
    }

    for n in 0..phys.n_scalars {
        f.s[n] = u.s[n] * vx;
    }

    f
}

/// Upwind passive-scalar fluxes from the mass flux and the two donor
/// concentrations; shared by the contact-resolving solvers.
pub(crate) fn upwind_scalar_flux(f: &mut Cons1D, ul: &Cons1D, ur: &Cons1D, phys: &Physics) {
    for n in 0..phys.n_scalars {
        let r = if f.d >= 0.0 {
            ul.s[n] / ul.d
        } else {
            ur.s[n] / ur.d
        };
        f.s[n] = f.d * r;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::IntegratorConfig;
    use crate::convert::prim1d_to_cons1d;
    use crate::state::Prim1D;

    pub(crate) const TOL: f64 = 1e-11;

    pub(crate) fn mhd_phys() -> Physics {
        IntegratorConfig::adiabatic_mhd(5.0 / 3.0).with_scalars(1).physics()
    }

    pub(crate) fn hydro_phys() -> Physics {
        IntegratorConfig::adiabatic_hydro(1.4).with_scalars(1).physics()
    }

    pub(crate) fn sample_cons(phys: &Physics, d: f64, vx: f64, p: f64, bx: f64) -> Cons1D {
        let w = Prim1D {
            d,
            vx,
            vy: 0.3,
            vz: -0.2,
            p,
            by: if phys.field == FieldModel::Mhd { 0.4 } else { 0.0 },
            bz: if phys.field == FieldModel::Mhd { -0.25 } else { 0.0 },
            r: [0.5, 0.0, 0.0, 0.0],
        };
        prim1d_to_cons1d(&w, bx, phys)
    }

    /// Consistency: for equal left/right states every solver must return
    /// the physical flux.
    pub(crate) fn check_consistency(solver: &dyn RiemannSolver, phys: &Physics, bx: f64) {
        for (d, vx, p) in [(1.0, 0.0, 1.0), (0.5, 2.5, 0.3), (2.0, -1.5, 0.8)] {
            let u = sample_cons(phys, d, vx, p, bx);
            let f = solver.flux(bx, &u, &u, phys, 0.0);
            let fp = phys_flux(&u, bx, phys);
            for (a, b, what) in [
                (f.d, fp.d, "d"),
                (f.mx, fp.mx, "mx"),
                (f.my, fp.my, "my"),
                (f.mz, fp.mz, "mz"),
                (f.e, fp.e, "e"),
                (f.by, fp.by, "by"),
                (f.bz, fp.bz, "bz"),
                (f.s[0], fp.s[0], "s0"),
            ] {
                assert!(
                    (a - b).abs() < TOL,
                    "{}: {what} flux {a} != physical {b}",
                    solver.name()
                );
            }
        }
    }

    /// Conservativity: flipping left/right and the sweep orientation must
    /// negate the flux (momentum/energy/mass conservative between
    /// opposing sweeps).
    pub(crate) fn check_conservativity(solver: &dyn RiemannSolver, phys: &Physics, bx: f64) {
        let ul = sample_cons(phys, 1.0, 0.7, 1.0, bx);
        let ur = sample_cons(phys, 0.4, -0.3, 0.25, bx);
        let f = solver.flux(bx, &ul, &ur, phys, 0.0);

        // Mirror the states through the interface: x -> -x.
        let flip = |u: &Cons1D| Cons1D {
            mx: -u.mx,
            by: u.by,
            bz: u.bz,
            ..*u
        };
        let g = solver.flux(-bx, &flip(&ur), &flip(&ul), phys, 0.0);

        // Mass/energy fluxes flip sign, normal-momentum flux is even,
        // transverse-momentum and induction fluxes flip sign.
        assert!((f.d + g.d).abs() < TOL, "{}: mass", solver.name());
        assert!((f.mx - g.mx).abs() < TOL, "{}: normal momentum", solver.name());
        assert!((f.my + g.my).abs() < TOL, "{}: my", solver.name());
        assert!((f.mz + g.mz).abs() < TOL, "{}: mz", solver.name());
        assert!((f.e + g.e).abs() < TOL, "{}: energy", solver.name());
        assert!((f.by + g.by).abs() < TOL, "{}: by", solver.name());
        assert!((f.bz + g.bz).abs() < TOL, "{}: bz", solver.name());
        assert!((f.s[0] + g.s[0]).abs() < TOL, "{}: scalar", solver.name());
    }

    #[test]
    fn test_phys_flux_hydro() {
        let phys = hydro_phys();
        let u = sample_cons(&phys, 2.0, 1.5, 1.0, 0.0);
        let f = phys_flux(&u, 0.0, &phys);
        assert!((f.d - u.mx).abs() < TOL);
        assert!((f.mx - (u.mx * 1.5 + 1.0)).abs() < TOL);
        assert!((f.s[0] - u.s[0] * 1.5).abs() < TOL);
    }
}
