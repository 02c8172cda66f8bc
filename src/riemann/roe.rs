//! Roe approximate Riemann solver (adiabatic hydrodynamics).
//!
//! Linearizes the Riemann problem at the Roe-averaged state:
//!
//! F* = 0.5 (F_L + F_R) - 0.5 sum_i |lambda_i| alpha_i r_i
//!
//! with a Harten-Hyman entropy fix replacing |lambda| across transonic
//! rarefactions. Reference: Toro, "Riemann Solvers and Numerical Methods
//! for Fluid Dynamics", ch. 11.

use super::{gas_pressure, phys_flux, upwind_scalar_flux, RiemannSolver};
use crate::config::{Eos, Physics};
use crate::state::Cons1D;

#[derive(Clone, Copy, Debug, Default)]
pub struct Roe;

impl RiemannSolver for Roe {
    fn flux(&self, bx: f64, ul: &Cons1D, ur: &Cons1D, phys: &Physics, etah: f64) -> Cons1D {
        let gamma = match phys.eos {
            Eos::Adiabatic { gamma } => gamma,
            // Validated out at configuration time.
            Eos::Isothermal { .. } => unreachable!("Roe solver requires an adiabatic EOS"),
        };

        let (dl, dr) = (ul.d, ur.d);
        let (vxl, vyl, vzl) = (ul.mx / dl, ul.my / dl, ul.mz / dl);
        let (vxr, vyr, vzr) = (ur.mx / dr, ur.my / dr, ur.mz / dr);
        let pl = gas_pressure(ul, bx, phys);
        let pr = gas_pressure(ur, bx, phys);
        let hl = (ul.e + pl) / dl;
        let hr = (ur.e + pr) / dr;

        // Roe averages.
        let sqdl = dl.sqrt();
        let sqdr = dr.sqrt();
        let isd = 1.0 / (sqdl + sqdr);
        let u = (sqdl * vxl + sqdr * vxr) * isd;
        let v = (sqdl * vyl + sqdr * vyr) * isd;
        let w = (sqdl * vzl + sqdr * vzr) * isd;
        let h = (sqdl * hl + sqdr * hr) * isd;
        let qsq = u * u + v * v + w * w;
        let asq = ((gamma - 1.0) * (h - 0.5 * qsq)).max(phys.pressure_floor);
        let a = asq.sqrt();

        // Wave strengths from the conserved jump.
        let dd = dr - dl;
        let dmx = ur.mx - ul.mx;
        let dmy = ur.my - ul.my;
        let dmz = ur.mz - ul.mz;
        let de = ur.e - ul.e;

        let a3 = dmy - v * dd;
        let a4 = dmz - w * dd;
        let de_sh = de - a3 * v - a4 * w;
        let a2 = (gamma - 1.0) / asq * (dd * (h - u * u) + u * dmx - de_sh);
        let a1 = (dd * (u + a) - dmx - a * a2) / (2.0 * a);
        let a5 = dd - a1 - a2;

        // Entropy-fixed wave speed magnitudes; the H-correction floors
        // every magnitude by etah.
        let al = (gamma * pl / dl).sqrt();
        let ar = (gamma * pr / dr).sqrt();
        let l1 = entropy_fix(u - a, vxl - al, vxr - ar).max(etah);
        let l2 = (u.abs()).max(etah);
        let l5 = entropy_fix(u + a, vxl + al, vxr + ar).max(etah);

        // Right eigenvectors of the conserved-variable Jacobian.
        let r1 = [1.0, u - a, v, w, h - u * a];
        let r2 = [1.0, u, v, w, 0.5 * qsq];
        let r3 = [0.0, 0.0, 1.0, 0.0, v];
        let r4 = [0.0, 0.0, 0.0, 1.0, w];
        let r5 = [1.0, u + a, v, w, h + u * a];

        let fl = phys_flux(ul, bx, phys);
        let fr = phys_flux(ur, bx, phys);
        let mut fv = [
            0.5 * (fl.d + fr.d),
            0.5 * (fl.mx + fr.mx),
            0.5 * (fl.my + fr.my),
            0.5 * (fl.mz + fr.mz),
            0.5 * (fl.e + fr.e),
        ];
        for m in 0..5 {
            fv[m] -= 0.5
                * (l1 * a1 * r1[m]
                    + l2 * a2 * r2[m]
                    + l2 * a3 * r3[m]
                    + l2 * a4 * r4[m]
                    + l5 * a5 * r5[m]);
        }

        let mut f = Cons1D {
            d: fv[0],
            mx: fv[1],
            my: fv[2],
            mz: fv[3],
            e: fv[4],
            ..Cons1D::default()
        };
        upwind_scalar_flux(&mut f, ul, ur, phys);
        f
    }

    fn name(&self) -> &'static str {
        "roe"
    }
}

/// Harten-Hyman entropy fix: across a transonic rarefaction (left and
/// right signal speeds straddling zero) the Roe speed magnitude is
/// replaced by a positive spread so the scheme cannot sustain an
/// expansion shock.
fn entropy_fix(lambda_roe: f64, lambda_l: f64, lambda_r: f64) -> f64 {
    if lambda_l < 0.0 && lambda_r > 0.0 {
        let delta = lambda_r - lambda_l;
        if delta.abs() > 1e-10 {
            0.5 * (lambda_roe.abs() + delta)
        } else {
            lambda_roe.abs()
        }
    } else {
        lambda_roe.abs()
    }
}
