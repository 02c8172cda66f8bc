//! HLLC approximate Riemann solver (adiabatic hydrodynamics).
//!
//! Three-wave solver restoring the contact discontinuity dropped by HLLE.
//! Reference: Toro, "Riemann Solvers and Numerical Methods for Fluid
//! Dynamics", ch. 10.

use super::{gas_pressure, phys_flux, upwind_scalar_flux, RiemannSolver};
use crate::config::Physics;
use crate::convert::cfast;
use crate::state::Cons1D;

#[derive(Clone, Copy, Debug, Default)]
pub struct Hllc;

impl RiemannSolver for Hllc {
    fn flux(&self, bx: f64, ul: &Cons1D, ur: &Cons1D, phys: &Physics, etah: f64) -> Cons1D {
        let vxl = ul.mx / ul.d;
        let vxr = ur.mx / ur.d;
        let pl = gas_pressure(ul, bx, phys);
        let pr = gas_pressure(ur, bx, phys);

        let mut sl = (vxl - cfast(ul, bx, phys)).min(vxr - cfast(ur, bx, phys));
        let mut sr = (vxl + cfast(ul, bx, phys)).max(vxr + cfast(ur, bx, phys));
        if etah > 0.0 {
            sl = sl.min(-etah);
            sr = sr.max(etah);
        }

        if sl >= 0.0 {
            return phys_flux(ul, bx, phys);
        }
        if sr <= 0.0 {
            return phys_flux(ur, bx, phys);
        }

        // Contact speed; the denominator is strictly negative because
        // sl < vxl - cl and sr > vxr + cr.
        let sm = (pr - pl + ul.mx * (sl - vxl) - ur.mx * (sr - vxr))
            / (ul.d * (sl - vxl) - ur.d * (sr - vxr));
        let p_star = pl + ul.d * (sl - vxl) * (sm - vxl);

        let (u, s, p, vx) = if sm >= 0.0 {
            (ul, sl, pl, vxl)
        } else {
            (ur, sr, pr, vxr)
        };

        let d_star = u.d * (s - vx) / (s - sm);
        let u_star = Cons1D {
            d: d_star,
            mx: d_star * sm,
            my: d_star * (u.my / u.d),
            mz: d_star * (u.mz / u.d),
            e: ((s - vx) * u.e - p * vx + p_star * sm) / (s - sm),
            ..Cons1D::default()
        };

        let mut f = phys_flux(u, bx, phys) + (u_star - *u) * s;
        upwind_scalar_flux(&mut f, ul, ur, phys);
        f
    }

    fn name(&self) -> &'static str {
        "hllc"
    }
}
