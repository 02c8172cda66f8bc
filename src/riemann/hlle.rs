//! HLLE approximate Riemann solver.
//!
//! Two-wave solver with Davis-type signal-speed bounds built from the
//! extremal fast speeds of the two states. Diffusive at contacts but
//! positivity-robust, and valid for every physics combination, which
//! makes it the reference solver and the one used by the first-order
//! fallback path.

use super::{phys_flux, RiemannSolver};
use crate::config::Physics;
use crate::convert::cfast;
use crate::state::Cons1D;

#[derive(Clone, Copy, Debug, Default)]
pub struct Hlle;

impl RiemannSolver for Hlle {
    fn flux(&self, bx: f64, ul: &Cons1D, ur: &Cons1D, phys: &Physics, etah: f64) -> Cons1D {
        let vxl = ul.mx / ul.d;
        let vxr = ur.mx / ur.d;
        let cfl = cfast(ul, bx, phys);
        let cfr = cfast(ur, bx, phys);

        let mut bp = (vxl + cfl).max(vxr + cfr).max(0.0);
        let mut bm = (vxl - cfl).min(vxr - cfr).min(0.0);
        if etah > 0.0 {
            bp = bp.max(etah);
            bm = bm.min(-etah);
        }

        let fl = phys_flux(ul, bx, phys);
        let fr = phys_flux(ur, bx, phys);

        ((fl * bp) - (fr * bm) + (*ur - *ul) * (bp * bm)) * (1.0 / (bp - bm))
    }

    fn name(&self) -> &'static str {
        "hlle"
    }
}
