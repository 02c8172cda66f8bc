//! HLLD approximate Riemann solver (adiabatic MHD).
//!
//! Four intermediate states separated by the two fast waves, two rotational
//! (Alfven) waves and the entropy wave, resolving contact and rotational
//! discontinuities that HLLE smears. Reference: Miyoshi & Kusano, "A
//! multi-state HLL approximate Riemann solver for ideal
//! magnetohydrodynamics", JCP 208, 315 (2005).

use super::{gas_pressure, phys_flux, upwind_scalar_flux, RiemannSolver};
use crate::config::Physics;
use crate::convert::cfast;
use crate::state::Cons1D;

#[derive(Clone, Copy, Debug, Default)]
pub struct Hlld;

/// Outer-star state between a fast wave moving at `s` and the rotational
/// wave, for the side with total pressure `pt` (MK eqs. 43-47). `pts` is
/// the common star-region total pressure.
fn star_state(u: &Cons1D, pt: f64, pts: f64, s: f64, sm: f64, bx: f64) -> Cons1D {
    let d = u.d;
    let vx = u.mx / d;
    let vy = u.my / d;
    let vz = u.mz / d;
    let sd = s - vx;
    let sdm = s - sm;
    let d_star = d * sd / sdm;

    // Degenerate when the rotational wave collapses onto the fast wave
    // (MK sec. 4.4): carry the transverse state through unchanged.
    let denom = d * sd * sdm - bx * bx;
    let (vy_s, vz_s, by_s, bz_s) = if denom.abs() <= 1e-12 * (d * sd * sd + bx * bx) {
        (vy, vz, u.by, u.bz)
    } else {
        let t1 = bx * (sd - sdm) / denom;
        let t2 = (d * sd * sd - bx * bx) / denom;
        (vy - u.by * t1, vz - u.bz * t1, u.by * t2, u.bz * t2)
    };

    let vb = vx * bx + vy * u.by + vz * u.bz;
    let vb_s = sm * bx + vy_s * by_s + vz_s * bz_s;
    let e_star = (sd * u.e - pt * vx + pts * sm + bx * (vb - vb_s)) / sdm;

    Cons1D {
        d: d_star,
        mx: d_star * sm,
        my: d_star * vy_s,
        mz: d_star * vz_s,
        e: e_star,
        by: by_s,
        bz: bz_s,
        ..Cons1D::default()
    }
}

impl RiemannSolver for Hlld {
    fn flux(&self, bx: f64, ul: &Cons1D, ur: &Cons1D, phys: &Physics, etah: f64) -> Cons1D {
        let vxl = ul.mx / ul.d;
        let vxr = ur.mx / ur.d;
        let pl = gas_pressure(ul, bx, phys);
        let pr = gas_pressure(ur, bx, phys);
        let ptl = pl + 0.5 * (bx * bx + ul.by * ul.by + ul.bz * ul.bz);
        let ptr_ = pr + 0.5 * (bx * bx + ur.by * ur.by + ur.bz * ur.bz);

        let cmax = cfast(ul, bx, phys).max(cfast(ur, bx, phys));
        let mut sl = vxl.min(vxr) - cmax;
        let mut sr = vxl.max(vxr) + cmax;
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

        let sdl = sl - vxl;
        let sdr = sr - vxr;
        // sdl < 0 < sdr strictly, so the denominator is positive.
        let denom = sdr * ur.d - sdl * ul.d;
        let sm = (sdr * ur.d * vxr - sdl * ul.d * vxl - ptr_ + ptl) / denom;
        let pts =
            (sdr * ur.d * ptl - sdl * ul.d * ptr_ + ul.d * ur.d * sdr * sdl * (vxr - vxl)) / denom;

        let usl = star_state(ul, ptl, pts, sl, sm, bx);
        let usr = star_state(ur, ptr_, pts, sr, sm, bx);

        let sqdl = usl.d.sqrt();
        let sqdr = usr.d.sqrt();
        let ssl = sm - bx.abs() / sqdl;
        let ssr = sm + bx.abs() / sqdr;

        let fl = phys_flux(ul, bx, phys);
        let fr = phys_flux(ur, bx, phys);

        let mut f = if ssl >= 0.0 {
            fl + (usl - *ul) * sl
        } else if ssr <= 0.0 {
            fr + (usr - *ur) * sr
        } else {
            // Inner region between the rotational waves (MK eqs. 59-63).
            // bx cannot vanish here: with bx = 0 both rotational speeds
            // equal sm and one of the outer branches is taken.
            let sgn = if bx >= 0.0 { 1.0 } else { -1.0 };
            let inv = 1.0 / (sqdl + sqdr);
            let (vyl_s, vzl_s) = (usl.my / usl.d, usl.mz / usl.d);
            let (vyr_s, vzr_s) = (usr.my / usr.d, usr.mz / usr.d);
            let vy_ss = inv * (sqdl * vyl_s + sqdr * vyr_s + sgn * (usr.by - usl.by));
            let vz_ss = inv * (sqdl * vzl_s + sqdr * vzr_s + sgn * (usr.bz - usl.bz));
            let by_ss = inv * (sqdl * usr.by + sqdr * usl.by + sgn * sqdl * sqdr * (vyr_s - vyl_s));
            let bz_ss = inv * (sqdl * usr.bz + sqdr * usl.bz + sgn * sqdl * sqdr * (vzr_s - vzl_s));
            let vb_ss = sm * bx + vy_ss * by_ss + vz_ss * bz_ss;

            if sm >= 0.0 {
                let vb_sl = sm * bx + vyl_s * usl.by + vzl_s * usl.bz;
                let uss = Cons1D {
                    d: usl.d,
                    mx: usl.d * sm,
                    my: usl.d * vy_ss,
                    mz: usl.d * vz_ss,
                    e: usl.e - sqdl * sgn * (vb_sl - vb_ss),
                    by: by_ss,
                    bz: bz_ss,
                    ..Cons1D::default()
                };
                fl + (usl - *ul) * sl + (uss - usl) * ssl
            } else {
                let vb_sr = sm * bx + vyr_s * usr.by + vzr_s * usr.bz;
                let uss = Cons1D {
                    d: usr.d,
                    mx: usr.d * sm,
                    my: usr.d * vy_ss,
                    mz: usr.d * vz_ss,
                    e: usr.e + sqdr * sgn * (vb_sr - vb_ss),
                    by: by_ss,
                    bz: bz_ss,
                    ..Cons1D::default()
                };
                fr + (usr - *ur) * sr + (uss - usr) * ssr
            }
        };

        upwind_scalar_flux(&mut f, ul, ur, phys);
        f
    }

    fn name(&self) -> &'static str {
        "hlld"
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{check_conservativity, check_consistency, mhd_phys};
    use super::*;
    use crate::convert::prim1d_to_cons1d;
    use crate::state::Prim1D;

    #[test]
    fn test_hlld_consistency() {
        check_consistency(&Hlld, &mhd_phys(), 0.9);
        check_consistency(&Hlld, &mhd_phys(), -0.6);
        check_consistency(&Hlld, &mhd_phys(), 0.0);
    }

    #[test]
    fn test_hlld_conservativity() {
        check_conservativity(&Hlld, &mhd_phys(), 0.8);
    }

    #[test]
    fn test_hlld_stationary_contact_with_normal_field_only() {
        // Density jump at rest with a purely normal field: pure contact,
        // zero mass flux, momentum flux = p + bx^2/2 - bx^2.
        let phys = mhd_phys();
        let still = |d: f64| {
            prim1d_to_cons1d(
                &Prim1D {
                    d,
                    p: 1.0,
                    ..Prim1D::default()
                },
                1.0,
                &phys,
            )
        };
        let f = Hlld.flux(1.0, &still(1.0), &still(0.25), &phys, 0.0);
        assert!(f.d.abs() < 1e-12, "mass flux {}", f.d);
        assert!((f.mx - 0.5).abs() < 1e-12, "momentum flux {}", f.mx);
        assert!(f.by.abs() < 1e-12);
        assert!(f.bz.abs() < 1e-12);
    }
}
