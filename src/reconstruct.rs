//! Piecewise-linear (PLM) reconstruction in the characteristic variables,
//! plus the piecewise-constant first-order variant.
//!
//! Notation: interface states carry the index of the cell to their right,
//! so `wl[i]` is the state on the left side of the `i - 1/2` face and
//! `wr[i]` the state on its right side. For a target range `[il, iu]` the
//! input must be valid over `[il - 2, iu + 2]` and output faces cover
//! `[il, iu + 1]`.
//!
//! Per cell: project centered / one-sided / van-Leer primitive differences
//! onto the characteristic fields, limit each characteristic slope with a
//! double-minmod limiter, project back, clamp the trial face values
//! between the neighboring cell averages (the shape-preservation
//! guarantee), and, in corrector mode, integrate the linear profile over
//! the domain of dependence and subtract the waves that cannot reach the
//! interface within the step. Advected scalars bypass the projection and
//! are limited as their own characteristic family.

use crate::config::{Physics, NCOMP_MAX};
use crate::eigen::Eigen;
use crate::state::{pack_prim, unpack_prim, Cons1D, Prim1D};

/// Reconstruction mode.
///
/// `Corrector` applies the characteristic time-centering (domain-of-
/// dependence integration and wave subtraction, scaled by `dtodx`);
/// `Predictor` is the pure spatial reconstruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlmMode {
    Predictor,
    Corrector,
}

/// Compute L/R interface primitive states over faces `[il, iu + 1]`.
///
/// `w` and `bxc` are the primitive slice and normal field at cell centers,
/// valid over `[il - 2, iu + 2]`. `hll_type` enables the symmetric wave
/// subtraction needed by solvers that transport waves toward the interface
/// from both sides. Never fails; positive density is a caller precondition.
#[allow(clippy::too_many_arguments)]
pub fn lr_states_plm(
    phys: &Physics,
    mode: PlmMode,
    hll_type: bool,
    dtodx: f64,
    w: &[Prim1D],
    bxc: &[f64],
    il: usize,
    iu: usize,
    wl: &mut [Prim1D],
    wr: &mut [Prim1D],
) {
    let nwave = phys.nwave();
    let ncomp = phys.ncomp();
    let mut es = Eigen::default();

    let mut pw_m = [0.0; NCOMP_MAX];
    let mut pw_c = [0.0; NCOMP_MAX];
    let mut pw_p = [0.0; NCOMP_MAX];

    for i in (il - 1)..=(iu + 1) {
        es.compute(phys, &w[i], bxc[i]);

        pack_prim(phys, &w[i - 1], &mut pw_m);
        pack_prim(phys, &w[i], &mut pw_c);
        pack_prim(phys, &w[i + 1], &mut pw_p);

        // Centered, one-sided and van Leer differences.
        let mut dwc = [0.0; NCOMP_MAX];
        let mut dwl = [0.0; NCOMP_MAX];
        let mut dwr = [0.0; NCOMP_MAX];
        let mut dwg = [0.0; NCOMP_MAX];
        for n in 0..ncomp {
            dwc[n] = pw_p[n] - pw_m[n];
            dwl[n] = pw_c[n] - pw_m[n];
            dwr[n] = pw_p[n] - pw_c[n];
            if dwl[n] * dwr[n] > 0.0 {
                dwg[n] = 2.0 * dwl[n] * dwr[n] / (dwl[n] + dwr[n]);
            }
        }

        // Project onto the characteristic fields; scalars are their own
        // family with unit eigenvectors.
        let mut dac = [0.0; NCOMP_MAX];
        let mut dal = [0.0; NCOMP_MAX];
        let mut dar = [0.0; NCOMP_MAX];
        let mut dag = [0.0; NCOMP_MAX];
        for n in 0..nwave {
            for m in 0..nwave {
                dac[n] += es.lem[n][m] * dwc[m];
                dal[n] += es.lem[n][m] * dwl[m];
                dar[n] += es.lem[n][m] * dwr[m];
                dag[n] += es.lem[n][m] * dwg[m];
            }
        }
        for n in nwave..ncomp {
            dac[n] = dwc[n];
            dal[n] = dwl[n];
            dar[n] = dwr[n];
            dag[n] = dwg[n];
        }

        // Double-minmod monotonicity constraint per characteristic.
        let mut da = [0.0; NCOMP_MAX];
        for n in 0..ncomp {
            if dal[n] * dar[n] > 0.0 {
                let lim_slope1 = dal[n].abs().min(dar[n].abs());
                let lim_slope2 = (0.5 * dac[n].abs()).min(dag[n].abs());
                da[n] = dac[n].signum() * (2.0 * lim_slope1).min(lim_slope2);
            }
        }

        // Back to primitive space.
        let mut dwm = [0.0; NCOMP_MAX];
        for n in 0..nwave {
            for (m, &dam) in da.iter().enumerate().take(nwave) {
                dwm[n] += dam * es.rem[n][m];
            }
        }
        for n in nwave..ncomp {
            dwm[n] = da[n];
        }

        // Trial face values, clamped between neighboring cell averages.
        let mut wlv = [0.0; NCOMP_MAX];
        let mut wrv = [0.0; NCOMP_MAX];
        for n in 0..ncomp {
            wlv[n] = pw_c[n] - 0.5 * dwm[n];
            wrv[n] = pw_c[n] + 0.5 * dwm[n];
        }
        for n in 0..ncomp {
            wlv[n] = wlv[n].max(pw_c[n].min(pw_m[n])).min(pw_c[n].max(pw_m[n]));
            wrv[n] = wrv[n].max(pw_c[n].min(pw_p[n])).min(pw_c[n].max(pw_p[n]));
        }

        let mut dw = [0.0; NCOMP_MAX];
        for n in 0..ncomp {
            dw[n] = wrv[n] - wlv[n];
        }

        let mut pwl = wrv;
        let mut pwr = wlv;

        if mode == PlmMode::Corrector {
            // Integrate the linear profile over the domain of dependence
            // bounded by the extremal wave speeds.
            let ev_max = es.ev[nwave - 1];
            let ev_min = es.ev[0];
            let qx = 0.5 * ev_max.max(0.0) * dtodx;
            for n in 0..ncomp {
                pwl[n] -= qx * dw[n];
            }
            let qx = -0.5 * ev_min.min(0.0) * dtodx;
            for n in 0..ncomp {
                pwr[n] += qx * dw[n];
            }

            // Subtract the contribution of waves that do not reach the
            // interface during the step (CW eqn 3.5ff); HLL-family solvers
            // also transport the waves moving away from the interface.
            for n in 0..nwave {
                if es.ev[n] > 0.0 {
                    let mut qa = 0.0;
                    for m in 0..nwave {
                        qa += es.lem[n][m] * 0.5 * dtodx * (ev_max - es.ev[n]) * dw[m];
                    }
                    for m in 0..nwave {
                        pwl[m] += qa * es.rem[m][n];
                    }
                    if hll_type {
                        let mut qa = 0.0;
                        for m in 0..nwave {
                            qa += es.lem[n][m] * 0.5 * dtodx * (es.ev[n] - ev_min) * dw[m];
                        }
                        for m in 0..nwave {
                            pwr[m] -= qa * es.rem[m][n];
                        }
                    }
                } else if es.ev[n] < 0.0 {
                    let mut qa = 0.0;
                    for m in 0..nwave {
                        qa += es.lem[n][m] * 0.5 * dtodx * (ev_min - es.ev[n]) * dw[m];
                    }
                    for m in 0..nwave {
                        pwr[m] += qa * es.rem[m][n];
                    }
                    if hll_type {
                        let mut qa = 0.0;
                        for m in 0..nwave {
                            qa += es.lem[n][m] * 0.5 * dtodx * (es.ev[n] - ev_max) * dw[m];
                        }
                        for m in 0..nwave {
                            pwl[m] -= qa * es.rem[m][n];
                        }
                    }
                }
            }

            // Scalars advect with the fluid velocity.
            let vx = w[i].vx;
            for n in nwave..ncomp {
                if vx > 0.0 {
                    pwl[n] += 0.5 * dtodx * (ev_max - vx) * dw[n];
                } else if vx < 0.0 {
                    pwr[n] += 0.5 * dtodx * (ev_min - vx) * dw[n];
                }
            }
        }

        wl[i + 1] = unpack_prim(phys, &pwl);
        wr[i] = unpack_prim(phys, &pwr);
    }
}

/// Piecewise-constant L/R states over faces `[il, iu + 1]`: the limited
/// slope forced to zero everywhere.
pub fn lr_states_first_order(u1d: &[Cons1D], il: usize, iu: usize, ul: &mut [Cons1D], ur: &mut [Cons1D]) {
    for i in il..=(iu + 1) {
        ul[i] = u1d[i - 1];
        ur[i] = u1d[i];
    }
}
