//! Eigensystems of the primitive-variable flux Jacobian.
//!
//! The characteristic reconstructor projects primitive-variable
//! differences onto the left eigenvectors of the quasi-linear system
//! `dW/dt + A(W) dW/dx = 0` and back through the right eigenvectors.
//! Four direction-agnostic variants cover the configuration space:
//! hydro/MHD x adiabatic/isothermal, with 5/7/4/6 wave families.
//!
//! Wave ordering (rows of `lem`, columns of `rem`, entries of `ev`):
//! - adiabatic hydro:  `vx-a,  vx, vx, vx, vx+a`
//! - isothermal hydro: `vx-a,  vx, vx, vx+a`
//! - adiabatic MHD:    `vx-cf, vx-va, vx-cs, vx, vx+cs, vx+va, vx+cf`
//! - isothermal MHD:   `vx-cf, vx-va, vx-cs, vx+cs, vx+va, vx+cf`
//!
//! Normalization follows Roe & Balsara (1996): the magnetosonic vectors
//! are scaled by the alpha_f/alpha_s factors, which stay well defined in
//! the triple-umbilic degeneracies (`bt -> 0`, `cf -> cs`).

use crate::config::{Eos, FieldModel, Physics, NWAVE_MAX};
use crate::state::Prim1D;

/// Eigenvalues and left/right eigenmatrices at one cell.
///
/// `rem` stores right eigenvectors as columns (`rem[component][wave]`),
/// `lem` stores left eigenvectors as rows (`lem[wave][component]`), so a
/// characteristic projection is `sum_m lem[n][m] * dW[m]`.
#[derive(Clone, Debug)]
pub(crate) struct Eigen {
    pub ev: [f64; NWAVE_MAX],
    pub rem: [[f64; NWAVE_MAX]; NWAVE_MAX],
    pub lem: [[f64; NWAVE_MAX]; NWAVE_MAX],
}

impl Default for Eigen {
    fn default() -> Self {
        Self {
            ev: [0.0; NWAVE_MAX],
            rem: [[0.0; NWAVE_MAX]; NWAVE_MAX],
            lem: [[0.0; NWAVE_MAX]; NWAVE_MAX],
        }
    }
}

impl Eigen {
    /// Fill the eigensystem for the state `w` with normal field `bx`.
    pub fn compute(&mut self, phys: &Physics, w: &Prim1D, bx: f64) {
        self.ev = [0.0; NWAVE_MAX];
        self.rem = [[0.0; NWAVE_MAX]; NWAVE_MAX];
        self.lem = [[0.0; NWAVE_MAX]; NWAVE_MAX];
        match (phys.field, phys.eos) {
            (FieldModel::Hydro, Eos::Adiabatic { gamma }) => {
                self.adiabatic_hydro(gamma, w.d, w.vx, w.p)
            }
            (FieldModel::Hydro, Eos::Isothermal { csound }) => {
                self.isothermal_hydro(csound, w.d, w.vx)
            }
            (FieldModel::Mhd, Eos::Adiabatic { gamma }) => {
                let asq = gamma * w.p / w.d;
                self.mhd(asq, true, w.d, w.vx, bx, w.by, w.bz)
            }
            (FieldModel::Mhd, Eos::Isothermal { csound }) => {
                let asq = csound * csound;
                self.mhd(asq, false, w.d, w.vx, bx, w.by, w.bz)
            }
        }
    }

    fn adiabatic_hydro(&mut self, gamma: f64, d: f64, vx: f64, p: f64) {
        let asq = gamma * p / d;
        let a = asq.sqrt();

        self.ev[..5].copy_from_slice(&[vx - a, vx, vx, vx, vx + a]);

        // Right eigenvectors as columns.
        self.rem[0][0] = 1.0;
        self.rem[1][0] = -a / d;
        self.rem[4][0] = asq;

        self.rem[0][1] = 1.0;
        self.rem[2][2] = 1.0;
        self.rem[3][3] = 1.0;

        self.rem[0][4] = 1.0;
        self.rem[1][4] = a / d;
        self.rem[4][4] = asq;

        // Left eigenvectors as rows.
        self.lem[0][1] = -0.5 * d / a;
        self.lem[0][4] = 0.5 / asq;

        self.lem[1][0] = 1.0;
        self.lem[1][4] = -1.0 / asq;

        self.lem[2][2] = 1.0;
        self.lem[3][3] = 1.0;

        self.lem[4][1] = 0.5 * d / a;
        self.lem[4][4] = 0.5 / asq;
    }

    fn isothermal_hydro(&mut self, a: f64, d: f64, vx: f64) {
        self.ev[..4].copy_from_slice(&[vx - a, vx, vx, vx + a]);

        self.rem[0][0] = 1.0;
        self.rem[1][0] = -a / d;
        self.rem[2][1] = 1.0;
        self.rem[3][2] = 1.0;
        self.rem[0][3] = 1.0;
        self.rem[1][3] = a / d;

        self.lem[0][0] = 0.5;
        self.lem[0][1] = -0.5 * d / a;
        self.lem[1][2] = 1.0;
        self.lem[2][3] = 1.0;
        self.lem[3][0] = 0.5;
        self.lem[3][1] = 0.5 * d / a;
    }

    /// Shared MHD eigensystem; `adiabatic` selects the 7-wave layout with
    /// a pressure component and entropy wave, versus the 6-wave layout.
    #[allow(clippy::too_many_arguments)]
    fn mhd(&mut self, asq: f64, adiabatic: bool, d: f64, vx: f64, bx: f64, by: f64, bz: f64) {
        let di = 1.0 / d;
        let vaxsq = bx * bx * di;
        let ctsq = (by * by + bz * bz) * di;

        let tsum = vaxsq + ctsq + asq;
        let tdif = vaxsq + ctsq - asq;
        let cf2_cs2 = (tdif * tdif + 4.0 * asq * ctsq).sqrt();
        let cfsq = 0.5 * (tsum + cf2_cs2);
        let cf = cfsq.sqrt();
        let cssq = asq * vaxsq / cfsq;
        let cs = cssq.sqrt();
        let vax = vaxsq.sqrt();
        let a = asq.sqrt();

        let bt = (by * by + bz * bz).sqrt();
        let (bet2, bet3) = if bt == 0.0 { (1.0, 0.0) } else { (by / bt, bz / bt) };

        let (alpha_f, alpha_s) = if cfsq - cssq == 0.0 {
            (1.0, 0.0)
        } else if asq - cssq <= 0.0 {
            (0.0, 1.0)
        } else if cfsq - asq <= 0.0 {
            (1.0, 0.0)
        } else {
            (
                ((asq - cssq) / (cfsq - cssq)).sqrt(),
                ((cfsq - asq) / (cfsq - cssq)).sqrt(),
            )
        };

        let s = if bx >= 0.0 { 1.0 } else { -1.0 };
        let sqrtd = d.sqrt();
        let qf = cf * alpha_f * s;
        let qs = cs * alpha_s * s;
        let af = a * alpha_f * sqrtd;
        let as_ = a * alpha_s * sqrtd;

        // Component indices: [d, vx, vy, vz, (p), by, bz].
        let (ip, iby, ibz) = if adiabatic { (4, 5, 6) } else { (0, 4, 5) };

        // Wave indices: fast-, alfven-, slow-, (entropy), slow+, alfven+, fast+.
        let (wf_m, wa_m, ws_m) = (0, 1, 2);
        let (ws_p, wa_p, wf_p) = if adiabatic { (4, 5, 6) } else { (3, 4, 5) };

        self.ev[wf_m] = vx - cf;
        self.ev[wa_m] = vx - vax;
        self.ev[ws_m] = vx - cs;
        if adiabatic {
            self.ev[3] = vx;
        }
        self.ev[ws_p] = vx + cs;
        self.ev[wa_p] = vx + vax;
        self.ev[wf_p] = vx + cf;

        // Right eigenvectors (columns).
        for (col, sgn) in [(wf_m, -1.0), (wf_p, 1.0)] {
            self.rem[0][col] = d * alpha_f;
            self.rem[1][col] = sgn * cf * alpha_f;
            self.rem[2][col] = -sgn * qs * bet2;
            self.rem[3][col] = -sgn * qs * bet3;
            if adiabatic {
                self.rem[ip][col] = d * asq * alpha_f;
            }
            self.rem[iby][col] = as_ * bet2;
            self.rem[ibz][col] = as_ * bet3;
        }
        for (col, sgn) in [(ws_m, -1.0), (ws_p, 1.0)] {
            self.rem[0][col] = d * alpha_s;
            self.rem[1][col] = sgn * cs * alpha_s;
            self.rem[2][col] = sgn * qf * bet2;
            self.rem[3][col] = sgn * qf * bet3;
            if adiabatic {
                self.rem[ip][col] = d * asq * alpha_s;
            }
            self.rem[iby][col] = -af * bet2;
            self.rem[ibz][col] = -af * bet3;
        }
        for (col, sgn) in [(wa_m, -1.0), (wa_p, 1.0)] {
            self.rem[2][col] = -bet3;
            self.rem[3][col] = bet2;
            self.rem[iby][col] = sgn * s * sqrtd * bet3;
            self.rem[ibz][col] = -sgn * s * sqrtd * bet2;
        }
        if adiabatic {
            self.rem[0][3] = 1.0;
        }

        // Left eigenvectors (rows), normalized by 1/(2 asq).
        let norm = 0.5 / asq;
        let cff = norm * cf * alpha_f;
        let css = norm * cs * alpha_s;
        let qf_h = norm * qf;
        let qs_h = norm * qs;
        let af_h = norm * af * di;
        let as_h = norm * as_ * di;

        for (row, sgn) in [(wf_m, -1.0), (wf_p, 1.0)] {
            if adiabatic {
                self.lem[row][ip] = norm * alpha_f * di;
            } else {
                self.lem[row][0] = 0.5 * alpha_f * di;
            }
            self.lem[row][1] = sgn * cff;
            self.lem[row][2] = -sgn * qs_h * bet2;
            self.lem[row][3] = -sgn * qs_h * bet3;
            self.lem[row][iby] = as_h * bet2;
            self.lem[row][ibz] = as_h * bet3;
        }
        for (row, sgn) in [(ws_m, -1.0), (ws_p, 1.0)] {
            if adiabatic {
                self.lem[row][ip] = norm * alpha_s * di;
            } else {
                self.lem[row][0] = 0.5 * alpha_s * di;
            }
            self.lem[row][1] = sgn * css;
            self.lem[row][2] = sgn * qf_h * bet2;
            self.lem[row][3] = sgn * qf_h * bet3;
            self.lem[row][iby] = -af_h * bet2;
            self.lem[row][ibz] = -af_h * bet3;
        }
        for (row, sgn) in [(wa_m, -1.0), (wa_p, 1.0)] {
            self.lem[row][2] = -0.5 * bet3;
            self.lem[row][3] = 0.5 * bet2;
            self.lem[row][iby] = sgn * 0.5 * s * bet3 / sqrtd;
            self.lem[row][ibz] = -sgn * 0.5 * s * bet2 / sqrtd;
        }
        if adiabatic {
            self.lem[3][0] = 1.0;
            self.lem[3][ip] = -1.0 / asq;
        }
    }
}
