//! The directionally-unsplit van Leer predictor-corrector integrator.
//!
//! One [`VlIntegrator::step`] advances a [`Grid`] by `grid.dt`:
//!
//! 1. **Predictor**: first-order fluxes from cell-centered states in the
//!    three sweep directions (x1, x2, x3, in that order), a half-dt CT
//!    update of workspace copies of the face fields, and a half-dt update
//!    of a full copy of the cell state (with half-dt gravity sources).
//! 2. **Corrector**: characteristic PLM reconstruction on the half-step
//!    state per direction, second-order fluxes (optionally with the
//!    H-correction dissipation hint), a full-dt CT update of the live
//!    face fields, full-dt gravity sources, and the full-dt conserved
//!    update.
//! 3. **Positivity safeguard**: when configured, cells driven to
//!    non-positive density are repaired by reverting their interfaces to
//!    first-order fluxes and EMFs; a violation that survives the repair
//!    is fatal. Finally the cell-centered field is reset to the average
//!    of the updated face fields.
//!
//! All scratch storage lives in a [`Workspace`] allocated once for the
//! maximum block dimensions and fully overwritten every step.

use thiserror::Error;

use crate::config::{CorrectionMode, FieldModel, IntegratorConfig, Physics, Reconstruction};
use crate::convert::{cfast, cons1d_to_prim1d, prim1d_to_cons1d};
use crate::correct;
use crate::emf;
use crate::grid::{Axis, Field3, Grid};
use crate::reconstruct::{lr_states_plm, PlmMode};
use crate::riemann::{create_solver, RiemannSolver};
use crate::state::{CellState, Cons1D, Prim1D};

/// Diagnostics returned by a successful step.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepReport {
    /// Number of cells repaired by the first-order flux correction.
    pub corrected_cells: usize,
}

/// Unrecoverable step failure.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("density {d:.4e} at cell ({i}, {j}, {k}) is non-positive after the conserved update")]
    NegativeDensity { i: usize, j: usize, k: usize, d: f64 },
    #[error("grid block {got:?} exceeds the workspace capacity {max:?}")]
    BlockTooLarge { got: [usize; 3], max: [usize; 3] },
    #[error("grid has {got} ghost layers but the configuration requires {need}")]
    InsufficientGhosts { got: usize, need: usize },
}

/// Map a position along the sweep line plus two transverse coordinates to
/// grid indices: `t` sits on the sweep axis, `o1`/`o2` on the transverse
/// axes in permutation order.
#[inline]
pub(crate) fn line_index(a: Axis, t: usize, o1: usize, o2: usize) -> (usize, usize, usize) {
    let p = a.perm();
    let mut c = [0usize; 3];
    c[p[0]] = t;
    c[p[1]] = o1;
    c[p[2]] = o2;
    (c[0], c[1], c[2])
}

// =============================================================================
// Workspace
// =============================================================================

/// Scratch buffers for one integrator, sized once for the maximum block
/// dimensions (including ghosts) and reused every step. Buffers for
/// physics the configuration disables stay empty.
pub(crate) struct Workspace {
    max_nt: [usize; 3],
    pub(crate) uhalf: Field3<CellState>,
    /// Workspace copies of the face fields, advanced by the predictor.
    pub(crate) bface: [Field3<f64>; 3],
    pub(crate) ul_face: [Field3<Cons1D>; 3],
    pub(crate) ur_face: [Field3<Cons1D>; 3],
    pub(crate) flux: [Field3<Cons1D>; 3],
    pub(crate) emf: [Field3<f64>; 3],
    pub(crate) emf_cc: [Field3<f64>; 3],
    eta: [Field3<f64>; 3],
    /// Per-cell face bitmask for the positivity safeguard.
    pub(crate) flags: Field3<u8>,
    /// Per-edge rebuild marks for the positivity safeguard.
    pub(crate) eflag: [Field3<bool>; 3],
    // 1D sweep lines.
    u1d: Vec<Cons1D>,
    wline: Vec<Prim1D>,
    wl: Vec<Prim1D>,
    wr: Vec<Prim1D>,
    bxc: Vec<f64>,
}

impl Workspace {
    pub(crate) fn new(max_nt: [usize; 3], cfg: &IntegratorConfig) -> Self {
        let (n1, n2, n3) = (max_nt[0], max_nt[1], max_nt[2]);
        let f3 = || Field3::<f64>::new(n1, n2, n3);
        let c3 = || Field3::<Cons1D>::new(n1, n2, n3);
        let mhd = cfg.field == FieldModel::Mhd;
        let nmax = n1.max(n2).max(n3) + 1;

        Self {
            max_nt,
            uhalf: Field3::new(n1, n2, n3),
            bface: if mhd {
                [f3(), f3(), f3()]
            } else {
                [Field3::empty(), Field3::empty(), Field3::empty()]
            },
            ul_face: [c3(), c3(), c3()],
            ur_face: [c3(), c3(), c3()],
            flux: [c3(), c3(), c3()],
            emf: if mhd {
                [f3(), f3(), f3()]
            } else {
                [Field3::empty(), Field3::empty(), Field3::empty()]
            },
            emf_cc: if mhd {
                [f3(), f3(), f3()]
            } else {
                [Field3::empty(), Field3::empty(), Field3::empty()]
            },
            eta: if cfg.correction == CorrectionMode::HCorrection {
                [f3(), f3(), f3()]
            } else {
                [Field3::empty(), Field3::empty(), Field3::empty()]
            },
            flags: if cfg.correction == CorrectionMode::FirstOrderFlux {
                Field3::new(n1, n2, n3)
            } else {
                Field3::empty()
            },
            eflag: if cfg.correction == CorrectionMode::FirstOrderFlux && mhd {
                [
                    Field3::new(n1, n2, n3),
                    Field3::new(n1, n2, n3),
                    Field3::new(n1, n2, n3),
                ]
            } else {
                [Field3::empty(), Field3::empty(), Field3::empty()]
            },
            u1d: vec![Cons1D::default(); nmax],
            wline: vec![Prim1D::default(); nmax],
            wl: vec![Prim1D::default(); nmax],
            wr: vec![Prim1D::default(); nmax],
            bxc: vec![0.0; nmax],
        }
    }
}

// =============================================================================
// Integrator
// =============================================================================

/// The van Leer unsplit integrator with constrained transport.
pub struct VlIntegrator {
    cfg: IntegratorConfig,
    solver: Box<dyn RiemannSolver>,
    ws: Workspace,
}

impl VlIntegrator {
    /// Validate the configuration and allocate scratch storage for blocks
    /// up to `max_interior` cells per axis (plus the required ghosts).
    pub fn new(
        cfg: IntegratorConfig,
        max_interior: [usize; 3],
    ) -> Result<Self, crate::config::ConfigError> {
        cfg.validate()?;
        let ng = cfg.required_nghost();
        let max_nt = [
            max_interior[0] + 2 * ng,
            max_interior[1] + 2 * ng,
            max_interior[2] + 2 * ng,
        ];
        let solver = create_solver(cfg.solver);
        let ws = Workspace::new(max_nt, &cfg);
        Ok(Self { cfg, solver, ws })
    }

    /// The active configuration.
    pub fn config(&self) -> &IntegratorConfig {
        &self.cfg
    }

    /// Advance the grid by one timestep of `g.dt`, mutating cell state and
    /// face fields in place. Ghost cells must be valid on entry.
    pub fn step(&mut self, g: &mut Grid) -> Result<StepReport, StepError> {
        let need = self.cfg.required_nghost();
        if g.nghost() < need {
            return Err(StepError::InsufficientGhosts {
                got: g.nghost(),
                need,
            });
        }
        let nt = g.total();
        if nt[0] > self.ws.max_nt[0] || nt[1] > self.ws.max_nt[1] || nt[2] > self.ws.max_nt[2] {
            return Err(StepError::BlockTooLarge {
                got: nt,
                max: self.ws.max_nt,
            });
        }

        let phys = self.cfg.physics();
        let mhd = self.cfg.field == FieldModel::Mhd;
        let dtodx = [g.dt / g.dx[0], g.dt / g.dx[1], g.dt / g.dx[2]];
        let hdtodx = [0.5 * dtodx[0], 0.5 * dtodx[1], 0.5 * dtodx[2]];

        // Corrector loop bounds; PLM needs one more cell of stencil than
        // piecewise-constant reconstruction.
        let margin = match self.cfg.order {
            Reconstruction::FirstOrder => 1,
            Reconstruction::Plm => 2,
        };
        let bb = [margin, margin, margin];
        let tt = [nt[0] - 1 - margin, nt[1] - 1 - margin, nt[2] - 1 - margin];

        self.predictor(g, &phys, mhd, nt, hdtodx);
        self.corrector(g, &phys, mhd, nt, dtodx, bb, tt);

        // Positivity safeguard, or the plain fatal check when the
        // fallback is disabled.
        let corrected = if self.cfg.correction == CorrectionMode::FirstOrderFlux {
            correct::first_order_correction(g, &self.cfg, self.solver.as_ref(), &mut self.ws)?
        } else {
            for k in g.lo(Axis::X3)..=g.hi(Axis::X3) {
                for j in g.lo(Axis::X2)..=g.hi(Axis::X2) {
                    for i in g.lo(Axis::X1)..=g.hi(Axis::X1) {
                        let d = g.u[(i, j, k)].d;
                        if d <= 0.0 {
                            log::error!("non-positive density {d:.4e} at ({i}, {j}, {k})");
                            return Err(StepError::NegativeDensity { i, j, k, d });
                        }
                    }
                }
            }
            0
        };

        // Cell-centered field from the average of the updated face pairs.
        if mhd {
            for k in bb[2] + 1..=tt[2] - 1 {
                for j in bb[1] + 1..=tt[1] - 1 {
                    for i in bb[0] + 1..=tt[0] - 1 {
                        let u = &mut g.u[(i, j, k)];
                        u.bc[0] = 0.5 * (g.b1i[(i, j, k)] + g.b1i[(i + 1, j, k)]);
                        u.bc[1] = 0.5 * (g.b2i[(i, j, k)] + g.b2i[(i, j + 1, k)]);
                        u.bc[2] = 0.5 * (g.b3i[(i, j, k)] + g.b3i[(i, j, k + 1)]);
                    }
                }
            }
        }

        Ok(StepReport {
            corrected_cells: corrected,
        })
    }

    // -------------------------------------------------------------------------
    // Predictor stage
    // -------------------------------------------------------------------------

    fn predictor(&mut self, g: &Grid, phys: &Physics, mhd: bool, nt: [usize; 3], hdtodx: [f64; 3]) {
        let ws = &mut self.ws;

        // Seed the half-step state and the workspace face fields.
        for k in 0..nt[2] {
            for j in 0..nt[1] {
                for i in 0..nt[0] {
                    ws.uhalf[(i, j, k)] = g.u[(i, j, k)];
                }
            }
        }
        if mhd {
            for (a, bf) in ws.bface.iter_mut().enumerate() {
                let src = g.face_field(Axis::ALL[a]);
                for k in 0..nt[2] {
                    for j in 0..nt[1] {
                        for i in 0..nt[0] {
                            bf[(i, j, k)] = src[(i, j, k)];
                        }
                    }
                }
            }
        }

        // First-order fluxes per direction from cell-centered values of
        // U^n; no reconstruction.
        for a in Axis::ALL {
            let ai = a.idx();
            let (di, dj, dk) = a.offset();
            for k in dk..nt[2] {
                for j in dj..nt[1] {
                    for i in di..nt[0] {
                        let ul = a.sweep_cons(&g.u[(i - di, j - dj, k - dk)]);
                        let ur = a.sweep_cons(&g.u[(i, j, k)]);
                        let bx = if mhd { ws.bface[ai][(i, j, k)] } else { 0.0 };
                        ws.flux[ai][(i, j, k)] = self.solver.flux(bx, &ul, &ur, phys, 0.0);
                    }
                }
            }
        }

        if mhd {
            // Cell-centered EMF estimate B x v at t^n, corner averaging,
            // and the half-dt CT update of the workspace face fields.
            cell_center_emf(&g.u, &mut ws.emf_cc, nt);
            emf::integrate_corners(&ws.flux, &ws.emf_cc, &mut ws.emf, nt);
            let [bf1, bf2, bf3] = &mut ws.bface;
            ct_update(
                bf1,
                bf2,
                bf3,
                &ws.emf,
                hdtodx,
                [1, 1, 1],
                [nt[0] - 2, nt[1] - 2, nt[2] - 2],
            );
            for k in 1..=nt[2] - 2 {
                for j in 1..=nt[1] - 2 {
                    for i in 1..=nt[0] - 2 {
                        let u = &mut ws.uhalf[(i, j, k)];
                        u.bc[0] = 0.5 * (ws.bface[0][(i, j, k)] + ws.bface[0][(i + 1, j, k)]);
                        u.bc[1] = 0.5 * (ws.bface[1][(i, j, k)] + ws.bface[1][(i, j + 1, k)]);
                        u.bc[2] = 0.5 * (ws.bface[2][(i, j, k)] + ws.bface[2][(i, j, k + 1)]);
                    }
                }
            }
        }

        // Half-dt conserved update from the first-order flux divergence.
        hydro_update(
            &mut ws.uhalf,
            &ws.flux,
            hdtodx,
            phys,
            [1, 1, 1],
            [nt[0] - 2, nt[1] - 2, nt[2] - 2],
        );

        // Half-dt gravitational source terms, using the t^n density.
        if let Some(phi) = self.cfg.gravity.get() {
            gravity_source(
                phi,
                g.x0,
                g.dx,
                g.nghost(),
                &g.u,
                &ws.flux,
                &mut ws.uhalf,
                hdtodx,
                phys.eos.is_adiabatic(),
                [1, 1, 1],
                [nt[0] - 2, nt[1] - 2, nt[2] - 2],
            );
        }
    }

    // -------------------------------------------------------------------------
    // Corrector stage
    // -------------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn corrector(
        &mut self,
        g: &mut Grid,
        phys: &Physics,
        mhd: bool,
        nt: [usize; 3],
        dtodx: [f64; 3],
        bb: [usize; 3],
        tt: [usize; 3],
    ) {
        // Second-order interface states from the half-step state.
        for a in Axis::ALL {
            self.reconstruct_axis(a, phys, nt, dtodx, bb, tt);
        }

        if self.cfg.correction == CorrectionMode::HCorrection {
            self.compute_eta(phys, mhd, nt);
        }

        // Second-order fluxes, with the dissipation hint when enabled.
        let hcorr = self.cfg.correction == CorrectionMode::HCorrection;
        for a in Axis::ALL {
            let ai = a.idx();
            let p = a.perm();
            let ws = &mut self.ws;
            for o2 in bb[p[2]]..=tt[p[2]] {
                for o1 in bb[p[1]]..=tt[p[1]] {
                    for t in bb[ai] + 1..=tt[ai] {
                        let idx = line_index(a, t, o1, o2);
                        let etah = if hcorr { eta_stencil_max(&ws.eta, a, idx) } else { 0.0 };
                        let bx = if mhd { ws.bface[ai][idx] } else { 0.0 };
                        let f = self.solver.flux(
                            bx,
                            &ws.ul_face[ai][idx],
                            &ws.ur_face[ai][idx],
                            phys,
                            etah,
                        );
                        ws.flux[ai][idx] = f;
                    }
                }
            }
        }

        let ws = &mut self.ws;
        if mhd {
            // Corner EMFs from the half-step state, then the full-dt CT
            // update of the live face fields.
            cell_center_emf(&ws.uhalf, &mut ws.emf_cc, nt);
            emf::integrate_corners(&ws.flux, &ws.emf_cc, &mut ws.emf, nt);
            ct_update(
                &mut g.b1i,
                &mut g.b2i,
                &mut g.b3i,
                &ws.emf,
                dtodx,
                [bb[0] + 1, bb[1] + 1, bb[2] + 1],
                [tt[0] - 1, tt[1] - 1, tt[2] - 1],
            );
        }

        // Full-dt gravitational sources, using the half-step density.
        if let Some(phi) = self.cfg.gravity.get() {
            let (x0, dx, ng) = (g.x0, g.dx, g.nghost());
            gravity_source(
                phi,
                x0,
                dx,
                ng,
                &ws.uhalf,
                &ws.flux,
                &mut g.u,
                dtodx,
                phys.eos.is_adiabatic(),
                [1, 1, 1],
                [nt[0] - 2, nt[1] - 2, nt[2] - 2],
            );
        }

        // Full-dt conserved update.
        hydro_update(
            &mut g.u,
            &ws.flux,
            dtodx,
            phys,
            [bb[0] + 1, bb[1] + 1, bb[2] + 1],
            [tt[0] - 1, tt[1] - 1, tt[2] - 1],
        );
    }

    /// Gather sweep lines of the half-step state along `a`, reconstruct,
    /// and store conserved L/R states for faces `[bb+1, tt]`.
    #[allow(clippy::too_many_arguments)]
    fn reconstruct_axis(
        &mut self,
        a: Axis,
        phys: &Physics,
        nt: [usize; 3],
        dtodx: [f64; 3],
        bb: [usize; 3],
        tt: [usize; 3],
    ) {
        let ai = a.idx();
        let p = a.perm();
        let n_line = nt[ai];
        let hll = self.cfg.solver.is_hll_type();
        let order = self.cfg.order;
        let Workspace {
            uhalf,
            ul_face,
            ur_face,
            u1d,
            wline,
            wl,
            wr,
            bxc,
            ..
        } = &mut self.ws;

        for o2 in bb[p[2]]..=tt[p[2]] {
            for o1 in bb[p[1]]..=tt[p[1]] {
                for t in 0..n_line {
                    let idx = line_index(a, t, o1, o2);
                    let u = &uhalf[idx];
                    u1d[t] = a.sweep_cons(u);
                    bxc[t] = u.bc[p[0]];
                }

                match order {
                    Reconstruction::Plm => {
                        for t in 0..n_line {
                            wline[t] = cons1d_to_prim1d(&u1d[t], bxc[t], phys);
                        }
                        lr_states_plm(
                            phys,
                            PlmMode::Corrector,
                            hll,
                            dtodx[ai],
                            wline,
                            bxc,
                            bb[ai] + 1,
                            tt[ai] - 1,
                            wl,
                            wr,
                        );
                        for t in bb[ai] + 1..=tt[ai] {
                            let idx = line_index(a, t, o1, o2);
                            ul_face[ai][idx] = prim1d_to_cons1d(&wl[t], bxc[t], phys);
                            ur_face[ai][idx] = prim1d_to_cons1d(&wr[t], bxc[t], phys);
                        }
                    }
                    Reconstruction::FirstOrder => {
                        for t in bb[ai] + 1..=tt[ai] {
                            let idx = line_index(a, t, o1, o2);
                            ul_face[ai][idx] = u1d[t - 1];
                            ur_face[ai][idx] = u1d[t];
                        }
                    }
                }
            }
        }
    }

    /// Per-face dissipation coefficients for the H-correction, from the
    /// first-order L/R states (adjacent half-step cell pairs).
    fn compute_eta(&mut self, phys: &Physics, mhd: bool, nt: [usize; 3]) {
        let ws = &mut self.ws;
        for a in Axis::ALL {
            let ai = a.idx();
            let (di, dj, dk) = a.offset();
            for k in dk..nt[2] {
                for j in dj..nt[1] {
                    for i in di..nt[0] {
                        let ul = a.sweep_cons(&ws.uhalf[(i - di, j - dj, k - dk)]);
                        let ur = a.sweep_cons(&ws.uhalf[(i, j, k)]);
                        let bx = if mhd { ws.bface[ai][(i, j, k)] } else { 0.0 };
                        let du = (ur.mx / ur.d - ul.mx / ul.d).abs();
                        let dcf = (cfast(&ur, bx, phys) - cfast(&ul, bx, phys)).abs();
                        ws.eta[ai][(i, j, k)] = 0.5 * (du + dcf);
                    }
                }
            }
        }
    }
}

/// Maximum eta over the face itself and the eight transverse-neighbor
/// faces sharing its edges (Sanders et al. 1998, eq. 10).
fn eta_stencil_max(eta: &[Field3<f64>; 3], a: Axis, idx: (usize, usize, usize)) -> f64 {
    let p = a.perm();
    let (da, dja, dka) = a.offset();
    let behind = (idx.0 - da, idx.1 - dja, idx.2 - dka);
    let mut m = eta[a.idx()][idx];
    for b in [Axis::ALL[p[1]], Axis::ALL[p[2]]] {
        let (db, djb, dkb) = b.offset();
        for base in [idx, behind] {
            let ahead = (base.0 + db, base.1 + djb, base.2 + dkb);
            m = m.max(eta[b.idx()][base]).max(eta[b.idx()][ahead]);
        }
    }
    m
}

/// Cell-centered EMF estimate `B x v` for every cell.
fn cell_center_emf(u: &Field3<CellState>, emf_cc: &mut [Field3<f64>; 3], nt: [usize; 3]) {
    for k in 0..nt[2] {
        for j in 0..nt[1] {
            for i in 0..nt[0] {
                let c = &u[(i, j, k)];
                let di = 1.0 / c.d;
                emf_cc[0][(i, j, k)] = (c.bc[1] * c.m[2] - c.bc[2] * c.m[1]) * di;
                emf_cc[1][(i, j, k)] = (c.bc[2] * c.m[0] - c.bc[0] * c.m[2]) * di;
                emf_cc[2][(i, j, k)] = (c.bc[0] * c.m[1] - c.bc[1] * c.m[0]) * di;
            }
        }
    }
}

/// Constrained-transport update of the three face-field arrays from the
/// corner EMFs over faces `[lo, hi]`, with the one-past-the-end tail
/// faces each array still has valid EMF stencils for.
pub(crate) fn ct_update(
    b1: &mut Field3<f64>,
    b2: &mut Field3<f64>,
    b3: &mut Field3<f64>,
    emf: &[Field3<f64>; 3],
    q: [f64; 3],
    lo: [usize; 3],
    hi: [usize; 3],
) {
    for k in lo[2]..=hi[2] {
        for j in lo[1]..=hi[1] {
            for i in lo[0]..=hi[0] {
                b1[(i, j, k)] += q[2] * (emf[1][(i, j, k + 1)] - emf[1][(i, j, k)])
                    - q[1] * (emf[2][(i, j + 1, k)] - emf[2][(i, j, k)]);
                b2[(i, j, k)] += q[0] * (emf[2][(i + 1, j, k)] - emf[2][(i, j, k)])
                    - q[2] * (emf[0][(i, j, k + 1)] - emf[0][(i, j, k)]);
                b3[(i, j, k)] += q[1] * (emf[0][(i, j + 1, k)] - emf[0][(i, j, k)])
                    - q[0] * (emf[1][(i + 1, j, k)] - emf[1][(i, j, k)]);
            }
            let i = hi[0] + 1;
            b1[(i, j, k)] += q[2] * (emf[1][(i, j, k + 1)] - emf[1][(i, j, k)])
                - q[1] * (emf[2][(i, j + 1, k)] - emf[2][(i, j, k)]);
        }
        let j = hi[1] + 1;
        for i in lo[0]..=hi[0] {
            b2[(i, j, k)] += q[0] * (emf[2][(i + 1, j, k)] - emf[2][(i, j, k)])
                - q[2] * (emf[0][(i, j, k + 1)] - emf[0][(i, j, k)]);
        }
    }
    let k = hi[2] + 1;
    for j in lo[1]..=hi[1] {
        for i in lo[0]..=hi[0] {
            b3[(i, j, k)] += q[1] * (emf[0][(i, j + 1, k)] - emf[0][(i, j, k)])
                - q[0] * (emf[1][(i + 1, j, k)] - emf[1][(i, j, k)]);
        }
    }
}

/// Conserved update from the flux divergence of all three directions over
/// cells `[lo, hi]`, with the momentum components scattered back through
/// the per-direction permutation.
pub(crate) fn hydro_update(
    u: &mut Field3<CellState>,
    flux: &[Field3<Cons1D>; 3],
    q: [f64; 3],
    phys: &Physics,
    lo: [usize; 3],
    hi: [usize; 3],
) {
    let adiabatic = phys.eos.is_adiabatic();
    for k in lo[2]..=hi[2] {
        for j in lo[1]..=hi[1] {
            for i in lo[0]..=hi[0] {
                for a in Axis::ALL {
                    let ai = a.idx();
                    let p = a.perm();
                    let (di, dj, dk) = a.offset();
                    let f_lo = &flux[ai][(i, j, k)];
                    let f_hi = &flux[ai][(i + di, j + dj, k + dk)];
                    let c = &mut u[(i, j, k)];
                    c.d -= q[ai] * (f_hi.d - f_lo.d);
                    c.m[p[0]] -= q[ai] * (f_hi.mx - f_lo.mx);
                    c.m[p[1]] -= q[ai] * (f_hi.my - f_lo.my);
                    c.m[p[2]] -= q[ai] * (f_hi.mz - f_lo.mz);
                    if adiabatic {
                        c.e -= q[ai] * (f_hi.e - f_lo.e);
                    }
                    for n in 0..phys.n_scalars {
                        c.s[n] -= q[ai] * (f_hi.s[n] - f_lo.s[n]);
                    }
                }
            }
        }
    }
}

/// Gravitational source terms: momentum from the potential difference
/// across each cell weighted by `dens`, and (adiabatic) energy from the
/// mass fluxes weighted by the potential differences, keeping the energy
/// update consistent with the momentum update.
#[allow(clippy::too_many_arguments)]
fn gravity_source(
    phi: fn(f64, f64, f64) -> f64,
    x0: [f64; 3],
    dx: [f64; 3],
    nghost: usize,
    dens: &Field3<CellState>,
    flux: &[Field3<Cons1D>; 3],
    target: &mut Field3<CellState>,
    q: [f64; 3],
    adiabatic: bool,
    lo: [usize; 3],
    hi: [usize; 3],
) {
    let gsh = nghost as f64;
    let pos = |i: usize, axis: usize| x0[axis] + (i as f64 - gsh + 0.5) * dx[axis];
    for k in lo[2]..=hi[2] {
        for j in lo[1]..=hi[1] {
            for i in lo[0]..=hi[0] {
                let x = [pos(i, 0), pos(j, 1), pos(k, 2)];
                let phic = phi(x[0], x[1], x[2]);
                let d = dens[(i, j, k)].d;
                for a in Axis::ALL {
                    let ai = a.idx();
                    let (di, dj, dk) = a.offset();
                    let mut xl = x;
                    let mut xr = x;
                    xl[ai] -= 0.5 * dx[ai];
                    xr[ai] += 0.5 * dx[ai];
                    let phil = phi(xl[0], xl[1], xl[2]);
                    let phir = phi(xr[0], xr[1], xr[2]);

                    let c = &mut target[(i, j, k)];
                    c.m[ai] -= q[ai] * (phir - phil) * d;
                    if adiabatic {
                        let f_lo = flux[ai][(i, j, k)].d;
                        let f_hi = flux[ai][(i + di, j + dj, k + dk)].d;
                        c.e += q[ai] * (f_lo * (phil - phic) + f_hi * (phic - phir));
                    }
                }
            }
        }
    }
}
