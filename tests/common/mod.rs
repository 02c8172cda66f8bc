//! Shared helpers for the integration tests.
//!
//! Boundary conditions are an external collaborator's responsibility, so
//! the tests own their ghost-cell fills: periodic wrap-around and
//! zero-gradient (outflow) clamping, for both cell state and the
//! staggered face fields.
#![allow(dead_code)] // not every test binary uses every helper

use vlct::{CellState, Eos, FieldModel, Grid, IntegratorConfig, Prim1D};

/// Wrap an index into the interior `[ng, ng + n)` with period `n`.
fn wrap(x: usize, ng: usize, n: usize) -> usize {
    ng + (x as isize - ng as isize).rem_euclid(n as isize) as usize
}

/// Clamp an index into the interior `[ng, ng + n)`.
fn clamp(x: usize, ng: usize, n: usize) -> usize {
    x.max(ng).min(ng + n - 1)
}

/// Fill every ghost entry (cells and faces) from its periodic image.
pub fn fill_periodic(g: &mut Grid) {
    let ng = g.nghost();
    let n = g.interior();
    let nt = g.total();
    for k in 0..nt[2] {
        for j in 0..nt[1] {
            for i in 0..nt[0] {
                let w = (wrap(i, ng, n[0]), wrap(j, ng, n[1]), wrap(k, ng, n[2]));
                if w != (i, j, k) {
                    g.u[(i, j, k)] = g.u[w];
                    g.b1i[(i, j, k)] = g.b1i[w];
                    g.b2i[(i, j, k)] = g.b2i[w];
                    g.b3i[(i, j, k)] = g.b3i[w];
                }
            }
        }
    }
}

/// Fill every ghost entry by clamping to the nearest interior entry
/// (zero-gradient outflow on all sides).
pub fn fill_outflow(g: &mut Grid) {
    let ng = g.nghost();
    let n = g.interior();
    let nt = g.total();
    for k in 0..nt[2] {
        for j in 0..nt[1] {
            for i in 0..nt[0] {
                let w = (clamp(i, ng, n[0]), clamp(j, ng, n[1]), clamp(k, ng, n[2]));
                if w != (i, j, k) {
                    g.u[(i, j, k)] = g.u[w];
                    g.b1i[(i, j, k)] = g.b1i[w];
                    g.b2i[(i, j, k)] = g.b2i[w];
                    g.b3i[(i, j, k)] = g.b3i[w];
                }
            }
        }
    }
}

/// Cell state from primitives for the given configuration (zero field).
pub fn cell_from_prim(cfg: &IntegratorConfig, w: &Prim1D) -> CellState {
    let phys = cfg.physics();
    let u = vlct::prim1d_to_cons1d(w, 0.0, &phys);
    CellState {
        d: u.d,
        m: [u.mx, u.my, u.mz],
        e: u.e,
        bc: [0.0; 3],
        s: u.s,
    }
}

/// Set the cell-centered field to the average of the face fields and fold
/// the magnetic energy into the total energy (consistent MHD setup).
pub fn finish_mhd_setup(cfg: &IntegratorConfig, g: &mut Grid) {
    assert_eq!(cfg.field, FieldModel::Mhd);
    let nt = g.total();
    for k in 0..nt[2] - 1 {
        for j in 0..nt[1] - 1 {
            for i in 0..nt[0] - 1 {
                let bc = [
                    0.5 * (g.b1i[(i, j, k)] + g.b1i[(i + 1, j, k)]),
                    0.5 * (g.b2i[(i, j, k)] + g.b2i[(i, j + 1, k)]),
                    0.5 * (g.b3i[(i, j, k)] + g.b3i[(i, j, k + 1)]),
                ];
                let u = &mut g.u[(i, j, k)];
                u.bc = bc;
                if cfg.eos.is_adiabatic() {
                    u.e += 0.5 * (bc[0] * bc[0] + bc[1] * bc[1] + bc[2] * bc[2]);
                }
            }
        }
    }
}

/// A conservative timestep from the fastest signal speed in the interior.
pub fn stable_dt(cfg: &IntegratorConfig, g: &Grid, cfl: f64) -> f64 {
    let phys = cfg.physics();
    let mut vmax = 0.0f64;
    for k in g.lo(vlct::Axis::X3)..=g.hi(vlct::Axis::X3) {
        for j in g.lo(vlct::Axis::X2)..=g.hi(vlct::Axis::X2) {
            for i in g.lo(vlct::Axis::X1)..=g.hi(vlct::Axis::X1) {
                let c = &g.u[(i, j, k)];
                for a in vlct::Axis::ALL {
                    let q = a.sweep_cons(c);
                    let bx = c.bc[a.perm()[0]];
                    let v = (q.mx / q.d).abs() + vlct::cfast(&q, bx, &phys);
                    vmax = vmax.max(v);
                }
            }
        }
    }
    let dxmin = g.dx[0].min(g.dx[1]).min(g.dx[2]);
    cfl * dxmin / vmax
}

/// Sound-speed-consistent uniform medium: `d = 1`, `v = 0`, `p = 1/Gamma`.
pub fn uniform_medium(cfg: &IntegratorConfig) -> Prim1D {
    let p = match cfg.eos {
        Eos::Adiabatic { gamma } => 1.0 / gamma,
        Eos::Isothermal { .. } => 0.0,
    };
    Prim1D {
        d: 1.0,
        p,
        ..Prim1D::default()
    }
}
