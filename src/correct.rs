//! Positivity safeguard: first-order flux correction.
//!
//! Second-order fluxes near strong discontinuities can drive a cell's
//! density non-positive. After the corrector's conserved update, cells
//! with `d <= 0` have all six bounding faces reverted to first-order
//! fluxes computed from the half-step state; in MHD the revert propagates
//! through the constrained-transport dependency graph so the discrete
//! divergence stays exactly preserved.
//!
//! The propagation is derived from two facts:
//! - a face's flux is an input to exactly the four corner EMFs on the
//!   edges bounding that face (for the two transverse EMF components), so
//!   replacing the flux marks those edges for rebuild;
//! - a face's CT update reads exactly the four corner EMFs on its own
//!   bounding edges, so every face adjacent to a rebuilt edge must have
//!   its CT contribution undone and reapplied.
//! The second rule guarantees that every face of every cell sees one
//! single value per edge, which is what keeps the 6-face divergence
//! stencil telescoping to zero.
//!
//! Order of operations: mark, undo hydro contributions, undo CT
//! contributions (old EMFs), replace marked fluxes, rebuild marked EMFs,
//! reapply CT (new EMFs), reapply hydro. A density that is still
//! non-positive in the physically active region afterwards is fatal.

use crate::config::{FieldModel, IntegratorConfig, Physics};
use crate::emf::{emf1_at, emf2_at, emf3_at};
use crate::grid::{Axis, Field3, Grid};
use crate::integrate::{StepError, Workspace};
use crate::riemann::RiemannSolver;
use crate::state::{CellState, Cons1D};

const FACE_X1: u8 = 1;
const FACE_X2: u8 = 2;
const FACE_X3: u8 = 4;
const FACE_ALL: u8 = FACE_X1 | FACE_X2 | FACE_X3;

#[inline]
fn face_bit(a: Axis) -> u8 {
    match a {
        Axis::X1 => FACE_X1,
        Axis::X2 => FACE_X2,
        Axis::X3 => FACE_X3,
    }
}

/// Add the contribution of one face flux to a cell, with the sweep
/// permutation scattered back to global components. `coef` carries both
/// `dt/dx` and the orientation sign.
fn add_flux(c: &mut CellState, f: &Cons1D, a: Axis, coef: f64, phys: &Physics) {
    let p = a.perm();
    c.d += coef * f.d;
    c.m[p[0]] += coef * f.mx;
    c.m[p[1]] += coef * f.my;
    c.m[p[2]] += coef * f.mz;
    if phys.eos.is_adiabatic() {
        c.e += coef * f.e;
    }
    for n in 0..phys.n_scalars {
        c.s[n] += coef * f.s[n];
    }
}

/// The constrained-transport increment of the face along `a` at `idx`.
fn ct_face_delta(
    a: Axis,
    emf: &[Field3<f64>; 3],
    q: [f64; 3],
    (i, j, k): (usize, usize, usize),
) -> f64 {
    match a {
        Axis::X1 => {
            q[2] * (emf[1][(i, j, k + 1)] - emf[1][(i, j, k)])
                - q[1] * (emf[2][(i, j + 1, k)] - emf[2][(i, j, k)])
        }
        Axis::X2 => {
            q[0] * (emf[2][(i + 1, j, k)] - emf[2][(i, j, k)])
                - q[2] * (emf[0][(i, j, k + 1)] - emf[0][(i, j, k)])
        }
        Axis::X3 => {
            q[1] * (emf[0][(i, j + 1, k)] - emf[0][(i, j, k)])
                - q[0] * (emf[1][(i + 1, j, k)] - emf[1][(i, j, k)])
        }
    }
}

/// Whether any corner EMF read by this face's CT update is marked for
/// rebuild.
fn face_needs_ct_redo(
    a: Axis,
    eflag: &[Field3<bool>; 3],
    (i, j, k): (usize, usize, usize),
) -> bool {
    match a {
        Axis::X1 => {
            eflag[1][(i, j, k)]
                || eflag[1][(i, j, k + 1)]
                || eflag[2][(i, j, k)]
                || eflag[2][(i, j + 1, k)]
        }
        Axis::X2 => {
            eflag[2][(i, j, k)]
                || eflag[2][(i + 1, j, k)]
                || eflag[0][(i, j, k)]
                || eflag[0][(i, j, k + 1)]
        }
        Axis::X3 => {
            eflag[0][(i, j, k)]
                || eflag[0][(i, j + 1, k)]
                || eflag[1][(i, j, k)]
                || eflag[1][(i + 1, j, k)]
        }
    }
}

/// Detect and repair non-positive densities after the corrector's update.
/// Returns the number of repaired cells; a violation that survives the
/// repair is fatal.
pub(crate) fn first_order_correction(
    g: &mut Grid,
    cfg: &IntegratorConfig,
    solver: &dyn RiemannSolver,
    ws: &mut Workspace,
) -> Result<usize, StepError> {
    let phys = cfg.physics();
    let mhd = cfg.field == FieldModel::Mhd;
    let dtodx = [g.dt / g.dx[0], g.dt / g.dx[1], g.dt / g.dx[2]];
    let lo = [g.lo(Axis::X1), g.lo(Axis::X2), g.lo(Axis::X3)];
    let hi = [g.hi(Axis::X1), g.hi(Axis::X2), g.hi(Axis::X3)];

    ws.flags.fill(0);

    // Scan the physically active cells plus one guard layer, deep enough
    // to cover the EMF stencils the repair depends on.
    let mut count = 0usize;
    for k in lo[2] - 1..=hi[2] + 1 {
        for j in lo[1] - 1..=hi[1] + 1 {
            for i in lo[0] - 1..=hi[0] + 1 {
                if g.u[(i, j, k)].d <= 0.0 {
                    ws.flags[(i, j, k)] |= FACE_ALL;
                    ws.flags[(i + 1, j, k)] |= FACE_X1;
                    ws.flags[(i, j + 1, k)] |= FACE_X2;
                    ws.flags[(i, j, k + 1)] |= FACE_X3;
                    count += 1;
                }
            }
        }
    }
    if count == 0 {
        return Ok(0);
    }
    log::warn!("correcting {count} non-positive densities with first-order fluxes");

    // Propagate marks to the corner EMFs fed by each marked face flux.
    if mhd {
        for e in ws.eflag.iter_mut() {
            e.fill(false);
        }
        for k in lo[2] - 1..=hi[2] + 2 {
            for j in lo[1] - 1..=hi[1] + 2 {
                for i in lo[0] - 1..=hi[0] + 2 {
                    let f = ws.flags[(i, j, k)];
                    if f & FACE_X1 != 0 {
                        ws.eflag[1][(i, j, k)] = true;
                        ws.eflag[1][(i, j, k + 1)] = true;
                        ws.eflag[2][(i, j, k)] = true;
                        ws.eflag[2][(i, j + 1, k)] = true;
                    }
                    if f & FACE_X2 != 0 {
                        ws.eflag[0][(i, j, k)] = true;
                        ws.eflag[0][(i, j, k + 1)] = true;
                        ws.eflag[2][(i, j, k)] = true;
                        ws.eflag[2][(i + 1, j, k)] = true;
                    }
                    if f & FACE_X3 != 0 {
                        ws.eflag[0][(i, j, k)] = true;
                        ws.eflag[0][(i, j + 1, k)] = true;
                        ws.eflag[1][(i, j, k)] = true;
                        ws.eflag[1][(i + 1, j, k)] = true;
                    }
                }
            }
        }
    }

    // Undo the second-order flux contributions on both cells adjacent to
    // every marked face. Only the physically active cells are repaired;
    // guard-cell inconsistencies are overwritten by the next halo
    // exchange.
    for k in lo[2]..=hi[2] {
        for j in lo[1]..=hi[1] {
            for i in lo[0]..=hi[0] {
                for a in Axis::ALL {
                    let ai = a.idx();
                    let bit = face_bit(a);
                    let (di, dj, dk) = a.offset();
                    if ws.flags[(i, j, k)] & bit != 0 {
                        let f = ws.flux[ai][(i, j, k)];
                        add_flux(&mut g.u[(i, j, k)], &f, a, -dtodx[ai], &phys);
                    }
                    if ws.flags[(i + di, j + dj, k + dk)] & bit != 0 {
                        let f = ws.flux[ai][(i + di, j + dj, k + dk)];
                        add_flux(&mut g.u[(i, j, k)], &f, a, dtodx[ai], &phys);
                    }
                }
            }
        }
    }

    // Undo the CT contribution of every active-region face that reads a
    // marked EMF, while the EMF arrays still hold their second-order
    // values.
    if mhd {
        for k in lo[2]..=hi[2] + 1 {
            for j in lo[1]..=hi[1] + 1 {
                for i in lo[0]..=hi[0] + 1 {
                    let idx = (i, j, k);
                    if face_needs_ct_redo(Axis::X1, &ws.eflag, idx) {
                        g.b1i[idx] -= ct_face_delta(Axis::X1, &ws.emf, dtodx, idx);
                    }
                    if face_needs_ct_redo(Axis::X2, &ws.eflag, idx) {
                        g.b2i[idx] -= ct_face_delta(Axis::X2, &ws.emf, dtodx, idx);
                    }
                    if face_needs_ct_redo(Axis::X3, &ws.eflag, idx) {
                        g.b3i[idx] -= ct_face_delta(Axis::X3, &ws.emf, dtodx, idx);
                    }
                }
            }
        }
    }

    // Replace marked face fluxes with first-order fluxes from the
    // half-step state.
    for k in lo[2] - 1..=hi[2] + 2 {
        for j in lo[1] - 1..=hi[1] + 2 {
            for i in lo[0] - 1..=hi[0] + 2 {
                for a in Axis::ALL {
                    if ws.flags[(i, j, k)] & face_bit(a) == 0 {
                        continue;
                    }
                    let ai = a.idx();
                    let (di, dj, dk) = a.offset();
                    let ul = a.sweep_cons(&ws.uhalf[(i - di, j - dj, k - dk)]);
                    let ur = a.sweep_cons(&ws.uhalf[(i, j, k)]);
                    let bx = if mhd { ws.bface[ai][(i, j, k)] } else { 0.0 };
                    ws.flux[ai][(i, j, k)] = solver.flux(bx, &ul, &ur, &phys, 0.0);
                }
            }
        }
    }

    // Rebuild marked corner EMFs from the updated flux arrays and
    // reapply the CT contributions.
    if mhd {
        for k in lo[2] - 1..=hi[2] + 2 {
            for j in lo[1] - 1..=hi[1] + 2 {
                for i in lo[0] - 1..=hi[0] + 2 {
                    if ws.eflag[0][(i, j, k)] {
                        let e = emf1_at(&ws.flux[1], &ws.flux[2], &ws.emf_cc[0], i, j, k);
                        ws.emf[0][(i, j, k)] = e;
                    }
                    if ws.eflag[1][(i, j, k)] {
                        let e = emf2_at(&ws.flux[0], &ws.flux[2], &ws.emf_cc[1], i, j, k);
                        ws.emf[1][(i, j, k)] = e;
                    }
                    if ws.eflag[2][(i, j, k)] {
                        let e = emf3_at(&ws.flux[0], &ws.flux[1], &ws.emf_cc[2], i, j, k);
                        ws.emf[2][(i, j, k)] = e;
                    }
                }
            }
        }
        for k in lo[2]..=hi[2] + 1 {
            for j in lo[1]..=hi[1] + 1 {
                for i in lo[0]..=hi[0] + 1 {
                    let idx = (i, j, k);
                    if face_needs_ct_redo(Axis::X1, &ws.eflag, idx) {
                        g.b1i[idx] += ct_face_delta(Axis::X1, &ws.emf, dtodx, idx);
                    }
                    if face_needs_ct_redo(Axis::X2, &ws.eflag, idx) {
                        g.b2i[idx] += ct_face_delta(Axis::X2, &ws.emf, dtodx, idx);
                    }
                    if face_needs_ct_redo(Axis::X3, &ws.eflag, idx) {
                        g.b3i[idx] += ct_face_delta(Axis::X3, &ws.emf, dtodx, idx);
                    }
                }
            }
        }
    }

    // Reapply the (now first-order) flux contributions.
    for k in lo[2]..=hi[2] {
        for j in lo[1]..=hi[1] {
            for i in lo[0]..=hi[0] {
                for a in Axis::ALL {
                    let ai = a.idx();
                    let bit = face_bit(a);
                    let (di, dj, dk) = a.offset();
                    if ws.flags[(i, j, k)] & bit != 0 {
                        let f = ws.flux[ai][(i, j, k)];
                        add_flux(&mut g.u[(i, j, k)], &f, a, dtodx[ai], &phys);
                    }
                    if ws.flags[(i + di, j + dj, k + dk)] & bit != 0 {
                        let f = ws.flux[ai][(i + di, j + dj, k + dk)];
                        add_flux(&mut g.u[(i, j, k)], &f, a, -dtodx[ai], &phys);
                    }
                }
            }
        }
    }

    // A violation that survives the repair in the active region is fatal.
    let mut first = None;
    for k in lo[2]..=hi[2] {
        for j in lo[1]..=hi[1] {
            for i in lo[0]..=hi[0] {
                let d = g.u[(i, j, k)].d;
                if d <= 0.0 {
                    log::error!("density {d:.4e} at ({i}, {j}, {k}) survived first-order correction");
                    first.get_or_insert((i, j, k, d));
                }
            }
        }
    }
    if let Some((i, j, k, d)) = first {
        return Err(StepError::NegativeDensity { i, j, k, d });
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CorrectionMode, IntegratorConfig};
    use crate::convert::prim1d_to_cons1d;
    use crate::integrate::hydro_update;
    use crate::riemann::Hlle;
    use crate::state::Prim1D;

    const NG: usize = 4;
    const N: usize = 4;
    const NT: usize = N + 2 * NG;

    fn uniform_cell(phys: &Physics, d: f64) -> CellState {
        let w = Prim1D {
            d,
            p: 1.0,
            ..Prim1D::default()
        };
        let u = prim1d_to_cons1d(&w, 0.0, phys);
        CellState {
            d: u.d,
            m: [0.0; 3],
            e: u.e,
            bc: [0.0; 3],
            s: [0.0; 4],
        }
    }

    fn setup_hydro() -> (Grid, Workspace, IntegratorConfig) {
        let cfg = IntegratorConfig::adiabatic_hydro(1.4)
            .with_correction(CorrectionMode::FirstOrderFlux);
        let phys = cfg.physics();
        let mut g = Grid::new([N, N, N], [1.0, 1.0, 1.0], [0.0, 0.0, 0.0], NG);
        g.dt = 0.1;
        let mut ws = Workspace::new([NT, NT, NT], &cfg);

        let cell = uniform_cell(&phys, 1.0);
        let f0 = crate::riemann::Hlle.flux(
            0.0,
            &Axis::X1.sweep_cons(&cell),
            &Axis::X1.sweep_cons(&cell),
            &phys,
            0.0,
        );
        for k in 0..NT {
            for j in 0..NT {
                for i in 0..NT {
                    g.u[(i, j, k)] = cell;
                    ws.uhalf[(i, j, k)] = cell;
                    for a in 0..3 {
                        ws.flux[a][(i, j, k)] = f0;
                    }
                }
            }
        }
        (g, ws, cfg)
    }

    #[test]
    fn test_repairs_planted_negative_density() {
        let (mut g, mut ws, cfg) = setup_hydro();
        let phys = cfg.physics();
        let c = (6, 6, 6);

        // Corrupt the mass flux through the right x1-face of the target
        // cell, then apply the corrector's update so the grid state is
        // exactly what the flux arrays claim.
        ws.flux[0][(7, 6, 6)].d += 20.0;
        let dtodx = [g.dt; 3];
        hydro_update(&mut g.u, &ws.flux, dtodx, &phys, [3, 3, 3], [8, 8, 8]);
        assert!(g.u[c].d < 0.0, "setup must drive the cell negative");

        let before: f64 = {
            let mut s = 0.0;
            for k in 2..=9 {
                for j in 2..=9 {
                    for i in 2..=9 {
                        s += g.u[(i, j, k)].d;
                    }
                }
            }
            s
        };

        let n = first_order_correction(&mut g, &cfg, &Hlle, &mut ws).unwrap();
        assert_eq!(n, 1);

        // The uniform half-step state gives zero first-order flux
        // divergence, so the cell comes back to exactly the background.
        assert!((g.u[c].d - 1.0).abs() < 1e-12, "repaired d = {}", g.u[c].d);
        assert!(g.u[(7, 6, 6)].d > 0.0);
        for k in 2..=9 {
            for j in 2..=9 {
                for i in 2..=9 {
                    assert!(g.u[(i, j, k)].d > 0.0, "negative d at ({i},{j},{k})");
                }
            }
        }

        // The repair only swaps fluxes, so the wide-region mass total is
        // unchanged.
        let after: f64 = {
            let mut s = 0.0;
            for k in 2..=9 {
                for j in 2..=9 {
                    for i in 2..=9 {
                        s += g.u[(i, j, k)].d;
                    }
                }
            }
            s
        };
        assert!((after - before).abs() < 1e-12);
    }

    #[test]
    fn test_surviving_negative_density_is_fatal() {
        let (mut g, mut ws, cfg) = setup_hydro();
        // Plant a negative density the uniform first-order fluxes cannot
        // repair (zero divergence leaves it untouched).
        g.u[(6, 5, 7)].d = -0.5;
        let err = first_order_correction(&mut g, &cfg, &Hlle, &mut ws).unwrap_err();
        match err {
            StepError::NegativeDensity { i, j, k, d } => {
                assert_eq!((i, j, k), (6, 5, 7));
                assert!((d + 0.5).abs() < 1e-12);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_mhd_repair_preserves_divergence() {
        let cfg = IntegratorConfig::adiabatic_mhd(1.4)
            .with_correction(CorrectionMode::FirstOrderFlux);
        let phys = cfg.physics();
        let mut g = Grid::new([N, N, N], [1.0, 1.0, 1.0], [0.0, 0.0, 0.0], NG);
        g.dt = 0.1;
        let mut ws = Workspace::new([NT, NT, NT], &cfg);

        // Divergence-free face field: each component varies only along a
        // transverse axis.
        for k in 0..NT {
            for j in 0..NT {
                for i in 0..NT {
                    g.b1i[(i, j, k)] = 0.3 * (j as f64).sin();
                    g.b2i[(i, j, k)] = 0.2 * (k as f64).cos();
                    g.b3i[(i, j, k)] = 0.1 * (i as f64).sin();
                }
            }
        }
        for k in 0..NT {
            for j in 0..NT {
                for i in 0..NT {
                    let mut cell = uniform_cell(&phys, 1.0);
                    if i < NT - 1 && j < NT - 1 && k < NT - 1 {
                        cell.bc = [
                            0.5 * (g.b1i[(i, j, k)] + g.b1i[(i + 1, j, k)]),
                            0.5 * (g.b2i[(i, j, k)] + g.b2i[(i, j + 1, k)]),
                            0.5 * (g.b3i[(i, j, k)] + g.b3i[(i, j, k + 1)]),
                        ];
                    }
                    cell.e += 0.5 * (cell.bc[0].powi(2) + cell.bc[1].powi(2) + cell.bc[2].powi(2));
                    g.u[(i, j, k)] = cell;
                    ws.uhalf[(i, j, k)] = cell;
                    ws.bface[0][(i, j, k)] = g.b1i[(i, j, k)];
                    ws.bface[1][(i, j, k)] = g.b2i[(i, j, k)];
                    ws.bface[2][(i, j, k)] = g.b3i[(i, j, k)];
                    // Stand-in second-order fluxes and EMF estimates with
                    // nonuniform texture.
                    for a in 0..3 {
                        let mut f = Cons1D::default();
                        f.d = 0.05 * ((i + 2 * j + 3 * k + a) as f64).sin();
                        f.by = 0.04 * ((2 * i + j + a) as f64).cos();
                        f.bz = 0.03 * ((i + 3 * k + a) as f64).sin();
                        ws.flux[a][(i, j, k)] = f;
                        ws.emf_cc[a][(i, j, k)] = 0.02 * ((i + j + k + a) as f64).cos();
                        ws.emf[a][(i, j, k)] = 0.06 * ((i * 2 + j + k + 2 * a) as f64).sin();
                    }
                }
            }
        }

        // Apply the corrector's CT update so the face fields are exactly
        // one curl away from the divergence-free base.
        let dtodx = [g.dt; 3];
        crate::integrate::ct_update(
            &mut g.b1i,
            &mut g.b2i,
            &mut g.b3i,
            &ws.emf,
            dtodx,
            [3, 3, 3],
            [NT - 5, NT - 5, NT - 5],
        );
        for k in NG..NG + N {
            for j in NG..NG + N {
                for i in NG..NG + N {
                    assert!(g.div_b(i, j, k).abs() < 1e-12);
                }
            }
        }

        // Drive one cell negative through a corrupted mass flux and the
        // matching conserved update.
        ws.flux[0][(7, 6, 6)].d += 20.0;
        hydro_update(&mut g.u, &ws.flux, dtodx, &phys, [3, 3, 3], [8, 8, 8]);
        assert!(g.u[(6, 6, 6)].d < 0.0);

        let n = first_order_correction(&mut g, &cfg, &Hlle, &mut ws).unwrap();
        assert_eq!(n, 1);

        // The partial EMF rebuild must leave the discrete divergence
        // untouched in the active region.
        for k in NG..NG + N {
            for j in NG..NG + N {
                for i in NG..NG + N {
                    let div = g.div_b(i, j, k);
                    assert!(div.abs() < 1e-12, "div B = {div:.3e} at ({i},{j},{k})");
                }
            }
        }
        for k in NG..NG + N {
            for j in NG..NG + N {
                for i in NG..NG + N {
                    assert!(g.u[(i, j, k)].d > 0.0);
                }
            }
        }
    }
}
