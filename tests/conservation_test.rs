//! Conservation tests: on a periodic domain with no source terms, the
//! interior sums of density, momentum, energy and passive scalars are
//! invariant across a step to floating-point round-off.

mod common;

use common::{cell_from_prim, fill_periodic, finish_mhd_setup, stable_dt};
use vlct::{Grid, IntegratorConfig, Prim1D, VlIntegrator};

const N: usize = 12;

fn wavy_grid(cfg: &IntegratorConfig) -> Grid {
    let ng = cfg.required_nghost();
    let mut g = Grid::new([N, N, N], [1.0 / N as f64; 3], [0.0; 3], ng);
    let tau = std::f64::consts::TAU;
    for k in g.lo(vlct::Axis::X3)..=g.hi(vlct::Axis::X3) {
        for j in g.lo(vlct::Axis::X2)..=g.hi(vlct::Axis::X2) {
            for i in g.lo(vlct::Axis::X1)..=g.hi(vlct::Axis::X1) {
                let (x, y, z) = g.cc_pos(i, j, k);
                let w = Prim1D {
                    d: 1.0 + 0.2 * (tau * x).sin() * (tau * y).cos(),
                    vx: 0.3 * (tau * y).sin(),
                    vy: -0.2 * (tau * z).cos(),
                    vz: 0.1 * (tau * x).cos(),
                    p: 1.0 + 0.1 * (tau * z).sin(),
                    r: [0.5 + 0.3 * (tau * x).cos(), 0.0, 0.0, 0.0],
                    ..Prim1D::default()
                };
                g.u[(i, j, k)] = cell_from_prim(cfg, &w);
            }
        }
    }
    g
}

fn check_conserved(cfg: IntegratorConfig, steps: usize) {
    let mut integ = VlIntegrator::new(cfg, [N, N, N]).unwrap();
    let mut g = wavy_grid(&cfg);
    if cfg.field == vlct::FieldModel::Mhd {
        let tau = std::f64::consts::TAU;
        let nt = g.total();
        for k in 0..nt[2] {
            for j in 0..nt[1] {
                for i in 0..nt[0] {
                    // Face field varying only along transverse axes keeps
                    // the discrete divergence identically zero.
                    g.b1i[(i, j, k)] = 0.2 * (tau * (j as f64) / N as f64).sin();
                    g.b2i[(i, j, k)] = 0.15 * (tau * (k as f64) / N as f64).cos();
                    g.b3i[(i, j, k)] = 0.1;
                }
            }
        }
        finish_mhd_setup(&cfg, &mut g);
    }
    fill_periodic(&mut g);
    g.dt = stable_dt(&cfg, &g, 0.4);

    let before = g.conserved_totals();
    for _ in 0..steps {
        fill_periodic(&mut g);
        let report = integ.step(&mut g).unwrap();
        assert_eq!(report.corrected_cells, 0);
    }
    let after = g.conserved_totals();

    let ncells = (N * N * N) as f64;
    let tol = 1e-12 * ncells;
    assert!(
        (after.mass - before.mass).abs() < tol,
        "mass drift {:.3e}",
        after.mass - before.mass
    );
    for a in 0..3 {
        assert!(
            (after.momentum[a] - before.momentum[a]).abs() < tol,
            "momentum[{a}] drift {:.3e}",
            after.momentum[a] - before.momentum[a]
        );
    }
    if cfg.eos.is_adiabatic() {
        assert!(
            (after.energy - before.energy).abs() < tol,
            "energy drift {:.3e}",
            after.energy - before.energy
        );
    }
    for n in 0..cfg.n_scalars {
        assert!(
            (after.scalars[n] - before.scalars[n]).abs() < tol,
            "scalar[{n}] drift {:.3e}",
            after.scalars[n] - before.scalars[n]
        );
    }
}

#[test]
fn test_conservation_adiabatic_hydro_with_scalars() {
    check_conserved(IntegratorConfig::adiabatic_hydro(1.4).with_scalars(1), 3);
}

#[test]
fn test_conservation_isothermal_hydro() {
    check_conserved(IntegratorConfig::isothermal_hydro(1.0), 3);
}

#[test]
fn test_conservation_adiabatic_mhd() {
    check_conserved(IntegratorConfig::adiabatic_mhd(5.0 / 3.0), 3);
}
