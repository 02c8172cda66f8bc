//! Steady-state tests: a uniform medium must be exactly preserved by one
//! step, for every physics combination, with and without a null
//! gravitational potential.

mod common;

use common::{cell_from_prim, fill_periodic, finish_mhd_setup, stable_dt, uniform_medium};
use vlct::{Axis, CorrectionMode, Grid, IntegratorConfig, VlIntegrator};

const N: usize = 8;
const TOL: f64 = 1e-13;

fn uniform_grid(cfg: &IntegratorConfig) -> Grid {
    let ng = cfg.required_nghost();
    let mut g = Grid::new([N, N, N], [1.0 / N as f64; 3], [0.0; 3], ng);
    let w = uniform_medium(cfg);
    let cell = cell_from_prim(cfg, &w);
    let nt = g.total();
    for k in 0..nt[2] {
        for j in 0..nt[1] {
            for i in 0..nt[0] {
                g.u[(i, j, k)] = cell;
            }
        }
    }
    g
}

fn assert_unchanged(cfg: &IntegratorConfig, g: &Grid, reference: &Grid) {
    for k in g.lo(Axis::X3)..=g.hi(Axis::X3) {
        for j in g.lo(Axis::X2)..=g.hi(Axis::X2) {
            for i in g.lo(Axis::X1)..=g.hi(Axis::X1) {
                let u = &g.u[(i, j, k)];
                let r = &reference.u[(i, j, k)];
                assert!((u.d - r.d).abs() < TOL, "d drift at ({i},{j},{k})");
                for a in 0..3 {
                    assert!((u.m[a] - r.m[a]).abs() < TOL, "m{a} drift at ({i},{j},{k})");
                    assert!(
                        (u.bc[a] - r.bc[a]).abs() < TOL,
                        "bc{a} drift at ({i},{j},{k})"
                    );
                }
                if cfg.eos.is_adiabatic() {
                    assert!((u.e - r.e).abs() < TOL, "e drift at ({i},{j},{k})");
                }
            }
        }
    }
}

fn run_steady(cfg: IntegratorConfig) {
    let mut integ = VlIntegrator::new(cfg, [N, N, N]).unwrap();
    let mut g = uniform_grid(&cfg);
    g.dt = stable_dt(&cfg, &g, 0.8);
    fill_periodic(&mut g);
    let reference = g.clone();

    let report = integ.step(&mut g).unwrap();
    assert_eq!(report.corrected_cells, 0);
    assert_unchanged(&cfg, &g, &reference);
}

#[test]
fn test_uniform_medium_adiabatic_hydro() {
    run_steady(IntegratorConfig::adiabatic_hydro(1.4));
}

#[test]
fn test_uniform_medium_isothermal_hydro() {
    run_steady(IntegratorConfig::isothermal_hydro(1.0));
}

#[test]
fn test_uniform_medium_with_null_potential() {
    run_steady(IntegratorConfig::adiabatic_hydro(1.4).with_gravity(|_, _, _| 0.0));
}

#[test]
fn test_uniform_medium_with_h_correction() {
    // The dissipation coefficients vanish for a uniform medium, so the
    // H-correction must not perturb the steady state.
    run_steady(
        IntegratorConfig::adiabatic_hydro(1.4).with_correction(CorrectionMode::HCorrection),
    );
}

fn run_steady_mhd(cfg: IntegratorConfig) {
    let mut integ = VlIntegrator::new(cfg, [N, N, N]).unwrap();
    let mut g = uniform_grid(&cfg);

    // Uniform oblique field through the whole block.
    let nt = g.total();
    for k in 0..nt[2] {
        for j in 0..nt[1] {
            for i in 0..nt[0] {
                g.b1i[(i, j, k)] = 0.3;
                g.b2i[(i, j, k)] = -0.2;
                g.b3i[(i, j, k)] = 0.15;
            }
        }
    }
    finish_mhd_setup(&cfg, &mut g);
    fill_periodic(&mut g);
    g.dt = stable_dt(&cfg, &g, 0.8);
    let reference = g.clone();

    let report = integ.step(&mut g).unwrap();
    assert_eq!(report.corrected_cells, 0);
    assert_unchanged(&cfg, &g, &reference);
    for k in g.lo(Axis::X3)..=g.hi(Axis::X3) {
        for j in g.lo(Axis::X2)..=g.hi(Axis::X2) {
            for i in g.lo(Axis::X1)..=g.hi(Axis::X1) {
                assert!((g.b1i[(i, j, k)] - 0.3).abs() < TOL);
                assert!((g.b2i[(i, j, k)] + 0.2).abs() < TOL);
                assert!((g.b3i[(i, j, k)] - 0.15).abs() < TOL);
            }
        }
    }
}

#[test]
fn test_uniform_medium_adiabatic_mhd() {
    run_steady_mhd(IntegratorConfig::adiabatic_mhd(5.0 / 3.0));
}

#[test]
fn test_uniform_medium_isothermal_mhd() {
    run_steady_mhd(IntegratorConfig::isothermal_mhd(1.0));
}
