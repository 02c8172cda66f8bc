//! # vlct
//!
//! The time-advance engine of a structured-grid finite-volume solver for
//! compressible (magneto)hydrodynamics: a directionally-unsplit van Leer
//! predictor-corrector Godunov integrator with constrained transport.
//!
//! Given a [`Grid`] of conserved fluid/field state, one
//! [`VlIntegrator::step`] produces the state one timestep later, to
//! second-order accuracy, while preserving the discrete divergence-free
//! constraint on the interface magnetic field and guaranteeing positivity
//! of density under stress (first-order flux/EMF fallback).
//!
//! This crate provides the core building blocks:
//! - Primitive/conserved conversion and wave speeds
//! - Characteristic piecewise-linear (PLM) reconstruction
//! - Approximate Riemann solvers (Roe, HLLE, HLLC, HLLD)
//! - Upwind corner-EMF averaging for constrained transport
//! - The predictor-corrector driver with H-correction and static-gravity
//!   source terms
//! - The positivity safeguard
//!
//! Out of scope, consumed as external collaborators: problem setup,
//! boundary conditions and halo exchange, timestep (CFL) control, I/O,
//! mesh refinement and diffusive source-term passes.
//!
//! # Example
//!
//! ```
//! use vlct::{Grid, IntegratorConfig, VlIntegrator};
//!
//! let cfg = IntegratorConfig::adiabatic_hydro(1.4);
//! let mut integrator = VlIntegrator::new(cfg, [16, 16, 16]).unwrap();
//!
//! let ng = cfg.required_nghost();
//! let mut grid = Grid::new([16, 16, 16], [1.0 / 16.0; 3], [0.0; 3], ng);
//! for k in 0..grid.total()[2] {
//!     for j in 0..grid.total()[1] {
//!         for i in 0..grid.total()[0] {
//!             let u = &mut grid.u[(i, j, k)];
//!             u.d = 1.0;
//!             u.e = 1.0 / (1.4 * 0.4); // p = 1/Gamma
//!         }
//!     }
//! }
//! grid.dt = 1e-3;
//!
//! let report = integrator.step(&mut grid).unwrap();
//! assert_eq!(report.corrected_cells, 0);
//! ```

pub mod config;
pub mod convert;
mod correct;
mod eigen;
mod emf;
pub mod grid;
pub mod integrate;
pub mod reconstruct;
pub mod riemann;
pub mod state;

pub use config::{
    ConfigError, CorrectionMode, Eos, FieldModel, GravPotential, IntegratorConfig, Physics,
    Reconstruction, SolverKind, MAX_SCALARS,
};
pub use convert::{cfast, cons1d_to_prim1d, prim1d_to_cons1d};
pub use grid::{Axis, ConservedTotals, Field3, Grid};
pub use integrate::{StepError, StepReport, VlIntegrator};
pub use reconstruct::{lr_states_first_order, lr_states_plm, PlmMode};
pub use riemann::{create_solver, Hllc, Hlld, Hlle, RiemannSolver, Roe};
pub use state::{CellState, Cons1D, Prim1D};
