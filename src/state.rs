//! State records for cell-centered and sweep-local data.
//!
//! Three records mirror the three places state lives:
//! - [`CellState`]: the conserved cell average owned by the grid, in global
//!   component order `(d, M1..M3, E, B1c..B3c, s[..])`.
//! - [`Cons1D`]: a conserved record in sweep-permuted order
//!   `(d, Mx, My, Mz, E, By, Bz, s[..])`, where `x` is the sweep normal.
//!   Also serves as the flux record (one conserved-variable vector per face).
//! - [`Prim1D`]: the matching primitive record
//!   `(d, Vx, Vy, Vz, P, By, Bz, r[..])`.
//!
//! Fields of disabled physics (energy under an isothermal equation of
//! state, transverse fields under pure hydro, unused scalar slots) are
//! carried as zeros so a single record type serves every configuration.
//!
//! The characteristic machinery works on a dense component vector whose
//! ordering depends on the configuration (`NWAVE` = 4..7 plus scalars);
//! [`pack_prim`]/[`unpack_prim`] own that mapping.

use std::ops::{Add, Mul, Sub};

use crate::config::{FieldModel, Physics, MAX_SCALARS, NCOMP_MAX};

/// Conserved cell-centered state in global component order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellState {
    /// Mass density (positive by invariant).
    pub d: f64,
    /// Momentum density `(M1, M2, M3)`.
    pub m: [f64; 3],
    /// Total energy density (meaningful iff adiabatic).
    pub e: f64,
    /// Cell-centered magnetic field `(B1c, B2c, B3c)` (meaningful iff MHD).
    pub bc: [f64; 3],
    /// Passive scalar densities.
    pub s: [f64; MAX_SCALARS],
}

/// Conserved state or flux in sweep-permuted order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cons1D {
    pub d: f64,
    /// Momentum along the sweep normal.
    pub mx: f64,
    pub my: f64,
    pub mz: f64,
    pub e: f64,
    /// Transverse field components; the normal component travels separately.
    pub by: f64,
    pub bz: f64,
    pub s: [f64; MAX_SCALARS],
}

/// Primitive state in sweep-permuted order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Prim1D {
    pub d: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    /// Gas pressure (meaningful iff adiabatic).
    pub p: f64,
    pub by: f64,
    pub bz: f64,
    /// Scalar concentrations `r[n] = s[n]/d`.
    pub r: [f64; MAX_SCALARS],
}

// =============================================================================
// Component Vector Layout
// =============================================================================

/// Pack a primitive record into the dense component vector used by the
/// eigensystem and limiter: `[d, vx, vy, vz, (p), (by, bz)] + r[..]`.
/// Presence of `p` and `by/bz` follows the configuration, so indices line
/// up with the eigenmatrix rows for every `NWAVE`.
#[inline]
pub(crate) fn pack_prim(phys: &Physics, w: &Prim1D, out: &mut [f64; NCOMP_MAX]) {
    out[0] = w.d;
    out[1] = w.vx;
    out[2] = w.vy;
    out[3] = w.vz;
    let mut n = 4;
    if phys.eos.is_adiabatic() {
        out[n] = w.p;
        n += 1;
    }
    if phys.field == FieldModel::Mhd {
        out[n] = w.by;
        out[n + 1] = w.bz;
        n += 2;
    }
    for m in 0..phys.n_scalars {
        out[n + m] = w.r[m];
    }
}

/// Inverse of [`pack_prim`]; absent components come back as zero.
#[inline]
pub(crate) fn unpack_prim(phys: &Physics, v: &[f64; NCOMP_MAX]) -> Prim1D {
    let mut w = Prim1D {
        d: v[0],
        vx: v[1],
        vy: v[2],
        vz: v[3],
        ..Prim1D::default()
    };
    let mut n = 4;
    if phys.eos.is_adiabatic() {
        w.p = v[n];
        n += 1;
    }
    if phys.field == FieldModel::Mhd {
        w.by = v[n];
        w.bz = v[n + 1];
        n += 2;
    }
    for m in 0..phys.n_scalars {
        w.r[m] = v[n + m];
    }
    w
}

// =============================================================================
// Arithmetic (used by the HLL-family flux combinations)
// =============================================================================

impl Add for Cons1D {
    type Output = Self;

    fn add(self, o: Self) -> Self {
        let mut s = self.s;
        for (a, b) in s.iter_mut().zip(o.s.iter()) {
            *a += b;
        }
        Self {
            d: self.d + o.d,
            mx: self.mx + o.mx,
            my: self.my + o.my,
            mz: self.mz + o.mz,
            e: self.e + o.e,
            by: self.by + o.by,
            bz: self.bz + o.bz,
            s,
        }
    }
}

impl Sub for Cons1D {
    type Output = Self;

    fn sub(self, o: Self) -> Self {
        let mut s = self.s;
        for (a, b) in s.iter_mut().zip(o.s.iter()) {
            *a -= b;
        }
        Self {
            d: self.d - o.d,
            mx: self.mx - o.mx,
            my: self.my - o.my,
            mz: self.mz - o.mz,
            e: self.e - o.e,
            by: self.by - o.by,
            bz: self.bz - o.bz,
            s,
        }
    }
}

impl Mul<f64> for Cons1D {
    type Output = Self;

    fn mul(self, c: f64) -> Self {
        let mut s = self.s;
        for a in s.iter_mut() {
            *a *= c;
        }
        Self {
            d: self.d * c,
            mx: self.mx * c,
            my: self.my * c,
            mz: self.mz * c,
            e: self.e * c,
            by: self.by * c,
            bz: self.bz * c,
            s,
        }
    }
}

impl Mul<Cons1D> for f64 {
    type Output = Cons1D;

    fn mul(self, u: Cons1D) -> Cons1D {
        u * self
    }
}
