//! Conversion between conserved and primitive sweep records, and the fast
//! magnetosonic speed.
//!
//! The interface-normal field component `bx` rides outside the records and
//! is passed alongside. Conversion never fails: pressure underflow is
//! clamped to the configured floor (a bounded, expected event near strong
//! rarefactions), and positive density is a precondition owed by the
//! caller.

use crate::config::{Eos, FieldModel, Physics};
use crate::state::{Cons1D, Prim1D};

/// Conserved to primitive: `(d, Mx..) -> (d, Vx.., P, ..)`.
///
/// Under an adiabatic equation of state the pressure is recovered from
/// total energy minus kinetic (and magnetic) energy and clamped to the
/// pressure floor on underflow.
pub fn cons1d_to_prim1d(u: &Cons1D, bx: f64, phys: &Physics) -> Prim1D {
    let di = 1.0 / u.d;
    let mut w = Prim1D {
        d: u.d,
        vx: u.mx * di,
        vy: u.my * di,
        vz: u.mz * di,
        ..Prim1D::default()
    };

    if let Eos::Adiabatic { gamma } = phys.eos {
        let mut p = u.e - 0.5 * (u.mx * u.mx + u.my * u.my + u.mz * u.mz) * di;
        if phys.field == FieldModel::Mhd {
            p -= 0.5 * (bx * bx + u.by * u.by + u.bz * u.bz);
        }
        p *= gamma - 1.0;
        w.p = p.max(phys.pressure_floor);
    }

    if phys.field == FieldModel::Mhd {
        w.by = u.by;
        w.bz = u.bz;
    }

    for n in 0..phys.n_scalars {
        w.r[n] = u.s[n] * di;
    }

    w
}

/// Primitive to conserved: `(d, Vx.., P, ..) -> (d, Mx.., E, ..)`.
pub fn prim1d_to_cons1d(w: &Prim1D, bx: f64, phys: &Physics) -> Cons1D {
    let mut u = Cons1D {
        d: w.d,
        mx: w.d * w.vx,
        my: w.d * w.vy,
        mz: w.d * w.vz,
        ..Cons1D::default()
    };

    if let Eos::Adiabatic { gamma } = phys.eos {
        u.e = w.p / (gamma - 1.0) + 0.5 * w.d * (w.vx * w.vx + w.vy * w.vy + w.vz * w.vz);
        if phys.field == FieldModel::Mhd {
            u.e += 0.5 * (bx * bx + w.by * w.by + w.bz * w.bz);
        }
    }

    if phys.field == FieldModel::Mhd {
        u.by = w.by;
        u.bz = w.bz;
    }

    for n in 0..phys.n_scalars {
        u.s[n] = w.r[n] * w.d;
    }

    u
}

/// Fast magnetosonic speed of a conserved sweep record.
///
/// Reduces to the sound speed for pure hydro. The recovered pressure is
/// floored so the returned speed is always finite and non-negative.
pub fn cfast(u: &Cons1D, bx: f64, phys: &Physics) -> f64 {
    let di = 1.0 / u.d;
    let asq = match phys.eos {
        Eos::Isothermal { csound } => csound * csound,
        Eos::Adiabatic { gamma } => {
            let mut pb = 0.0;
            if phys.field == FieldModel::Mhd {
                pb = 0.5 * (bx * bx + u.by * u.by + u.bz * u.bz);
            }
            let ke = 0.5 * (u.mx * u.mx + u.my * u.my + u.mz * u.mz) * di;
            let p = ((gamma - 1.0) * (u.e - pb - ke)).max(phys.pressure_floor);
            gamma * p * di
        }
    };

    match phys.field {
        FieldModel::Hydro => asq.sqrt(),
        FieldModel::Mhd => {
            let ctsq = (u.by * u.by + u.bz * u.bz) * di;
            let casq = bx * bx * di;
            let tmp = casq + ctsq - asq;
            let cfsq = 0.5 * ((asq + ctsq + casq) + (tmp * tmp + 4.0 * asq * ctsq).sqrt());
            cfsq.sqrt()
        }
    }
}
