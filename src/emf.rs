//! Corner EMF integration for constrained transport.
//!
//! Each face flux carries the two transverse-field flux components, which
//! are (up to sign) electric-field values at face centers:
//!
//! ```text
//! x1-flux: by = -E3,  bz = +E2
//! x2-flux: by = -E1,  bz = +E3
//! x3-flux: by = -E2,  bz = +E1
//! ```
//!
//! An edge-centered EMF is the average of the two adjacent face-flux
//! contributions plus four upwind-selected corrections `E_face - E_cc`,
//! where the donor cell for each correction is chosen by the sign of the
//! mass flux crossing the face between the two candidates (an exact zero
//! averages both). This upwind bias is what makes the discrete induction
//! update exactly divergence-preserving; a plain average is not an
//! acceptable substitute.
//!
//! The per-edge functions are shared between the bulk corner pass and the
//! positivity safeguard's local rebuild, so a repaired edge reproduces the
//! bulk value exactly when its inputs are unchanged.

use crate::grid::Field3;
use crate::state::Cons1D;

/// Donor selection by mass-flux sign.
#[inline]
fn upwind(mass_flux: f64, lo: f64, hi: f64) -> f64 {
    if mass_flux > 0.0 {
        lo
    } else if mass_flux < 0.0 {
        hi
    } else {
        0.5 * (lo + hi)
    }
}

/// E1 at the edge `(i, j-1/2, k-1/2)`.
pub(crate) fn emf1_at(
    x2flux: &Field3<Cons1D>,
    x3flux: &Field3<Cons1D>,
    emf1_cc: &Field3<f64>,
    i: usize,
    j: usize,
    k: usize,
) -> f64 {
    // x2-flux of by = -E1; x3-flux of bz = +E1.
    let de1_l3 = upwind(
        x2flux[(i, j, k - 1)].d,
        x3flux[(i, j - 1, k)].bz - emf1_cc[(i, j - 1, k - 1)],
        x3flux[(i, j, k)].bz - emf1_cc[(i, j, k - 1)],
    );
    let de1_r3 = upwind(
        x2flux[(i, j, k)].d,
        x3flux[(i, j - 1, k)].bz - emf1_cc[(i, j - 1, k)],
        x3flux[(i, j, k)].bz - emf1_cc[(i, j, k)],
    );
    let de1_l2 = upwind(
        x3flux[(i, j - 1, k)].d,
        -x2flux[(i, j, k - 1)].by - emf1_cc[(i, j - 1, k - 1)],
        -x2flux[(i, j, k)].by - emf1_cc[(i, j - 1, k)],
    );
    let de1_r2 = upwind(
        x3flux[(i, j, k)].d,
        -x2flux[(i, j, k - 1)].by - emf1_cc[(i, j, k - 1)],
        -x2flux[(i, j, k)].by - emf1_cc[(i, j, k)],
    );

    0.25 * (x3flux[(i, j, k)].bz + x3flux[(i, j - 1, k)].bz
        - x2flux[(i, j, k)].by
        - x2flux[(i, j, k - 1)].by
        + de1_l2
        + de1_r2
        + de1_l3
        + de1_r3)
}

/// E2 at the edge `(i-1/2, j, k-1/2)`.
pub(crate) fn emf2_at(
    x1flux: &Field3<Cons1D>,
    x3flux: &Field3<Cons1D>,
    emf2_cc: &Field3<f64>,
    i: usize,
    j: usize,
    k: usize,
) -> f64 {
    // x1-flux of bz = +E2; x3-flux of by = -E2.
    let de2_l3 = upwind(
        x1flux[(i, j, k - 1)].d,
        -x3flux[(i - 1, j, k)].by - emf2_cc[(i - 1, j, k - 1)],
        -x3flux[(i, j, k)].by - emf2_cc[(i, j, k - 1)],
    );
    let de2_r3 = upwind(
        x1flux[(i, j, k)].d,
        -x3flux[(i - 1, j, k)].by - emf2_cc[(i - 1, j, k)],
        -x3flux[(i, j, k)].by - emf2_cc[(i, j, k)],
    );
    let de2_l1 = upwind(
        x3flux[(i - 1, j, k)].d,
        x1flux[(i, j, k - 1)].bz - emf2_cc[(i - 1, j, k - 1)],
        x1flux[(i, j, k)].bz - emf2_cc[(i - 1, j, k)],
    );
    let de2_r1 = upwind(
        x3flux[(i, j, k)].d,
        x1flux[(i, j, k - 1)].bz - emf2_cc[(i, j, k - 1)],
        x1flux[(i, j, k)].bz - emf2_cc[(i, j, k)],
    );

    0.25 * (x1flux[(i, j, k)].bz + x1flux[(i, j, k - 1)].bz
        - x3flux[(i, j, k)].by
        - x3flux[(i - 1, j, k)].by
        + de2_l1
        + de2_r1
        + de2_l3
        + de2_r3)
}

/// E3 at the edge `(i-1/2, j-1/2, k)`.
pub(crate) fn emf3_at(
    x1flux: &Field3<Cons1D>,
    x2flux: &Field3<Cons1D>,
    emf3_cc: &Field3<f64>,
    i: usize,
    j: usize,
    k: usize,
) -> f64 {
    // x1-flux of by = -E3; x2-flux of bz = +E3.
    let de3_l2 = upwind(
        x1flux[(i, j - 1, k)].d,
        x2flux[(i - 1, j, k)].bz - emf3_cc[(i - 1, j - 1, k)],
        x2flux[(i, j, k)].bz - emf3_cc[(i, j - 1, k)],
    );
    let de3_r2 = upwind(
        x1flux[(i, j, k)].d,
        x2flux[(i - 1, j, k)].bz - emf3_cc[(i - 1, j, k)],
        x2flux[(i, j, k)].bz - emf3_cc[(i, j, k)],
    );
    let de3_l1 = upwind(
        x2flux[(i - 1, j, k)].d,
        -x1flux[(i, j - 1, k)].by - emf3_cc[(i - 1, j - 1, k)],
        -x1flux[(i, j, k)].by - emf3_cc[(i - 1, j, k)],
    );
    let de3_r1 = upwind(
        x2flux[(i, j, k)].d,
        -x1flux[(i, j - 1, k)].by - emf3_cc[(i, j - 1, k)],
        -x1flux[(i, j, k)].by - emf3_cc[(i, j, k)],
    );

    0.25 * (x2flux[(i - 1, j, k)].bz + x2flux[(i, j, k)].bz
        - x1flux[(i, j - 1, k)].by
        - x1flux[(i, j, k)].by
        + de3_l1
        + de3_r1
        + de3_l2
        + de3_r2)
}

/// Integrate all three corner EMF arrays over the widest valid ranges of
/// a block with total dimensions `nt`.
pub(crate) fn integrate_corners(
    flux: &[Field3<Cons1D>; 3],
    emf_cc: &[Field3<f64>; 3],
    emf: &mut [Field3<f64>; 3],
    nt: [usize; 3],
) {
    let (n1, n2, n3) = (nt[0], nt[1], nt[2]);
    for k in 1..n3 {
        for j in 1..n2 {
            for i in 1..n1 - 1 {
                emf[0][(i, j, k)] = emf1_at(&flux[1], &flux[2], &emf_cc[0], i, j, k);
            }
        }
    }
    for k in 1..n3 {
        for j in 1..n2 - 1 {
            for i in 1..n1 {
                emf[1][(i, j, k)] = emf2_at(&flux[0], &flux[2], &emf_cc[1], i, j, k);
            }
        }
    }
    for k in 1..n3 - 1 {
        for j in 1..n2 {
            for i in 1..n1 {
                emf[2][(i, j, k)] = emf3_at(&flux[0], &flux[1], &emf_cc[2], i, j, k);
            }
        }
    }
}
