//! Grid storage: 3D fields, sweep directions and the grid block.
//!
//! [`Grid`] owns the persistent state of one block: cell-centered conserved
//! averages addressable over `[is - nghost, ie + nghost]` per axis, the
//! staggered interface magnetic field, the timestep and the cell spacings.
//! The integrator mutates it in place once per step; ghost cells must be
//! valid on entry (halo exchange is the caller's responsibility).
//!
//! Index conventions follow the staggered-mesh layout: the face array
//! entry at index `i` holds the field on the `i - 1/2` face of cell `i`,
//! so cell and face arrays share dimensions and the rightmost ghost face
//! is not stored.

use crate::config::MAX_SCALARS;
use crate::state::{CellState, Cons1D};

// =============================================================================
// Sweep Direction
// =============================================================================

/// A sweep direction with its component permutation.
///
/// All 1D machinery (reconstruction, flux solvers) works in sweep-local
/// coordinates where `x` is the interface normal. The permutation table
/// maps sweep-local `(x, y, z)` onto global `(1, 2, 3)` components:
/// `perm()[0]` is the global index of the normal component, `perm()[1]`
/// and `perm()[2]` the two transverse ones, in the cyclic order the
/// corner-EMF sign conventions rely on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X1,
    X2,
    X3,
}

impl Axis {
    /// Sweep order is fixed: x1, then x2, then x3.
    pub const ALL: [Axis; 3] = [Axis::X1, Axis::X2, Axis::X3];

    /// Global component indices of (normal, transverse-1, transverse-2).
    #[inline]
    pub fn perm(self) -> [usize; 3] {
        match self {
            Axis::X1 => [0, 1, 2],
            Axis::X2 => [1, 2, 0],
            Axis::X3 => [2, 0, 1],
        }
    }

    /// Index of this axis (0, 1, 2).
    #[inline]
    pub fn idx(self) -> usize {
        match self {
            Axis::X1 => 0,
            Axis::X2 => 1,
            Axis::X3 => 2,
        }
    }

    /// Unit index offset `(di, dj, dk)` along this axis.
    #[inline]
    pub fn offset(self) -> (usize, usize, usize) {
        match self {
            Axis::X1 => (1, 0, 0),
            Axis::X2 => (0, 1, 0),
            Axis::X3 => (0, 0, 1),
        }
    }

    /// Gather a cell's conserved state into sweep-permuted order.
    #[inline]
    pub fn sweep_cons(self, u: &CellState) -> Cons1D {
        let p = self.perm();
        Cons1D {
            d: u.d,
            mx: u.m[p[0]],
            my: u.m[p[1]],
            mz: u.m[p[2]],
            e: u.e,
            by: u.bc[p[1]],
            bz: u.bc[p[2]],
            s: u.s,
        }
    }
}

// =============================================================================
// 3D Field
// =============================================================================

/// A dense 3D array indexed by `(i, j, k)` with `i` fastest.
#[derive(Clone, Debug)]
pub struct Field3<T> {
    n1: usize,
    n2: usize,
    n3: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Field3<T> {
    /// Allocate a zero-initialized field of the given dimensions.
    pub fn new(n1: usize, n2: usize, n3: usize) -> Self {
        Self {
            n1,
            n2,
            n3,
            data: vec![T::default(); n1 * n2 * n3],
        }
    }

    /// A zero-sized placeholder for arrays the configuration does not use.
    pub fn empty() -> Self {
        Self {
            n1: 0,
            n2: 0,
            n3: 0,
            data: Vec::new(),
        }
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.n1, self.n2, self.n3)
    }

    /// Overwrite every entry.
    pub fn fill(&mut self, v: T) {
        self.data.fill(v);
    }
}

impl<T> std::ops::Index<(usize, usize, usize)> for Field3<T> {
    type Output = T;

    #[inline]
    fn index(&self, (i, j, k): (usize, usize, usize)) -> &T {
        debug_assert!(i < self.n1 && j < self.n2 && k < self.n3);
        &self.data[(k * self.n2 + j) * self.n1 + i]
    }
}

impl<T> std::ops::IndexMut<(usize, usize, usize)> for Field3<T> {
    #[inline]
    fn index_mut(&mut self, (i, j, k): (usize, usize, usize)) -> &mut T {
        debug_assert!(i < self.n1 && j < self.n2 && k < self.n3);
        &mut self.data[(k * self.n2 + j) * self.n1 + i]
    }
}

// =============================================================================
// Grid Block
// =============================================================================

/// One structured grid block: persistent cell state, interface fields,
/// timestep and geometry.
#[derive(Clone, Debug)]
pub struct Grid {
    nghost: usize,
    n: [usize; 3],
    /// Cell spacing per axis.
    pub dx: [f64; 3],
    /// Physical position of the lower-left-front corner of the interior.
    pub x0: [f64; 3],
    /// Timestep to advance by (chosen by the external driver).
    pub dt: f64,
    /// Conserved cell averages.
    pub u: Field3<CellState>,
    /// Interface-normal magnetic field at x1-faces (`b1i[(i,j,k)]` is the
    /// field on the `i - 1/2` face).
    pub b1i: Field3<f64>,
    /// Interface-normal magnetic field at x2-faces.
    pub b2i: Field3<f64>,
    /// Interface-normal magnetic field at x3-faces.
    pub b3i: Field3<f64>,
}

impl Grid {
    /// Create a block with `n` interior cells per axis and `nghost` ghost
    /// layers on every side, zero-initialized.
    pub fn new(n: [usize; 3], dx: [f64; 3], x0: [f64; 3], nghost: usize) -> Self {
        let nt = [n[0] + 2 * nghost, n[1] + 2 * nghost, n[2] + 2 * nghost];
        Self {
            nghost,
            n,
            dx,
            x0,
            dt: 0.0,
            u: Field3::new(nt[0], nt[1], nt[2]),
            b1i: Field3::new(nt[0], nt[1], nt[2]),
            b2i: Field3::new(nt[0], nt[1], nt[2]),
            b3i: Field3::new(nt[0], nt[1], nt[2]),
        }
    }

    #[inline]
    pub fn nghost(&self) -> usize {
        self.nghost
    }

    /// Interior cell count per axis.
    #[inline]
    pub fn interior(&self) -> [usize; 3] {
        self.n
    }

    /// Total (interior + ghost) cell count per axis.
    #[inline]
    pub fn total(&self) -> [usize; 3] {
        [
            self.n[0] + 2 * self.nghost,
            self.n[1] + 2 * self.nghost,
            self.n[2] + 2 * self.nghost,
        ]
    }

    /// First interior index along an axis.
    #[inline]
    pub fn lo(&self, a: Axis) -> usize {
        let _ = a;
        self.nghost
    }

    /// Last interior index along an axis.
    #[inline]
    pub fn hi(&self, a: Axis) -> usize {
        self.nghost + self.n[a.idx()] - 1
    }

    /// Cell-center position of cell `(i, j, k)`.
    #[inline]
    pub fn cc_pos(&self, i: usize, j: usize, k: usize) -> (f64, f64, f64) {
        let g = self.nghost as f64;
        (
            self.x0[0] + (i as f64 - g + 0.5) * self.dx[0],
            self.x0[1] + (j as f64 - g + 0.5) * self.dx[1],
            self.x0[2] + (k as f64 - g + 0.5) * self.dx[2],
        )
    }

    /// Face field array along an axis.
    #[inline]
    pub fn face_field(&self, a: Axis) -> &Field3<f64> {
        match a {
            Axis::X1 => &self.b1i,
            Axis::X2 => &self.b2i,
            Axis::X3 => &self.b3i,
        }
    }

    /// Discrete divergence of the interface field over the 6-face stencil
    /// of cell `(i, j, k)`.
    pub fn div_b(&self, i: usize, j: usize, k: usize) -> f64 {
        (self.b1i[(i + 1, j, k)] - self.b1i[(i, j, k)]) / self.dx[0]
            + (self.b2i[(i, j + 1, k)] - self.b2i[(i, j, k)]) / self.dx[1]
            + (self.b3i[(i, j, k + 1)] - self.b3i[(i, j, k)]) / self.dx[2]
    }

    /// Domain sums of density, momentum, energy and scalars over the
    /// interior, for conservation diagnostics.
    pub fn conserved_totals(&self) -> ConservedTotals {
        let mut t = ConservedTotals::default();
        for k in self.lo(Axis::X3)..=self.hi(Axis::X3) {
            for j in self.lo(Axis::X2)..=self.hi(Axis::X2) {
                for i in self.lo(Axis::X1)..=self.hi(Axis::X1) {
                    let u = &self.u[(i, j, k)];
                    t.mass += u.d;
                    for a in 0..3 {
                        t.momentum[a] += u.m[a];
                    }
                    t.energy += u.e;
                    for n in 0..MAX_SCALARS {
                        t.scalars[n] += u.s[n];
                    }
                }
            }
        }
        t
    }
}

/// Interior sums of the conserved variables.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConservedTotals {
    pub mass: f64,
    pub momentum: [f64; 3],
    pub energy: f64,
    pub scalars: [f64; MAX_SCALARS],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field3_indexing() {
        let mut f: Field3<f64> = Field3::new(4, 3, 2);
        f[(1, 2, 1)] = 7.0;
        f[(3, 0, 0)] = -1.0;
        assert_eq!(f[(1, 2, 1)], 7.0);
        assert_eq!(f[(3, 0, 0)], -1.0);
        assert_eq!(f[(0, 0, 0)], 0.0);
        assert_eq!(f.dims(), (4, 3, 2));
    }

    #[test]
    fn test_axis_permutations_are_cyclic() {
        assert_eq!(Axis::X1.perm(), [0, 1, 2]);
        assert_eq!(Axis::X2.perm(), [1, 2, 0]);
        assert_eq!(Axis::X3.perm(), [2, 0, 1]);
    }

    #[test]
    fn test_sweep_cons_permutes_momentum_and_field() {
        let u = CellState {
            d: 1.0,
            m: [10.0, 20.0, 30.0],
            e: 5.0,
            bc: [1.0, 2.0, 3.0],
            ..CellState::default()
        };
        let q2 = Axis::X2.sweep_cons(&u);
        assert_eq!((q2.mx, q2.my, q2.mz), (20.0, 30.0, 10.0));
        assert_eq!((q2.by, q2.bz), (3.0, 1.0));
        let q3 = Axis::X3.sweep_cons(&u);
        assert_eq!((q3.mx, q3.my, q3.mz), (30.0, 10.0, 20.0));
        assert_eq!((q3.by, q3.bz), (1.0, 2.0));
    }

    #[test]
    fn test_grid_geometry() {
        let g = Grid::new([8, 4, 4], [0.5, 1.0, 1.0], [0.0, 0.0, 0.0], 3);
        assert_eq!(g.lo(Axis::X1), 3);
        assert_eq!(g.hi(Axis::X1), 10);
        assert_eq!(g.total(), [14, 10, 10]);
        let (x1, x2, x3) = g.cc_pos(3, 3, 3);
        assert!((x1 - 0.25).abs() < 1e-14);
        assert!((x2 - 0.5).abs() < 1e-14);
        assert!((x3 - 0.5).abs() < 1e-14);
    }
}
