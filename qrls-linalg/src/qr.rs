#![allow(clippy::needless_range_loop)]
//! Rank-revealing pivoted QR primitives.
//!
//! Householder QR with limited column pivoting in the LINPACK dqrdc2
//! style: columns whose current norm drops below `tol` times their
//! original norm are cycled to the right, and the numerical rank is the
//! count of columns that survive on the left. The orthogonal factor is
//! never formed explicitly; reflectors stay compressed below the diagonal
//! with their scaling in `qraux`, and are applied implicitly by
//! `apply_qt`. All buffers are column-major.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinalgError {
    #[error("dimension mismatch: expected {expected} rows, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("matrix is numerically singular: rank {rank} of {ncols} columns")]
    SingularMatrix { rank: usize, ncols: usize },

    #[error("{stage} primitive failed with diagnostic code {code}")]
    NumericalFailure { stage: &'static str, code: i32 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// A column-pivoted Householder QR factorization of an n x p matrix.
///
/// `qr` packs the upper-triangular factor above the diagonal and the
/// compressed reflectors below it; `qraux` holds the reflector diagonal
/// elements; `pivot` records the column permutation (0-based: position i
/// of the factorization came from caller column `pivot[i]`).
///
/// Immutable after construction, so it can be shared read-only across
/// solves against different right-hand sides.
#[derive(Debug, Clone)]
pub struct PivotedQr {
    qr: Vec<f64>,
    qraux: Vec<f64>,
    pivot: Vec<usize>,
    rank: usize,
    nrows: usize,
    ncols: usize,
}

impl PivotedQr {
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Numerical rank determined by the tolerance test, at most `ncols`.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Column permutation applied during factorization.
    pub fn pivot(&self) -> &[usize] {
        &self.pivot
    }

    /// Packed factorization buffer (column-major n x p).
    pub fn qr_packed(&self) -> &[f64] {
        &self.qr
    }

    /// Reflector scaling vector of length p.
    pub fn qraux(&self) -> &[f64] {
        &self.qraux
    }
}

/// Scratch handling for [`apply_qt`]: probe for the required length first,
/// then call again with a buffer of at least that length.
pub enum Workspace<'a> {
    /// Report the required scratch length; no numerical work is performed.
    Probe(&'a mut usize),
    /// Scratch buffer for the real pass.
    Buffer(&'a mut [f64]),
}

/// Column-pivoted Householder QR of a column-major n x p matrix.
///
/// The input is copied, never mutated. A column is considered negligible
/// when its remaining norm falls below `tol` times its original norm;
/// negligible columns are rotated to the right and excluded from the rank.
pub fn factorize(x: &[f64], n: usize, p: usize, tol: f64) -> Result<PivotedQr, LinalgError> {
    if n == 0 || p == 0 || x.len() != n * p {
        return Err(LinalgError::InvalidArgument(format!(
            "expected a non-empty {n} x {p} column-major buffer, got length {}",
            x.len()
        )));
    }
    if !x.iter().all(|v| v.is_finite()) {
        return Err(LinalgError::InvalidArgument(
            "non-finite value in input matrix".to_string(),
        ));
    }

    let mut a = x.to_vec();
    let mut pivot: Vec<usize> = (0..p).collect();
    let mut qraux = vec![0.0; p];

    // Column norms: qraux tracks the current norms for the negligibility
    // test, work1 mirrors them, work2 keeps the originals (floored at 1).
    let mut col_norms: Vec<f64> = (0..p)
        .map(|j| {
            let mut s = 0.0;
            for i in 0..n {
                s += a[i + j * n] * a[i + j * n];
            }
            s.sqrt()
        })
        .collect();
    let mut work1 = col_norms.clone();
    let mut work2: Vec<f64> = col_norms
        .iter()
        .map(|&v| if v == 0.0 { 1.0 } else { v })
        .collect();
    qraux.copy_from_slice(&col_norms);

    let lup = n.min(p);
    // k_cur marks the left edge of the cycled-out region, 1-based like the
    // Fortran original; rank falls out of it after the main loop.
    let mut k_cur = p + 1;

    for col in 0..lup {
        // Cycle negligible columns to the right until the current column
        // passes the tolerance test or the cycled region is reached.
        loop {
            // k_cur is 1-based like the Fortran original; column `col`
            // sits at 1-based position col + 1.
            if col + 1 >= k_cur {
                break;
            }
            if qraux[col] >= work2[col] * tol {
                break;
            }

            for i in 0..n {
                let t = a[i + col * n];
                for j in (col + 1)..p {
                    a[i + (j - 1) * n] = a[i + j * n];
                }
                a[i + (p - 1) * n] = t;
            }
            let pv = pivot[col];
            let cn = col_norms[col];
            let qa = qraux[col];
            let w1 = work1[col];
            let w2 = work2[col];
            for j in (col + 1)..p {
                pivot[j - 1] = pivot[j];
                col_norms[j - 1] = col_norms[j];
                qraux[j - 1] = qraux[j];
                work1[j - 1] = work1[j];
                work2[j - 1] = work2[j];
            }
            pivot[p - 1] = pv;
            col_norms[p - 1] = cn;
            qraux[p - 1] = qa;
            work1[p - 1] = w1;
            work2[p - 1] = w2;
            k_cur -= 1;
        }

        // Householder reflection for the current column. No reflector is
        // formed from the last row (1-based l == n in dqrdc2): the
        // remaining 1 x 1 block is already triangular, and a sign-flipping
        // reflector there would disagree with the Q that apply_qt builds
        // from the first n - 1 reflectors.
        qraux[col] = 0.0;
        if col + 1 == n {
            continue;
        }

        let mut nrmxl = 0.0;
        for i in col..n {
            nrmxl += a[i + col * n] * a[i + col * n];
        }
        nrmxl = nrmxl.sqrt();

        if nrmxl != 0.0 {
            if a[col + col * n] != 0.0 {
                nrmxl = nrmxl.copysign(a[col + col * n]);
            }
            for i in col..n {
                a[i + col * n] /= nrmxl;
            }
            a[col + col * n] += 1.0;

            // Apply the reflector to the trailing columns and downdate
            // their norms, recomputing when cancellation has eaten them.
            for j in (col + 1)..p {
                let mut t = 0.0;
                for i in col..n {
                    t += a[i + col * n] * a[i + j * n];
                }
                t = -t / a[col + col * n];
                for i in col..n {
                    a[i + j * n] += t * a[i + col * n];
                }

                if col_norms[j] != 0.0 {
                    let mut tt = 1.0 - (a[col + j * n].abs() / col_norms[j]).powi(2);
                    if tt < 0.0 {
                        tt = 0.0;
                    }
                    if tt.abs() >= 1e-6 {
                        col_norms[j] *= tt.sqrt();
                    } else {
                        let mut s = 0.0;
                        for i in (col + 1)..n {
                            s += a[i + j * n] * a[i + j * n];
                        }
                        col_norms[j] = s.sqrt();
                    }
                    work1[j] = col_norms[j];
                    qraux[j] = col_norms[j];
                }
            }

            qraux[col] = a[col + col * n];
            a[col + col * n] = -nrmxl;
        }
    }

    let rank = (k_cur - 1).min(n);

    Ok(PivotedQr {
        qr: a,
        qraux,
        pivot,
        rank,
        nrows: n,
        ncols: p,
    })
}

/// Apply the transpose of the implicit orthogonal factor to `target`
/// (column-major n x nrhs) in place, consuming the first `rank` reflectors.
///
/// Call once with [`Workspace::Probe`] to size the scratch buffer, then
/// again with [`Workspace::Buffer`]. Returns 0 on success; -1 when the
/// target length does not match, -2 when the workspace is too short.
pub fn apply_qt(fact: &PivotedQr, target: &mut [f64], nrhs: usize, workspace: Workspace) -> i32 {
    let n = fact.nrows;
    let work = match workspace {
        Workspace::Probe(len) => {
            *len = n;
            return 0;
        }
        Workspace::Buffer(work) => work,
    };
    if target.len() != n * nrhs {
        return -1;
    }
    if work.len() < n {
        return -2;
    }

    let ju = fact.rank.min(n.saturating_sub(1));
    for j in 0..ju {
        if fact.qraux[j] == 0.0 {
            continue;
        }
        // Materialize reflector j in the workspace; its diagonal element
        // lives in qraux, the rest below the diagonal of the packed buffer.
        work[j] = fact.qraux[j];
        for i in (j + 1)..n {
            work[i] = fact.qr[i + j * n];
        }
        for k in 0..nrhs {
            let col = &mut target[k * n..(k + 1) * n];
            let mut t = 0.0;
            for i in j..n {
                t += work[i] * col[i];
            }
            t = -t / work[j];
            for i in j..n {
                col[i] += t * work[i];
            }
        }
    }
    0
}

/// Back-substitute against the top `rank` rows of the packed upper
/// triangle, non-unit diagonal, overwriting the leading `rank` entries of
/// each column of `target` (column-major n x nrhs) with the solution.
///
/// Returns 0 on success; -1 when the target length does not match, or
/// j+1 when a zero diagonal is met at position j.
pub fn triangular_solve(fact: &PivotedQr, target: &mut [f64], nrhs: usize) -> i32 {
    let n = fact.nrows;
    let rank = fact.rank;
    if target.len() != n * nrhs {
        return -1;
    }

    for k in 0..nrhs {
        let col = &mut target[k * n..(k + 1) * n];
        for jj in 1..=rank {
            let i = rank - jj;
            let d = fact.qr[i + i * n];
            if d == 0.0 {
                return (i + 1) as i32;
            }
            col[i] /= d;
            if i > 0 {
                let t = -col[i];
                for m in 0..i {
                    col[m] += t * fact.qr[m + i * n];
                }
            }
        }
    }
    0
}
