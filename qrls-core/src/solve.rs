//! Least-squares solving on a rank-revealing pivoted QR factorization.
//!
//! Two entry points: `qr_solve` factorizes a design matrix and solves in
//! one call, `qr_coef` reuses an already-computed factorization against
//! new right-hand sides. Both refuse rank-deficient inputs outright; no
//! pivoted-subset or minimum-norm fallback is ever produced, because a
//! silently truncated solution would change the numerical semantics the
//! callers rely on.

use tracing::debug;

use qrls_linalg::dense::DenseMatrix;
use qrls_linalg::qr::{self, LinalgError, PivotedQr, Workspace};

/// Default rank-detection tolerance, matching R's qr default.
pub const DEFAULT_TOL: f64 = 1e-7;

/// Result of a full build-path solve.
///
/// Coefficients, residuals, and effects are freshly allocated; the
/// retained factorization can be handed to [`qr_coef`] for further
/// right-hand sides.
#[derive(Debug)]
pub struct QrLsFit {
    /// Coefficient matrix (p x nrhs), in the caller's original column order.
    pub coefficients: DenseMatrix,
    /// Residual matrix Y - X * coefficients (n x nrhs).
    pub residuals: DenseMatrix,
    /// Effects matrix Q' * Y (n x nrhs).
    pub effects: DenseMatrix,
    /// The pivoted factorization of X.
    pub qr: PivotedQr,
    /// Tolerance actually used for rank detection.
    pub tol: f64,
}

fn effective_tol(tol: Option<f64>) -> f64 {
    match tol {
        Some(t) if t >= 1e-10 => t,
        _ => DEFAULT_TOL,
    }
}

/// Factorize `x` and solve the least-squares problem min ||x * c - y||
/// for every column of `y` simultaneously.
///
/// Fails with `DimensionMismatch` when row counts disagree and with
/// `SingularMatrix` when the factorization does not reveal full column
/// rank at the given tolerance (default 1e-7). Neither input is mutated;
/// both are copied into private column-major buffers before any
/// numerical work.
pub fn qr_solve(
    x: &DenseMatrix,
    y: &DenseMatrix,
    tol: Option<f64>,
) -> Result<QrLsFit, LinalgError> {
    if x.nrows() != y.nrows() {
        return Err(LinalgError::DimensionMismatch {
            expected: x.nrows(),
            got: y.nrows(),
        });
    }

    let n = x.nrows();
    let p = x.ncols();
    let nrhs = y.ncols();
    let tol_eff = effective_tol(tol);

    let x_cm = x.to_col_major();
    let fact = qr::factorize(&x_cm, n, p, tol_eff)?;
    debug!(
        "pivoted QR: n={}, p={}, nrhs={}, rank={}",
        n,
        p,
        nrhs,
        fact.rank()
    );

    if fact.rank() != p {
        return Err(LinalgError::SingularMatrix {
            rank: fact.rank(),
            ncols: p,
        });
    }

    let mut b_cm = y.to_col_major();
    let effects_cm = apply_and_solve(&fact, &mut b_cm, nrhs)?;

    let coefficients = unscramble(&fact, &b_cm, nrhs);
    let effects = DenseMatrix::from_col_major(n, nrhs, &effects_cm);
    let residuals = y.sub(&x.mat_mul(&coefficients));

    Ok(QrLsFit {
        coefficients,
        residuals,
        effects,
        qr: fact,
        tol: tol_eff,
    })
}

/// Extract coefficients from an existing full-rank factorization for the
/// right-hand-side matrix `b`.
///
/// The factorization must have been verified full rank (`rank == p`);
/// anything else is an `InvalidArgument`. `b` is copied, transformed by
/// the implicit orthogonal factor in its transpose sense, and
/// back-substituted; the leading p rows are returned in the caller's
/// original column order.
pub fn qr_coef(fact: &PivotedQr, b: &DenseMatrix) -> Result<DenseMatrix, LinalgError> {
    let p = fact.ncols();
    if fact.rank() != p {
        return Err(LinalgError::InvalidArgument(format!(
            "factorization is rank deficient (rank {} of {} columns)",
            fact.rank(),
            p
        )));
    }
    if b.nrows() != fact.nrows() {
        return Err(LinalgError::DimensionMismatch {
            expected: fact.nrows(),
            got: b.nrows(),
        });
    }

    let nrhs = b.ncols();
    let mut b_cm = b.to_col_major();
    apply_and_solve(fact, &mut b_cm, nrhs)?;
    Ok(unscramble(fact, &b_cm, nrhs))
}

/// Shared tail of both paths: probe and allocate workspace, apply Q' in
/// place, then back-substitute in place. Returns the post-apply buffer
/// (the effects) before back-substitution overwrites its leading rows.
fn apply_and_solve(
    fact: &PivotedQr,
    b: &mut [f64],
    nrhs: usize,
) -> Result<Vec<f64>, LinalgError> {
    let mut needed = 0usize;
    let code = qr::apply_qt(fact, b, nrhs, Workspace::Probe(&mut needed));
    if code != 0 {
        return Err(LinalgError::NumericalFailure {
            stage: "apply",
            code,
        });
    }

    let mut work = vec![0.0; needed];
    let code = qr::apply_qt(fact, b, nrhs, Workspace::Buffer(&mut work));
    if code != 0 {
        return Err(LinalgError::NumericalFailure {
            stage: "apply",
            code,
        });
    }
    let effects = b.to_vec();

    let code = qr::triangular_solve(fact, b, nrhs);
    if code != 0 {
        return Err(LinalgError::NumericalFailure {
            stage: "triangular-solve",
            code,
        });
    }
    Ok(effects)
}

/// Map the leading `rank` entries of each solved column back to the
/// caller's original column order through the pivot vector.
fn unscramble(fact: &PivotedQr, b: &[f64], nrhs: usize) -> DenseMatrix {
    let n = fact.nrows();
    let p = fact.ncols();
    let mut coef = DenseMatrix::zeros(p, nrhs);
    for k in 0..nrhs {
        for i in 0..fact.rank() {
            coef.set(fact.pivot()[i], k, b[i + k * n]);
        }
    }
    coef
}
