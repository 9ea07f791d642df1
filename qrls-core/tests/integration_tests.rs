//! End-to-end tests for the pivoted-QR least-squares solver.
//!
//! Exercises both entry points through the public API: the build path
//! (`qr_solve`) and the apply path (`qr_coef`) reusing a factorization,
//! along with the full error taxonomy.

use qrls_core::solve::{qr_coef, qr_solve};
use qrls_linalg::dense::DenseMatrix;
use qrls_linalg::qr::LinalgError;

/// Square full-rank round trip: build Y = X * c, recover c.
#[test]
fn test_square_round_trip() {
    let x = DenseMatrix::from_row_major(
        3,
        3,
        &[
            2.0, 1.0, 0.0, //
            1.0, 3.0, 1.0, //
            0.0, 1.0, 4.0,
        ],
    );
    let c = DenseMatrix::from_vec(&[1.5, -2.0, 0.25]);
    let y = x.mat_mul(&c);

    let fit = qr_solve(&x, &y, None).unwrap();
    for i in 0..3 {
        assert!(
            (fit.coefficients.get(i, 0) - c.get(i, 0)).abs() < 1e-10,
            "coefficient {} = {}, expected {}",
            i,
            fit.coefficients.get(i, 0),
            c.get(i, 0)
        );
    }
}

/// X = [[1,0],[0,1],[1,1]], Y = [1,1,2] has the exact
/// solution [1, 1] with zero residual.
#[test]
fn test_overdetermined_exact_fit() {
    let x = DenseMatrix::from_row_major(3, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    let y = DenseMatrix::from_vec(&[1.0, 1.0, 2.0]);

    let fit = qr_solve(&x, &y, None).unwrap();
    assert!((fit.coefficients.get(0, 0) - 1.0).abs() < 1e-10);
    assert!((fit.coefficients.get(1, 0) - 1.0).abs() < 1e-10);
    for i in 0..3 {
        assert!(fit.residuals.get(i, 0).abs() < 1e-10);
    }
}

/// Genuinely overdetermined system: residuals must be orthogonal to the
/// column space (normal equations hold).
#[test]
fn test_least_squares_normal_equations() {
    let x = DenseMatrix::from_row_major(4, 2, &[1.0, 1.0, 1.0, 2.0, 1.0, 3.0, 1.0, 4.0]);
    let y = DenseMatrix::from_vec(&[2.1, 3.9, 6.2, 7.8]);

    let fit = qr_solve(&x, &y, None).unwrap();
    let xt_r = x.transpose().mat_mul(&fit.residuals);
    for i in 0..2 {
        assert!(
            xt_r.get(i, 0).abs() < 1e-9,
            "X' * residuals[{}] = {}",
            i,
            xt_r.get(i, 0)
        );
    }
}

/// Duplicated column: rank deficient by construction, must fail with
/// SingularMatrix and never return coefficients.
#[test]
fn test_duplicated_column_is_singular() {
    let x = DenseMatrix::from_row_major(3, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    let y = DenseMatrix::from_vec(&[1.0, 2.0, 3.0]);
    match qr_solve(&x, &y, None) {
        Err(LinalgError::SingularMatrix { rank, ncols }) => {
            assert_eq!(rank, 1);
            assert_eq!(ncols, 2);
        }
        Ok(_) => panic!("rank-deficient solve returned coefficients"),
        Err(e) => panic!("expected SingularMatrix, got {e}"),
    }
}

/// Wide matrix (more columns than rows) can never have full column rank.
#[test]
fn test_wide_matrix_is_singular() {
    let x = DenseMatrix::from_row_major(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let y = DenseMatrix::from_vec(&[1.0, 2.0]);
    assert!(matches!(
        qr_solve(&x, &y, None),
        Err(LinalgError::SingularMatrix { .. })
    ));
}

/// Mismatched row counts fail before any numerical work.
#[test]
fn test_row_count_mismatch() {
    let x = DenseMatrix::zeros(5, 3);
    let y = DenseMatrix::zeros(4, 2);
    match qr_solve(&x, &y, None) {
        Err(LinalgError::DimensionMismatch { expected, got }) => {
            assert_eq!(expected, 5);
            assert_eq!(got, 4);
        }
        _ => panic!("expected DimensionMismatch"),
    }
}

/// Build path and apply path must agree on the same X, Y.
#[test]
fn test_build_and_apply_paths_agree() {
    let x = DenseMatrix::from_row_major(
        4,
        3,
        &[
            1.0, 0.5, 0.2, //
            0.3, 2.0, 0.1, //
            0.7, 0.4, 3.0, //
            1.0, 1.0, 1.0,
        ],
    );
    let y = DenseMatrix::from_row_major(4, 2, &[1.0, 0.0, 2.0, 1.0, 3.0, -1.0, 4.0, 2.0]);

    let fit = qr_solve(&x, &y, None).unwrap();
    let coef = qr_coef(&fit.qr, &y).unwrap();

    assert_eq!(coef.nrows(), 3);
    assert_eq!(coef.ncols(), 2);
    for i in 0..3 {
        for j in 0..2 {
            assert!(
                (coef.get(i, j) - fit.coefficients.get(i, j)).abs() < 1e-10,
                "apply path disagrees at ({}, {}): {} vs {}",
                i,
                j,
                coef.get(i, j),
                fit.coefficients.get(i, j)
            );
        }
    }
}

/// A factorization is reusable across distinct right-hand sides.
#[test]
fn test_factorization_reuse_across_rhs() {
    let x = DenseMatrix::from_row_major(3, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    let y1 = DenseMatrix::from_vec(&[1.0, 1.0, 2.0]);
    let y2 = DenseMatrix::from_vec(&[3.0, -1.0, 2.0]);

    let fit = qr_solve(&x, &y1, None).unwrap();
    let coef2 = qr_coef(&fit.qr, &y2).unwrap();
    let direct2 = qr_solve(&x, &y2, None).unwrap();

    for i in 0..2 {
        assert!((coef2.get(i, 0) - direct2.coefficients.get(i, 0)).abs() < 1e-10);
    }
}

/// Solving nrhs > 1 at once equals solving each column independently.
#[test]
fn test_multi_rhs_matches_per_column_solves() {
    let x = DenseMatrix::from_row_major(
        4,
        2,
        &[1.0, 1.0, 1.0, 2.0, 1.0, 3.0, 1.0, 4.0],
    );
    let y = DenseMatrix::from_row_major(4, 3, &[
        1.0, 0.5, -1.0, //
        2.0, 1.5, 0.0, //
        3.0, 2.5, 1.0, //
        4.0, 3.5, 2.0,
    ]);

    let joint = qr_solve(&x, &y, None).unwrap();
    for j in 0..3 {
        let yj = DenseMatrix::from_vec(&y.col(j));
        let single = qr_solve(&x, &yj, None).unwrap();
        for i in 0..2 {
            assert!(
                (joint.coefficients.get(i, j) - single.coefficients.get(i, 0)).abs() < 1e-10,
                "column {} coefficient {} differs",
                j,
                i
            );
        }
    }
}

/// Inputs are never mutated by a solve.
#[test]
fn test_inputs_left_untouched() {
    let x_data = [1.0, 0.0, 0.0, 1.0, 1.0, 1.0];
    let y_data = [1.0, 1.0, 2.0];
    let x = DenseMatrix::from_row_major(3, 2, &x_data);
    let y = DenseMatrix::from_vec(&y_data);

    let _fit = qr_solve(&x, &y, None).unwrap();
    assert_eq!(x.to_row_major(), x_data.to_vec());
    assert_eq!(y.to_row_major(), y_data.to_vec());
}

/// Effects are Q'Y: their squared norm matches Y's (Q is orthogonal).
#[test]
fn test_effects_preserve_norm() {
    let x = DenseMatrix::from_row_major(3, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    let y = DenseMatrix::from_vec(&[1.0, 1.0, 2.0]);
    let fit = qr_solve(&x, &y, None).unwrap();

    let norm2 = |m: &DenseMatrix| -> f64 {
        let mut s = 0.0;
        for i in 0..m.nrows() {
            s += m.get(i, 0) * m.get(i, 0);
        }
        s
    };
    assert!((norm2(&fit.effects) - norm2(&y)).abs() < 1e-9);
}

/// Error values format with their diagnostic context.
#[test]
fn test_error_display() {
    let x = DenseMatrix::from_row_major(3, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    let y = DenseMatrix::from_vec(&[1.0, 2.0, 3.0]);
    let err = qr_solve(&x, &y, None).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("singular"), "unexpected message: {msg}");
    assert!(msg.contains("rank 1"), "unexpected message: {msg}");
}
