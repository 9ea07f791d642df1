//! qrls-core: Least-squares solving on a pivoted QR factorization.
//!
//! Implements the build path (factorize a design matrix, verify full
//! column rank, solve for coefficients) and the apply path (reuse an
//! existing factorization against new right-hand sides), plus the GLM
//! family transforms consumed by higher-level model-fitting code.

pub mod family;
pub mod solve;

pub use solve::{qr_coef, qr_solve, QrLsFit, DEFAULT_TOL};
