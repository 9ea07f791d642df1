//! qrls-linalg: Linear algebra kernels for qrls-rs
//!
//! Provides the dense matrix type, explicit layout conversion between
//! row-major caller buffers and the column-major storage the QR kernels
//! require, and the rank-revealing pivoted QR primitives
//! (factorize / apply-Q-transpose / triangular solve).

pub mod dense;
pub mod qr;

pub use dense::DenseMatrix;
pub use qr::{LinalgError, PivotedQr, Workspace};
