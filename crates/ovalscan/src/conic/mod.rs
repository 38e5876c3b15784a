//! Conic fitting and geometric decoding.
//!
//! Implements:
//! - Least-squares conic fit via a generalized eigenproblem on the full
//!   6×6 power-sum scatter matrix, with the ellipse constraint 4AC − B² = 1.
//! - Conversion from general conic coefficients to geometric ellipse
//!   parameters, with degeneracy checks.

mod decode;
mod eigen;
mod fit;
mod types;

pub use decode::decode_conic;
pub use fit::{fit_conic, DETERMINANT_EPS, EIGENVALUE_THRESHOLD};
pub use types::{ConicCoeffs, Ellipse};
