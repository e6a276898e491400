//! Numerical helpers for drawing ordination diagrams.
//!
//! These compute the coordinates that biplots and triplots are made of: species scores as
//! weighted averages of site scores, confidence ellipses around groups of objects, and the
//! scaling of scores, loadings and arrows. Rendering is left to the caller.
//!
//! # Example
//!
//! ```rust
//! use nalgebra::DMatrix;
//! use ordistats::ordination::group_ellipses;
//!
//! let scores = DMatrix::from_row_slice(
//!     6,
//!     2,
//!     &[0.1, 0.2, 0.5, 0.1, -0.2, 0.3, 2.0, 1.8, 2.4, 2.1, 1.7, 2.6],
//! );
//! let groups = ["wet", "wet", "wet", "dry", "dry", "dry"];
//!
//! let ellipses = group_ellipses(&scores, groups, (0, 1), 0.95, 50).unwrap();
//! assert_eq!(ellipses["dry"].deviation.len(), 51);
//! ```

mod biplot;
mod ellipse;
mod wascores;

pub use biplot::{BiplotCoordinates, BiplotScaling, biplot_coordinates, triplot_arrow_scale};
pub use ellipse::{EllipseMethod, GroupEllipse, ellipse, group_ellipses};
pub use wascores::wascores;
