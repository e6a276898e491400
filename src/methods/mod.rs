mod box_m;
mod mardia;
pub mod ordination;

pub use box_m::{BoxMComputation, box_m_test};
pub use mardia::{MardiaComputation, mardia};
