//! CoLAR - Colloid Analysis for Rust.
//!
//! Analysis of 3D colloidal particle configurations: neighbourhood graphs
//! over spatially indexed particle sets, bond-orientational-order
//! descriptors and their rotational invariants, topological cluster
//! detection, frame-to-frame trajectory linking and reconstruction of
//! 3D particles from stacks of 2D detections.

pub mod core;
pub mod io;

pub mod prelude {
    pub use crate::core::*;
    pub use crate::io::*;
    pub use rayon::iter::ParallelIterator;
}
