mod bounding_box;
mod rtree;
mod particles;
mod bonds;
mod wigner;
mod boo;
mod traj;
mod multiscale;
mod reconstruct;

pub use {
    bounding_box::*,
    rtree::*,
    particles::*,
    bonds::*,
    boo::*,
    traj::*,
    multiscale::*,
    reconstruct::*,
};

pub(crate) use wigner::{factorial, wigner_3j, wigner_small_d};

// Aliases for vectors and points
pub type Vector3d = nalgebra::Vector3<f64>;
pub type Pos = nalgebra::Point3<f64>;

/// Complex spherical harmonics coefficient
pub type Cplx = num_complex::Complex<f64>;

/// Iterator alias traits to make signatures less verbose
pub trait PosIterator<'a>: Iterator<Item = &'a Pos> {}
impl<'a, T> PosIterator<'a> for T where T: Iterator<Item = &'a Pos> {}

pub trait IndexIterator: Iterator<Item = usize> {}
impl<T> IndexIterator for T where T: Iterator<Item = usize> {}
