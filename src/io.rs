//! Readers and writers for the file formats of the analysis chain.
//!
//! Each format lives in its own handler module with its own error type;
//! the public functions pair every failure with the offending path.

use std::path::PathBuf;
use thiserror::Error;

mod bonds_handler;
mod cloud_handler;
mod dat_handler;
mod grv_handler;
mod qlm_handler;
mod rdf_handler;
mod vtk_handler;

pub use bonds_handler::{load_bonds, save_bonds, BondsHandlerError};
pub use cloud_handler::{load_cloud, save_cloud, CloudHandlerError};
pub use dat_handler::{load_dat, save_dat, DatHandlerError};
pub use grv_handler::{load_grv, save_grv, GrvHandlerError};
pub use qlm_handler::{
    load_q6m, load_qlm, load_qlm_binary, save_q6m, save_qlm, save_qlm_binary, QlmHandlerError,
};
pub use rdf_handler::{save_rdf, RdfHandlerError};
pub use vtk_handler::{export_vtk, ScalarField, VectorField, VtkHandlerError};

/// Any format-level failure.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Dat(#[from] DatHandlerError),

    #[error(transparent)]
    Grv(#[from] GrvHandlerError),

    #[error(transparent)]
    Bonds(#[from] BondsHandlerError),

    #[error(transparent)]
    Qlm(#[from] QlmHandlerError),

    #[error(transparent)]
    Cloud(#[from] CloudHandlerError),

    #[error(transparent)]
    Vtk(#[from] VtkHandlerError),

    #[error(transparent)]
    Rdf(#[from] RdfHandlerError),
}

/// A format failure tied to the file it happened in.
#[derive(Debug, Error)]
#[error("file '{}': {source}", .path.display())]
pub struct FileIoError {
    pub path: PathBuf,
    #[source]
    pub source: FormatError,
}

impl FileIoError {
    pub(crate) fn new(path: impl Into<PathBuf>, source: impl Into<FormatError>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }
}
