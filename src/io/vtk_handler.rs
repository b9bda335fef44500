use crate::core::{BondSet, Particles, Vector3d};
use crate::io::FileIoError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VtkHandlerError {
    #[error("unexpected io error")]
    Io(#[from] std::io::Error),

    #[error("can't open vtk file for writing")]
    OpenWrite(#[source] std::io::Error),

    #[error("field '{0}' has {1} values for {2} particles")]
    FieldSize(String, usize, usize),
}

/// A named per-particle scalar field.
pub struct ScalarField<'a> {
    pub name: &'a str,
    pub values: &'a [f64],
}

/// A named per-particle vector field.
pub struct VectorField<'a> {
    pub name: &'a str,
    pub values: &'a [Vector3d],
}

/// Exports positions, optional bonds and per-particle fields to an ASCII
/// VTK 3.0 PolyData file.
pub fn export_vtk(
    parts: &Particles,
    fname: impl AsRef<Path>,
    bonds: Option<&BondSet>,
    scalars: &[ScalarField],
    vectors: &[VectorField],
    data_name: &str,
) -> Result<(), FileIoError> {
    let fname = fname.as_ref();
    write_vtk(parts, fname, bonds, scalars, vectors, data_name)
        .map_err(|e| FileIoError::new(fname, e))
}

fn write_vtk(
    parts: &Particles,
    fname: &Path,
    bonds: Option<&BondSet>,
    scalars: &[ScalarField],
    vectors: &[VectorField],
    data_name: &str,
) -> Result<(), VtkHandlerError> {
    let n = parts.len();
    for s in scalars {
        if s.values.len() != n {
            return Err(VtkHandlerError::FieldSize(s.name.into(), s.values.len(), n));
        }
    }
    for v in vectors {
        if v.values.len() != n {
            return Err(VtkHandlerError::FieldSize(v.name.into(), v.values.len(), n));
        }
    }

    let mut buf = BufWriter::new(File::create(fname).map_err(VtkHandlerError::OpenWrite)?);
    writeln!(buf, "# vtk DataFile Version 3.0")?;
    writeln!(buf, "{}", data_name)?;
    writeln!(buf, "ASCII")?;
    writeln!(buf, "DATASET POLYDATA")?;
    writeln!(buf, "POINTS {} double", n)?;
    for p in parts.iter_pos() {
        writeln!(buf, "{} {} {}", p.x, p.y, p.z)?;
    }

    if let Some(bonds) = bonds {
        writeln!(buf, "LINES {} {}", bonds.len(), 3 * bonds.len())?;
        for b in bonds.iter() {
            writeln!(buf, "2 {} {}", b.low(), b.high())?;
        }
    }

    writeln!(buf, "POINT_DATA {}", n)?;
    for s in scalars {
        writeln!(buf, "SCALARS {} double 1", s.name)?;
        writeln!(buf, "LOOKUP_TABLE default")?;
        for v in s.values {
            writeln!(buf, "{}", v)?;
        }
    }
    for field in vectors {
        writeln!(buf, "VECTORS {} double", field.name)?;
        for v in field.values {
            writeln!(buf, "{} {} {}", v.x, v.y, v.z)?;
        }
    }
    Ok(())
}
