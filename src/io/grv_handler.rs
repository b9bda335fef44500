use super::dat_handler::{read_triples, Tokens};
use crate::core::{BoundingBox, Particles};
use crate::io::FileIoError;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrvHandlerError {
    #[error("unexpected io error")]
    Io(#[from] std::io::Error),

    #[error("can't open grv file for reading")]
    OpenRead(#[source] std::io::Error),

    #[error("can't open grv file for writing")]
    OpenWrite(#[source] std::io::Error),

    #[error("bad grv data: {0}")]
    Data(#[from] super::DatHandlerError),
}

/// Reads a GRV file: `n` bare coordinate triples. The bounding box is not
/// part of the format and is provided alongside.
pub fn load_grv(
    fname: impl AsRef<Path>,
    n: usize,
    bb: BoundingBox,
    radius: f64,
) -> Result<Particles, FileIoError> {
    let fname = fname.as_ref();
    read_grv(fname, n, bb, radius).map_err(|e| FileIoError::new(fname, e))
}

fn read_grv(
    fname: &Path,
    n: usize,
    bb: BoundingBox,
    radius: f64,
) -> Result<Particles, GrvHandlerError> {
    let file = File::open(fname).map_err(GrvHandlerError::OpenRead)?;
    let mut tokens = Tokens::new(BufReader::new(file));
    let positions = read_triples(&mut tokens, n)?;
    let mut parts = Particles::from_positions(positions, radius);
    parts.bb = bb;
    Ok(parts)
}

/// Writes bare coordinate triples.
pub fn save_grv(parts: &Particles, fname: impl AsRef<Path>) -> Result<(), FileIoError> {
    let fname = fname.as_ref();
    write_grv(parts, fname).map_err(|e| FileIoError::new(fname, e))
}

fn write_grv(parts: &Particles, fname: &Path) -> Result<(), GrvHandlerError> {
    let mut buf = BufWriter::new(File::create(fname).map_err(GrvHandlerError::OpenWrite)?);
    for p in parts.iter_pos() {
        writeln!(buf, "{}\t{}\t{}", p.x, p.y, p.z)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Pos;

    #[test]
    fn round_trip() -> anyhow::Result<()> {
        let parts = Particles::from_positions(
            vec![Pos::new(1.0, 2.0, 3.0), Pos::new(4.0, 5.0, 6.0)],
            1.0,
        );
        let path = std::env::temp_dir().join("colar_round_trip.grv");
        save_grv(&parts, &path)?;
        let bb = BoundingBox::new([0.0; 3], [10.0; 3]);
        let back = load_grv(&path, 2, bb, 1.0)?;
        assert_eq!(back.len(), 2);
        assert_eq!(back.pos(1), &Pos::new(4.0, 5.0, 6.0));
        assert_eq!(back.bb, bb);
        Ok(())
    }
}
