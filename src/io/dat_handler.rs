use crate::core::{BoundingBox, Particles, Pos};
use crate::io::FileIoError;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::num::{ParseFloatError, ParseIntError};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatHandlerError {
    #[error("unexpected io error")]
    Io(#[from] std::io::Error),

    #[error("can't open dat file for reading")]
    OpenRead(#[source] std::io::Error),

    #[error("can't open dat file for writing")]
    OpenWrite(#[source] std::io::Error),

    #[error(transparent)]
    ParseInt(#[from] ParseIntError),

    #[error(transparent)]
    ParseFloat(#[from] ParseFloatError),

    #[error("malformed header")]
    Header,

    #[error("particle {0} has an incomplete coordinate entry")]
    Entry(usize),

    #[error("expected {0} particles, file holds {1}")]
    Truncated(usize, usize),
}

/// Reads a DAT file: a "1 N 1" header, the three upper bounds of the box,
/// then N coordinate triples. The lower bounds are zero.
pub fn load_dat(fname: impl AsRef<Path>, radius: f64) -> Result<Particles, FileIoError> {
    let fname = fname.as_ref();
    read_dat(fname, radius).map_err(|e| FileIoError::new(fname, e))
}

fn read_dat(fname: &Path, radius: f64) -> Result<Particles, DatHandlerError> {
    let file = File::open(fname).map_err(DatHandlerError::OpenRead)?;
    let mut tokens = Tokens::new(BufReader::new(file));

    // header: trash, count, trash
    tokens.next_f64()?.ok_or(DatHandlerError::Header)?;
    let n = tokens
        .next_f64()?
        .ok_or(DatHandlerError::Header)? as usize;
    tokens.next_f64()?.ok_or(DatHandlerError::Header)?;

    let mut hi = [0.0; 3];
    for h in hi.iter_mut() {
        *h = tokens.next_f64()?.ok_or(DatHandlerError::Header)?;
    }
    let bb = BoundingBox::new([0.0; 3], hi);

    let positions = read_triples(&mut tokens, n)?;
    let mut parts = Particles::from_positions(positions, radius);
    parts.bb = bb;
    Ok(parts)
}

/// Writes a DAT file with the particles' bounding box upper bounds.
pub fn save_dat(parts: &Particles, fname: impl AsRef<Path>) -> Result<(), FileIoError> {
    let fname = fname.as_ref();
    write_dat(parts, fname).map_err(|e| FileIoError::new(fname, e))
}

fn write_dat(parts: &Particles, fname: &Path) -> Result<(), DatHandlerError> {
    let mut buf = BufWriter::new(File::create(fname).map_err(DatHandlerError::OpenWrite)?);
    writeln!(buf, "1\t{}\t1", parts.len())?;
    writeln!(
        buf,
        "{}\t{}\t{}",
        parts.bb.hi[0], parts.bb.hi[1], parts.bb.hi[2]
    )?;
    for p in parts.iter_pos() {
        writeln!(buf, "{}\t{}\t{}", p.x, p.y, p.z)?;
    }
    Ok(())
}

// Whitespace-separated token reader shared with the GRV format.
pub(super) struct Tokens<R: BufRead> {
    reader: R,
    line: Vec<String>,
    cursor: usize,
}

impl<R: BufRead> Tokens<R> {
    pub(super) fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            cursor: 0,
        }
    }

    pub(super) fn next_f64(&mut self) -> Result<Option<f64>, DatHandlerError> {
        loop {
            if self.cursor < self.line.len() {
                let tok = &self.line[self.cursor];
                self.cursor += 1;
                return Ok(Some(tok.parse::<f64>()?));
            }
            let mut raw = String::new();
            if self.reader.read_line(&mut raw)? == 0 {
                return Ok(None);
            }
            self.line = raw.split_whitespace().map(|s| s.to_owned()).collect();
            self.cursor = 0;
        }
    }
}

pub(super) fn read_triples<R: BufRead>(
    tokens: &mut Tokens<R>,
    n: usize,
) -> Result<Vec<Pos>, DatHandlerError> {
    let mut positions = Vec::with_capacity(n);
    for i in 0..n {
        let mut c = [0.0; 3];
        for v in c.iter_mut() {
            *v = tokens
                .next_f64()?
                .ok_or(DatHandlerError::Truncated(n, i))?;
        }
        positions.push(Pos::new(c[0], c[1], c[2]));
    }
    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(name)
    }

    #[test]
    #[should_panic]
    fn invalid_file() {
        load_dat("nonexisting.dat", 1.0).unwrap();
    }

    #[test]
    fn round_trip() -> anyhow::Result<()> {
        let mut parts = Particles::from_positions(
            vec![
                Pos::new(0.5, 1.5, 2.5),
                Pos::new(3.25, 4.0, 5.0),
                Pos::new(6.0, 7.0, 8.0),
            ],
            1.3,
        );
        parts.bb = BoundingBox::new([0.0; 3], [10.0, 11.0, 12.0]);
        let path = tmp("colar_round_trip.dat");
        save_dat(&parts, &path)?;
        let back = load_dat(&path, 1.3)?;
        assert_eq!(back.len(), 3);
        assert_eq!(back.bb.hi, [10.0, 11.0, 12.0]);
        assert_eq!(back.pos(1), &Pos::new(3.25, 4.0, 5.0));
        Ok(())
    }

    #[test]
    fn truncated_file_errors() -> anyhow::Result<()> {
        let path = tmp("colar_truncated.dat");
        std::fs::write(&path, "1\t5\t1\n10\t10\t10\n1 2 3\n")?;
        let err = load_dat(&path, 1.0).unwrap_err();
        assert!(err.to_string().contains("expected 5 particles"));
        Ok(())
    }
}
