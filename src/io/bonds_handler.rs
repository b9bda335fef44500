use crate::core::{Bond, BondSet};
use crate::io::FileIoError;
use sorted_vec::SortedSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::num::ParseIntError;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BondsHandlerError {
    #[error("unexpected io error")]
    Io(#[from] std::io::Error),

    #[error("can't open bonds file for reading")]
    OpenRead(#[source] std::io::Error),

    #[error("can't open bonds file for writing")]
    OpenWrite(#[source] std::io::Error),

    #[error(transparent)]
    ParseInt(#[from] ParseIntError),

    #[error("line {0} does not hold an index pair")]
    Pair(usize),
}

/// Writes one bond per line as "high low".
pub fn save_bonds(bonds: &BondSet, fname: impl AsRef<Path>) -> Result<(), FileIoError> {
    let fname = fname.as_ref();
    write_bonds(bonds, fname).map_err(|e| FileIoError::new(fname, e))
}

fn write_bonds(bonds: &BondSet, fname: &Path) -> Result<(), BondsHandlerError> {
    let mut buf = BufWriter::new(File::create(fname).map_err(BondsHandlerError::OpenWrite)?);
    for b in bonds.iter() {
        writeln!(buf, "{} {}", b.high(), b.low())?;
    }
    Ok(())
}

/// Reads whitespace-separated index pairs, in any order per line,
/// into a sorted unique bond set.
pub fn load_bonds(fname: impl AsRef<Path>) -> Result<BondSet, FileIoError> {
    let fname = fname.as_ref();
    read_bonds(fname).map_err(|e| FileIoError::new(fname, e))
}

fn read_bonds(fname: &Path) -> Result<BondSet, BondsHandlerError> {
    let file = File::open(fname).map_err(BondsHandlerError::OpenRead)?;
    let mut bonds = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut it = line.split_whitespace();
        let a = it
            .next()
            .ok_or(BondsHandlerError::Pair(i))?
            .parse::<usize>()?;
        let b = it
            .next()
            .ok_or(BondsHandlerError::Pair(i))?
            .parse::<usize>()?;
        bonds.push(Bond::new(a, b));
    }
    Ok(SortedSet::from_unsorted(bonds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_sorted_unique() -> anyhow::Result<()> {
        let bonds: BondSet = SortedSet::from_unsorted(vec![
            Bond::new(3, 1),
            Bond::new(0, 2),
            Bond::new(1, 3),
        ]);
        assert_eq!(bonds.len(), 2);
        let path = std::env::temp_dir().join("colar_bonds.bonds");
        save_bonds(&bonds, &path)?;
        let back = load_bonds(&path)?;
        assert_eq!(back.len(), 2);
        assert_eq!(back[0], Bond::new(0, 2));
        assert_eq!(back[1], Bond::new(1, 3));
        Ok(())
    }

    #[test]
    fn malformed_line_errors() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join("colar_bad.bonds");
        std::fs::write(&path, "1 2\n7\n")?;
        assert!(load_bonds(&path).is_err());
        Ok(())
    }
}
