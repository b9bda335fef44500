use crate::core::BooData;
use crate::io::FileIoError;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::num::ParseFloatError;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CloudHandlerError {
    #[error("unexpected io error")]
    Io(#[from] std::io::Error),

    #[error("can't open cloud file for reading")]
    OpenRead(#[source] std::io::Error),

    #[error("can't open cloud file for writing")]
    OpenWrite(#[source] std::io::Error),

    #[error(transparent)]
    ParseFloat(#[from] ParseFloatError),

    #[error("cloud file has no header")]
    NoHeader,

    #[error("particle {0} has an incomplete invariant entry")]
    Entry(usize),
}

/// The orders whose invariants a cloud file holds.
const CLOUD_ORDERS: [usize; 4] = [4, 6, 8, 10];

/// Writes one line of rotational invariants per particle:
/// Q4 Q6 Q8 Q10 then w4 w6 w8 w10, tab separated.
pub fn save_cloud(boos: &[BooData], fname: impl AsRef<Path>) -> Result<(), FileIoError> {
    let fname = fname.as_ref();
    write_cloud(boos, fname).map_err(|e| FileIoError::new(fname, e))
}

fn write_cloud(boos: &[BooData], fname: &Path) -> Result<(), CloudHandlerError> {
    let mut buf = BufWriter::new(File::create(fname).map_err(CloudHandlerError::OpenWrite)?);
    writeln!(buf, "#Q4\tQ6\tW4\tW6")?;
    for boo in boos {
        let qw: Vec<(f64, f64)> = CLOUD_ORDERS.iter().map(|&l| boo.invariants(l)).collect();
        let mut sep = "";
        for (q, _) in &qw {
            write!(buf, "{}{}", sep, q)?;
            sep = "\t";
        }
        for (_, w) in &qw {
            write!(buf, "\t{}", w)?;
        }
        writeln!(buf)?;
    }
    Ok(())
}

/// Reads the invariants of exactly `n` particles back as rows of
/// [Q4, Q6, Q8, Q10, w4, w6, w8, w10]. A shorter file is an input error.
pub fn load_cloud(fname: impl AsRef<Path>, n: usize) -> Result<Vec<[f64; 8]>, FileIoError> {
    let fname = fname.as_ref();
    read_cloud(fname, n).map_err(|e| FileIoError::new(fname, e))
}

fn read_cloud(fname: &Path, n: usize) -> Result<Vec<[f64; 8]>, CloudHandlerError> {
    let file = File::open(fname).map_err(CloudHandlerError::OpenRead)?;
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    // the header line is not data
    if reader.read_line(&mut line)? == 0 {
        return Err(CloudHandlerError::NoHeader);
    }
    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(CloudHandlerError::Entry(i));
        }
        let mut row = [0.0; 8];
        let mut values = line.split_whitespace();
        for v in row.iter_mut() {
            *v = values
                .next()
                .ok_or(CloudHandlerError::Entry(i))?
                .parse::<f64>()?;
        }
        rows.push(row);
    }
    Ok(rows)
}
