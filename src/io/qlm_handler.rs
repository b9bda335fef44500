use crate::core::{BooData, Cplx, BOO_LEN};
use crate::io::FileIoError;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::num::ParseFloatError;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QlmHandlerError {
    #[error("unexpected io error")]
    Io(#[from] std::io::Error),

    #[error("can't open qlm file for reading")]
    OpenRead(#[source] std::io::Error),

    #[error("can't open qlm file for writing")]
    OpenWrite(#[source] std::io::Error),

    #[error(transparent)]
    ParseFloat(#[from] ParseFloatError),

    #[error("expected {0} bytes of coefficients, file holds {1}")]
    BinarySize(usize, usize),

    #[error("particle {0} has an incomplete coefficient entry")]
    Entry(usize),
}

const RECORD: usize = 2 * BOO_LEN; // 72 doubles per particle

/// Writes the descriptors in binary: for each particle, 72 little-endian
/// doubles, the real and imaginary part of every stored coefficient.
pub fn save_qlm_binary(boos: &[BooData], fname: impl AsRef<Path>) -> Result<(), FileIoError> {
    let fname = fname.as_ref();
    write_qlm_binary(boos, fname).map_err(|e| FileIoError::new(fname, e))
}

fn write_qlm_binary(boos: &[BooData], fname: &Path) -> Result<(), QlmHandlerError> {
    let mut buf = BufWriter::new(File::create(fname).map_err(QlmHandlerError::OpenWrite)?);
    for boo in boos {
        for c in boo.0.iter() {
            buf.write_all(&c.re.to_le_bytes())?;
            buf.write_all(&c.im.to_le_bytes())?;
        }
    }
    Ok(())
}

/// Reads exactly `n` binary descriptor records. A file of any other
/// length is an input error.
pub fn load_qlm_binary(fname: impl AsRef<Path>, n: usize) -> Result<Vec<BooData>, FileIoError> {
    let fname = fname.as_ref();
    read_qlm_binary(fname, n).map_err(|e| FileIoError::new(fname, e))
}

fn read_qlm_binary(fname: &Path, n: usize) -> Result<Vec<BooData>, QlmHandlerError> {
    let mut file = File::open(fname).map_err(QlmHandlerError::OpenRead)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    let expected = n * RECORD * 8;
    if bytes.len() != expected {
        return Err(QlmHandlerError::BinarySize(expected, bytes.len()));
    }
    let mut boos = Vec::with_capacity(n);
    let mut at = 0;
    for _ in 0..n {
        let mut boo = BooData::default();
        for c in boo.0.iter_mut() {
            let re = f64::from_le_bytes(bytes[at..at + 8].try_into().unwrap());
            let im = f64::from_le_bytes(bytes[at + 8..at + 16].try_into().unwrap());
            *c = Cplx::new(re, im);
            at += 16;
        }
        boos.push(boo);
    }
    Ok(boos)
}

/// Writes the descriptors in ASCII, one particle per line, the real and
/// imaginary parts of every coefficient separated by tabs.
pub fn save_qlm(boos: &[BooData], fname: impl AsRef<Path>) -> Result<(), FileIoError> {
    let fname = fname.as_ref();
    write_ascii(boos, fname, 0, BOO_LEN).map_err(|e| FileIoError::new(fname, e))
}

/// Reads `n` ASCII descriptor lines.
pub fn load_qlm(fname: impl AsRef<Path>, n: usize) -> Result<Vec<BooData>, FileIoError> {
    let fname = fname.as_ref();
    read_ascii(fname, n, 0, BOO_LEN).map_err(|e| FileIoError::new(fname, e))
}

/// Writes only the l=6 coefficients, one particle per line.
pub fn save_q6m(boos: &[BooData], fname: impl AsRef<Path>) -> Result<(), FileIoError> {
    let fname = fname.as_ref();
    write_ascii(boos, fname, 9, 16).map_err(|e| FileIoError::new(fname, e))
}

/// Reads `n` lines of l=6 coefficients; all other coefficients are zero.
pub fn load_q6m(fname: impl AsRef<Path>, n: usize) -> Result<Vec<BooData>, FileIoError> {
    let fname = fname.as_ref();
    read_ascii(fname, n, 9, 16).map_err(|e| FileIoError::new(fname, e))
}

fn write_ascii(
    boos: &[BooData],
    fname: &Path,
    from: usize,
    to: usize,
) -> Result<(), QlmHandlerError> {
    let mut buf = BufWriter::new(File::create(fname).map_err(QlmHandlerError::OpenWrite)?);
    for boo in boos {
        let mut sep = "";
        for c in &boo.0[from..to] {
            write!(buf, "{}{}\t{}", sep, c.re, c.im)?;
            sep = "\t";
        }
        writeln!(buf)?;
    }
    Ok(())
}

fn read_ascii(
    fname: &Path,
    n: usize,
    from: usize,
    to: usize,
) -> Result<Vec<BooData>, QlmHandlerError> {
    let file = File::open(fname).map_err(QlmHandlerError::OpenRead)?;
    let mut reader = BufReader::new(file);
    let mut boos = Vec::with_capacity(n);
    let mut line = String::new();
    for i in 0..n {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(QlmHandlerError::Entry(i));
        }
        let mut boo = BooData::default();
        let mut values = line.split_whitespace();
        for c in boo.0[from..to].iter_mut() {
            let re = values
                .next()
                .ok_or(QlmHandlerError::Entry(i))?
                .parse::<f64>()?;
            let im = values
                .next()
                .ok_or(QlmHandlerError::Entry(i))?
                .parse::<f64>()?;
            *c = Cplx::new(re, im);
        }
        boos.push(boo);
    }
    Ok(boos)
}
