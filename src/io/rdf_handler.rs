use crate::io::FileIoError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RdfHandlerError {
    #[error("unexpected io error")]
    Io(#[from] std::io::Error),

    #[error("can't open rdf file for writing")]
    OpenWrite(#[source] std::io::Error),
}

/// Writes a radial distribution function, one "r g(r)" line per bin.
/// `bin_width` converts bin indices to distances.
pub fn save_rdf(g: &[f64], bin_width: f64, fname: impl AsRef<Path>) -> Result<(), FileIoError> {
    let fname = fname.as_ref();
    write_rdf(g, bin_width, fname).map_err(|e| FileIoError::new(fname, e))
}

fn write_rdf(g: &[f64], bin_width: f64, fname: &Path) -> Result<(), RdfHandlerError> {
    let mut buf = BufWriter::new(File::create(fname).map_err(RdfHandlerError::OpenWrite)?);
    writeln!(buf, "#r\tg(r)")?;
    for (i, v) in g.iter().enumerate() {
        writeln!(buf, "{}\t{}", i as f64 * bin_width, v)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_bins() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join("colar_g.rdf");
        save_rdf(&[0.0, 0.5, 1.25], 0.1, &path)?;
        let text = std::fs::read_to_string(&path)?;
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("#r\tg(r)"));
        assert_eq!(lines.next(), Some("0\t0"));
        assert!(lines.next().unwrap().starts_with("0.1"));
        Ok(())
    }
}
