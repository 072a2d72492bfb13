//! Subcommand implementations.

pub(crate) mod algorithms;
pub(crate) mod digest;
pub(crate) mod kdf;
pub(crate) mod keys;
pub(crate) mod rand;

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context as _, Result};
use veil_config::{Config, Encoding};
use veil_core::CryptoResult;

/// Read size when streaming input into a primitive.
const CHUNK_SIZE: usize = 64 * 1024;

/// Settings every command sees.
pub(crate) struct Context {
    /// Loaded configuration.
    pub(crate) config: Config,
    /// Output encoding after applying `--encoding`.
    pub(crate) encoding: Encoding,
}

/// Feed `file`, or stdin when `None`, to `sink` in chunks.
pub(crate) fn stream_input(
    file: Option<&Path>,
    mut sink: impl FnMut(&[u8]) -> CryptoResult<()>,
) -> Result<()> {
    let mut reader: Box<dyn Read> = match file {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("cannot open {}", path.display()))?,
        ),
        None => Box::new(io::stdin().lock()),
    };
    let mut buf = vec![0_u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf).context("failed to read input")?;
        let Some(chunk) = buf.get(..n) else {
            break;
        };
        if chunk.is_empty() {
            break;
        }
        sink(chunk)?;
    }
    Ok(())
}

/// Read all of `file`, or stdin when `None`.
pub(crate) fn read_input(file: Option<&Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) => read_file(path),
        None => {
            let mut data = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut data)
                .context("failed to read stdin")?;
            Ok(data)
        },
    }
}

/// Read a whole file.
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_input_chunks_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.bin");
        let data: Vec<u8> = (0..=255_u8)
            .cycle()
            .take(CHUNK_SIZE.saturating_mul(2).saturating_add(7))
            .collect();
        std::fs::write(&path, &data).unwrap();

        let mut seen = Vec::new();
        let mut calls = 0_usize;
        stream_input(Some(path.as_path()), |chunk| {
            calls = calls.saturating_add(1);
            seen.extend_from_slice(chunk);
            Ok(())
        })
        .unwrap();

        assert_eq!(seen, data);
        assert!(calls >= 3);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = stream_input(Some(Path::new("/nonexistent/veil")), |_| Ok(())).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/veil"));
    }
}
