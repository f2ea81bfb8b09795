//! Input discovery and source id assignment
//!
//! An input is either one file or a directory of `*.bin` files. A file whose
//! stem is a number in `0..=255` keeps that number as its source id, so
//! `3.bin` decodes back to `3.bin`. Every other file takes the lowest id not
//! claimed that way, in path order.

use anyhow::{bail, Context, Result};
use qrcast_core::{SourceStream, TransportError};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// One input file and the source id it travels under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Source id
    pub source_id: u8,
    /// File path
    pub path: PathBuf,
}

/// Source id a file name asks for, if any
pub fn requested_id(path: &Path) -> Option<u8> {
    path.file_stem()?.to_str()?.parse::<u8>().ok()
}

/// Assign source ids to `paths`, preserving their order
pub fn assign_source_ids(paths: &[PathBuf]) -> Result<Vec<InputFile>, TransportError> {
    if paths.len() > 256 {
        return Err(TransportError::TooManySources(paths.len()));
    }

    let mut claimed = BTreeSet::new();
    for id in paths.iter().filter_map(|p| requested_id(p)) {
        if !claimed.insert(id) {
            return Err(TransportError::DuplicateSource(id));
        }
    }

    let mut free = (0..=u8::MAX).filter(|id| !claimed.contains(id));
    paths
        .iter()
        .map(|path| {
            let source_id = match requested_id(path) {
                Some(id) => id,
                None => free
                    .next()
                    .ok_or(TransportError::TooManySources(paths.len()))?,
            };
            Ok(InputFile {
                source_id,
                path: path.clone(),
            })
        })
        .collect()
}

/// Resolve `input` into the files to send
pub fn discover(input: &Path) -> Result<Vec<InputFile>> {
    if input.is_file() {
        return Ok(assign_source_ids(&[input.to_path_buf()])?);
    }
    if !input.is_dir() {
        bail!("Input not found: {}", input.display());
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(input)
        .with_context(|| format!("Failed to read input directory: {}", input.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "bin") {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        bail!("No .bin files in {}", input.display());
    }

    Ok(assign_source_ids(&paths)?)
}

/// Read every input into a source stream
pub fn load(inputs: &[InputFile]) -> Result<Vec<SourceStream>> {
    inputs
        .iter()
        .map(|input| {
            let data = fs::read(&input.path)
                .with_context(|| format!("Failed to read input file: {}", input.path.display()))?;
            info!(
                "Source {}: {} ({} bytes)",
                input.source_id,
                input.path.display(),
                data.len()
            );
            Ok(SourceStream::new(input.source_id, data))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    fn ids(files: &[InputFile]) -> Vec<u8> {
        files.iter().map(|f| f.source_id).collect()
    }

    #[test]
    fn test_numeric_stems_keep_their_id() {
        let files = assign_source_ids(&paths(&["dir/0.bin", "dir/7.bin", "dir/255.bin"])).unwrap();
        assert_eq!(ids(&files), vec![0, 7, 255]);
    }

    #[test]
    fn test_other_names_take_lowest_free_ids() {
        let files = assign_source_ids(&paths(&["a.bin", "0.bin", "b.bin", "2.bin"])).unwrap();
        assert_eq!(ids(&files), vec![1, 0, 3, 2]);
    }

    #[test]
    fn test_out_of_range_stem_is_not_an_id() {
        assert_eq!(requested_id(Path::new("256.bin")), None);
        assert_eq!(requested_id(Path::new("-1.bin")), None);
        assert_eq!(requested_id(Path::new("12.bin")), Some(12));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = assign_source_ids(&paths(&["x/5.bin", "y/5.bin"])).unwrap_err();
        assert!(matches!(err, TransportError::DuplicateSource(5)));
    }

    #[test]
    fn test_too_many_sources() {
        let many: Vec<PathBuf> = (0..257).map(|i| PathBuf::from(format!("f{}.bin", i))).collect();
        assert!(matches!(
            assign_source_ids(&many),
            Err(TransportError::TooManySources(257))
        ));
    }

    #[test]
    fn test_discover_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1.bin"), b"one").unwrap();
        fs::write(dir.path().join("notes.txt"), b"skip").unwrap();
        fs::write(dir.path().join("data.bin"), b"data").unwrap();

        let files = discover(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].source_id, 1);
        assert!(files[0].path.ends_with("1.bin"));
        assert_eq!(files[1].source_id, 0);
        assert!(files[1].path.ends_with("data.bin"));

        let sources = load(&files).unwrap();
        assert_eq!(sources[0].data.as_ref(), b"one");
    }

    #[test]
    fn test_discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.dat");
        fs::write(&path, b"x").unwrap();

        let files = discover(&path).unwrap();
        assert_eq!(ids(&files), vec![0]);
    }

    #[test]
    fn test_discover_missing_input() {
        assert!(discover(Path::new("/definitely/not/here")).is_err());
    }
}
