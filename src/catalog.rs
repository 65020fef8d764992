//! Sequence catalog loader.
//!
//! The loader turns a line-oriented manifest plus two camera roots into an
//! ordered `SequenceCatalog`. It is responsible for:
//! - Assigning contiguous indices to non-blank lines, in file order
//! - Deriving both camera paths from the shared frame identifier
//! - Normalizing nanosecond timestamps to seconds
//!
//! The loader MUST NOT:
//! - Open or probe image files
//! - Re-sort records (manifests are assumed sorted by capture time)
//! - Return an empty catalog for a manifest it could not read

use anyhow::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::ReplayError;

/// Default image extension appended to each frame identifier.
pub const DEFAULT_IMAGE_EXTENSION: &str = "png";

const NANOS_PER_SECOND: f64 = 1e9;

/// One synchronized stereo entry.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRecord {
    /// Position in the sequence. Defines processing order.
    pub index: usize,
    /// Leading token of the manifest line, used verbatim in both paths.
    pub identifier: String,
    pub left_path: PathBuf,
    pub right_path: PathBuf,
    /// Capture time in seconds.
    pub timestamp: f64,
}

/// Ordered, immutable collection of frame records.
///
/// Left paths, right paths and timestamps are all views over the same record
/// list, so they cannot drift out of alignment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SequenceCatalog {
    records: Vec<FrameRecord>,
}

impl SequenceCatalog {
    /// Load a manifest, deriving `<root>/<identifier>.png` for each camera.
    pub fn load(
        manifest: impl AsRef<Path>,
        left_root: impl AsRef<Path>,
        right_root: impl AsRef<Path>,
    ) -> Result<Self> {
        Self::load_with_extension(manifest, left_root, right_root, DEFAULT_IMAGE_EXTENSION)
    }

    pub fn load_with_extension(
        manifest: impl AsRef<Path>,
        left_root: impl AsRef<Path>,
        right_root: impl AsRef<Path>,
        extension: &str,
    ) -> Result<Self> {
        let manifest = manifest.as_ref();
        log::info!("loading sequence manifest {}", manifest.display());
        let file = File::open(manifest).map_err(|source| ReplayError::ManifestIo {
            path: manifest.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_reader(
            BufReader::new(file),
            left_root.as_ref(),
            right_root.as_ref(),
            extension,
        )
        .map_err(|err| match err.downcast::<std::io::Error>() {
            Ok(source) => anyhow::Error::from(ReplayError::ManifestIo {
                path: manifest.to_path_buf(),
                source,
            }),
            Err(err) => err,
        })?;
        log::info!(
            "loaded {} frames spanning {:.3}s",
            catalog.len(),
            catalog.duration()
        );
        Ok(catalog)
    }

    /// Parse a manifest from any buffered reader.
    ///
    /// Reads until end of stream; a trailing newline never yields an extra
    /// record.
    pub fn from_reader<R: BufRead>(
        reader: R,
        left_root: &Path,
        right_root: &Path,
        extension: &str,
    ) -> Result<Self> {
        let mut records = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let Some(identifier) = line.split_whitespace().next() else {
                continue;
            };
            let raw_ns = first_number(&line).ok_or_else(|| ReplayError::ManifestParse {
                line: line_no + 1,
                content: line.clone(),
            })?;
            let file_name = format!("{}.{}", identifier, extension);
            records.push(FrameRecord {
                index: records.len(),
                identifier: identifier.to_string(),
                left_path: left_root.join(&file_name),
                right_path: right_root.join(&file_name),
                timestamp: raw_ns / NANOS_PER_SECOND,
            });
        }
        Ok(Self { records })
    }

    /// Build a catalog from existing records, reassigning indices `0..len`.
    pub fn from_records(records: Vec<FrameRecord>) -> Self {
        let records = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| FrameRecord { index, ..record })
            .collect();
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FrameRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[FrameRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrameRecord> {
        self.records.iter()
    }

    pub fn left_paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.records.iter().map(|r| r.left_path.as_path())
    }

    pub fn right_paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.records.iter().map(|r| r.right_path.as_path())
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.timestamp).collect()
    }

    /// Seconds between the first and last capture; zero for fewer than two frames.
    pub fn duration(&self) -> f64 {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).max(0.0),
            _ => 0.0,
        }
    }
}

impl<'a> IntoIterator for &'a SequenceCatalog {
    type Item = &'a FrameRecord;
    type IntoIter = std::slice::Iter<'a, FrameRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// First whitespace-delimited token that parses as a finite number.
fn first_number(line: &str) -> Option<f64> {
    line.split_whitespace()
        .filter_map(|token| token.parse::<f64>().ok())
        .find(|value| value.is_finite())
}
