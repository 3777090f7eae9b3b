//! ZIP archive extraction for uploaded H5P packages.
//!
//! Every entry is written under the destination directory with its relative
//! path preserved. Entries whose path would resolve outside the destination
//! (absolute names, `..` escaping the root) fail the whole extraction.
//!
//! While extracting, the extractor records every file entry named
//! [`MANIFEST_FILE_NAME`] regardless of nesting depth. Whether a missing
//! manifest is an error is up to the caller.
//!
//! Extraction is synchronous. Call it from `tokio::task::spawn_blocking` when
//! running on the async runtime. Partial output is never rolled back.

use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

/// File name marking an archive as a valid H5P package.
pub const MANIFEST_FILE_NAME: &str = "content.json";

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("failed to write archive entry: {0}")]
    Io(#[from] io::Error),

    #[error("archive could not be read: {0}")]
    Zip(#[from] ZipError),

    #[error("archive entry escapes extraction directory: {0}")]
    UnsafeEntry(String),
}

impl ArchiveError {
    /// Whether the failure lies in the uploaded archive rather than the server.
    pub fn is_invalid_archive(&self) -> bool {
        matches!(self, Self::Zip(_) | Self::UnsafeEntry(_))
    }
}

/// Outcome of a successful extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedArchive {
    /// Relative paths of every file written, in archive order.
    pub files: Vec<PathBuf>,
    /// Relative path of the shallowest manifest, first in archive order on ties.
    pub manifest: Option<PathBuf>,
}

impl ExtractedArchive {
    pub fn manifest_found(&self) -> bool {
        self.manifest.is_some()
    }

    fn record_manifest(&mut self, candidate: &Path) {
        let depth = candidate.components().count();
        let shallower = self
            .manifest
            .as_ref()
            .is_none_or(|current| depth < current.components().count());

        if shallower {
            self.manifest = Some(candidate.to_path_buf());
        }
    }
}

fn is_manifest(relative: &Path) -> bool {
    relative
        .file_name()
        .is_some_and(|name| name == MANIFEST_FILE_NAME)
}

/// Drops `.` segments and resolves inner `..` segments. Only called on paths
/// already checked not to escape their root.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(segment) => normalized.push(segment),
            Component::ParentDir => {
                normalized.pop();
            }
            _ => {}
        }
    }
    normalized
}

/// Extracts every entry of `reader` under `destination`, creating it if absent.
pub fn extract_archive<R>(reader: R, destination: &Path) -> Result<ExtractedArchive, ArchiveError>
where
    R: Read + Seek,
{
    fs::create_dir_all(destination)?;

    let mut archive = ZipArchive::new(reader)?;
    let mut extracted = ExtractedArchive::default();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;

        let relative = entry
            .enclosed_name()
            .map(|path| normalize(&path))
            .ok_or_else(|| ArchiveError::UnsafeEntry(entry.name().to_string()))?;

        let output_path = destination.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&output_path)?;
            continue;
        }

        if relative.as_os_str().is_empty() {
            return Err(ArchiveError::UnsafeEntry(entry.name().to_string()));
        }

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut outfile = File::create(&output_path)?;
        io::copy(&mut entry, &mut outfile)?;

        if is_manifest(&relative) {
            extracted.record_manifest(&relative);
        }
        extracted.files.push(relative);
    }

    debug!(
        destination = %destination.display(),
        files = extracted.files.len(),
        manifest_found = extracted.manifest_found(),
        "Archive extracted"
    );

    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::FileOptions;

    fn build_archive(entries: &[(&str, &[u8])]) -> Cursor<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();

        for (name, content) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content).unwrap();
            }
        }

        let mut cursor = writer.finish().unwrap();
        cursor.set_position(0);
        cursor
    }

    #[test]
    fn test_extracts_entries_and_finds_root_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("upload");
        let archive = build_archive(&[
            ("content.json", b"{\"title\":\"quiz\"}"),
            ("images/", b""),
            ("images/cat.png", b"png-bytes"),
        ]);

        let extracted = extract_archive(archive, &dest).unwrap();

        assert!(extracted.manifest_found());
        assert_eq!(extracted.manifest, Some(PathBuf::from("content.json")));
        assert_eq!(
            fs::read_to_string(dest.join("content.json")).unwrap(),
            "{\"title\":\"quiz\"}"
        );
        assert_eq!(fs::read(dest.join("images/cat.png")).unwrap(), b"png-bytes");
        assert_eq!(extracted.files.len(), 2);
    }

    #[test]
    fn test_finds_nested_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = build_archive(&[
            ("h5p.json", b"{}"),
            ("content/content.json", b"{}"),
        ]);

        let extracted = extract_archive(archive, tmp.path()).unwrap();

        assert_eq!(
            extracted.manifest,
            Some(PathBuf::from("content").join("content.json"))
        );
        assert!(tmp.path().join("content/content.json").is_file());
    }

    #[test]
    fn test_prefers_shallowest_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = build_archive(&[
            ("a/b/content.json", b"deep"),
            ("a/content.json", b"shallow"),
            ("c/content.json", b"tie"),
        ]);

        let extracted = extract_archive(archive, tmp.path()).unwrap();

        assert_eq!(extracted.manifest, Some(PathBuf::from("a").join("content.json")));
    }

    #[test]
    fn test_missing_manifest_still_writes_files() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = build_archive(&[("h5p.json", b"{}"), ("readme.txt", b"hello")]);

        let extracted = extract_archive(archive, tmp.path()).unwrap();

        assert!(!extracted.manifest_found());
        assert!(tmp.path().join("readme.txt").is_file());
    }

    #[test]
    fn test_directory_named_like_manifest_is_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = build_archive(&[("content.json/", b""), ("content.json/x.txt", b"x")]);

        let extracted = extract_archive(archive, tmp.path()).unwrap();

        assert!(!extracted.manifest_found());
    }

    #[test]
    fn test_rejects_parent_traversal() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("dest");
        let archive = build_archive(&[("../evil.txt", b"owned")]);

        let err = extract_archive(archive, &dest).unwrap_err();

        assert!(matches!(err, ArchiveError::UnsafeEntry(ref name) if name == "../evil.txt"));
        assert!(err.is_invalid_archive());
        assert!(!tmp.path().join("evil.txt").exists());
    }

    #[test]
    fn test_rejects_absolute_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = build_archive(&[("/etc/evil.txt", b"owned")]);

        let err = extract_archive(archive, tmp.path()).unwrap_err();

        assert!(matches!(err, ArchiveError::UnsafeEntry(_)));
    }

    #[test]
    fn test_normalizes_inner_parent_segments_that_stay_inside() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = build_archive(&[("a/../content.json", b"{}")]);

        let extracted = extract_archive(archive, tmp.path()).unwrap();

        assert_eq!(extracted.manifest, Some(PathBuf::from("content.json")));
        assert!(tmp.path().join("content.json").is_file());
    }

    #[test]
    fn test_rejects_non_zip_input() {
        let tmp = tempfile::tempdir().unwrap();

        let err = extract_archive(Cursor::new(b"definitely not a zip".to_vec()), tmp.path())
            .unwrap_err();

        assert!(matches!(err, ArchiveError::Zip(_)));
        assert!(err.is_invalid_archive());
    }
}
