//! Archive extraction module
//!
//! Handles the two release formats: tar.gz and zip.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::ZipArchive;

/// Archive extraction failed.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Filesystem error while unpacking.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// File extension is neither `.tar.gz` nor `.zip`.
    #[error("Unsupported archive format: {0}")]
    UnsupportedFormat(String),

    /// Archive is corrupt or has an unsafe entry path.
    #[error("Archive error: {0}")]
    Archive(String),
}

/// Unpacks a downloaded archive into a directory.
pub trait ArchiveExtractor: Send + Sync {
    /// Extract `archive` into `dest_dir`, returning the paths of extracted files.
    fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, ExtractError>;
}

/// [`ArchiveExtractor`] using the `tar`, `flate2` and `zip` crates in-process.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeExtractor;

impl ArchiveExtractor for NativeExtractor {
    fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
        let name = archive
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        tracing::debug!(archive = %archive.display(), dest = %dest_dir.display(), "extracting");
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            extract_tar_gz(archive, dest_dir)
        } else if name.ends_with(".zip") {
            extract_zip(archive, dest_dir)
        } else {
            Err(ExtractError::UnsupportedFormat(name))
        }
    }
}

/// Extract a tar.gz archive to a destination directory
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let file = File::open(archive_path)?;
    let reader = BufReader::new(file);
    let gz_decoder = flate2::read::GzDecoder::new(reader);

    extract_tar(gz_decoder, dest_dir)
}

/// Extract a tar archive from a reader
fn extract_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    fs::create_dir_all(dest_dir)?;

    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    let mut extracted = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.header().entry_type().is_dir() {
            continue;
        }

        let relative_path: PathBuf = entry.path()?.components().collect();
        let absolute_path = dest_dir.join(&relative_path);

        // Sanitize path to prevent Zip Slip
        if !entry.unpack_in(dest_dir)? {
            return Err(ExtractError::Archive(format!(
                "Invalid path in archive: {}",
                relative_path.display()
            )));
        }

        extracted.push(absolute_path);
    }

    Ok(extracted)
}

/// Extract a zip archive
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| ExtractError::Archive(e.to_string()))?;

    fs::create_dir_all(dest_dir)?;
    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| ExtractError::Archive(e.to_string()))?;
        let Some(relative_path) = file.enclosed_name() else {
            continue;
        };

        if file.is_dir() {
            fs::create_dir_all(dest_dir.join(&relative_path))?;
            continue;
        }

        let absolute_path = dest_dir.join(&relative_path);
        if let Some(p) = absolute_path.parent() {
            fs::create_dir_all(p)?;
        }

        let mut outfile = File::create(&absolute_path)?;
        io::copy(&mut file, &mut outfile)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode))?;
            }
        }

        extracted.push(absolute_path);
    }

    Ok(extracted)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    /// In-memory tar.gz with every entry marked executable.
    pub(crate) fn tar_gz_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn write_tar_gz(path: &Path, files: &[(&str, &[u8])]) {
        fs::write(path, tar_gz_bytes(files)).unwrap();
    }

    #[test]
    fn extracts_tar_gz_with_modes() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("foundry_v1.0.0_linux_amd64.tar.gz");
        write_tar_gz(&archive, &[("forge", b"forge-bin"), ("cast", b"cast-bin")]);

        let dest = dir.path().join("out");
        let files = NativeExtractor.extract(&archive, &dest).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(fs::read(dest.join("forge")).unwrap(), b"forge-bin");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(dest.join("cast")).unwrap().permissions().mode();
            assert_ne!(mode & 0o111, 0);
        }
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("foundry.rar");
        fs::write(&archive, b"").unwrap();
        let err = NativeExtractor.extract(&archive, dir.path()).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }

    #[test]
    fn corrupt_tarball_fails() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.tar.gz");
        fs::write(&archive, b"definitely not gzip").unwrap();
        assert!(NativeExtractor.extract(&archive, &dir.path().join("out")).is_err());
    }
}
