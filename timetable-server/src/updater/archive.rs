//! Unpacking of the downloaded feed archive into the data directory.

use std::fs::File;
use std::path::Path;

use tracing::{debug, info};

use super::error::UpdateError;

/// Largest total uncompressed size accepted (2 GB).
const MAX_DECOMPRESSED_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Extract every file of the archive at `zip_path` into `dest_dir`,
/// overwriting existing files. Returns the number of files written.
///
/// Entries with absolute paths or `..` components are rejected before
/// anything is written. Blocking; run on a blocking thread.
pub fn extract_archive(zip_path: &Path, dest_dir: &Path) -> Result<usize, UpdateError> {
    let file = File::open(zip_path).map_err(|source| UpdateError::Io {
        path: zip_path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut total: u64 = 0;
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if entry.enclosed_name().is_none() {
            return Err(UpdateError::UnsafeEntry {
                name: entry.name().to_string(),
            });
        }
        total = total.saturating_add(entry.size());
    }
    if total > MAX_DECOMPRESSED_BYTES {
        return Err(UpdateError::TooLarge {
            limit: MAX_DECOMPRESSED_BYTES,
        });
    }

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(UpdateError::UnsafeEntry {
                name: entry.name().to_string(),
            });
        };
        let out_path = dest_dir.join(relative);
        let io_err = |source| UpdateError::Io {
            path: out_path.clone(),
            source,
        };

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(io_err)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut out = File::create(&out_path).map_err(io_err)?;
        std::io::copy(&mut entry, &mut out).map_err(io_err)?;
        debug!(file = %out_path.display(), "Extracted feed file");
        written += 1;
    }

    info!(files = written, dir = %dest_dir.display(), "Unpacked feed archive");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, contents) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn extracts_files() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("feed.zip");
        let out = dir.path().join("gtfs");
        std::fs::create_dir_all(&out).unwrap();
        write_zip(
            &zip_path,
            &[
                ("stops.txt", "stop_id,stop_name\n"),
                ("nested/metadata.xml", "<Metadata/>"),
            ],
        );

        let count = extract_archive(&zip_path, &out).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            std::fs::read_to_string(out.join("stops.txt")).unwrap(),
            "stop_id,stop_name\n"
        );
        assert!(out.join("nested").join("metadata.xml").exists());
    }

    #[test]
    fn overwrites_existing_files() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("feed.zip");
        std::fs::write(dir.path().join("stops.txt"), "old").unwrap();
        write_zip(&zip_path, &[("stops.txt", "new")]);

        extract_archive(&zip_path, dir.path()).unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join("stops.txt")).unwrap(), "new");
    }

    #[test]
    fn rejects_parent_traversal_before_writing() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("feed.zip");
        let out = dir.path().join("gtfs");
        std::fs::create_dir_all(&out).unwrap();
        write_zip(&zip_path, &[("stops.txt", "a"), ("../escaped.txt", "b")]);

        let result = extract_archive(&zip_path, &out);

        assert!(matches!(result, Err(UpdateError::UnsafeEntry { .. })));
        assert!(!out.join("stops.txt").exists());
        assert!(!dir.path().join("escaped.txt").exists());
    }

    #[test]
    fn not_a_zip() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("feed.zip");
        std::fs::write(&zip_path, "plain text").unwrap();

        assert!(matches!(
            extract_archive(&zip_path, dir.path()),
            Err(UpdateError::Zip(_))
        ));
    }
}
