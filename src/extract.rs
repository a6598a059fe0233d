// Extraction stage: explode downloaded archives and collect their class files

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use log::{info, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::constants;
use crate::error::{ArchiveError, Error, Result};

/// Unpack `archive` into `destination`, then any nested `classes.jar` into
/// `destination/classes/`, and return every class file found under
/// `destination`.
///
/// The archive (and the nested one) is deleted once its entries are copied.
/// Files already present in `destination` are overwritten.
pub fn explode_archive(archive: &Path, destination: &Path) -> Result<Vec<PathBuf>> {
    explode(archive, destination).map_err(|source| Error::Extraction {
        archive: archive.to_path_buf(),
        source,
    })
}

fn explode(archive: &Path, destination: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    info!("Unzipping {}", archive.display());
    unpack(archive, destination)?;
    fs::remove_file(archive)?;

    let nested = destination.join(constants::NESTED_ARCHIVE);
    if nested.is_file() {
        info!("Unzipping {}", nested.display());
        unpack(&nested, &destination.join(constants::NESTED_ARCHIVE_DIR))?;
        fs::remove_file(&nested)?;
    }

    class_files(destination)
}

/// Copy every entry of `archive` below `destination`, keeping relative paths.
fn unpack(archive: &Path, destination: &Path) -> Result<usize, ArchiveError> {
    let mut zip = ZipArchive::new(BufReader::new(File::open(archive)?))?;
    fs::create_dir_all(destination)?;

    let mut copied = 0;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!(
                "Skipping entry '{}' of {}: path escapes the output directory",
                entry.name(),
                archive.display()
            );
            continue;
        };

        let target = destination.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut output = File::create(&target)?;
        io::copy(&mut entry, &mut output)?;
        copied += 1;
    }

    Ok(copied)
}

/// Every `.class` file below `root`, as full paths in sorted order.
pub fn class_files(root: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let mut classes = Vec::new();
    for relative in TreeWalk::new(root).files() {
        let relative = relative?;
        if relative
            .extension()
            .is_some_and(|ext| ext == constants::CLASS_EXTENSION)
        {
            classes.push(root.join(relative));
        }
    }
    classes.sort();
    Ok(classes)
}

/// Lazy walk over the regular files of a directory tree.
///
/// Paths are yielded relative to the root. Each call to [`TreeWalk::files`]
/// starts a fresh walk, so the same tree can be traversed again after it
/// changed.
#[derive(Debug, Clone)]
pub struct TreeWalk {
    root: PathBuf,
}

impl TreeWalk {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn files(&self) -> impl Iterator<Item = Result<PathBuf, walkdir::Error>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    Some(Ok(self.relative(entry.into_path())))
                }
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
    }

    fn relative(&self, path: PathBuf) -> PathBuf {
        match path.strip_prefix(&self.root) {
            Ok(relative) => relative.components().collect(),
            Err(_) => path,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::{Cursor, Write};
    use zip::CompressionMethod;
    use zip::write::{FileOptions, ZipWriter};

    /// In-memory archive holding `entries` uncompressed.
    pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::<()>::default().compression_method(CompressionMethod::Stored);
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::zip_bytes;
    use super::*;
    use tempfile::TempDir;

    fn write_archive(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, zip_bytes(entries)).unwrap();
        path
    }

    #[test]
    fn test_explode_with_nested_classes_jar() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path();

        let classes_jar = zip_bytes(&[
            ("com/example/Foo.class", b"foo".as_slice()),
            ("com/example/Bar.class", b"bar".as_slice()),
        ]);
        let archive = write_archive(
            out,
            "lib-1.0.aar",
            &[
                ("AndroidManifest.xml", b"<manifest/>".as_slice()),
                ("res/values/values.xml", b"<resources/>".as_slice()),
                ("classes.jar", classes_jar.as_slice()),
            ],
        );

        let classes = explode_archive(&archive, out).unwrap();

        assert!(!archive.exists(), "archive should be deleted");
        assert!(!out.join("classes.jar").exists(), "nested archive should be deleted");
        assert!(out.join("AndroidManifest.xml").is_file());
        assert!(out.join("res/values/values.xml").is_file());
        assert_eq!(
            classes,
            vec![
                out.join("classes/com/example/Bar.class"),
                out.join("classes/com/example/Foo.class"),
            ]
        );
        assert_eq!(fs::read(&classes[1]).unwrap(), b"foo");
    }

    #[test]
    fn test_explode_without_nested_archive() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path();
        let archive = write_archive(
            out,
            "lib-1.0.jar",
            &[
                ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n".as_slice()),
                ("com/example/Foo.class", b"foo".as_slice()),
            ],
        );

        let classes = explode_archive(&archive, out).unwrap();

        assert_eq!(classes, vec![out.join("com/example/Foo.class")]);
        assert!(!out.join("classes").exists());
        assert!(!archive.exists());
    }

    #[test]
    fn test_invalid_archive_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("broken-1.0.jar");
        fs::write(&archive, b"not a zip").unwrap();

        let err = explode_archive(&archive, temp_dir.path()).unwrap_err();
        match err {
            Error::Extraction { archive: path, .. } => assert_eq!(path, archive),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(archive.exists(), "a failed archive is left in place");
    }

    #[test]
    fn test_tree_walk_is_relative_and_restartable() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/b/C.class"), b"").unwrap();
        fs::write(root.join("top.txt"), b"").unwrap();

        let walk = TreeWalk::new(root);
        let mut first: Vec<PathBuf> = walk.files().map(|p| p.unwrap()).collect();
        first.sort();
        assert_eq!(first, vec![PathBuf::from("a/b/C.class"), PathBuf::from("top.txt")]);

        fs::write(root.join("a/D.class"), b"").unwrap();
        assert_eq!(walk.files().count(), 3);
        assert_eq!(class_files(root).unwrap().len(), 2);
    }
}
