//! Packs a local directory into an in-memory zip for folder ingestion.
//!
//! Entries are stored under the directory's own name (`docs/guide.md`,
//! `docs/api/index.md`), the same layout a desktop "compress folder" action
//! produces, so the backend's folder tree starts at that name. Files are
//! deflated and visited in file-name order so the same directory always packs
//! to the same entry order.
//!
//! Nothing is filtered by type. Version-control metadata is skipped, and the
//! caller may add `--exclude` globs matched against the path relative to the
//! directory. An excluded directory is not descended into.
//!
//! The archive never grows past the folder upload limit: packing stops with
//! [`ValidationError::ArchiveTooLarge`] as soon as the next write would cross
//! it.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rag_console_core::messages::MAX_FOLDER_ZIP_BYTES;
use rag_console_core::ValidationError;
use std::cell::Cell;
use std::fs::File;
use std::io::{self, Cursor, Seek, SeekFrom, Write};
use std::path::Path;
use std::rc::Rc;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const DEFAULT_EXCLUDES: &[&str] = &["**/.git"];

/// A packed directory.
#[derive(Debug)]
pub struct PackedDirectory {
    /// `<directory name>.zip`.
    pub archive_name: String,
    pub bytes: Vec<u8>,
    pub files: usize,
}

/// Zip `root` into memory, refusing to exceed the folder upload limit.
pub fn pack_directory(root: &Path, excludes: &[String]) -> Result<PackedDirectory> {
    pack_directory_within(root, excludes, MAX_FOLDER_ZIP_BYTES)
}

/// Zip `root` into memory, stopping once the archive would pass `limit` bytes.
pub fn pack_directory_within(
    root: &Path,
    excludes: &[String],
    limit: u64,
) -> Result<PackedDirectory> {
    if !root.is_dir() {
        bail!("Not a directory: {}", root.display());
    }
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", root.display()))?;
    let prefix = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "folder".to_string());

    let mut patterns: Vec<String> = DEFAULT_EXCLUDES.iter().map(|p| p.to_string()).collect();
    patterns.extend(excludes.iter().cloned());
    let exclude_set = build_globset(&patterns)?;

    let sink = CappedBuffer::new(limit);
    let overflow = sink.overflow.clone();
    let mut zip = ZipWriter::new(sink);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let walker = WalkDir::new(&root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !exclude_set.is_match(relative_name(&root, e.path())));
    let finished = add_entries(&mut zip, walker, &root, &prefix, options)
        .and_then(|files| Ok((files, zip.finish()?)));

    if let Some(size) = overflow.get() {
        debug!(root = %root.display(), size, limit, "packing stopped at the size limit");
        return Err(ValidationError::ArchiveTooLarge { size }.into());
    }
    let (files, sink) = finished?;
    let bytes = sink.into_inner();
    debug!(root = %root.display(), files, bytes = bytes.len(), "packed directory");

    Ok(PackedDirectory {
        archive_name: format!("{}.zip", prefix),
        bytes,
        files,
    })
}

fn add_entries(
    zip: &mut ZipWriter<CappedBuffer>,
    entries: impl Iterator<Item = walkdir::Result<DirEntry>>,
    root: &Path,
    prefix: &str,
    options: SimpleFileOptions,
) -> Result<usize> {
    let mut files = 0;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let name = format!("{}/{}", prefix, relative_name(root, path));
        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else if entry.file_type().is_file() {
            let mut file =
                File::open(path).with_context(|| format!("Failed to read {}", path.display()))?;
            zip.start_file(name, options)?;
            io::copy(&mut file, zip)?;
            files += 1;
        }
    }
    Ok(files)
}

/// `path` relative to `root`, `/`-separated.
fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Zip sink that fails any write that would take it past `limit` bytes and
/// remembers the size that write would have reached.
struct CappedBuffer {
    inner: Cursor<Vec<u8>>,
    limit: u64,
    overflow: Rc<Cell<Option<u64>>>,
}

impl CappedBuffer {
    fn new(limit: u64) -> Self {
        Self {
            inner: Cursor::new(Vec::new()),
            limit,
            overflow: Rc::new(Cell::new(None)),
        }
    }

    fn into_inner(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

impl Write for CappedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let end = self.inner.position() + buf.len() as u64;
        if end > self.limit {
            self.overflow.set(Some(end));
            return Err(io::Error::other(format!(
                "archive would exceed {} bytes",
                self.limit
            )));
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for CappedBuffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    fn sample_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("notes");
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join("readme.md"), "# Notes").unwrap();
        std::fs::write(root.join("src/a.py"), "print('a')").unwrap();
        std::fs::write(root.join("src/b.log"), "log line").unwrap();
        std::fs::write(root.join(".git/HEAD"), "ref").unwrap();
        dir
    }

    #[test]
    fn packs_under_directory_name() {
        let dir = sample_tree();
        let packed = pack_directory(&dir.path().join("notes"), &[]).unwrap();
        assert_eq!(packed.archive_name, "notes.zip");
        assert_eq!(packed.files, 3);

        let mut names = entry_names(&packed.bytes);
        names.sort();
        assert!(names.contains(&"notes/readme.md".to_string()));
        assert!(names.contains(&"notes/src/a.py".to_string()));
        assert!(names.contains(&"notes/src/b.log".to_string()));
        assert!(!names.iter().any(|n| n.contains(".git")));

        let mut archive = zip::ZipArchive::new(Cursor::new(&packed.bytes[..])).unwrap();
        let mut body = String::new();
        archive
            .by_name("notes/src/a.py")
            .unwrap()
            .read_to_string(&mut body)
            .unwrap();
        assert_eq!(body, "print('a')");
    }

    #[test]
    fn honours_user_excludes() {
        let dir = sample_tree();
        let packed = pack_directory(&dir.path().join("notes"), &["**/*.log".to_string()]).unwrap();
        assert_eq!(packed.files, 2);
        assert!(!entry_names(&packed.bytes).iter().any(|n| n.ends_with(".log")));
    }

    #[test]
    fn excluded_directories_are_pruned() {
        let dir = sample_tree();
        let root = dir.path().join("notes");
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::write(root.join("node_modules/pkg/index.js"), "x").unwrap();
        let packed = pack_directory(&root, &["**/node_modules".to_string()]).unwrap();
        assert_eq!(packed.files, 3);
        assert!(!entry_names(&packed.bytes)
            .iter()
            .any(|n| n.contains("node_modules") || n.contains(".git")));
    }

    #[test]
    fn stops_once_the_limit_is_passed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("media");
        std::fs::create_dir_all(&root).unwrap();
        // Pseudo-random bytes so deflate cannot shrink them under the limit.
        let mut state = 0x2545_f491_u32;
        let noise: Vec<u8> = (0..64 * 1024)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect();
        std::fs::write(root.join("a.bin"), &noise).unwrap();
        std::fs::write(root.join("b.bin"), &noise).unwrap();

        let err = pack_directory_within(&root, &[], 16 * 1024).unwrap_err();
        match err.downcast_ref::<ValidationError>() {
            Some(ValidationError::ArchiveTooLarge { size }) => assert!(*size > 16 * 1024),
            other => panic!("expected size limit failure, got {:?}", other),
        }

        let packed = pack_directory_within(&root, &[], 1024 * 1024).unwrap();
        assert_eq!(packed.files, 2);
        assert!(packed.bytes.len() as u64 > 64 * 1024);
    }

    #[test]
    fn rejects_non_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(pack_directory(&file, &[]).is_err());
    }

    #[test]
    fn rejects_bad_glob() {
        let dir = sample_tree();
        let err = pack_directory(&dir.path().join("notes"), &["[".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Invalid glob"));
    }
}
