//! Where buffer bytes come from.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Soft ceiling on documents and buffers read from disk (1 GiB).
pub const DEFAULT_SOFT_LIMIT: u64 = 1 << 30;

/// Looks up a buffer URI in an ordered list of directories.
pub trait BufferSource {
    fn fetch(&self, uri: &str, search_paths: &[&Path]) -> io::Result<Vec<u8>>;
}

impl<F> BufferSource for F
where
    F: Fn(&str, &[&Path]) -> io::Result<Vec<u8>>,
{
    fn fetch(&self, uri: &str, search_paths: &[&Path]) -> io::Result<Vec<u8>> {
        self(uri, search_paths)
    }
}

/// Reads buffers from the local filesystem. The first directory holding a
/// file named by the URI wins.
#[derive(Clone, Copy, Debug)]
pub struct FileSource {
    max_bytes: u64,
}

impl FileSource {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}

impl Default for FileSource {
    fn default() -> Self {
        Self::new(DEFAULT_SOFT_LIMIT)
    }
}

impl BufferSource for FileSource {
    fn fetch(&self, uri: &str, search_paths: &[&Path]) -> io::Result<Vec<u8>> {
        if uri.starts_with("data:") {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "embedded data URIs are not supported",
            ));
        }

        if escapes_search_paths(uri) {
            log::warn!("Buffer URI '{uri}' points outside the search paths");
        }

        for dir in search_paths {
            let candidate = dir.join(uri);
            let meta = match fs::metadata(&candidate) {
                Ok(meta) if meta.is_file() => meta,
                Ok(_) => continue,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            if meta.len() > self.max_bytes {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "{} is {} bytes, above the {} byte soft limit",
                        candidate.display(),
                        meta.len(),
                        self.max_bytes
                    ),
                ));
            }
            log::debug!("Reading buffer {:?} ({} bytes)", candidate, meta.len());
            return fs::read(&candidate);
        }

        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("'{uri}' not found in {} search path(s)", search_paths.len()),
        ))
    }
}

/// Absolute URIs replace the search directory on join, and `..` climbs
/// out of it.
fn escapes_search_paths(uri: &str) -> bool {
    let mut depth = 0usize;
    for component in Path::new(uri).components() {
        match component {
            Component::RootDir | Component::Prefix(_) => return true,
            Component::ParentDir => match depth.checked_sub(1) {
                Some(up) => depth = up,
                None => return true,
            },
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
        }
    }
    false
}

/// Explicit paths win; otherwise fall back to the directory the document
/// was loaded from. May be empty.
pub fn effective_search_paths<'p>(
    explicit: &'p [PathBuf],
    default_dir: Option<&'p Path>,
) -> Vec<&'p Path> {
    if explicit.is_empty() {
        default_dir.into_iter().collect()
    } else {
        explicit.iter().map(PathBuf::as_path).collect()
    }
}
