//! Reading and writing source files.
//!
//! Files are decoded according to their byte order mark and written back in
//! the same encoding. Writes are atomic (tempfile + fsync + rename) and are
//! refused when the file changed on disk after it was read.

use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid {encoding}")]
    Decode {
        path: PathBuf,
        encoding: TextEncoding,
    },

    #[error("{path} changed on disk since it was read")]
    ChangedOnDisk { path: PathBuf },
}

impl PersistError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        PersistError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Utf8Bom => "UTF-8 (with BOM)",
            TextEncoding::Utf16Le => "UTF-16LE",
            TextEncoding::Utf16Be => "UTF-16BE",
        })
    }
}

impl TextEncoding {
    /// Encoding announced by the BOM; UTF-8 without one.
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes {
            [0xEF, 0xBB, 0xBF, ..] => TextEncoding::Utf8Bom,
            [0xFF, 0xFE, ..] => TextEncoding::Utf16Le,
            [0xFE, 0xFF, ..] => TextEncoding::Utf16Be,
            _ => TextEncoding::Utf8,
        }
    }

    pub fn bom(self) -> &'static [u8] {
        match self {
            TextEncoding::Utf8 => &[],
            TextEncoding::Utf8Bom => &[0xEF, 0xBB, 0xBF],
            TextEncoding::Utf16Le => &[0xFF, 0xFE],
            TextEncoding::Utf16Be => &[0xFE, 0xFF],
        }
    }

    /// Decode `bytes`, BOM included.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        let body = bytes.strip_prefix(self.bom())?;
        match self {
            TextEncoding::Utf8 | TextEncoding::Utf8Bom => String::from_utf8(body.to_vec()).ok(),
            TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
                if body.len() % 2 != 0 {
                    return None;
                }
                let units = body.chunks_exact(2).map(|pair| {
                    let pair = [pair[0], pair[1]];
                    if self == TextEncoding::Utf16Le {
                        u16::from_le_bytes(pair)
                    } else {
                        u16::from_be_bytes(pair)
                    }
                });
                char::decode_utf16(units).collect::<Result<String, _>>().ok()
            }
        }
    }

    /// Encode `text`, BOM included.
    pub fn encode(self, text: &str) -> Vec<u8> {
        let mut out = self.bom().to_vec();
        match self {
            TextEncoding::Utf8 | TextEncoding::Utf8Bom => out.extend_from_slice(text.as_bytes()),
            TextEncoding::Utf16Le => out.extend(text.encode_utf16().flat_map(u16::to_le_bytes)),
            TextEncoding::Utf16Be => out.extend(text.encode_utf16().flat_map(u16::to_be_bytes)),
        }
        out
    }
}

/// A decoded source file and the fingerprint of the bytes it came from.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
    pub encoding: TextEncoding,
    pub fingerprint: u64,
}

impl SourceFile {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| PersistError::io(path, e))?;
        let encoding = TextEncoding::detect(&bytes);
        let text = encoding.decode(&bytes).ok_or_else(|| PersistError::Decode {
            path: path.to_path_buf(),
            encoding,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            text,
            encoding,
            fingerprint: xxh3_64(&bytes),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "WriteOutcome tells whether the file was touched"]
pub enum WriteOutcome {
    Written { bytes: usize },
    Unchanged,
}

/// Serializes writes so that concurrent units never interleave on disk.
#[derive(Debug, Default)]
pub struct WriteSink {
    lock: Mutex<()>,
}

impl WriteSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `text` over `file` in the file's own encoding.
    pub fn write(&self, file: &SourceFile, text: &str) -> Result<WriteOutcome, PersistError> {
        let _guard = self.lock.lock();

        let current = fs::read(&file.path).map_err(|e| PersistError::io(&file.path, e))?;
        if xxh3_64(&current) != file.fingerprint {
            return Err(PersistError::ChangedOnDisk {
                path: file.path.clone(),
            });
        }

        let encoded = file.encoding.encode(text);
        if encoded == current {
            return Ok(WriteOutcome::Unchanged);
        }
        atomic_write(&file.path, &encoded)?;
        tracing::debug!(path = %file.path.display(), bytes = encoded.len(), "wrote file");
        Ok(WriteOutcome::Written {
            bytes: encoded.len(),
        })
    }
}

/// Atomic file write: tempfile + fsync + rename, keeping permissions.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), PersistError> {
    let parent = path.parent().ok_or_else(|| {
        PersistError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent directory"),
        )
    })?;
    let permissions = fs::metadata(path)
        .map_err(|e| PersistError::io(path, e))?
        .permissions();

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| PersistError::io(path, e))?;
    temp.write_all(content).map_err(|e| PersistError::io(path, e))?;
    temp.as_file()
        .set_permissions(permissions)
        .map_err(|e| PersistError::io(path, e))?;
    temp.as_file().sync_all().map_err(|e| PersistError::io(path, e))?;
    temp.persist(path).map_err(|e| PersistError::io(path, e.error))?;

    Ok(())
}
