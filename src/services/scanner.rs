use crate::models::config::DEFAULT_COPY_BUFFER_SIZE;
use crate::models::HeaderMetadata;
use camino::{Utf8Path, Utf8PathBuf};
use md5::{Digest, Md5};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use thiserror::Error;

/// Errors that can occur while scanning a single file.
///
/// These are never fatal to a merge: the engine turns them into an inline
/// failure note in the file's header.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    pub fn path(&self) -> &Utf8Path {
        match self {
            ScanError::Open { path, .. } | ScanError::Read { path, .. } => path,
        }
    }
}

/// Computes line counts and MD5 digests of source files.
///
/// Both operations stream the file through a fixed-size buffer and never hold
/// the whole file in memory.
#[derive(Debug, Clone)]
pub struct LineAndHashScanner {
    buffer_size: usize,
}

impl LineAndHashScanner {
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_COPY_BUFFER_SIZE)
    }

    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Count lines the way a line-oriented reader yields them.
    ///
    /// `\n`, `\r` and `\r\n` each end one line; trailing bytes after the last
    /// terminator form one more line; a file ending on a terminator has no
    /// trailing empty line. Bytes are not decoded, so binary files are counted
    /// by the same rule.
    pub fn count_lines(&self, path: &Utf8Path) -> Result<u64, ScanError> {
        let file = self.open(path)?;
        count_lines_in(BufReader::with_capacity(self.buffer_size, file)).map_err(|source| {
            ScanError::Read {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// MD5 of the file content as 32 lowercase hex characters.
    pub fn compute_hash(&self, path: &Utf8Path) -> Result<String, ScanError> {
        let file = self.open(path)?;
        compute_hash_in(file, self.buffer_size).map_err(|source| ScanError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Line count and hash together, as header metadata.
    ///
    /// Either failure yields [`HeaderMetadata::Failed`] carrying the error text.
    pub fn scan(&self, path: &Utf8Path) -> HeaderMetadata {
        let scanned = self
            .compute_hash(path)
            .and_then(|md5| self.count_lines(path).map(|lines| (md5, lines)));

        match scanned {
            Ok((md5, lines)) => HeaderMetadata::Scanned { md5, lines },
            Err(e) => {
                tracing::warn!("Metadata scan failed: {}", e);
                HeaderMetadata::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn open(&self, path: &Utf8Path) -> Result<File, ScanError> {
        File::open(path).map_err(|source| ScanError::Open {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for LineAndHashScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Count lines from any buffered reader (see [`LineAndHashScanner::count_lines`]).
pub fn count_lines_in<R: BufRead>(mut reader: R) -> io::Result<u64> {
    let mut lines = 0u64;
    let mut partial = false;
    let mut after_cr = false;

    loop {
        let buf = match reader.fill_buf() {
            Ok([]) => break,
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        for &byte in buf {
            match byte {
                // Second half of a \r\n pair
                b'\n' if after_cr => after_cr = false,
                b'\n' => {
                    lines += 1;
                    partial = false;
                }
                b'\r' => {
                    lines += 1;
                    partial = false;
                    after_cr = true;
                }
                _ => {
                    partial = true;
                    after_cr = false;
                }
            }
        }

        let consumed = buf.len();
        reader.consume(consumed);
    }

    if partial {
        lines += 1;
    }

    Ok(lines)
}

/// MD5 of everything `reader` yields, as lowercase hex.
pub fn compute_hash_in<R: Read>(mut reader: R, buffer_size: usize) -> io::Result<String> {
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; buffer_size.max(1)];

    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(format!("{:x}", hasher.finalize()))
}
