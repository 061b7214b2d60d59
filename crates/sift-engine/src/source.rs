//! Log source abstraction — open log data from files, mocks, or other backends.

use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::error::{LogError, LogResult};

/// Abstraction for opening log data as a buffered line stream.
///
/// The pipeline may open the same path twice (a strict UTF-8 pass, then a
/// lossy retry), so `open` must be repeatable.
pub trait LogSource: Send + Sync {
    /// Open `path` for streaming reads.
    fn open(&self, path: &str) -> LogResult<Box<dyn BufRead + Send + '_>>;
}

/// Reads logs from the local filesystem.
pub struct FileLogSource;

impl LogSource for FileLogSource {
    fn open(&self, path: &str) -> LogResult<Box<dyn BufRead + Send + '_>> {
        let file = File::open(path).map_err(|e| LogError::from_io(path, e))?;
        let metadata = file.metadata().map_err(|e| LogError::from_io(path, e))?;
        if metadata.is_dir() {
            return Err(LogError::Io {
                path: path.to_string(),
                source: std::io::Error::other("is a directory"),
            });
        }
        Ok(Box::new(BufReader::new(file)))
    }
}
