use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Error that occurs when reading from an opened file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to read file `{path}`: {source}")]
pub struct FileReadError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use cgroup_os_metrics::fsutil;
/// let reader = fsutil::open_file_reader("/proc/meminfo")?;
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileOpenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Opens `path` and hands the buffered reader to `parse`.
///
/// Parse failures surfaced by `parse` as [`io::Error`] are attributed to `path`.
///
/// # Errors
///
/// Returns an [`io::Error`] carrying the path if opening or parsing fails.
pub fn parse_file<T>(
    path: impl AsRef<Path>,
    parse: impl FnOnce(&mut BufReader<File>) -> io::Result<T>,
) -> io::Result<T> {
    let path = path.as_ref();
    let mut reader =
        open_file_reader(path).map_err(|err| io::Error::new(err.source.kind(), err))?;
    parse(&mut reader).map_err(|source| {
        io::Error::new(
            source.kind(),
            FileReadError {
                path: path.to_path_buf(),
                source,
            },
        )
    })
}
