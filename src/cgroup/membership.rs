use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::fsutil;

use super::{Error, Result};

/// Reads the cgroup v2 path of a process from a `/proc/<pid>/cgroup` file.
///
/// file format: `<hierarchy-id>:<controller-list>:<cgroup-path>`, where the unified hierarchy
/// always has id `0` and an empty controller list, e.g. `0::/system.slice/app.service`.
///
/// # Errors
///
/// - [`Error::FileOpen`] if the file cannot be opened.
/// - [`Error::ReadLine`] if a line cannot be read.
/// - [`Error::MissingUnifiedEntry`] if the process is not attached to a cgroup v2 hierarchy.
pub fn read_unified_cgroup_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let reader = fsutil::open_file_reader(path)?;

    unified_cgroup_path_from_reader(reader, path)
}

fn unified_cgroup_path_from_reader<R: BufRead>(mut reader: R, origin: &Path) -> Result<PathBuf> {
    let mut line = String::with_capacity(128);

    while reader
        .read_line(&mut line)
        .map_err(|source| Error::ReadLine {
            path: origin.to_path_buf(),
            source,
        })?
        != 0
    {
        if let Some(cgroup_path) = line.trim_end().strip_prefix("0::") {
            log::debug!("Found unified cgroup membership: {cgroup_path}");
            return Ok(PathBuf::from(cgroup_path));
        }
        line.clear();
    }

    Err(Error::MissingUnifiedEntry {
        path: origin.to_path_buf(),
    })
}
