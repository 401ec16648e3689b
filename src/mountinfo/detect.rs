use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::fsutil;

use super::parser::parse_mount_info_line;
use super::{Error, Result};

/// A mounted cgroup v2 hierarchy as seen by the current process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cgroup2Mount {
    /// Path of the mount's root within the cgroup hierarchy.
    ///
    /// This is `/` on the host and usually the container's own cgroup inside a container with a
    /// private cgroup namespace.
    pub root: PathBuf,
    /// Where the hierarchy is mounted in the process's filesystem view.
    pub mount_point: PathBuf,
}

impl Cgroup2Mount {
    /// Maps a cgroup path taken from `/proc/<pid>/cgroup` to a directory below the mount point.
    ///
    /// Returns `None` if `cgroup_path` lies outside the mounted part of the hierarchy.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::path::{Path, PathBuf};
    /// # use cgroup_os_metrics::mountinfo::Cgroup2Mount;
    /// let mount = Cgroup2Mount {
    ///     root: PathBuf::from("/"),
    ///     mount_point: PathBuf::from("/sys/fs/cgroup"),
    /// };
    /// assert_eq!(
    ///     mount.resolve("/system.slice/app.service"),
    ///     Some(PathBuf::from("/sys/fs/cgroup/system.slice/app.service")),
    /// );
    /// ```
    pub fn resolve(&self, cgroup_path: impl AsRef<Path>) -> Option<PathBuf> {
        let relative = cgroup_path.as_ref().strip_prefix(&self.root).ok()?;
        if relative.as_os_str().is_empty() {
            return Some(self.mount_point.clone());
        }
        Some(self.mount_point.join(relative))
    }
}

/// Detects the first `cgroup2` mount in a mountinfo file.
///
/// # Arguments
///
/// * `path` - Path to a mountinfo file, e.g., `/proc/self/mountinfo`.
///
/// # Errors
///
/// - [`Error::FileOpen`] if the file cannot be opened.
/// - [`Error::ReadLine`] if reading a line fails.
/// - [`Error::Parse`] if a line fails to parse.
/// - [`Error::MissingCgroup2Mount`] if no `cgroup2` entry is found.
pub fn detect_cgroup2_mount(path: impl AsRef<Path>) -> Result<Cgroup2Mount> {
    let path = path.as_ref();
    let reader = fsutil::open_file_reader(path)?;

    detect_cgroup2_mount_from_reader(reader, path)
}

fn detect_cgroup2_mount_from_reader<R: BufRead>(
    mut reader: R,
    origin: &Path,
) -> Result<Cgroup2Mount> {
    let mut line = String::with_capacity(256);
    let mut lineno = 0;

    loop {
        line.clear();
        let read = reader
            .read_line(&mut line)
            .map_err(|source| Error::ReadLine {
                path: origin.to_path_buf(),
                source,
            })?;
        if read == 0 {
            break;
        }
        lineno += 1;

        let mount_info = parse_mount_info_line(&line).map_err(|source| Error::Parse {
            path: origin.to_path_buf(),
            line: lineno,
            source,
        })?;
        if mount_info.fs_type == "cgroup2" {
            log::debug!(
                "Found `cgroup2` mount point with root `{}`: {}",
                mount_info.root,
                mount_info.mount_point
            );
            return Ok(Cgroup2Mount {
                root: PathBuf::from(mount_info.root.as_ref()),
                mount_point: PathBuf::from(mount_info.mount_point.as_ref()),
            });
        }
    }

    Err(Error::MissingCgroup2Mount {
        path: origin.to_path_buf(),
    })
}
