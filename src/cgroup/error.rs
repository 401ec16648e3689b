use std::path::PathBuf;

use crate::{fsutil, mountinfo};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Mountinfo(#[from] mountinfo::Error),
    #[error(transparent)]
    FileOpen(#[from] fsutil::FileOpenError),
    #[error("failed to read line for file `{path}`: {source}")]
    ReadLine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no cgroup v2 membership entry in file `{path}`")]
    MissingUnifiedEntry { path: PathBuf },
    #[error("cgroup `{cgroup_path}` is not visible below the cgroup2 mount rooted at `{root}`")]
    OutsideMount { cgroup_path: PathBuf, root: PathBuf },
    #[error("cgroup directory `{path}` does not exist")]
    MissingDirectory { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;
