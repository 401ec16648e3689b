//! Locating the cgroup v2 hierarchy through `/proc/<pid>/mountinfo`.

mod detect;
mod error;
mod parser;

pub use detect::{Cgroup2Mount, detect_cgroup2_mount};
pub use error::{Error, Result};
pub use parser::{MountInfo, ParseError, parse_mount_info_line};
