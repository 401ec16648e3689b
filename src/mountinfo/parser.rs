//! Mountinfo line parser for Linux systems.
//!
//! Parses lines in `/proc/[pid]/mountinfo` format. See
//! [`proc_pid_mountinfo(5)`](https://man7.org/linux/man-pages/man5/proc_pid_mountinfo.5.html)
//! for details on the structure:
//!
//! ```text
//! 36 35 98:0 /mnt1 /mnt2 rw,noatime master:1 - ext3 /dev/root rw,errors=continue
//! (1)(2)(3)   (4)   (5)      (6)      (7)   (8) (9)   (10)         (11)
//! ```
//!
//! Only the fields needed to resolve a cgroup directory are kept: the root of the mount within
//! its filesystem (4), the mount point (5) and the filesystem type (9).

use std::borrow::Cow;

/// The parts of a mountinfo line needed to resolve cgroup paths.
#[derive(Debug, PartialEq, Eq)]
pub struct MountInfo<'a> {
    /// Root of the mount within the filesystem, with octal escapes decoded.
    pub root: Cow<'a, str>,
    /// Mount point relative to the process's root, with octal escapes decoded.
    pub mount_point: Cow<'a, str>,
    /// Filesystem type (e.g., `ext4`, `cgroup2`).
    pub fs_type: &'a str,
}

/// Errors that may occur when parsing a mountinfo line.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("missing separator ` - ` in line: `{0}`")]
    MissingSeparator(String),

    #[error("expected at least 5 fields before the separator, found {found} in line: `{line}`")]
    TooFewFields { found: usize, line: String },

    #[error("missing filesystem type after the separator in line: `{0}`")]
    MissingFsType(String),
}

/// Parses a single line of mountinfo data.
///
/// # Errors
///
/// Returns [`ParseError`] if the separator, any of the first five fields, or the filesystem type
/// is missing.
pub fn parse_mount_info_line(line: &str) -> Result<MountInfo<'_>, ParseError> {
    let (pre, post) = line
        .split_once(" - ")
        .ok_or_else(|| ParseError::MissingSeparator(line.trim_end().to_owned()))?;

    let pre_fields: Vec<&str> = pre.split_whitespace().take(5).collect();
    let [_mount_id, _parent_id, _major_minor, root, mount_point] = pre_fields[..] else {
        return Err(ParseError::TooFewFields {
            found: pre_fields.len(),
            line: line.trim_end().to_owned(),
        });
    };

    let fs_type = post
        .split_whitespace()
        .next()
        .ok_or_else(|| ParseError::MissingFsType(line.trim_end().to_owned()))?;

    Ok(MountInfo {
        root: unescape(root),
        mount_point: unescape(mount_point),
        fs_type,
    })
}

/// Decodes the `\ooo` octal escapes the kernel uses for space, tab, newline and backslash.
fn unescape(field: &str) -> Cow<'_, str> {
    if !field.contains('\\') {
        return Cow::Borrowed(field);
    }

    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && is_octal_escape(&bytes[i + 1..i + 4]) {
            let [hi, mid, lo] = [bytes[i + 1], bytes[i + 2], bytes[i + 3]].map(|d| d - b'0');
            out.push(hi * 64 + mid * 8 + lo);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    Cow::Owned(String::from_utf8_lossy(&out).into_owned())
}

fn is_octal_escape(digits: &[u8]) -> bool {
    digits.len() == 3 && digits[0] <= b'3' && digits.iter().all(|d| (b'0'..=b'7').contains(d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cgroup2_line() {
        let line = "35 24 0:30 / /sys/fs/cgroup rw,nosuid,nodev,noexec,relatime shared:9 - cgroup2 cgroup2 rw,nsdelegate,memory_recursiveprot";
        let info = parse_mount_info_line(line).unwrap();

        assert_eq!(info.root, "/");
        assert_eq!(info.mount_point, "/sys/fs/cgroup");
        assert_eq!(info.fs_type, "cgroup2");
    }

    #[test]
    fn parses_line_without_optional_fields() {
        let line = "36 25 0:32 / /sys - sysfs sysfs rw";
        let info = parse_mount_info_line(line).unwrap();
        assert_eq!(info.fs_type, "sysfs");
        assert_eq!(info.mount_point, "/sys");
    }

    #[test]
    fn parses_nested_cgroup_root() {
        let line = "1210 1209 0:30 /kubepods.slice/pod1 /sys/fs/cgroup ro,nosuid - cgroup2 cgroup rw";
        let info = parse_mount_info_line(line).unwrap();
        assert_eq!(info.root, "/kubepods.slice/pod1");
    }

    #[test]
    fn decodes_escaped_spaces() {
        let line = r"42 35 0:22 / /mnt/with\040space rw - ext4 /dev/sda1 rw";
        let info = parse_mount_info_line(line).unwrap();
        assert_eq!(info.mount_point, "/mnt/with space");
        assert!(matches!(info.root, Cow::Borrowed(_)));
    }

    #[test]
    fn keeps_trailing_backslash() {
        assert_eq!(unescape(r"/odd\04"), r"/odd\04");
        assert_eq!(unescape(r"/odd\"), r"/odd\");
    }

    #[test]
    fn error_on_missing_separator() {
        let line = "42 35 0:22 / /mnt rw,nosuid ext4 /dev/sda1 rw";
        let err = parse_mount_info_line(line).unwrap_err();
        assert!(matches!(err, ParseError::MissingSeparator(_)));
    }

    #[test]
    fn error_on_missing_mount_point() {
        let line = "42 35 0:22 / - ext4 /dev/sda1 rw";
        let err = parse_mount_info_line(line).unwrap_err();
        match err {
            ParseError::TooFewFields { found, .. } => assert_eq!(found, 4),
            other => panic!("Expected TooFewFields, got {other:?}"),
        }
    }

    #[test]
    fn error_on_missing_fs_type() {
        let line = "42 35 0:22 / /mnt rw -  ";
        let err = parse_mount_info_line(line).unwrap_err();
        assert!(matches!(err, ParseError::MissingFsType(_)));
    }

    #[test]
    fn error_on_empty_line() {
        let err = parse_mount_info_line("").unwrap_err();
        assert!(matches!(err, ParseError::MissingSeparator(_)));
    }
}
