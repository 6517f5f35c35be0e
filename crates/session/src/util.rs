use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn temporary_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("document"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes `data` to a temporary sibling of `path` and renames it into place, so
/// readers only ever see the old or the new content.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = temporary_sibling(path);
    fs::write(&tmp_path, data)?;
    fs::rename(&tmp_path, path)
}
