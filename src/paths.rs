//! Path arithmetic shared by toolchains and emitters.
//!
//! Commands run from a working directory that is usually not the directory
//! the build description was configured from, so paths recorded relative to
//! the configure directory need an offset prefix before they land in a
//! command line or a ninja manifest.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

/// Relative path that reaches `to` from `from`. Both are made absolute
/// against the current directory first.
pub fn relative_path(from: &Path, to: &Path) -> Result<PathBuf> {
    let from = absolute(from)?;
    let to = absolute(to)?;

    let from_parts: Vec<Component> = from.components().collect();
    let to_parts: Vec<Component> = to.components().collect();

    let mut common = 0;
    while common < from_parts.len()
        && common < to_parts.len()
        && from_parts[common] == to_parts[common]
    {
        common += 1;
    }

    let mut result = PathBuf::new();
    for _ in common..from_parts.len() {
        result.push("..");
    }
    for part in &to_parts[common..] {
        result.push(part.as_os_str());
    }

    if result.as_os_str().is_empty() {
        result.push(".");
    }
    Ok(result)
}

/// Offset of the configure directory as seen from `working_dir`; joining a
/// configure-relative path onto it yields a path valid inside `working_dir`.
pub fn path_offset(working_dir: &Path) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    relative_path(working_dir, &cwd)
}

/// Applies an offset to a configure-relative path; absolute paths pass
/// through untouched.
pub fn offset_path(offset: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || offset.as_os_str() == "." {
        path.to_path_buf()
    } else {
        offset.join(path)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(clean(path))
    } else {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Ok(clean(&cwd.join(path)))
    }
}

// Lexical cleanup only; never touches the filesystem, so paths that do not
// exist yet still resolve.
fn clean(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for part in path.components() {
        match part {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push("..");
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}
