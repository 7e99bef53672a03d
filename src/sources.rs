//! Source tree enumeration helpers for build descriptions.

use std::path::Path;

use anyhow::{bail, Result};
use walkdir::WalkDir;

use crate::options::{OptionCollection, FILES, GENERATOR_DEPENDENCIES};

const LISTED_EXTENSIONS: [&str; 5] = ["c", "cpp", "mm", "h", "hpp"];

/// Collects every C/C++/Objective-C++ source and header under `path` into
/// a `Files` option, recording the scanned directories as generator
/// dependencies so the build files regenerate when the tree changes.
///
/// ```no_run
/// # use gantry::{Environment, ProjectType};
/// # let mut env = Environment::new();
/// let app = env.project("App", ProjectType::Executable);
/// let sources = gantry::sources::source_list("src").unwrap();
/// env[app].merge(&sources);
/// ```
pub fn source_list(path: impl AsRef<Path>) -> Result<OptionCollection> {
    let path = path.as_ref();
    if !path.is_dir() {
        bail!("Source directory '{}' does not exist.", path.display());
    }

    let mut result = OptionCollection::new();
    result.push(GENERATOR_DEPENDENCIES, path);

    for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_dir() {
            result.push(GENERATOR_DEPENDENCIES, entry.path());
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        let recognized = entry
            .path()
            .extension()
            .map(|ext| LISTED_EXTENSIONS.iter().any(|known| ext == *known))
            .unwrap_or(false);
        if recognized {
            result.push(FILES, entry.path());
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn lists_recognized_files_and_directories() {
        let scratch = std::env::temp_dir().join(".gantry_sources_test");
        let _ = fs::remove_dir_all(&scratch);
        fs::create_dir_all(scratch.join("nested")).unwrap();
        fs::write(scratch.join("a.c"), "").unwrap();
        fs::write(scratch.join("nested/b.cpp"), "").unwrap();
        fs::write(scratch.join("nested/c.h"), "").unwrap();
        fs::write(scratch.join("notes.txt"), "").unwrap();

        let collection = source_list(&scratch).unwrap();
        let mut files: Vec<PathBuf> = collection.slice(FILES).to_vec();
        files.sort();
        assert_eq!(
            files,
            [
                scratch.join("a.c"),
                scratch.join("nested/b.cpp"),
                scratch.join("nested/c.h"),
            ]
        );
        assert!(collection
            .slice(GENERATOR_DEPENDENCIES)
            .contains(&scratch.join("nested")));

        fs::remove_dir_all(&scratch).unwrap();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = source_list("definitely/not/here").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
