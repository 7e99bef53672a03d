//! Command entries: the unit of work toolchains emit and emitters consume.

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// A shell command with declared inputs and outputs. Two entries are equal
/// iff every field but the description matches.
#[derive(Clone, Debug, Default)]
pub struct CommandEntry {
    pub command: String,
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
    pub working_directory: PathBuf,
    pub depfile: Option<PathBuf>,
    pub description: String,
}

impl PartialEq for CommandEntry {
    fn eq(&self, other: &Self) -> bool {
        self.command == other.command
            && self.outputs == other.outputs
            && self.inputs == other.inputs
            && self.working_directory == other.working_directory
            && self.depfile == other.depfile
    }
}

impl Eq for CommandEntry {}

impl Hash for CommandEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.command.hash(state);
        self.inputs.hash(state);
        self.outputs.hash(state);
        self.working_directory.hash(state);
        self.depfile.hash(state);
    }
}

/// Copies `from` to `to`, creating the target directory first.
pub fn copy(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> CommandEntry {
    let from = from.into();
    let to = to.into();
    let target_dir = to.parent().unwrap_or(Path::new(".")).to_path_buf();
    CommandEntry {
        command: format!(
            "mkdir -p \"{}\" && cp \"{}\" \"{}\"",
            target_dir.display(),
            from.display(),
            to.display()
        ),
        description: format!("Copying '{}' -> '{}'", from.display(), to.display()),
        inputs: vec![from],
        outputs: vec![to],
        ..Default::default()
    }
}

/// Creates a directory and its parents.
pub fn mkdir(dir: impl Into<PathBuf>) -> CommandEntry {
    let dir = dir.into();
    CommandEntry {
        command: format!("mkdir -p \"{}\"", dir.display()),
        description: format!("Creating directory '{}'", dir.display()),
        outputs: vec![dir],
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_description() {
        let mut a = copy("a.txt", "out/a.txt");
        let mut b = a.clone();
        b.description = "something else".into();
        assert_eq!(a, b);
        a.command.push('x');
        assert_ne!(a, b);
    }

    #[test]
    fn copy_declares_endpoints() {
        let entry = copy("src/logo.png", "bundle/Contents/logo.png");
        assert_eq!(entry.inputs, [PathBuf::from("src/logo.png")]);
        assert_eq!(entry.outputs, [PathBuf::from("bundle/Contents/logo.png")]);
        assert!(entry.command.contains("mkdir -p \"bundle/Contents\""));
    }
}
