//! Post-processors: closures that mutate a resolved option set after
//! resolution, before commands are consumed.

use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::command;
use crate::options::{OptionCollection, BUNDLE_CONTENTS, COMMANDS, DATA_DIR};
use crate::project::Project;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// A uniquely-identified post-processing closure. Equality and hashing use
/// the id so processors survive option deduplication unharmed.
///
/// Processors run index-based over the current length of the `PostProcess`
/// option, so a processor may append further processors and they will run
/// in the same pass.
#[derive(Clone)]
pub struct PostProcessor {
    id: u64,
    func: Arc<dyn Fn(&Project, &mut OptionCollection) -> Result<()>>,
}

impl PostProcessor {
    pub fn new(func: impl Fn(&Project, &mut OptionCollection) -> Result<()> + 'static) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            func: Arc::new(func),
        }
    }

    pub fn run(&self, project: &Project, resolved: &mut OptionCollection) -> Result<()> {
        (self.func)(project, resolved)
    }
}

impl PartialEq for PostProcessor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PostProcessor {}

impl Hash for PostProcessor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for PostProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PostProcessor#{}", self.id)
    }
}

/// Packages the project's binary into a macOS-style application bundle.
/// Writes an Info.plist under the data dir and appends copy commands that
/// relocate the binary and any `BundleContents` entries.
pub fn bundle(extension: &str) -> PostProcessor {
    let extension = extension.trim_start_matches('.').to_string();
    PostProcessor::new(move |project, resolved| {
        let output = project.output_path(resolved);
        let mut bundle_root = output.clone();
        bundle_root.set_extension(&extension);

        let mut binary = output
            .file_name()
            .map(std::path::PathBuf::from)
            .unwrap_or_default();
        binary.set_extension("");

        let data_dir: std::path::PathBuf = resolved.value(DATA_DIR);
        let plist_path = data_dir.join(&project.name).join("Info.plist");
        if let Some(parent) = plist_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create '{}'", parent.display()))?;
        }
        fs::write(&plist_path, generate_plist(project))
            .with_context(|| format!("Failed to write '{}'", plist_path.display()))?;

        resolved.push(
            COMMANDS,
            command::copy(&output, bundle_root.join("Contents/MacOS").join(binary)),
        );
        resolved.push(
            COMMANDS,
            command::copy(&plist_path, bundle_root.join("Contents/Info.plist")),
        );
        for entry in resolved.slice(BUNDLE_CONTENTS).to_vec() {
            resolved.push(
                COMMANDS,
                command::copy(&entry.source, bundle_root.join(&entry.target)),
            );
        }
        Ok(())
    })
}

fn generate_plist(_project: &Project) -> String {
    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n";
    result += "<plist version=\"1.0\">\n";
    result += "<dict>\n";
    result += "</dict>\n";
    result += "</plist>\n";
    result
}
