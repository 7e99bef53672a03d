//! Standard options recognized by the framework and the default toolchain.

use std::path::PathBuf;

use crate::command::CommandEntry;
use crate::options::OptionDef;
use crate::postprocess::PostProcessor;
use crate::toolchain::ToolchainRef;

/// Target platform tag, e.g. `"x64"`.
pub const PLATFORM: OptionDef<String> = OptionDef::new("Platform");

/// Header search paths, passed to the compiler as `-I`.
pub const INCLUDE_PATHS: OptionDef<Vec<PathBuf>> = OptionDef::new("IncludePaths");

/// Source and header files belonging to the project.
pub const FILES: OptionDef<Vec<PathBuf>> = OptionDef::new("Files");

/// Paths that should trigger regeneration of the build files when touched.
pub const GENERATOR_DEPENDENCIES: OptionDef<Vec<PathBuf>> = OptionDef::new("GeneratorDependencies");

/// Libraries handed to the linker by path.
pub const LIBS: OptionDef<Vec<PathBuf>> = OptionDef::new("Libs");

/// Preprocessor defines, passed as `-D`.
pub const DEFINES: OptionDef<Vec<String>> = OptionDef::new("Defines");

/// Named feature toggles understood by the toolchain, e.g. `"optimize"`.
pub const FEATURES: OptionDef<Vec<String>> = OptionDef::new("Features");

/// macOS framework names, passed as `-framework`.
pub const FRAMEWORKS: OptionDef<Vec<String>> = OptionDef::new("Frameworks");

/// Extra files packaged into an application bundle.
pub const BUNDLE_CONTENTS: OptionDef<Vec<BundleEntry>> = OptionDef::new("BundleContents");

pub const OUTPUT_DIR: OptionDef<PathBuf> = OptionDef::new("OutputDir");
pub const OUTPUT_STEM: OptionDef<String> = OptionDef::new("OutputStem");
pub const OUTPUT_EXTENSION: OptionDef<String> = OptionDef::new("OutputExtension");
pub const OUTPUT_PREFIX: OptionDef<String> = OptionDef::new("OutputPrefix");
pub const OUTPUT_SUFFIX: OptionDef<String> = OptionDef::new("OutputSuffix");

/// Full artifact path; overrides the stem-based computation when set.
pub const OUTPUT_PATH: OptionDef<PathBuf> = OptionDef::new("OutputPath");

/// Header compiled into a precompiled header for this project.
pub const BUILD_PCH: OptionDef<PathBuf> = OptionDef::new("BuildPch");

/// Header whose precompiled form is injected into every compile.
pub const IMPORT_PCH: OptionDef<PathBuf> = OptionDef::new("ImportPch");

/// Closures run against the resolved options before commands are consumed.
pub const POST_PROCESS: OptionDef<Vec<PostProcessor>> = OptionDef::new("PostProcess");

/// The concrete work units an emitter consumes. Toolchains append here.
pub const COMMANDS: OptionDef<Vec<CommandEntry>> = OptionDef::new("Commands");

/// Toolchain handle used to process this project.
pub const TOOLCHAIN: OptionDef<ToolchainRef> = OptionDef::new("Toolchain");

/// Root directory for intermediate artifacts; set by the emitter.
pub const DATA_DIR: OptionDef<PathBuf> = OptionDef::new("DataDir");

/// Archive outputs recorded by static library projects for their
/// dependents. Planted by toolchains under the (Public, config) selector.
pub const LINKED_OUTPUTS: OptionDef<Vec<PathBuf>> = OptionDef::new("_LinkedOutputs");

/// One file relocation inside an application bundle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BundleEntry {
    pub source: PathBuf,
    pub target: PathBuf,
}

impl BundleEntry {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}
