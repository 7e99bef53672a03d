//! Toolchain interface: turning a resolved project into command entries.

mod gcc;

pub use gcc::GccLikeToolchain;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::options::OptionCollection;
use crate::project::Project;
use crate::scalar_option;
use crate::stringid::StringId;

/// Handle into the environment's toolchain registry. Options store this
/// handle rather than any owning reference; toolchains are process-wide.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ToolchainRef(pub(crate) usize);

scalar_option!(ToolchainRef);

/// Translates a resolved project into compile, link and archive commands.
///
/// `process` is the key operation: it appends [`CommandEntry`]s to the
/// resolved `Commands` option and returns the final linked outputs. Static
/// library toolchains additionally record their archive path under the
/// public-scope `_LinkedOutputs` option so dependents pick it up during
/// their own resolution.
///
/// [`CommandEntry`]: crate::command::CommandEntry
pub trait ToolchainProvider {
    fn name(&self) -> &str;

    fn compiler(&self, project: &Project, resolved: &OptionCollection, path_offset: &Path)
        -> String;

    fn common_compiler_flags(
        &self,
        project: &Project,
        resolved: &OptionCollection,
        path_offset: &Path,
    ) -> String;

    fn compiler_flags(
        &self,
        project: &Project,
        resolved: &OptionCollection,
        path_offset: &Path,
        input: &str,
        output: &str,
    ) -> String;

    fn linker(&self, project: &Project, resolved: &OptionCollection, path_offset: &Path)
        -> String;

    fn common_linker_flags(
        &self,
        project: &Project,
        resolved: &OptionCollection,
        path_offset: &Path,
    ) -> Result<String>;

    fn linker_flags(
        &self,
        project: &Project,
        resolved: &OptionCollection,
        path_offset: &Path,
        inputs: &[String],
        output: &str,
    ) -> Result<String>;

    /// Appends this project's commands to `resolved[Commands]` and returns
    /// the final artifact paths.
    fn process(
        &self,
        project: &mut Project,
        resolved: &mut OptionCollection,
        config: StringId,
        working_dir: &Path,
    ) -> Result<Vec<PathBuf>>;
}
