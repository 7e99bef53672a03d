//! The environment: owner of the project set, configurations, emitters and
//! toolchains for one invocation.

use std::collections::HashSet;
use std::ops::{Index, IndexMut};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::emit::Emitter;
use crate::options::OptionCollection;
use crate::project::{OperatingSystem, Project, ProjectId, ProjectType, Transitivity};
use crate::stringid::StringId;
use crate::toolchain::{GccLikeToolchain, ToolchainProvider, ToolchainRef};

/// Context handed over by the bootstrapper that compiled the build
/// description; drives the self-hosting `_generator` command.
#[derive(Clone, Debug)]
pub struct GeneratorInfo {
    /// Directory the user invoked the build from.
    pub start_dir: PathBuf,
    /// Root of the framework sources.
    pub framework_dir: PathBuf,
    /// Directory the compiled build description lives in.
    pub build_dir: PathBuf,
    /// The build description source file.
    pub build_file: PathBuf,
    /// Original command-line arguments, re-passed on regeneration.
    pub args: Vec<String>,
    /// Command that recompiles and reruns the build description.
    pub regen_command: String,
    /// Artifact the regeneration refreshes (the description binary).
    pub output: PathBuf,
}

impl GeneratorInfo {
    /// Reads the bootstrapper handoff from `GANTRY_*` environment
    /// variables; `None` when running without a bootstrapper.
    pub fn from_env() -> Option<Self> {
        let get = |name: &str| std::env::var(name).ok();
        Some(Self {
            start_dir: PathBuf::from(get("GANTRY_START_DIR")?),
            framework_dir: PathBuf::from(get("GANTRY_FRAMEWORK_DIR")?),
            build_dir: PathBuf::from(get("GANTRY_BUILD_DIR")?),
            build_file: PathBuf::from(get("GANTRY_BUILD_FILE")?),
            args: std::env::args().skip(1).collect(),
            regen_command: get("GANTRY_REGEN_COMMAND")?,
            output: PathBuf::from(get("GANTRY_BUILD_OUTPUT")?),
        })
    }
}

pub struct Environment {
    projects: Vec<Project>,
    configurations: Vec<StringId>,
    emitters: Vec<Arc<dyn Emitter>>,
    toolchains: Vec<Arc<dyn ToolchainProvider>>,
    default_toolchain: ToolchainRef,
    generator: Option<GeneratorInfo>,
    pub target_os: OperatingSystem,
}

impl Environment {
    /// An environment with the built-in emitters and the detected
    /// GCC/clang-like toolchain registered as default.
    pub fn new() -> Self {
        let mut env = Self::bare();
        env.add_emitter(Arc::new(crate::build::DirectBuilder));
        env.add_emitter(Arc::new(crate::emit::NinjaEmitter));
        env.add_emitter(Arc::new(crate::emit::CompileCommandsEmitter));
        env.add_toolchain(Arc::new(GccLikeToolchain::detect()));
        env
    }

    /// An environment with nothing registered; tests and embedders build it
    /// up themselves.
    pub fn bare() -> Self {
        Self {
            projects: Vec::new(),
            configurations: Vec::new(),
            emitters: Vec::new(),
            toolchains: Vec::new(),
            default_toolchain: ToolchainRef(0),
            generator: GeneratorInfo::from_env(),
            target_os: OperatingSystem::current(),
        }
    }

    /// Creates a project and returns its handle.
    pub fn project(&mut self, name: impl Into<String>, ty: impl Into<Option<ProjectType>>) -> ProjectId {
        self.projects.push(Project::new(name, ty.into()));
        ProjectId(self.projects.len() - 1)
    }

    pub fn get(&self, id: ProjectId) -> &Project {
        &self.projects[id.0]
    }

    pub fn get_mut(&mut self, id: ProjectId) -> &mut Project {
        &mut self.projects[id.0]
    }

    pub fn project_ids(&self) -> impl Iterator<Item = ProjectId> {
        (0..self.projects.len()).map(ProjectId)
    }

    /// Registers a configuration name, e.g. `"debug"`.
    pub fn configuration(&mut self, name: &str) -> StringId {
        let id = StringId::new(name);
        if !self.configurations.contains(&id) {
            self.configurations.push(id);
        }
        id
    }

    pub fn configurations(&self) -> &[StringId] {
        &self.configurations
    }

    pub fn add_emitter(&mut self, emitter: Arc<dyn Emitter>) {
        self.emitters.push(emitter);
    }

    pub fn emitters(&self) -> &[Arc<dyn Emitter>] {
        &self.emitters
    }

    pub fn find_emitter(&self, name: &str) -> Option<Arc<dyn Emitter>> {
        self.emitters
            .iter()
            .find(|emitter| emitter.name() == name)
            .cloned()
    }

    /// Registers a toolchain; the first registered one is the default.
    pub fn add_toolchain(&mut self, toolchain: Arc<dyn ToolchainProvider>) -> ToolchainRef {
        self.toolchains.push(toolchain);
        ToolchainRef(self.toolchains.len() - 1)
    }

    pub fn toolchain(&self, handle: ToolchainRef) -> Option<Arc<dyn ToolchainProvider>> {
        self.toolchains.get(handle.0).cloned()
    }

    pub fn set_default_toolchain(&mut self, handle: ToolchainRef) {
        self.default_toolchain = handle;
    }

    pub fn default_toolchain(&self) -> ToolchainRef {
        self.default_toolchain
    }

    pub fn set_generator(&mut self, info: GeneratorInfo) {
        self.generator = Some(info);
    }

    pub fn generator(&self) -> Option<&GeneratorInfo> {
        self.generator.as_ref()
    }

    /// Every project in dependency-first order: each project appears after
    /// everything it links, ties broken by creation order.
    pub fn discover_order(&self) -> Vec<ProjectId> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        for id in self.project_ids() {
            self.visit(id, &mut visited, &mut order);
        }
        order
    }

    fn visit(&self, id: ProjectId, visited: &mut HashSet<ProjectId>, order: &mut Vec<ProjectId>) {
        if !visited.insert(id) {
            return;
        }
        for &link in self.get(id).links() {
            self.visit(link, visited, order);
        }
        order.push(id);
    }

    /// Computes the effective option set for a project as seen from the
    /// given query context, walking the link graph depth-first and applying
    /// selector filters, then deduplicating.
    pub fn resolve(
        &self,
        id: ProjectId,
        project_type: Option<ProjectType>,
        config: StringId,
        target_os: OperatingSystem,
    ) -> Result<OptionCollection> {
        let mut walk = Vec::new();
        let mut options =
            self.internal_resolve(id, project_type, config, target_os, true, &mut walk)?;
        options.deduplicate();
        Ok(options)
    }

    fn internal_resolve(
        &self,
        id: ProjectId,
        project_type: Option<ProjectType>,
        config: StringId,
        target_os: OperatingSystem,
        local: bool,
        walk: &mut Vec<ProjectId>,
    ) -> Result<OptionCollection> {
        let project = self.get(id);
        if walk.contains(&id) {
            bail!("Cyclic link graph involving '{}'.", project.name);
        }
        walk.push(id);

        let mut result = OptionCollection::new();

        // Transitive contributions come first so the project's own choices
        // win on single-valued options and sort last on sequences.
        for &link in project.links() {
            let resolved =
                self.internal_resolve(link, project_type, config, target_os, false, walk)?;
            result.combine(&resolved);
        }

        // Selector map order puts the default (all-empty) entry first, so a
        // local resolve combines the project's base options before any
        // filtered group.
        for (selector, options) in project.selector_entries() {
            if local {
                if selector.transitivity == Some(Transitivity::PublicOnly) {
                    continue;
                }
            } else {
                match selector.transitivity {
                    Some(Transitivity::Public) | Some(Transitivity::PublicOnly) => {}
                    _ => continue,
                }
            }
            if selector.project_type.is_some() && selector.project_type != project_type {
                continue;
            }
            if let Some(name) = selector.name {
                if name != config {
                    continue;
                }
            }
            if selector.target_os.is_some() && selector.target_os != Some(target_os) {
                continue;
            }

            result.combine(options);
        }

        walk.pop();
        Ok(result)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<ProjectId> for Environment {
    type Output = Project;

    fn index(&self, id: ProjectId) -> &Project {
        self.get(id)
    }
}

impl IndexMut<ProjectId> for Environment {
    fn index_mut(&mut self, id: ProjectId) -> &mut Project {
        self.get_mut(id)
    }
}
