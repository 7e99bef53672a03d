//! Projects, selectors and the configuration maps between them.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::options::{
    OptionCollection, OptionDef, OptionValue, OUTPUT_DIR, OUTPUT_EXTENSION, OUTPUT_PATH,
    OUTPUT_PREFIX, OUTPUT_STEM, OUTPUT_SUFFIX,
};
use crate::stringid::StringId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProjectType {
    Executable,
    StaticLib,
    SharedLib,
    Command,
}

/// Scope tag on a property group: who sees it when the link graph is walked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Transitivity {
    /// Visible only to the project itself.
    Local,
    /// Visible to the project and everything linking it.
    Public,
    /// Visible only to projects linking it, not the project itself.
    PublicOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperatingSystem {
    Windows,
    Linux,
    MacOs,
}

impl OperatingSystem {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            OperatingSystem::Windows
        } else if cfg!(target_os = "macos") {
            OperatingSystem::MacOs
        } else {
            OperatingSystem::Linux
        }
    }
}

/// Predicate gating a property group. Empty fields match everything; the
/// all-empty selector is the project's default group. Ordered
/// lexicographically over (transitivity, project type, config name, target
/// OS) for use as a map key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Selector {
    pub transitivity: Option<Transitivity>,
    pub project_type: Option<ProjectType>,
    pub name: Option<StringId>,
    pub target_os: Option<OperatingSystem>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges another selector fragment into this one. Specifying the same
    /// field twice is a configuration error and panics.
    pub fn and(mut self, other: impl Into<Selector>) -> Selector {
        let other = other.into();
        if other.transitivity.is_some() {
            assert!(
                self.transitivity.is_none(),
                "transitivity was specified twice in a selector"
            );
            self.transitivity = other.transitivity;
        }
        if other.project_type.is_some() {
            assert!(
                self.project_type.is_none(),
                "project type was specified twice in a selector"
            );
            self.project_type = other.project_type;
        }
        if other.name.is_some() {
            assert!(
                self.name.is_none(),
                "configuration name was specified twice in a selector"
            );
            self.name = other.name;
        }
        if other.target_os.is_some() {
            assert!(
                self.target_os.is_none(),
                "target operating system was specified twice in a selector"
            );
            self.target_os = other.target_os;
        }
        self
    }
}

impl From<Transitivity> for Selector {
    fn from(transitivity: Transitivity) -> Self {
        Selector {
            transitivity: Some(transitivity),
            ..Default::default()
        }
    }
}

impl From<ProjectType> for Selector {
    fn from(project_type: ProjectType) -> Self {
        Selector {
            project_type: Some(project_type),
            ..Default::default()
        }
    }
}

impl From<OperatingSystem> for Selector {
    fn from(target_os: OperatingSystem) -> Self {
        Selector {
            target_os: Some(target_os),
            ..Default::default()
        }
    }
}

impl From<StringId> for Selector {
    fn from(name: StringId) -> Self {
        Selector {
            name: Some(name),
            ..Default::default()
        }
    }
}

impl From<&str> for Selector {
    fn from(name: &str) -> Self {
        Selector::from(StringId::new(name))
    }
}

/// Handle to a project inside its [`Environment`](crate::Environment).
/// Links are stored as these handles, never as owning references.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProjectId(pub(crate) usize);

/// A named configuration node. A project with an empty name and no type is
/// configuration-only and emits nothing of its own.
pub struct Project {
    pub name: String,
    pub ty: Option<ProjectType>,
    links: Vec<ProjectId>,
    configs: BTreeMap<Selector, OptionCollection>,
}

impl Project {
    pub(crate) fn new(name: impl Into<String>, ty: Option<ProjectType>) -> Self {
        Self {
            name: name.into(),
            ty,
            links: Vec::new(),
            configs: BTreeMap::new(),
        }
    }

    /// Adds a link to another project. Dependents inherit the linked
    /// project's non-local options during resolution. Link order is
    /// preserved.
    pub fn link(&mut self, dep: ProjectId) -> &mut Self {
        self.links.push(dep);
        self
    }

    pub fn links(&self) -> &[ProjectId] {
        &self.links
    }

    /// The property group gated by `selector`, created on first access.
    pub fn config(&mut self, selector: impl Into<Selector>) -> &mut OptionCollection {
        self.configs.entry(selector.into()).or_default()
    }

    /// The default property group (empty selector).
    pub fn options(&mut self) -> &mut OptionCollection {
        self.config(Selector::default())
    }

    pub(crate) fn selector_entries(&self) -> impl Iterator<Item = (&Selector, &OptionCollection)> {
        self.configs.iter()
    }

    /// Appends one element to a sequence option in the default group.
    pub fn push<T, U>(&mut self, option: OptionDef<Vec<T>>, item: U)
    where
        Vec<T>: OptionValue + Default,
        U: Into<T>,
    {
        self.options().push(option, item);
    }

    /// Extends a sequence option in the default group.
    pub fn append<T, I>(&mut self, option: OptionDef<Vec<T>>, items: I)
    where
        Vec<T>: OptionValue + Default,
        I: IntoIterator,
        I::Item: Into<T>,
    {
        self.options().append(option, items);
    }

    /// Sets a scalar option in the default group.
    pub fn set<T: OptionValue>(&mut self, option: OptionDef<T>, value: T) {
        self.options().set(option, value);
    }

    /// Combines a prebuilt collection into the default group, e.g. the
    /// result of [`source_list`](crate::sources::source_list).
    pub fn merge(&mut self, collection: &OptionCollection) {
        self.options().combine(collection);
    }

    /// Computes the artifact path from the resolved options: `OutputPath`
    /// when set, otherwise `OutputDir/(prefix + stem + suffix + extension)`
    /// with the stem defaulting to the project name.
    pub fn output_path(&self, resolved: &OptionCollection) -> PathBuf {
        let path: PathBuf = resolved.value(OUTPUT_PATH);
        if !path.as_os_str().is_empty() {
            return path;
        }

        let mut stem: String = resolved.value(OUTPUT_STEM);
        if stem.is_empty() {
            stem = self.name.clone();
        }

        let dir: PathBuf = resolved.value(OUTPUT_DIR);
        dir.join(format!(
            "{}{}{}{}",
            resolved.value(OUTPUT_PREFIX),
            stem,
            resolved.value(OUTPUT_SUFFIX),
            resolved.value(OUTPUT_EXTENSION)
        ))
    }
}
