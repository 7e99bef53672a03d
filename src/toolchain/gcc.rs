//! Default GCC/clang-like toolchain.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::command::CommandEntry;
use crate::options::{
    OptionCollection, BUILD_PCH, COMMANDS, DATA_DIR, DEFINES, FEATURES, FILES, FRAMEWORKS,
    IMPORT_PCH, INCLUDE_PATHS, LIBS, LINKED_OUTPUTS, OUTPUT_DIR, OUTPUT_EXTENSION, OUTPUT_PREFIX,
    PLATFORM,
};
use crate::paths;
use crate::project::{Project, ProjectType, Selector, Transitivity};
use crate::stringid::StringId;
use crate::toolchain::ToolchainProvider;

/// Source extensions the compile step recognizes.
const SOURCE_EXTENSIONS: [&str; 3] = ["c", "cpp", "mm"];

pub struct GccLikeToolchain {
    compiler: String,
    linker: String,
    archiver: String,
}

impl GccLikeToolchain {
    pub fn new(
        compiler: impl Into<String>,
        linker: impl Into<String>,
        archiver: impl Into<String>,
    ) -> Self {
        Self {
            compiler: compiler.into(),
            linker: linker.into(),
            archiver: archiver.into(),
        }
    }

    /// Picks the compiler from `$CXX` and the archiver from `$AR`, falling
    /// back to clang and ar.
    pub fn detect() -> Self {
        let compiler = std::env::var("CXX").unwrap_or_else(|_| "clang++".to_string());
        let archiver = std::env::var("AR").unwrap_or_else(|_| "ar".to_string());
        Self::new(compiler.clone(), compiler, archiver)
    }

    // Per-type artifact naming, applied only where the user left the
    // options untouched.
    fn apply_output_defaults(
        &self,
        project: &Project,
        resolved: &mut OptionCollection,
        data_dir: &Path,
    ) {
        if resolved.get(OUTPUT_DIR).is_none() {
            resolved.set(OUTPUT_DIR, data_dir.to_path_buf());
        }
        let (prefix, extension) = match project.ty {
            Some(ProjectType::StaticLib) => ("lib", ".a"),
            Some(ProjectType::SharedLib) => ("lib", ".so"),
            _ => return,
        };
        if resolved.get(OUTPUT_PREFIX).is_none() {
            resolved.set(OUTPUT_PREFIX, prefix.to_string());
        }
        if resolved.get(OUTPUT_EXTENSION).is_none() {
            resolved.set(OUTPUT_EXTENSION, extension.to_string());
        }
    }
}

fn quoted(path: &Path) -> String {
    format!("\"{}\"", path.display())
}

// "src/a.c" -> "src/a.c.o"
fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut os = path.to_path_buf().into_os_string();
    os.push(extension);
    PathBuf::from(os)
}

impl ToolchainProvider for GccLikeToolchain {
    fn name(&self) -> &str {
        "gcc-like"
    }

    fn compiler(&self, _project: &Project, _resolved: &OptionCollection, _offset: &Path) -> String {
        self.compiler.clone()
    }

    fn common_compiler_flags(
        &self,
        _project: &Project,
        resolved: &OptionCollection,
        path_offset: &Path,
    ) -> String {
        let mut flags = String::new();

        for define in resolved.slice(DEFINES) {
            flags += &format!(" -D\"{define}\"");
        }
        for path in resolved.slice(INCLUDE_PATHS) {
            flags += &format!(" -I{}", quoted(&paths::offset_path(path_offset, path)));
        }
        if resolved.value(PLATFORM) == "x64" {
            flags += " -m64";
        }

        for feature in resolved.slice(FEATURES) {
            flags += match feature.as_str() {
                "c++17" => " -std=c++17",
                "c++20" => " -std=c++20",
                "libc++" => " -stdlib=libc++",
                "optimize" => " -O3",
                "debuginfo" => " -g",
                "warnings" => " -Wall",
                _ => "",
            };
        }

        flags
    }

    fn compiler_flags(
        &self,
        _project: &Project,
        _resolved: &OptionCollection,
        _offset: &Path,
        input: &str,
        output: &str,
    ) -> String {
        format!(" -MMD -MF {output}.d -c -o {output} {input}")
    }

    fn linker(&self, project: &Project, _resolved: &OptionCollection, _offset: &Path) -> String {
        if project.ty == Some(ProjectType::StaticLib) {
            self.archiver.clone()
        } else {
            self.linker.clone()
        }
    }

    fn common_linker_flags(
        &self,
        project: &Project,
        resolved: &OptionCollection,
        path_offset: &Path,
    ) -> Result<String> {
        let mut flags = String::new();

        match project.ty {
            Some(ProjectType::StaticLib) => {
                flags += " -rcs";
            }
            Some(ProjectType::Executable) | Some(ProjectType::SharedLib) => {
                for path in resolved.slice(LIBS) {
                    flags += &format!(" {}", paths::offset_path(path_offset, path).display());
                }
                for framework in resolved.slice(FRAMEWORKS) {
                    flags += &format!(" -framework {framework}");
                }
                if project.ty == Some(ProjectType::SharedLib) {
                    if resolved.slice(FEATURES).iter().any(|f| f == "bundle") {
                        flags += " -bundle";
                    } else {
                        flags += " -shared";
                    }
                }
            }
            _ => bail!(
                "Project type in '{}' not supported by toolchain.",
                project.name
            ),
        }

        Ok(flags)
    }

    fn linker_flags(
        &self,
        project: &Project,
        _resolved: &OptionCollection,
        _offset: &Path,
        inputs: &[String],
        output: &str,
    ) -> Result<String> {
        let mut flags = String::new();

        match project.ty {
            Some(ProjectType::StaticLib) => {
                flags += &format!(" \"{output}\"");
                for input in inputs {
                    flags += &format!(" \"{input}\"");
                }
            }
            Some(ProjectType::Executable) | Some(ProjectType::SharedLib) => {
                flags += &format!(" -o \"{output}\"");
                for input in inputs {
                    flags += &format!(" \"{input}\"");
                }
            }
            _ => bail!(
                "Project type in '{}' not supported by toolchain.",
                project.name
            ),
        }

        Ok(flags)
    }

    fn process(
        &self,
        project: &mut Project,
        resolved: &mut OptionCollection,
        config: StringId,
        working_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        if !matches!(
            project.ty,
            Some(ProjectType::Executable) | Some(ProjectType::SharedLib)
                | Some(ProjectType::StaticLib)
        ) {
            return Ok(Vec::new());
        }

        let path_offset = paths::path_offset(working_dir)
            .with_context(|| format!("Failed to locate '{}'", working_dir.display()))?;
        let data_dir: PathBuf = resolved.value(DATA_DIR);
        self.apply_output_defaults(project, resolved, &data_dir);

        let compiler = self.compiler(project, resolved, &path_offset);
        let mut common_compiler_flags = self.common_compiler_flags(project, resolved, &path_offset);
        let linker = self.linker(project, resolved, &path_offset);
        let common_linker_flags = self.common_linker_flags(project, resolved, &path_offset)?;

        let build_pch: PathBuf = resolved.value(BUILD_PCH);
        if !build_pch.as_os_str().is_empty() {
            let input_str = paths::offset_path(&path_offset, &build_pch).display().to_string();
            let output = data_dir
                .join("pch")
                .join(append_extension(&build_pch, ".pch"));
            let output_str = paths::offset_path(&path_offset, &output).display().to_string();

            resolved.push(
                COMMANDS,
                CommandEntry {
                    command: format!(
                        "{compiler}{common_compiler_flags} -x c++-header -Xclang -emit-pch{}",
                        self.compiler_flags(project, resolved, &path_offset, &input_str, &output_str)
                    ),
                    inputs: vec![build_pch.clone()],
                    depfile: Some(append_extension(&output, ".d")),
                    description: format!(
                        "Compiling {} PCH: {}",
                        project.name,
                        build_pch.display()
                    ),
                    outputs: vec![output],
                    working_directory: working_dir.to_path_buf(),
                },
            );
        }

        let mut pch_inputs = Vec::new();
        let import_pch: PathBuf = resolved.value(IMPORT_PCH);
        if !import_pch.as_os_str().is_empty() {
            let input = data_dir
                .join("pch")
                .join(append_extension(&import_pch, ".pch"));
            let input_str = paths::offset_path(&path_offset, &input).display().to_string();
            common_compiler_flags += &format!(" -Xclang -include-pch -Xclang {input_str}");
            pch_inputs.push(input);
        }

        let mut linker_inputs = Vec::new();
        for input in resolved.slice(FILES).to_vec() {
            let recognized = input
                .extension()
                .map(|ext| SOURCE_EXTENSIONS.iter().any(|known| ext == *known))
                .unwrap_or(false);
            if !recognized {
                continue;
            }

            let input_str = paths::offset_path(&path_offset, &input).display().to_string();
            let output = data_dir
                .join("obj")
                .join(&project.name)
                .join(append_extension(&input, ".o"));
            let output_str = paths::offset_path(&path_offset, &output).display().to_string();

            let mut inputs = vec![input.clone()];
            inputs.extend(pch_inputs.iter().cloned());

            resolved.push(
                COMMANDS,
                CommandEntry {
                    command: format!(
                        "{compiler}{common_compiler_flags}{}",
                        self.compiler_flags(project, resolved, &path_offset, &input_str, &output_str)
                    ),
                    inputs,
                    depfile: Some(append_extension(&output, ".d")),
                    description: format!("Compiling {}: {}", project.name, input.display()),
                    outputs: vec![output.clone()],
                    working_directory: working_dir.to_path_buf(),
                },
            );

            linker_inputs.push(output);
        }

        if project.ty == Some(ProjectType::StaticLib) && linker_inputs.is_empty() {
            bail!("Static library '{}' has no inputs.", project.name);
        }

        linker_inputs.extend(resolved.slice(LINKED_OUTPUTS).iter().cloned());

        let linker_input_strs: Vec<String> = linker_inputs
            .iter()
            .map(|input| paths::offset_path(&path_offset, input).display().to_string())
            .collect();

        let output = project.output_path(resolved);
        let output_str = paths::offset_path(&path_offset, &output).display().to_string();

        resolved.push(
            COMMANDS,
            CommandEntry {
                command: format!(
                    "{linker}{common_linker_flags}{}",
                    self.linker_flags(
                        project,
                        resolved,
                        &path_offset,
                        &linker_input_strs,
                        &output_str
                    )?
                ),
                inputs: linker_inputs,
                outputs: vec![output.clone()],
                working_directory: working_dir.to_path_buf(),
                depfile: None,
                description: format!("Linking {}: {}", project.name, output.display()),
            },
        );

        // Dependents resolving against this config pick the archive up as a
        // linker input of their own.
        if project.ty == Some(ProjectType::StaticLib) {
            project
                .config(Selector::from(Transitivity::Public).and(Selector::from(config)))
                .push(LINKED_OUTPUTS, output.clone());
        }

        Ok(vec![output])
    }
}
