//! Emitters: backends that consume resolved projects.
//!
//! The shared [`prepare`] pass turns the environment's project graph into a
//! list of [`PreparedProject`]s (resolved, post-processed and run through
//! the toolchain) which each backend then serializes or executes.

mod compile_commands;
mod ninja;

pub use compile_commands::CompileCommandsEmitter;
pub use ninja::NinjaEmitter;

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::*;

use crate::command::CommandEntry;
use crate::environment::Environment;
use crate::options::{
    OptionCollection, COMMANDS, DATA_DIR, GENERATOR_DEPENDENCIES, POST_PROCESS, TOOLCHAIN,
};
use crate::project::ProjectType;
use crate::stringid::StringId;

/// A backend registered with the environment and selectable from the
/// command line as `--<name>[=dir]`.
pub trait Emitter {
    fn name(&self) -> &'static str;

    /// One-line help text shown by `--help`.
    fn help(&self) -> &'static str;

    fn emit(&self, env: &mut Environment, ctx: &EmitContext) -> Result<()>;
}

/// Parameters for one emitter dispatch.
pub struct EmitContext {
    /// Directory the backend writes into (or builds into).
    pub target_path: PathBuf,
    /// The configuration being emitted.
    pub config: StringId,
    /// Concurrency override for executing backends.
    pub jobs: Option<usize>,
}

/// One project after resolution, post-processing and toolchain processing.
#[derive(Debug)]
pub struct PreparedProject {
    pub name: String,
    pub ty: Option<ProjectType>,
    pub options: OptionCollection,
    /// Final artifact paths reported by the toolchain.
    pub outputs: Vec<PathBuf>,
    pub is_generator: bool,
}

impl PreparedProject {
    pub fn commands(&self) -> &[CommandEntry] {
        self.options.slice(COMMANDS)
    }
}

/// Resolves every project in dependency-first order and runs the shared
/// emit pipeline. `generator_outputs` names the artifacts the synthetic
/// `_generator` command refreshes; it is appended last when the environment
/// carries bootstrapper info.
pub fn prepare(
    env: &mut Environment,
    ctx: &EmitContext,
    generator_outputs: &[PathBuf],
) -> Result<Vec<PreparedProject>> {
    fs::create_dir_all(&ctx.target_path)
        .with_context(|| format!("Failed to create '{}'", ctx.target_path.display()))?;

    let mut prepared = Vec::new();
    let mut generator_deps: Vec<PathBuf> = Vec::new();

    for id in env.discover_order() {
        let ty = env.get(id).ty;
        let mut resolved = env.resolve(id, ty, ctx.config, env.target_os)?;
        resolved.set(DATA_DIR, ctx.target_path.clone());

        // Index-based on purpose: a post-processor may append further
        // post-processors, which must run in this same pass.
        let mut index = 0;
        loop {
            let Some(processor) = resolved.slice(POST_PROCESS).get(index).cloned() else {
                break;
            };
            processor.run(env.get(id), &mut resolved)?;
            index += 1;
        }

        generator_deps.extend(resolved.slice(GENERATOR_DEPENDENCIES).iter().cloned());

        let Some(ty) = ty else {
            // Configuration-only node; nothing to emit.
            continue;
        };

        let name = env.get(id).name.clone();
        if name.is_empty() {
            bail!("Trying to emit project with no name.");
        }

        if ctx.config.is_empty() {
            println!("{} Emitting '{}'", "▸".cyan(), name);
        } else {
            println!("{} Emitting '{}' ({})", "▸".cyan(), name, ctx.config);
        }

        let toolchain_ref = resolved
            .get(TOOLCHAIN)
            .copied()
            .unwrap_or_else(|| env.default_toolchain());
        let Some(toolchain) = env.toolchain(toolchain_ref) else {
            bail!("No toolchain registered for project '{}'.", name);
        };

        let outputs = toolchain.process(env.get_mut(id), &mut resolved, ctx.config, &ctx.target_path)?;

        if ty == ProjectType::Command && resolved.slice(COMMANDS).is_empty() {
            bail!("Command project '{}' has no commands.", name);
        }

        prepared.push(PreparedProject {
            name,
            ty: Some(ty),
            options: resolved,
            outputs,
            is_generator: false,
        });
    }

    if let Some(info) = env.generator() {
        let mut command = info.regen_command.clone();
        if !info.args.is_empty() {
            command += " ";
            command += &info.args.join(" ");
        }

        let mut inputs = generator_deps;
        inputs.push(info.build_file.clone());

        let mut options = OptionCollection::new();
        options.push(
            COMMANDS,
            CommandEntry {
                command,
                inputs,
                outputs: generator_outputs.to_vec(),
                working_directory: info.start_dir.clone(),
                depfile: None,
                description: "Regenerating build files.".to_string(),
            },
        );

        prepared.push(PreparedProject {
            name: "_generator".to_string(),
            ty: Some(ProjectType::Command),
            options,
            outputs: Vec::new(),
            is_generator: true,
        });
    }

    Ok(prepared)
}
