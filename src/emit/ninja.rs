//! Ninja manifest emitter: one `build.ninja` pulling in one
//! `<project>.ninja` per project.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::emit::{prepare, EmitContext, Emitter, PreparedProject};
use crate::environment::Environment;
use crate::paths;

pub struct NinjaEmitter;

impl Emitter for NinjaEmitter {
    fn name(&self) -> &'static str {
        "ninja"
    }

    fn help(&self) -> &'static str {
        "Emit ninja build files into the given directory"
    }

    fn emit(&self, env: &mut Environment, ctx: &EmitContext) -> Result<()> {
        let manifest = ctx.target_path.join("build.ninja");
        let prepared = prepare(env, ctx, &[manifest.clone()])?;
        let offset = paths::path_offset(&ctx.target_path)?;
        let has_generator = prepared.iter().any(|p| p.is_generator);

        let mut root = NinjaFile::new();
        for project in &prepared {
            if project.commands().is_empty() && project.outputs.is_empty() {
                continue;
            }
            let file_name = format!("{}.ninja", project.name);
            emit_project(project, &ctx.target_path.join(&file_name), &offset, has_generator)?;
            root.subninja(&file_name);
        }
        root.write_to(&manifest)
    }
}

fn emit_project(
    project: &PreparedProject,
    path: &Path,
    offset: &Path,
    has_generator: bool,
) -> Result<()> {
    let mut ninja = NinjaFile::new();

    let mut prologue = String::new();
    if cfg!(target_os = "windows") {
        prologue += "cmd /c ";
    }
    prologue += "cd \"$cwd\" && ";
    ninja.rule("command", &(prologue + "$cmd"), "$depfile", "$desc");

    let offset_str = |p: &Path| paths::offset_path(offset, p).display().to_string();
    let mut project_outputs: Vec<String> = project.outputs.iter().map(|p| offset_str(p)).collect();

    for command in project.commands() {
        let cwd = if command.working_directory.as_os_str().is_empty() {
            Path::new(".")
        } else {
            &command.working_directory
        };

        let inputs: Vec<String> = command.inputs.iter().map(|p| offset_str(p)).collect();
        let outputs: Vec<String> = command.outputs.iter().map(|p| offset_str(p)).collect();
        project_outputs.extend(outputs.iter().cloned());

        let mut variables = vec![
            ("cmd".to_string(), command.command.clone()),
            ("cwd".to_string(), offset_str(cwd)),
        ];
        if let Some(depfile) = &command.depfile {
            variables.push(("depfile".to_string(), offset_str(depfile)));
        }
        if !command.description.is_empty() {
            variables.push(("desc".to_string(), command.description.clone()));
        }
        if project.is_generator {
            variables.push(("generator".to_string(), "1".to_string()));
        }

        // Everything except the generator itself waits for regenerated
        // build files via an order-only edge.
        let order_deps: &[&str] = if has_generator && !project.is_generator {
            &["_generator"]
        } else {
            &[]
        };

        ninja.build(&outputs, "command", &inputs, order_deps, &variables);
    }

    let mut seen = std::collections::HashSet::new();
    project_outputs.retain(|output| seen.insert(output.clone()));
    if !project_outputs.is_empty() {
        ninja.phony(&project.name, &project_outputs);
    }

    ninja.write_to(path)
}

/// Minimal ninja-syntax writer.
struct NinjaFile {
    buffer: String,
}

impl NinjaFile {
    fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    fn subninja(&mut self, name: &str) {
        let _ = writeln!(self.buffer, "subninja {name}");
    }

    fn rule(&mut self, name: &str, command: &str, depfile: &str, description: &str) {
        let _ = writeln!(self.buffer, "rule {name}");
        let _ = writeln!(self.buffer, "  command = {command}");
        if !depfile.is_empty() {
            let _ = writeln!(self.buffer, "  depfile = {depfile}");
        }
        if !description.is_empty() {
            let _ = writeln!(self.buffer, "  description = {description}");
        }
        let _ = writeln!(self.buffer);
    }

    fn build(
        &mut self,
        outputs: &[String],
        rule: &str,
        inputs: &[String],
        order_deps: &[&str],
        variables: &[(String, String)],
    ) {
        let _ = write!(self.buffer, "build {}: {rule}", outputs.join(" "));
        if !inputs.is_empty() {
            let _ = write!(self.buffer, " {}", inputs.join(" "));
        }
        if !order_deps.is_empty() {
            let _ = write!(self.buffer, " || {}", order_deps.join(" "));
        }
        let _ = writeln!(self.buffer);
        for (name, value) in variables {
            let _ = writeln!(self.buffer, "  {name} = {value}");
        }
        let _ = writeln!(self.buffer);
    }

    fn phony(&mut self, name: &str, inputs: &[String]) {
        let _ = writeln!(self.buffer, "build {name}: phony {}", inputs.join(" "));
        let _ = writeln!(self.buffer);
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, &self.buffer)
            .with_context(|| format!("Failed to write '{}'", path.display()))
    }
}
