//! compile_commands.json emitter for clangd and friends.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::emit::{prepare, EmitContext, Emitter};
use crate::environment::Environment;

#[derive(Serialize)]
struct CompileCommand {
    directory: String,
    command: String,
    file: String,
}

pub struct CompileCommandsEmitter;

impl Emitter for CompileCommandsEmitter {
    fn name(&self) -> &'static str {
        "compile_commands"
    }

    fn help(&self) -> &'static str {
        "Emit a compile_commands.json database into the given directory"
    }

    fn emit(&self, env: &mut Environment, ctx: &EmitContext) -> Result<()> {
        let prepared = prepare(env, ctx, &[])?;

        let mut entries = Vec::new();
        for project in &prepared {
            for command in project.commands() {
                // Compile steps carry a depfile and lead with their source
                // file; the remaining inputs are implicit (PCH).
                let Some(input) = command.inputs.first() else {
                    continue;
                };
                if command.depfile.is_none() || !is_source(input) {
                    continue;
                }
                let directory = if command.working_directory.as_os_str().is_empty() {
                    ".".to_string()
                } else {
                    command.working_directory.display().to_string()
                };
                entries.push(CompileCommand {
                    directory,
                    command: command.command.clone(),
                    file: input.display().to_string(),
                });
            }
        }

        let path = ctx.target_path.join("compile_commands.json");
        let json = serde_json::to_string_pretty(&entries)?;
        fs::write(&path, json).with_context(|| format!("Failed to write '{}'", path.display()))
    }
}

fn is_source(path: &Path) -> bool {
    path.extension()
        .map(|ext| ["c", "cpp", "cc", "cxx", "mm"].iter().any(|known| ext == *known))
        .unwrap_or(false)
}
