//! In-process executor: collects every command, builds the dependency DAG
//! keyed on output paths, computes the dirty frontier from mtimes and
//! depfiles, and runs it with bounded parallelism.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use anyhow::{bail, Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::build::{depfile, runner};
use crate::emit::{prepare, EmitContext, Emitter, PreparedProject};
use crate::environment::Environment;

pub struct DirectBuilder;

impl Emitter for DirectBuilder {
    fn name(&self) -> &'static str {
        "build"
    }

    fn help(&self) -> &'static str {
        "Build directly, writing artifacts into the given directory"
    }

    fn emit(&self, env: &mut Environment, ctx: &EmitContext) -> Result<()> {
        let start_time = Instant::now();

        let generator_outputs: Vec<PathBuf> = env
            .generator()
            .map(|info| vec![info.output.clone()])
            .unwrap_or_default();
        let prepared = prepare(env, ctx, &generator_outputs)?;

        let mut commands = collect_commands(&prepared);
        let order = process_commands(&mut commands)?;
        compute_dirty(&mut commands, &order);

        let dirty: Vec<usize> = order
            .iter()
            .copied()
            .filter(|&index| commands[index].dirty)
            .collect();

        if dirty.is_empty() {
            println!("{} Up to date", "⚡".green());
            return Ok(());
        }

        run_commands(&commands, &dirty, ctx.jobs)?;

        println!(
            "{} Build finished in {:.2?}",
            "✓".green(),
            start_time.elapsed()
        );
        Ok(())
    }
}

struct PendingCommand {
    command: String,
    inputs: Vec<PathBuf>,
    outputs: Vec<PathBuf>,
    depfile: Option<PathBuf>,
    description: String,
    dependencies: Vec<usize>,
    depth: usize,
    dirty: bool,
}

/// Flattens every command entry from every project into schedulable
/// records, baking the working directory into the shell line.
fn collect_commands(prepared: &[PreparedProject]) -> Vec<PendingCommand> {
    let mut commands = Vec::new();
    for project in prepared {
        for entry in project.commands() {
            let cwd = if entry.working_directory.as_os_str().is_empty() {
                Path::new(".")
            } else {
                &entry.working_directory
            };
            commands.push(PendingCommand {
                command: format!("cd \"{}\" && {}", cwd.display(), entry.command),
                inputs: entry.inputs.clone(),
                outputs: entry.outputs.clone(),
                depfile: entry.depfile.clone(),
                description: entry.description.clone(),
                dependencies: Vec::new(),
                depth: 0,
                dirty: false,
            });
        }
    }
    commands
}

/// Wires inputs to producing commands, assigns topological depths and
/// returns the execution order (descending depth, producers first).
fn process_commands(commands: &mut [PendingCommand]) -> Result<Vec<usize>> {
    let mut producers: HashMap<PathBuf, usize> = HashMap::new();
    for (index, command) in commands.iter().enumerate() {
        for output in &command.outputs {
            if producers.insert(output.clone(), index).is_some() {
                bail!("Multiple commands produce '{}'.", output.display());
            }
        }
    }

    for index in 0..commands.len() {
        let mut dependencies = Vec::new();
        for input in &commands[index].inputs {
            if let Some(&producer) = producers.get(input) {
                if producer != index {
                    dependencies.push(producer);
                }
            }
        }
        dependencies.sort_unstable();
        dependencies.dedup();
        commands[index].dependencies = dependencies;
    }

    // Iterative relaxation: every dependency sits at least one level above
    // its dependent. A depth exceeding the command count means the walk
    // went around a cycle.
    let count = commands.len();
    let mut stack: Vec<usize> = Vec::new();
    for root in 0..count {
        stack.push(root);
        while let Some(index) = stack.pop() {
            let next_depth = commands[index].depth + 1;
            for position in 0..commands[index].dependencies.len() {
                let dep = commands[index].dependencies[position];
                if commands[dep].depth < next_depth {
                    if next_depth > count {
                        bail!(
                            "Dependency cycle detected involving '{}'.",
                            commands[index].description
                        );
                    }
                    commands[dep].depth = next_depth;
                    stack.push(dep);
                }
            }
        }
    }

    let mut order: Vec<usize> = (0..count).collect();
    order.sort_by(|&a, &b| commands[b].depth.cmp(&commands[a].depth));
    Ok(order)
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

/// Walks the execution order (deepest first, so dependencies are decided
/// before their dependents) and marks everything that must run.
fn compute_dirty(commands: &mut [PendingCommand], order: &[usize]) {
    for &index in order {
        let dirty = {
            let command = &commands[index];
            if command.dependencies.iter().any(|&dep| commands[dep].dirty) {
                true
            } else {
                is_stale(command)
            }
        };
        commands[index].dirty = dirty;
    }
}

fn is_stale(command: &PendingCommand) -> bool {
    // The oldest output bounds everything the command consumed.
    let mut output_time: Option<SystemTime> = None;
    for output in &command.outputs {
        match modified(output) {
            None => return true,
            Some(time) => {
                output_time = Some(match output_time {
                    None => time,
                    Some(previous) => previous.min(time),
                });
            }
        }
    }
    let Some(output_time) = output_time else {
        // No outputs declared; always run.
        return true;
    };

    for input in &command.inputs {
        match modified(input) {
            // A missing input is "dirty", not an error: the command may be
            // the one that creates it.
            None => return true,
            Some(time) if time > output_time => return true,
            Some(_) => {}
        }
    }

    if let Some(depfile) = &command.depfile {
        let Ok(content) = fs::read_to_string(depfile) else {
            return true;
        };
        let Some(discovered) = depfile::parse(&content) else {
            return true;
        };
        for input in discovered {
            match modified(&input) {
                None => return true,
                Some(time) if time > output_time => return true,
                Some(_) => {}
            }
        }
    }

    false
}

/// Executes the dirty commands stratum by stratum. Commands at equal depth
/// are independent by construction, so each stratum fans out over the
/// worker pool; a dependency always sits in an earlier stratum.
fn run_commands(commands: &[PendingCommand], dirty: &[usize], jobs: Option<usize>) -> Result<()> {
    let jobs = jobs
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
        .max(1);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to create worker pool")?;

    let progress_style = ProgressStyle::with_template("[{pos}/{len}] {wide_msg}").unwrap();
    let progress = ProgressBar::new(dirty.len() as u64);
    progress.set_style(progress_style);

    let mut remaining = dirty;
    while !remaining.is_empty() {
        let depth = commands[remaining[0]].depth;
        let split = remaining
            .iter()
            .position(|&index| commands[index].depth != depth)
            .unwrap_or(remaining.len());
        let (stratum, rest) = remaining.split_at(split);
        remaining = rest;

        pool.install(|| {
            stratum
                .par_iter()
                .map(|&index| execute_one(&commands[index], &progress))
                .collect::<Result<Vec<_>>>()
        })?;
    }

    progress.finish_and_clear();
    Ok(())
}

fn execute_one(command: &PendingCommand, progress: &ProgressBar) -> Result<()> {
    progress.set_message(command.description.clone());

    for output in &command.outputs {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create '{}'", parent.display()))?;
            }
        }
    }

    let result = runner::run_command(&command.command)?;

    if !result.success() {
        progress.println(format!(
            "{} {}\n{}",
            "x".red(),
            command.description,
            result.output
        ));
        bail!("Command failed: {}", command.description);
    }

    // Compiler warnings and the like; keep them visible above the
    // progress line.
    if !result.output.trim().is_empty() {
        progress.println(format!(
            "{} {}\n{}",
            "!".yellow(),
            command.description,
            result.output
        ));
    }

    progress.inc(1);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(
        name: &str,
        inputs: &[&str],
        outputs: &[&str],
    ) -> PendingCommand {
        PendingCommand {
            command: String::new(),
            inputs: inputs.iter().map(PathBuf::from).collect(),
            outputs: outputs.iter().map(PathBuf::from).collect(),
            depfile: None,
            description: name.to_string(),
            dependencies: Vec::new(),
            depth: 0,
            dirty: false,
        }
    }

    #[test]
    fn duplicate_outputs_are_rejected() {
        let mut commands = vec![
            pending("first", &[], &["same.o"]),
            pending("second", &[], &["same.o"]),
        ];
        let err = process_commands(&mut commands).unwrap_err();
        assert!(err.to_string().contains("Multiple commands produce"));
    }

    #[test]
    fn depth_respects_dependencies() {
        // link <- compile <- (nothing); producers must sort first.
        let mut commands = vec![
            pending("link", &["a.o", "b.o"], &["app"]),
            pending("compile a", &["a.c"], &["a.o"]),
            pending("compile b", &["b.c"], &["b.o"]),
        ];
        let order = process_commands(&mut commands).unwrap();

        assert_eq!(commands[0].dependencies, [1, 2]);
        for &dep in &commands[0].dependencies {
            assert!(commands[dep].depth >= commands[0].depth + 1);
        }
        // The link step comes last in execution order.
        assert_eq!(*order.last().unwrap(), 0);
    }

    #[test]
    fn deep_chains_stack_up() {
        let mut commands = vec![
            pending("c", &["b"], &["c"]),
            pending("a", &[], &["a"]),
            pending("b", &["a"], &["b"]),
        ];
        let order = process_commands(&mut commands).unwrap();
        let names: Vec<&str> = order
            .iter()
            .map(|&i| commands[i].description.as_str())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn cycles_are_fatal() {
        let mut commands = vec![
            pending("a", &["y"], &["x"]),
            pending("b", &["x"], &["y"]),
        ];
        let err = process_commands(&mut commands).unwrap_err();
        assert!(err.to_string().contains("Dependency cycle"));
    }

    #[test]
    fn missing_outputs_mark_dirty_and_propagate() {
        let scratch = std::env::temp_dir().join(".gantry_dirty_test");
        let _ = fs::remove_dir_all(&scratch);
        fs::create_dir_all(&scratch).unwrap();

        let existing = scratch.join("existing");
        fs::write(&existing, "x").unwrap();
        let missing = scratch.join("missing");

        let mut commands = vec![
            pending(
                "consumer",
                &[missing.to_str().unwrap()],
                &[existing.to_str().unwrap()],
            ),
            pending("producer", &[], &[missing.to_str().unwrap()]),
        ];
        let order = process_commands(&mut commands).unwrap();
        compute_dirty(&mut commands, &order);

        // The producer's output does not exist, so it is dirty; the
        // consumer inherits the flag even though its own output exists.
        assert!(commands[1].dirty);
        assert!(commands[0].dirty);

        fs::remove_dir_all(&scratch).unwrap();
    }

    #[test]
    fn up_to_date_command_stays_clean() {
        let scratch = std::env::temp_dir().join(".gantry_clean_test");
        let _ = fs::remove_dir_all(&scratch);
        fs::create_dir_all(&scratch).unwrap();

        let input = scratch.join("input");
        fs::write(&input, "in").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let output = scratch.join("output");
        fs::write(&output, "out").unwrap();

        let mut commands = vec![pending(
            "copy",
            &[input.to_str().unwrap()],
            &[output.to_str().unwrap()],
        )];
        let order = process_commands(&mut commands).unwrap();
        compute_dirty(&mut commands, &order);
        assert!(!commands[0].dirty);

        // Touch the input; the command must become dirty again.
        std::thread::sleep(std::time::Duration::from_millis(20));
        fs::write(&input, "changed").unwrap();
        compute_dirty(&mut commands, &order);
        assert!(commands[0].dirty);

        fs::remove_dir_all(&scratch).unwrap();
    }

    #[test]
    fn depfile_inputs_participate_in_dirty_checks() {
        let scratch = std::env::temp_dir().join(".gantry_depfile_test");
        let _ = fs::remove_dir_all(&scratch);
        fs::create_dir_all(&scratch).unwrap();

        let source = scratch.join("a.c");
        let header = scratch.join("a.h");
        fs::write(&source, "s").unwrap();
        fs::write(&header, "h").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let object = scratch.join("a.o");
        fs::write(&object, "o").unwrap();
        let dep = scratch.join("a.o.d");
        fs::write(
            &dep,
            format!("{}: {} {}\n", object.display(), source.display(), header.display()),
        )
        .unwrap();

        let mut commands = vec![PendingCommand {
            depfile: Some(dep.clone()),
            ..pending("compile", &[source.to_str().unwrap()], &[object.to_str().unwrap()])
        }];
        let order = process_commands(&mut commands).unwrap();
        compute_dirty(&mut commands, &order);
        assert!(!commands[0].dirty);

        // Touching the discovered header dirties the compile even though
        // the declared input is unchanged.
        std::thread::sleep(std::time::Duration::from_millis(20));
        fs::write(&header, "changed").unwrap();
        compute_dirty(&mut commands, &order);
        assert!(commands[0].dirty);

        // A garbled depfile degrades to "dirty", never an error.
        fs::write(&dep, "").unwrap();
        compute_dirty(&mut commands, &order);
        assert!(commands[0].dirty);

        fs::remove_dir_all(&scratch).unwrap();
    }
}
