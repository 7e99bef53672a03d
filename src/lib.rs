//! # gantry - Programmatic Build Definitions
//!
//! gantry expresses build configurations as imperative construction of
//! typed project graphs, then resolves them into concrete command DAGs that
//! are either emitted as build files (ninja, compile_commands.json) or
//! executed directly by the in-process incremental builder.
//!
//! ## Quick Start
//!
//! A build description is a small Rust program:
//!
//! ```no_run
//! use gantry::options::*;
//! use gantry::{Environment, ProjectType, Transitivity};
//!
//! fn main() {
//!     let mut env = Environment::new();
//!     env.configuration("debug");
//!     env.configuration("release");
//!
//!     let lib = env.project("Lib", ProjectType::StaticLib);
//!     env[lib].config(Transitivity::Public).push(INCLUDE_PATHS, "lib/include");
//!     env[lib].push(FILES, "lib/a.c");
//!
//!     let app = env.project("App", ProjectType::Executable);
//!     env[app].link(lib);
//!     env[app].push(FILES, "app.c");
//!
//!     if let Err(err) = gantry::run(&mut env) {
//!         eprintln!("ERROR: {err:#}");
//!         std::process::exit(1);
//!     }
//! }
//! ```
//!
//! Running it with `--build=out --config=debug` compiles and links
//! incrementally; `--ninja=out` writes ninja manifests instead.
//!
//! ## Module Organization
//!
//! - [`options`] - Heterogeneously-typed option collections with
//!   combine/deduplicate semantics
//! - [`project`] - Projects, selectors and transitivity
//! - [`environment`] - The project graph owner and resolution algorithm
//! - [`toolchain`] - Translating resolved projects into commands
//! - [`emit`] - Emitter registry, ninja and compile_commands backends
//! - [`build`] - The direct in-process builder

/// The direct in-process builder.
pub mod build;

/// Command-line parsing with dynamically registered emitter flags.
pub mod cli;

/// Command entries and small command constructors.
pub mod command;

/// The environment owning projects, configurations and registries.
pub mod environment;

/// Emitter interface and the file-writing backends.
pub mod emit;

/// The typed option/property system.
pub mod options;

/// Path arithmetic for offset-relative command lines.
pub mod paths;

/// Post-processors mutating resolved options before emission.
pub mod postprocess;

/// Projects, selectors, transitivity and project types.
pub mod project;

/// Source tree enumeration helpers.
pub mod sources;

/// Interned strings underpinning option keys and configuration names.
pub mod stringid;

/// Toolchain interface and the default GCC/clang-like toolchain.
pub mod toolchain;

pub use command::CommandEntry;
pub use environment::{Environment, GeneratorInfo};
pub use options::{OptionCollection, OptionDef};
pub use postprocess::PostProcessor;
pub use project::{OperatingSystem, Project, ProjectId, ProjectType, Selector, Transitivity};
pub use stringid::StringId;

use anyhow::{bail, Result};

/// Entry point for build descriptions: parses the command line, then
/// dispatches every selected emitter over the selected configurations.
/// Errors propagate out so the caller can print them and exit non-zero.
pub fn run(env: &mut Environment) -> Result<()> {
    run_with_args(env, std::env::args().skip(1))
}

/// [`run`] with an explicit argument list (no binary name).
pub fn run_with_args<I>(env: &mut Environment, args: I) -> Result<()>
where
    I: IntoIterator<Item = String>,
{
    let descriptors: Vec<(String, String)> = env
        .emitters()
        .iter()
        .map(|emitter| (emitter.name().to_string(), emitter.help().to_string()))
        .collect();

    let Some(parsed) = cli::parse(&descriptors, args)? else {
        return Ok(());
    };

    if env.configurations().is_empty() {
        bail!("No configurations available.");
    }
    if parsed.emitters.is_empty() {
        bail!("No emitters specified. Run with --help to list the available emitters.");
    }

    let configs: Vec<StringId> = match &parsed.config {
        Some(name) => {
            let id = StringId::new(name);
            if !env.configurations().contains(&id) {
                bail!("Unknown configuration '{name}'.");
            }
            vec![id]
        }
        None => env.configurations().to_vec(),
    };

    for (name, dir) in &parsed.emitters {
        let Some(emitter) = env.find_emitter(name) else {
            bail!("Unknown emitter '{name}'.");
        };
        for &config in &configs {
            let ctx = emit::EmitContext {
                target_path: dir.join(config.as_str()),
                config,
                jobs: parsed.jobs,
            };
            emitter.emit(env, &ctx)?;
        }
    }

    Ok(())
}
