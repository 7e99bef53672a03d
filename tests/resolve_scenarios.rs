//! End-to-end resolution scenarios through the public API.

use std::path::PathBuf;
use std::sync::Arc;

use gantry::emit::{prepare, EmitContext};
use gantry::options::*;
use gantry::toolchain::GccLikeToolchain;
use gantry::{Environment, OperatingSystem, ProjectType, Selector, StringId, Transitivity};

fn scratch_root(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join(".tmp_gantry_tests")
        .join("resolve")
        .join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn test_env() -> Environment {
    let mut env = Environment::bare();
    env.add_toolchain(Arc::new(GccLikeToolchain::new("clang++", "clang++", "ar")));
    env.configuration("debug");
    env.target_os = OperatingSystem::Linux;
    env
}

#[test]
fn transitive_include_paths_and_linked_outputs() {
    let mut env = test_env();

    let lib = env.project("Lib", ProjectType::StaticLib);
    env[lib]
        .config(Transitivity::Public)
        .push(INCLUDE_PATHS, "lib/include");
    env[lib].push(FILES, "lib/a.c");

    let app = env.project("App", ProjectType::Executable);
    env[app].link(lib);
    env[app].push(FILES, "app.c");

    let target = scratch_root("transitive");
    let ctx = EmitContext {
        target_path: target.clone(),
        config: StringId::new("debug"),
        jobs: None,
    };
    let prepared = prepare(&mut env, &ctx, &[]).unwrap();

    // Lib is processed first (links-first order), planting its archive for
    // App's resolution to pick up.
    assert_eq!(prepared[0].name, "Lib");
    assert_eq!(prepared[1].name, "App");

    let app_options = &prepared[1].options;
    assert_eq!(
        app_options.slice(INCLUDE_PATHS),
        [PathBuf::from("lib/include")]
    );
    assert_eq!(
        app_options.slice(LINKED_OUTPUTS),
        [target.join("libLib.a")]
    );

    // App's link command consumes the archive.
    let link = app_options.slice(COMMANDS).last().unwrap().clone();
    assert!(link.inputs.contains(&target.join("libLib.a")));

    let _ = std::fs::remove_dir_all(&target);
}

#[test]
fn selector_precedence_across_configs() {
    let mut env = test_env();
    env.configuration("release");

    let p = env.project("P", ProjectType::StaticLib);
    env[p].push(DEFINES, "X");
    env[p].config("debug").push(DEFINES, "Y");
    env[p]
        .config(Selector::from(Transitivity::Public).and("release"))
        .push(DEFINES, "Z");

    let resolved = env
        .resolve(
            p,
            Some(ProjectType::StaticLib),
            StringId::new("debug"),
            OperatingSystem::Linux,
        )
        .unwrap();
    assert_eq!(resolved.slice(DEFINES), ["X", "Y"]);

    let dependent = env.project("Dep", ProjectType::Executable);
    env[dependent].link(p);
    let resolved = env
        .resolve(
            dependent,
            Some(ProjectType::Executable),
            StringId::new("release"),
            OperatingSystem::Linux,
        )
        .unwrap();
    assert_eq!(resolved.slice(DEFINES), ["Z"]);
}

#[test]
fn public_only_reaches_dependents_but_not_self() {
    let mut env = test_env();

    let lib = env.project("Lib", ProjectType::StaticLib);
    env[lib]
        .config(Transitivity::PublicOnly)
        .push(DEFINES, "EXPORT");

    let own = env
        .resolve(
            lib,
            Some(ProjectType::StaticLib),
            StringId::new("debug"),
            OperatingSystem::Linux,
        )
        .unwrap();
    assert!(own.slice(DEFINES).is_empty());

    let app = env.project("App", ProjectType::Executable);
    env[app].link(lib);
    let dependent = env
        .resolve(
            app,
            Some(ProjectType::Executable),
            StringId::new("debug"),
            OperatingSystem::Linux,
        )
        .unwrap();
    assert_eq!(dependent.slice(DEFINES), ["EXPORT"]);
}

#[test]
fn duplicate_libs_collapse_to_one() {
    let mut env = test_env();

    let a = env.project("A", ProjectType::StaticLib);
    env[a].config(Transitivity::Public).push(LIBS, "m");
    let b = env.project("B", ProjectType::StaticLib);
    env[b].config(Transitivity::Public).push(LIBS, "m");

    let app = env.project("App", ProjectType::Executable);
    env[app].link(a);
    env[app].link(b);

    let resolved = env
        .resolve(
            app,
            Some(ProjectType::Executable),
            StringId::new("debug"),
            OperatingSystem::Linux,
        )
        .unwrap();
    assert_eq!(resolved.slice(LIBS), [PathBuf::from("m")]);
}

#[test]
fn post_processors_may_append_post_processors() {
    use gantry::PostProcessor;

    let mut env = test_env();
    let p = env.project("P", ProjectType::Command);
    env[p].push(
        COMMANDS,
        gantry::command::mkdir("somewhere"),
    );
    env[p].push(
        POST_PROCESS,
        PostProcessor::new(|_, resolved| {
            resolved.push(DEFINES, "FIRST");
            resolved.push(
                POST_PROCESS,
                PostProcessor::new(|_, resolved| {
                    resolved.push(DEFINES, "APPENDED");
                    Ok(())
                }),
            );
            Ok(())
        }),
    );

    let target = scratch_root("postprocess");
    let ctx = EmitContext {
        target_path: target.clone(),
        config: StringId::new("debug"),
        jobs: None,
    };
    let prepared = prepare(&mut env, &ctx, &[]).unwrap();
    let defines = prepared[0].options.slice(DEFINES);
    assert_eq!(defines, ["FIRST", "APPENDED"]);

    let _ = std::fs::remove_dir_all(&target);
}

#[test]
fn command_project_without_commands_is_fatal() {
    let mut env = test_env();
    env.project("Empty", ProjectType::Command);

    let target = scratch_root("empty_command");
    let ctx = EmitContext {
        target_path: target.clone(),
        config: StringId::new("debug"),
        jobs: None,
    };
    let err = prepare(&mut env, &ctx, &[]).unwrap_err();
    assert!(err.to_string().contains("has no commands"));

    let _ = std::fs::remove_dir_all(&target);
}

#[test]
fn unnamed_typed_project_is_fatal() {
    let mut env = test_env();
    env.project("", ProjectType::Executable);

    let target = scratch_root("unnamed");
    let ctx = EmitContext {
        target_path: target.clone(),
        config: StringId::new("debug"),
        jobs: None,
    };
    let err = prepare(&mut env, &ctx, &[]).unwrap_err();
    assert!(err.to_string().contains("no name"));

    let _ = std::fs::remove_dir_all(&target);
}

#[test]
fn configuration_only_projects_emit_nothing() {
    let mut env = test_env();

    let flags = env.project("", None);
    env[flags].config(Transitivity::Public).push(DEFINES, "SHARED_FLAG");

    let app = env.project("App", ProjectType::Executable);
    env[app].link(flags);
    env[app].push(FILES, "app.c");

    let target = scratch_root("config_only");
    let ctx = EmitContext {
        target_path: target.clone(),
        config: StringId::new("debug"),
        jobs: None,
    };
    let prepared = prepare(&mut env, &ctx, &[]).unwrap();

    // Only App emits, with the shared flag folded in.
    assert_eq!(prepared.len(), 1);
    assert_eq!(prepared[0].name, "App");
    assert_eq!(prepared[0].options.slice(DEFINES), ["SHARED_FLAG"]);

    let _ = std::fs::remove_dir_all(&target);
}
