//! Command-line handling for build descriptions.
//!
//! The flag set is partly dynamic: every registered emitter contributes a
//! `--<name>[=dir]` flag, so the clap command is assembled at runtime
//! rather than derived.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Arg, ArgAction, Command};

/// Parsed arguments for one invocation.
pub struct CliArgs {
    /// Configuration selected with `--config`, if any.
    pub config: Option<String>,
    /// Concurrency cap selected with `--jobs`, if any.
    pub jobs: Option<usize>,
    /// Selected emitters with their output directories, in argument order.
    pub emitters: Vec<(String, PathBuf)>,
}

/// Builds the dynamic flag set and parses `args` (without the binary
/// name). Returns `None` when help was requested and printed.
pub fn parse<I>(emitters: &[(String, String)], args: I) -> Result<Option<CliArgs>>
where
    I: IntoIterator<Item = String>,
{
    let mut command = Command::new("gantry")
        .about("Resolves the project graph and dispatches the selected emitters")
        .no_binary_name(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("NAME")
                .help("Select which configuration to build or emit"),
        )
        .arg(
            Arg::new("jobs")
                .long("jobs")
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .help("Maximum number of concurrent commands"),
        );

    for (name, help) in emitters {
        command = command.arg(
            Arg::new(name.clone())
                .long(name.clone())
                .value_name("DIR")
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value(format!("{name}build"))
                .action(ArgAction::Set)
                .help(help.clone()),
        );
    }

    let matches = match command.try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(err)
            if matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) =>
        {
            err.print()?;
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };

    let selected = emitters
        .iter()
        .filter_map(|(name, _)| {
            matches
                .get_one::<String>(name)
                .map(|dir| (name.clone(), PathBuf::from(dir)))
        })
        .collect();

    Ok(Some(CliArgs {
        config: matches.get_one::<String>("config").cloned(),
        jobs: matches.get_one::<usize>("jobs").copied(),
        emitters: selected,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitters() -> Vec<(String, String)> {
        vec![
            ("ninja".to_string(), "Emit ninja files".to_string()),
            ("build".to_string(), "Build directly".to_string()),
        ]
    }

    fn parse_line(line: &[&str]) -> CliArgs {
        parse(&emitters(), line.iter().map(|s| s.to_string()))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn emitter_flag_with_directory() {
        let args = parse_line(&["--ninja=out", "--config", "debug"]);
        assert_eq!(args.config.as_deref(), Some("debug"));
        assert_eq!(args.emitters, [("ninja".to_string(), PathBuf::from("out"))]);
    }

    #[test]
    fn emitter_flag_defaults_its_directory() {
        let args = parse_line(&["--ninja"]);
        assert_eq!(
            args.emitters,
            [("ninja".to_string(), PathBuf::from("ninjabuild"))]
        );
    }

    #[test]
    fn several_emitters_may_be_selected() {
        let args = parse_line(&["--ninja=n", "--build=b", "--jobs", "4"]);
        assert_eq!(args.emitters.len(), 2);
        assert_eq!(args.jobs, Some(4));
    }

    #[test]
    fn no_emitters_selected_is_empty_not_an_error() {
        let args = parse_line(&["--config", "release"]);
        assert!(args.emitters.is_empty());
    }

    #[test]
    fn unknown_flags_are_rejected() {
        let result = parse(&emitters(), ["--bogus".to_string()]);
        assert!(result.is_err());
    }
}
