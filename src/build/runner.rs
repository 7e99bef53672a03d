//! Shelling out: spawns a command line and captures its combined output.

use std::process::Command;

use anyhow::{Context, Result};

pub struct RunResult {
    pub exit_code: i32,
    pub output: String,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs `command` through the platform shell, blocking until it finishes.
/// stdout and stderr are captured together so failure output can be shown
/// without interleaving into the progress display.
pub fn run_command(command: &str) -> Result<RunResult> {
    let output = if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", command]).output()
    } else {
        Command::new("sh").args(["-c", command]).output()
    }
    .with_context(|| format!("Failed to spawn '{command}'"))?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    Ok(RunResult {
        exit_code: output.status.code().unwrap_or(-1),
        output: text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_output_and_exit_code() {
        let result = run_command("echo hello").unwrap();
        assert!(result.success());
        assert_eq!(result.output.trim(), "hello");
    }

    #[test]
    fn nonzero_exit_is_reported() {
        let result = run_command("exit 3").unwrap();
        assert!(!result.success());
        assert_eq!(result.exit_code, 3);
    }

    #[test]
    fn stderr_is_captured_too() {
        let result = run_command("echo oops 1>&2").unwrap();
        assert!(result.output.contains("oops"));
    }
}
