//! Pre/post render hook runner.
//!
//! Hooks are opaque, operator-supplied shell commands. verso does not
//! interpret their output; a non-zero exit gates the run.

use std::io;
use std::path::Path;
use std::process::Command;

/// Error returned by a hook command.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// The command could not be spawned.
    #[error("{name} hook failed to start: {source}")]
    Spawn {
        /// Hook name ("pre_render" / "post_render").
        name: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The command ran and exited non-zero.
    #[error("{name} hook exited with {status}: {command}")]
    Failed {
        /// Hook name.
        name: String,
        /// The command line that failed.
        command: String,
        /// Exit status description.
        status: String,
    },
}

/// Run a hook command through the shell, inheriting stdio.
///
/// # Errors
///
/// Returns [`HookError`] if the command cannot start or exits non-zero.
pub fn run_hook(name: &str, command: &str, cwd: &Path) -> Result<(), HookError> {
    tracing::info!(hook = name, command, "running hook");
    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(cwd)
        .status()
        .map_err(|source| HookError::Spawn {
            name: name.to_owned(),
            source,
        })?;

    if !status.success() {
        return Err(HookError::Failed {
            name: name.to_owned(),
            command: command.to_owned(),
            status: status.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_hook() {
        let temp = tempfile::tempdir().unwrap();
        run_hook("pre_render", "true", temp.path()).unwrap();
    }

    #[test]
    fn test_failing_hook_reports_command() {
        let temp = tempfile::tempdir().unwrap();
        let err = run_hook("post_render", "exit 3", temp.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("post_render"));
        assert!(msg.contains("exit 3"));
    }

    #[test]
    fn test_hook_runs_in_given_directory() {
        let temp = tempfile::tempdir().unwrap();
        run_hook("pre_render", "touch marker", temp.path()).unwrap();
        assert!(temp.path().join("marker").exists());
    }
}
