//! Child process execution for build and install steps.
//!
//! Unlike a hermetic build, the child inherits the caller's environment:
//! compilers and CMake are found on the user's `PATH`. Extra variables are
//! set on the child only, never on this process.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command, Output};

use tracing::{debug, info, warn};

use crate::package::StageError;

/// Run `cmd` through a shell in `cwd`.
pub fn run_shell(
  cmd: &str,
  cwd: &Path,
  env: &BTreeMap<String, String>,
  shell: Option<&str>,
  dry_run: bool,
) -> Result<(), StageError> {
  if dry_run {
    info!(cmd = %cmd, cwd = %cwd.display(), "[dry-run] run");
    return Ok(());
  }

  info!(cmd = %cmd, cwd = %cwd.display(), "running command");
  let (shell_cmd, shell_args) = get_shell(shell);
  debug!(shell = %shell_cmd, "spawning process");

  let mut command = Command::new(&shell_cmd);
  command.args(&shell_args).arg(cmd).current_dir(cwd).envs(env);
  check(cmd, command.output()?)
}

/// Run `program` with `args` directly, without a shell.
pub fn run_program(
  program: &str,
  args: &[String],
  cwd: Option<&Path>,
  env: &BTreeMap<String, String>,
  dry_run: bool,
) -> Result<(), StageError> {
  let shown = display_command(program, args);
  if dry_run {
    info!(cmd = %shown, "[dry-run] run");
    return Ok(());
  }

  info!(cmd = %shown, "running command");
  let mut command = Command::new(program);
  command.args(args).envs(env);
  if let Some(cwd) = cwd {
    command.current_dir(cwd);
  }
  check(&shown, command.output()?)
}

fn check(cmd: &str, output: Output) -> Result<(), StageError> {
  let stdout = String::from_utf8_lossy(&output.stdout);
  let stderr = String::from_utf8_lossy(&output.stderr);
  if !stdout.trim().is_empty() {
    debug!(stdout = %stdout.trim_end(), "command stdout");
  }

  if !output.status.success() {
    if !stderr.trim().is_empty() {
      warn!(stderr = %stderr.trim_end(), "command stderr");
    }
    return Err(StageError::CmdFailed {
      cmd: cmd.to_string(),
      code: output.status.code(),
    });
  }

  if !stderr.trim().is_empty() {
    debug!(stderr = %stderr.trim_end(), "command stderr");
  }
  Ok(())
}

/// Shell command line for log output.
pub(crate) fn display_command(program: &str, args: &[String]) -> String {
  let mut out = String::from(program);
  for arg in args {
    out.push(' ');
    if arg.is_empty() || arg.contains(char::is_whitespace) {
      out.push('"');
      out.push_str(arg);
      out.push('"');
    } else {
      out.push_str(arg);
    }
  }
  out
}

/// Shell program and the arguments that precede the command string.
///
/// An explicit shell gets the flag its family expects. Otherwise `/bin/sh` on
/// Unix and PowerShell on Windows; `$SHELL` is ignored.
fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      vec!["-NoProfile".to_string(), "-Command".to_string()]
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    (
      "powershell.exe".to_string(),
      vec![
        "-NoProfile".to_string(),
        "-ExecutionPolicy".to_string(),
        "Bypass".to_string(),
        "-Command".to_string(),
      ],
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;
  use tracing_test::traced_test;

  #[test]
  fn shell_detection_for_overrides() {
    assert_eq!(get_shell(Some("/bin/bash")).1, vec!["-c"]);
    assert_eq!(get_shell(Some("cmd.exe")).1, vec!["/C"]);
    assert_eq!(get_shell(Some("pwsh")).1, vec!["-NoProfile", "-Command"]);
  }

  #[test]
  fn display_quotes_args_with_spaces() {
    let args = vec!["-S".to_string(), "my src".to_string(), String::new()];
    assert_eq!(display_command("cmake", &args), r#"cmake -S "my src" """#);
  }

  #[test]
  fn dry_run_skips_execution() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("marker");

    run_shell(
      &format!("echo hi > {}", marker.display()),
      temp.path(),
      &BTreeMap::new(),
      None,
      true,
    )
    .unwrap();

    assert!(!marker.exists());
  }

  #[test]
  #[traced_test]
  fn dry_run_program_logs_quoted_command() {
    let args = vec!["--build".to_string(), "out dir".to_string()];

    run_program("cmake", &args, None, &BTreeMap::new(), true).unwrap();

    assert!(logs_contain("[dry-run] run"));
    assert!(logs_contain(r#"cmake --build "out dir""#));
  }

  #[test]
  fn missing_program_is_io_error() {
    let err = run_program("nestpkg-no-such-program", &[], None, &BTreeMap::new(), false).unwrap_err();
    assert!(matches!(err, StageError::Io(_)));
  }

  #[cfg(unix)]
  #[test]
  fn shell_runs_in_cwd_with_env() {
    let temp = TempDir::new().unwrap();
    let env = BTreeMap::from([("GREETING".to_string(), "hello".to_string())]);

    run_shell("echo \"$GREETING\" > out.txt", temp.path(), &env, None, false).unwrap();

    let written = std::fs::read_to_string(temp.path().join("out.txt")).unwrap();
    assert_eq!(written.trim(), "hello");
  }

  #[cfg(unix)]
  #[test]
  fn env_is_not_leaked_to_parent() {
    let temp = TempDir::new().unwrap();
    let env = BTreeMap::from([("NESTPKG_CHILD_ONLY".to_string(), "1".to_string())]);

    run_shell("true", temp.path(), &env, None, false).unwrap();

    assert!(std::env::var("NESTPKG_CHILD_ONLY").is_err());
  }

  #[cfg(unix)]
  #[test]
  fn failing_command_reports_exit_code() {
    let temp = TempDir::new().unwrap();

    let err = run_shell("exit 3", temp.path(), &BTreeMap::new(), None, false).unwrap_err();

    match err {
      StageError::CmdFailed { cmd, code } => {
        assert_eq!(cmd, "exit 3");
        assert_eq!(code, Some(3));
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[cfg(unix)]
  #[test]
  fn program_runs_without_shell() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("made by touch");

    run_program(
      "touch",
      &[target.to_string_lossy().into_owned()],
      None,
      &BTreeMap::new(),
      false,
    )
    .unwrap();

    assert!(target.exists());
  }
}
