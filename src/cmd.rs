//! Subprocess execution.
//!
//! Builder over `std::process::Command` for the external collaborators
//! (spack, gh). Commands run argv-style, no shell. Each invocation is
//! echoed to the terminal before it runs unless marked quiet.
//!
//! # Example
//! ```ignore
//! let out = Cmd::new("gh").args(["pr", "diff"]).capture()?;
//! if out.success { ... }
//! ```

use std::io;
use std::path::PathBuf;
use std::process::Command;

use crate::output;

/// A command to run, with its arguments.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: PathBuf,
    args: Vec<String>,
    quiet: bool,
}

impl Cmd {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            quiet: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Do not echo the command line before running.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// The command line as it would appear in a shell, for display.
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    fn echo(&self) {
        if !self.quiet {
            output::command(&self.command_line());
        }
    }

    /// Run and capture stdout/stderr.
    pub fn capture(&self) -> io::Result<CmdOutput> {
        self.echo();
        let output = self.build().output()?;
        Ok(CmdOutput {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            success: output.status.success(),
        })
    }

    /// Run with the terminal's stdio attached, so the child's output and
    /// any prompts reach the user directly. Returns the exit code.
    pub fn stream(&self) -> io::Result<i32> {
        self.echo();
        let status = self.build().status()?;
        Ok(status.code().unwrap_or(-1))
    }
}

/// Captured output of a finished command.
#[derive(Debug, Clone)]
pub struct CmdOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

impl CmdOutput {
    /// Stderr when present, stdout otherwise. What the original tool
    /// prints when a command goes wrong.
    pub fn error_text(&self) -> &str {
        if self.stderr.is_empty() { &self.stdout } else { &self.stderr }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_stdout() {
        let out = Cmd::new("echo").arg("hello").quiet().capture().unwrap();
        assert_eq!(out.stdout, "hello");
        assert!(out.success);
        assert_eq!(out.exit_code, 0);
    }

    #[test]
    fn test_capture_failure() {
        let out = Cmd::new("false").quiet().capture().unwrap();
        assert!(!out.success);
        assert_eq!(out.exit_code, 1);
    }

    #[test]
    fn test_stream_exit_code() {
        assert_eq!(Cmd::new("true").quiet().stream().unwrap(), 0);
        assert_eq!(Cmd::new("false").quiet().stream().unwrap(), 1);
    }

    #[test]
    fn test_missing_program_is_io_error() {
        assert!(Cmd::new("/nonexistent/program").quiet().capture().is_err());
    }

    #[test]
    fn test_command_line_display() {
        let cmd = Cmd::new("bin/spack").args(["install", "-v", "wget@2.4.1"]);
        assert_eq!(cmd.command_line(), "bin/spack install -v wget@2.4.1");
    }

    #[test]
    fn test_error_text_prefers_stderr() {
        let out = CmdOutput {
            stdout: "out".into(),
            stderr: "err".into(),
            exit_code: 1,
            success: false,
        };
        assert_eq!(out.error_text(), "err");

        let out = CmdOutput {
            stdout: "out".into(),
            stderr: String::new(),
            exit_code: 1,
            success: false,
        };
        assert_eq!(out.error_text(), "out");
    }
}
