//! External compiler execution.
//!
//! Builder-style wrapper around `tokio::process::Command` used by the
//! command-backed preprocessors.
//!
//! ```ignore
//! let css = Cmd::new("sass")
//!     .args(["--no-source-map", "--style=expanded"])
//!     .arg(source)
//!     .output()
//!     .await?;
//! ```

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::build::BuildError;

/// Command builder for one compiler invocation.
#[derive(Debug, Default)]
pub struct Cmd {
    program: String,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    /// Run from `dir` so relative imports in the source resolve.
    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Run to completion and return stdout.
    ///
    /// The child is killed if this future is dropped (e.g. on build timeout).
    pub async fn output(self) -> Result<Vec<u8>, BuildError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }

        tracing::debug!(program = %self.program, args = ?self.args, "Running compiler");

        let output = command.output().await.map_err(|source| BuildError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(BuildError::Compiler {
                program: self.program,
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}
