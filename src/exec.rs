//! A renderer that shells out to an external dump tool.

use std::path::PathBuf;
use std::process::Command;

use miette::Diagnostic;
use thiserror::Error;

use crate::diagnostics::RunnerError;
use crate::platform::TargetBackend;
use crate::runner::Fixture;
use crate::snapshot::Renderer;

/// Environment variable carrying the platform marker to the child process.
pub const TARGET_ENV: &str = "FIXREG_TARGET_BACKEND";

#[derive(Debug, Error, Diagnostic)]
pub enum ExecError {
    #[error("failed to start `{program}`")]
    #[diagnostic(code(fixreg::exec_spawn))]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status} on {}:\n{stderr}", .fixture.display())]
    #[diagnostic(code(fixreg::exec_failed))]
    RendererFailed {
        program: String,
        fixture: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("`{program}` printed non UTF-8 output")]
    #[diagnostic(code(fixreg::exec_output))]
    Output { program: String },
}

/// Runs `program args... <fixture>` and uses its stdout as the dump.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Renderer for CommandRenderer {
    fn render(&self, fixture: &Fixture, target: TargetBackend) -> Result<String, RunnerError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(&fixture.path).env(TARGET_ENV, target.as_str());
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!(program = %self.program, fixture = %fixture.path.display(), "running dump tool");
        let output = cmd.output().map_err(|source| ExecError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(ExecError::RendererFailed {
                program: self.program.clone(),
                fixture: fixture.path.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            }
            .into());
        }
        String::from_utf8(output.stdout).map_err(|_| {
            ExecError::Output {
                program: self.program.clone(),
            }
            .into()
        })
    }
}
