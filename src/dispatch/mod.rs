//! Child process dispatch
//!
//! Maps a subcommand to a single external process, waits for it and turns
//! its exit status into ours. There are no retries: every failure ends the
//! invocation.

mod runner;

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

pub use runner::SystemRunner;

/// The subcommands the dispatcher accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// Run the dev server with the development config
    Start,
    /// Run a production build
    Build,
}

impl Script {
    pub fn as_str(&self) -> &'static str {
        match self {
            Script::Start => "start",
            Script::Build => "build",
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An argument that is not one of the known subcommands
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unsupported command: {0}")]
pub struct ScriptError(pub String);

impl FromStr for Script {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Script::Start),
            "build" => Ok(Script::Build),
            other => Err(ScriptError(other.to_string())),
        }
    }
}

/// A fully resolved child process launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub envs: Vec<(String, OsString)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            envs: Vec::new(),
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

    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Shell-style rendering for logs and `--dry-run`
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How a child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    /// `None` when the child was killed by a signal
    pub code: Option<i32>,
}

impl ChildExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Spawns and awaits child processes
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<ChildExit>;
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with code {code}")]
    Exited { program: String, code: i32 },

    #[error("'{program}' was terminated by a signal")]
    Terminated { program: String },
}

/// Terminal state of an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::Failure => 1,
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        ExitCode::from(outcome.exit_code())
    }
}

/// Runs one invocation and mirrors its exit status
pub struct Dispatcher<'a, R: ProcessRunner + ?Sized> {
    runner: &'a R,
}

impl<'a, R: ProcessRunner + ?Sized> Dispatcher<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    pub async fn dispatch(&self, invocation: &Invocation) -> Result<(), DispatchError> {
        info!("Running {}", invocation.command_line());
        debug!("Working directory: {}", invocation.cwd.display());

        let exit = self
            .runner
            .run(invocation)
            .await
            .map_err(|source| DispatchError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        debug!("{} exited with {:?}", invocation.program, exit.code);

        match exit.code {
            Some(0) => Ok(()),
            Some(code) => Err(DispatchError::Exited {
                program: invocation.program.clone(),
                code,
            }),
            None => Err(DispatchError::Terminated {
                program: invocation.program.clone(),
            }),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingRunner;
    use super::*;
    use std::io;

    fn invocation() -> Invocation {
        Invocation::new("webpack", "/project").args(["--config", "/project/build.config.js"])
    }

    #[test]
    fn test_parse_script() {
        assert_eq!("start".parse::<Script>(), Ok(Script::Start));
        assert_eq!("build".parse::<Script>(), Ok(Script::Build));

        let err = "deploy".parse::<Script>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported command: deploy");
        assert!("Build".parse::<Script>().is_err());
    }

    #[test]
    fn test_command_line() {
        assert_eq!(
            invocation().command_line(),
            "webpack --config /project/build.config.js"
        );
    }

    #[test]
    fn test_outcome_exit_codes() {
        assert_eq!(Outcome::Success.exit_code(), 0);
        assert_eq!(Outcome::Failure.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_zero_exit_succeeds() {
        let runner = RecordingRunner::exiting(0);
        let result = Dispatcher::new(&runner).dispatch(&invocation()).await;

        assert!(result.is_ok());
        assert_eq!(runner.calls(), vec![invocation()]);
    }

    #[tokio::test]
    async fn test_non_zero_exit_fails() {
        let runner = RecordingRunner::exiting(2);
        let err = Dispatcher::new(&runner).dispatch(&invocation()).await.unwrap_err();

        assert!(matches!(err, DispatchError::Exited { code: 2, .. }));
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_spawn_error_fails() {
        let runner = RecordingRunner::with_result(Err(io::Error::new(
            io::ErrorKind::NotFound,
            "not found",
        )));
        let err = Dispatcher::new(&runner).dispatch(&invocation()).await.unwrap_err();

        assert!(matches!(err, DispatchError::Spawn { .. }));
        assert!(err.to_string().contains("webpack"));
    }

    #[tokio::test]
    async fn test_signal_fails() {
        let runner = RecordingRunner::with_result(Ok(ChildExit { code: None }));
        let err = Dispatcher::new(&runner).dispatch(&invocation()).await.unwrap_err();

        assert!(matches!(err, DispatchError::Terminated { .. }));
    }
}
