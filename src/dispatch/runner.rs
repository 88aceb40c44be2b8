//! Process runner backed by the operating system

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{ChildExit, Invocation, ProcessRunner};

/// Spawns real child processes with inherited stdio
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<ChildExit> {
        let (program, args) = program_and_args(invocation, cfg!(windows));

        let status = Command::new(program)
            .args(args)
            .current_dir(&invocation.cwd)
            .envs(invocation.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;

        Ok(ChildExit {
            code: status.code(),
        })
    }
}

/// npm installs `.cmd` shims on Windows, which only resolve through `cmd`
fn program_and_args(invocation: &Invocation, windows: bool) -> (String, Vec<String>) {
    if windows {
        let mut args = vec!["/C".to_string(), invocation.program.clone()];
        args.extend(invocation.args.iter().cloned());
        ("cmd".to_string(), args)
    } else {
        (invocation.program.clone(), invocation.args.clone())
    }
}
