//! Tokio implementation of the launch use case's process seam.

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::application::launch_consumers::{
    CommandSpec, LaunchError, ProcessSpawner, RunningProcess,
};

/// [`ProcessSpawner`] backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessSpawner;

impl TokioProcessSpawner {
    pub fn new() -> Self {
        Self
    }
}

fn command(spec: &CommandSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args);
    for (key, value) in &spec.env {
        cmd.env(key, value);
    }
    cmd
}

#[async_trait]
impl ProcessSpawner for TokioProcessSpawner {
    async fn run(&self, spec: &CommandSpec) -> Result<(), LaunchError> {
        debug!("executing: {}", spec.display_line());
        let status = command(spec)
            .status()
            .await
            .map_err(|source| LaunchError::Spawn {
                program: spec.program.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(LaunchError::Failed {
                program: spec.program.clone(),
                status: status.code(),
            })
        }
    }

    async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn RunningProcess>, LaunchError> {
        debug!("spawning: {}", spec.display_line());
        let child = command(spec).spawn().map_err(|source| LaunchError::Spawn {
            program: spec.program.clone(),
            source,
        })?;
        Ok(Box::new(TokioProcess {
            program: spec.program.clone(),
            child,
        }))
    }
}

/// A child started by [`TokioProcessSpawner`].
#[derive(Debug)]
pub struct TokioProcess {
    program: String,
    child: Child,
}

#[async_trait]
impl RunningProcess for TokioProcess {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait(&mut self) -> Result<Option<i32>, LaunchError> {
        let status = self.child.wait().await.map_err(|source| LaunchError::Wait {
            program: self.program.clone(),
            source,
        })?;
        Ok(status.code())
    }
}
