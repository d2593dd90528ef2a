//! Process control for the UI under test
//!
//! The publisher only drives state; the UI that renders it runs as a
//! separate process started before the loop and stopped after it.

use crate::error::{AlertError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::{Child, Command};

/// Start/stop handle for an external process
#[async_trait]
pub trait ProcessControl: Send {
    /// Process name for logging
    fn name(&self) -> &str;

    /// Start the process; a no-op when it is already running
    async fn start(&mut self) -> Result<()>;

    /// Stop the process; a no-op when it is not running
    async fn stop(&mut self) -> Result<()>;

    /// Whether the process is alive
    fn is_running(&mut self) -> bool;
}

/// How to launch the UI process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Name used in logs
    #[serde(default = "default_process_name")]
    pub name: String,

    /// Shell-style command line, e.g. `./ui --fullscreen`
    pub command: String,

    /// Working directory
    #[serde(default)]
    pub dir: Option<PathBuf>,

    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Seconds to wait for exit after the kill signal
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,
}

fn default_process_name() -> String {
    "ui".to_string()
}

fn default_stop_timeout() -> u64 {
    5
}

impl ProcessConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            name: default_process_name(),
            command: command.into(),
            dir: None,
            env: HashMap::new(),
            stop_timeout_secs: default_stop_timeout(),
        }
    }
}

/// A child process launched from a command line
pub struct CommandProcess {
    config: ProcessConfig,
    child: Option<Child>,
}

impl CommandProcess {
    pub fn new(config: ProcessConfig) -> Self {
        Self {
            config,
            child: None,
        }
    }

    /// OS process id while running
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(|c| c.id())
    }

    fn error(&self, reason: impl Into<String>) -> AlertError {
        AlertError::Process {
            name: self.config.name.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ProcessControl for CommandProcess {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }

        let parts = split_cmd(&self.config.command);
        let Some((program, args)) = parts.split_first() else {
            return Err(self.error("empty command"));
        };

        let mut cmd = Command::new(program);
        cmd.args(args).envs(&self.config.env).kill_on_drop(true);
        if let Some(dir) = &self.config.dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| self.error(e.to_string()))?;
        tracing::info!(
            name = %self.config.name,
            pid = child.id().unwrap_or(0),
            command = %self.config.command,
            "Process started"
        );
        self.child = Some(child);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        if let Err(e) = child.start_kill() {
            // Already exited
            tracing::debug!(name = %self.config.name, error = %e, "Kill signal not delivered");
        }

        let timeout = Duration::from_secs(self.config.stop_timeout_secs);
        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => {
                tracing::info!(name = %self.config.name, %status, "Process stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(self.error(e.to_string())),
            Err(_) => Err(AlertError::Timeout(format!(
                "process '{}' did not exit within {}s",
                self.config.name, self.config.stop_timeout_secs
            ))),
        }
    }

    fn is_running(&mut self) -> bool {
        match self.child.as_mut().map(|c| c.try_wait()) {
            Some(Ok(None)) => true,
            Some(Ok(Some(_))) | Some(Err(_)) => {
                self.child = None;
                false
            }
            None => false,
        }
    }
}

/// Shell-style command splitting with single/double quotes and backslash escapes
pub fn split_cmd(cmd: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut chars = cmd.chars();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if !in_single => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            ' ' | '\t' if !in_single && !in_double => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }
    args
}
