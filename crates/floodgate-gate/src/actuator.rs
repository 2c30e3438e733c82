//! CommandSwitch — flips registrations by running an admin command.
//!
//! The configured template is split on whitespace and the mode argument
//! (`open_arg` or `close_arg`, also whitespace split) is appended:
//!
//! ```text
//! /usr/local/bin/docker-compose run --rm web rails mastodon:settings:close_registrations
//! ```
//!
//! The command runs on every evaluation. Re-asserting the current state is
//! harmless, so no attempt is made to track what the remote side holds.

use std::process::Command;

use tracing::{debug, info};

use floodgate_core::{CommandConfig, FloodgateError, FloodgateResult, RegistrationSwitch};

#[derive(Debug, Clone)]
pub struct CommandSwitch {
    template: Vec<String>,
    open_args: Vec<String>,
    close_args: Vec<String>,
}

impl CommandSwitch {
    pub fn new(program: &str, open_arg: &str, close_arg: &str) -> FloodgateResult<Self> {
        let template = split_words(program);
        if template.is_empty() {
            return Err(FloodgateError::Config(
                "command.program must name a program".into(),
            ));
        }
        Ok(Self {
            template,
            open_args: split_words(open_arg),
            close_args: split_words(close_arg),
        })
    }

    pub fn from_config(config: &CommandConfig) -> FloodgateResult<Self> {
        Self::new(&config.program, &config.open_arg, &config.close_arg)
    }

    /// The full argument vector for the requested state, program first.
    pub fn argv(&self, open: bool) -> Vec<String> {
        let mode = if open { &self.open_args } else { &self.close_args };
        self.template.iter().chain(mode).cloned().collect()
    }
}

impl RegistrationSwitch for CommandSwitch {
    fn set_registrations(&self, open: bool) -> FloodgateResult<()> {
        let argv = self.argv(open);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| FloodgateError::Config("empty admin command".into()))?;

        let mut cmd = Command::new(program);
        cmd.args(args);
        debug!("Running: {:?}", cmd);

        let output = cmd
            .output()
            .map_err(|e| FloodgateError::Spawn(format!("{program}: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.trim().is_empty() {
            debug!(stdout = %stdout.trim(), "admin command output");
        }
        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim(), "admin command stderr");
        }

        if !output.status.success() {
            return Err(FloodgateError::Actuation {
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        info!(open, "registration state asserted");
        Ok(())
    }
}

fn split_words(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}
